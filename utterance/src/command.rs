use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Utterance;

/// Device or conversational command recognized in an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    TvOn,
    TvOff,
    LightOn,
    LightOff,
    CurtainOpen,
    CurtainClose,
    AlarmOn,
    AlarmOff,
    MusicOn,
    MusicOff,
    VolumeUp,
    VolumeDown,
    GetSnack,
    Snack,
    Insult,
    Gratitude,
    Exit,
}

impl Command {
    /// Every command, in table order.
    pub const ALL: [Command; 17] = [
        Command::TvOn,
        Command::TvOff,
        Command::LightOn,
        Command::LightOff,
        Command::CurtainOpen,
        Command::CurtainClose,
        Command::AlarmOn,
        Command::AlarmOff,
        Command::MusicOn,
        Command::MusicOff,
        Command::VolumeUp,
        Command::VolumeDown,
        Command::GetSnack,
        Command::Snack,
        Command::Insult,
        Command::Gratitude,
        Command::Exit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::TvOn => "TV_ON",
            Command::TvOff => "TV_OFF",
            Command::LightOn => "LIGHT_ON",
            Command::LightOff => "LIGHT_OFF",
            Command::CurtainOpen => "CURTAIN_OPEN",
            Command::CurtainClose => "CURTAIN_CLOSE",
            Command::AlarmOn => "ALARM_ON",
            Command::AlarmOff => "ALARM_OFF",
            Command::MusicOn => "MUSIC_ON",
            Command::MusicOff => "MUSIC_OFF",
            Command::VolumeUp => "VOLUME_UP",
            Command::VolumeDown => "VOLUME_DOWN",
            Command::GetSnack => "GET_SNACK",
            Command::Snack => "SNACK",
            Command::Insult => "INSULT",
            Command::Gratitude => "GRATITUDE",
            Command::Exit => "EXIT",
        }
    }

    /// Parses the wire name produced by [`Command::as_str`].
    pub fn from_name(name: &str) -> Option<Command> {
        Command::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the command table.
///
/// A rule fires when the utterance contains any of its `topic` keywords.
/// Once fired, the first branch whose keywords match decides the command; if
/// no branch matches, `otherwise` decides. A rule with no matching branch and
/// no `otherwise` passes the text on to the next rule.
struct Rule {
    topic: &'static [&'static str],
    branches: &'static [(&'static [&'static str], Command)],
    otherwise: Option<Command>,
}

const RULES: &[Rule] = &[
    Rule {
        topic: &["テレビ"],
        branches: &[(&["つけ"], Command::TvOn), (&["けし", "消し"], Command::TvOff)],
        otherwise: None,
    },
    Rule {
        topic: &["電気"],
        branches: &[(&["つけ"], Command::LightOn), (&["けし", "消し"], Command::LightOff)],
        otherwise: None,
    },
    Rule {
        topic: &["カーテン"],
        branches: &[(&["開け"], Command::CurtainOpen), (&["閉め"], Command::CurtainClose)],
        otherwise: None,
    },
    Rule {
        topic: &["アラーム"],
        branches: &[(&["かけ"], Command::AlarmOn), (&["けし", "とめ"], Command::AlarmOff)],
        otherwise: None,
    },
    Rule {
        topic: &["音楽"],
        branches: &[(&["かけ"], Command::MusicOn), (&["けし", "とめ"], Command::MusicOff)],
        otherwise: None,
    },
    Rule {
        topic: &["音量"],
        branches: &[(&["上げ"], Command::VolumeUp), (&["下げ"], Command::VolumeDown)],
        otherwise: None,
    },
    Rule {
        topic: &["おやつ"],
        branches: &[(&["ちょうだい", "ください"], Command::GetSnack)],
        otherwise: Some(Command::Snack),
    },
    Rule {
        topic: &["うるさい", "うるせ", "黙れ", "黙っ"],
        branches: &[],
        otherwise: Some(Command::Insult),
    },
    Rule {
        topic: &["ありがとう"],
        branches: &[],
        otherwise: Some(Command::Gratitude),
    },
    Rule {
        topic: &["終了"],
        branches: &[],
        otherwise: Some(Command::Exit),
    },
];

/// Returns the command carried by `text`, if any.
///
/// Rules are tried in a fixed order: device pairs (TV, light, curtain,
/// alarm, music), volume, snack, insult, gratitude, exit. The first rule
/// whose topic and verb both appear decides the result; a topic without its
/// verb ("テレビの音量を上げて") leaves the scan to later rules.
pub fn classify_command<'a>(text: impl Into<Utterance<'a>>) -> Option<Command> {
    let text = text.into();
    RULES
        .iter()
        .filter(|rule| text.contains_any(rule.topic))
        .find_map(|rule| {
            rule.branches
                .iter()
                .find(|(keywords, _)| text.contains_any(keywords))
                .map(|(_, cmd)| *cmd)
                .or(rule.otherwise)
        })
}
