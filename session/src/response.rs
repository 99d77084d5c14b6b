//! Two-level response table: command to base phrase, then role and
//! attitude to phrasing.

use std::fmt;

use mamaswitch_utterance::{Attitude, Command};
use serde::{Deserialize, Serialize};

/// Which of the two fixed identities is speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mother,
    Child,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mother => "mother",
            Role::Child => "child",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phrase used when a command has no entry of its own.
pub const FALLBACK_PHRASE: &str = "コマンドを実行します";

/// Returns the action phrase for `command`.
pub fn base_phrase(command: Option<Command>) -> &'static str {
    let Some(command) = command else {
        return FALLBACK_PHRASE;
    };
    match command {
        Command::TvOn => "テレビをつけます",
        Command::TvOff => "テレビを消します",
        Command::LightOn => "電気をつけます",
        Command::LightOff => "電気を消します",
        Command::CurtainOpen => "カーテンを開けます",
        Command::CurtainClose => "カーテンを閉めます",
        Command::AlarmOn => "アラームをセットします",
        Command::AlarmOff => "アラームを止めます",
        Command::MusicOn => "音楽を再生します",
        Command::MusicOff => "音楽を止めます",
        Command::VolumeUp => "音量を上げます",
        Command::VolumeDown => "音量を下げます",
        Command::GetSnack => "おやつを用意します",
        Command::Snack => "おやつの要求を受け取りました",
        Command::Insult => "そんな言い方はよくありません",
        Command::Gratitude => "どういたしまして",
        Command::Exit => "システムを終了します",
    }
}

/// Picks the reply for one event. Defined for every input.
pub fn select_response(command: Option<Command>, attitude: Attitude, role: Role) -> String {
    let base = base_phrase(command);
    match role {
        Role::Mother => match attitude {
            Attitude::Polite => format!("はい、お母さん。{base}。"),
            Attitude::Rude => format!("お母さん、承知しました。{base}。"),
            Attitude::Insult => format!("お母さん、悲しいです。{base}。"),
            Attitude::Gratitude => "どういたしまして、お母さん。".to_string(),
            Attitude::Neutral => format!("かしこまりました。{base}。"),
        },
        Role::Child => match (attitude, command) {
            (Attitude::Polite, Some(Command::GetSnack)) => format!("いい子ですね。{base}。"),
            (Attitude::Polite, _) => format!("はい、{base}。"),
            (Attitude::Rude, _) => "そんな言い方はダメですよ。お母さんを呼んでください。".to_string(),
            (Attitude::Insult, _) => "そんなこと言う子は知りません。".to_string(),
            (Attitude::Gratitude, _) => "どういたしまして。".to_string(),
            (Attitude::Neutral, Some(Command::GetSnack)) => {
                "おやつは宿題が終わってからね。".to_string()
            }
            (Attitude::Neutral, Some(Command::TvOn)) => {
                "テレビは勉強が終わってからです。".to_string()
            }
            (Attitude::Neutral, _) => "それはお母さんに頼んでください。".to_string(),
        },
    }
}
