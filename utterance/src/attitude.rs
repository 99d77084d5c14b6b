use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Utterance;

/// Coarse politeness of an utterance, independent of its command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attitude {
    Polite,
    Rude,
    Insult,
    Gratitude,
    #[default]
    Neutral,
}

const POLITE: &[&str] = &[
    "ください",
    "お願い",
    "ちょうだい",
    "つけて",
    "してください",
    "いただけ",
    "開けて",
    "閉めて",
    "上げて",
    "下げて",
];

const RUDE: &[&str] = &[
    "つけろ", "くれ", "しろ", "やれ", "けせ", "開けろ", "閉めろ", "上げろ", "下げろ",
];

const INSULT: &[&str] = &["うるさい", "うるせ", "黙れ", "黙っ"];

const GRATITUDE: &[&str] = &["ありがとう"];

/// Precedence order: the first set that matches decides.
const TABLE: &[(&[&str], Attitude)] = &[
    (POLITE, Attitude::Polite),
    (RUDE, Attitude::Rude),
    (INSULT, Attitude::Insult),
    (GRATITUDE, Attitude::Gratitude),
];

impl Attitude {
    pub const ALL: [Attitude; 5] = [
        Attitude::Polite,
        Attitude::Rude,
        Attitude::Insult,
        Attitude::Gratitude,
        Attitude::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attitude::Polite => "polite",
            Attitude::Rude => "rude",
            Attitude::Insult => "insult",
            Attitude::Gratitude => "gratitude",
            Attitude::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Attitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Judges the attitude of `text`. Polite beats rude beats insult beats
/// gratitude; anything else is neutral.
pub fn judge_attitude<'a>(text: impl Into<Utterance<'a>>) -> Attitude {
    let text = text.into();
    TABLE
        .iter()
        .find(|(keywords, _)| text.contains_any(keywords))
        .map(|(_, attitude)| *attitude)
        .unwrap_or_default()
}
