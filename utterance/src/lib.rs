//! Command and attitude classification of recognized utterances.
//!
//! Both classifiers are pure keyword tables over substring containment.
//! They accept raw text or a recognizer word list (joined without a
//! separator) and never fail: unmatched text has no command and a
//! [`Attitude::Neutral`] attitude.
//!
//! ```
//! use mamaswitch_utterance::{classify, Attitude, Command};
//!
//! let c = classify("電気つけろ");
//! assert_eq!(c.command, Some(Command::LightOn));
//! assert_eq!(c.attitude, Attitude::Rude);
//! ```

mod attitude;
mod command;
pub mod julius;
mod utterance;

pub use attitude::{judge_attitude, Attitude};
pub use command::{classify_command, Command};
pub use utterance::Utterance;

use serde::{Deserialize, Serialize};

/// Command and attitude of one utterance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub command: Option<Command>,
    pub attitude: Attitude,
}

/// Runs both classifiers over the same text. Blank text classifies as
/// no command, neutral.
pub fn classify<'a>(text: impl Into<Utterance<'a>>) -> Classification {
    let text = text.into();
    if text.is_empty() {
        return Classification::default();
    }
    Classification {
        command: classify_command(&text),
        attitude: judge_attitude(&text),
    }
}
