use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use mamaswitch_utterance::{classify, julius, Attitude, Command};
use serde::Serialize;
use tracing::warn;

use super::{output_result, text_or_stdin};
use crate::Cli;

/// Classify text, or the words of a Julius recognition result.
#[derive(Args)]
pub struct ClassifyCommand {
    /// Utterance text; several words are joined without spaces (default: stdin)
    text: Vec<String>,

    /// Julius module-mode output containing a <RECOGOUT> block
    #[arg(long, conflicts_with = "text")]
    julius: Option<PathBuf>,
}

#[derive(Serialize)]
struct Classified {
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    words: Vec<String>,
    command: Option<Command>,
    attitude: Attitude,
}

impl ClassifyCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let (text, words) = match &self.julius {
            Some(path) => {
                let buffer = std::fs::read_to_string(path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                if !julius::is_complete(&buffer) {
                    warn!(path = %path.display(), "no complete <RECOGOUT> block");
                }
                let words = julius::parse_words(&buffer);
                (words.concat(), words)
            }
            None => (text_or_stdin(&self.text)?, Vec::new()),
        };

        let tags = classify(text.as_str());
        output_result(
            &Classified {
                text,
                words,
                command: tags.command,
                attitude: tags.attitude,
            },
            cli.json,
        )
    }
}
