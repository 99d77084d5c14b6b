use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use mamaswitch_voiceprint::AudioSample;
use tracing::debug;

use super::{get_config, identifier, output_result};
use crate::Cli;

/// Score a WAV file against the registered speakers.
#[derive(Args)]
pub struct IdentifyCommand {
    /// WAV file (mono or multi-channel, sample rate must match the model)
    wav: PathBuf,

    /// Speaker model artifact (overrides config file)
    #[arg(long)]
    model: Option<PathBuf>,
}

impl IdentifyCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let id = identifier(&cfg, self.model.as_deref());
        let audio = AudioSample::read_wav(&self.wav)
            .with_context(|| format!("cannot read {}", self.wav.display()))?;
        debug!(
            samples = audio.len(),
            seconds = audio.duration_secs(),
            "audio loaded"
        );

        let result = tokio::task::spawn_blocking(move || id.identify(&audio)).await??;
        output_result(&result, cli.json)
    }
}
