//! Utility functions for CLI commands.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mamaswitch_voiceprint::Identifier;
use tracing::debug;

use crate::config::{load_config, Config};
use crate::Cli;

/// Gets the configuration named by `--config`, or the default one.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(cli.config.as_deref())
}

/// Identifier for `--model` if given, else the configured artifact.
pub fn identifier(cfg: &Config, model: Option<&Path>) -> Arc<Identifier> {
    let path: PathBuf = model.map_or_else(|| cfg.model_path.clone(), Path::to_path_buf);
    debug!(model = %path.display(), "speaker model");
    Arc::new(Identifier::from_path(path))
}

/// Joins positional words, or reads all of stdin when there are none.
pub fn text_or_stdin(words: &[String]) -> anyhow::Result<String> {
    if !words.is_empty() {
        return Ok(words.concat());
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim().to_string())
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: serde::Serialize>(result: &T, as_json: bool) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(result)?
    } else {
        serde_yaml::to_string(result)?
    };
    print!("{}", output);
    if as_json {
        println!();
    }
    Ok(())
}
