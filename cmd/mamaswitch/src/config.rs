//! Configuration file for the CLI.
//!
//! Stored as YAML in `~/.mamaswitch/config.yaml` unless `--config` points
//! elsewhere.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use mamaswitch_session::{JsonDirSink, JsonLinesSink, LogEntry, LogSink, SessionConfig, SessionError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".mamaswitch";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Model artifact used when neither the file nor the command line names one.
pub const DEFAULT_MODEL_PATH: &str = "models/speakers.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Speaker model artifact (JSON).
    pub model_path: PathBuf,

    /// Directory receiving one JSON file per event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// JSON-lines journal receiving every event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<PathBuf>,

    pub session: SessionConfig,

    /// Path the config was read from (not serialized).
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            log_dir: None,
            journal: None,
            session: SessionConfig::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the file the config came from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Builds the log sinks named by `log_dir` and `journal`.
    pub fn sinks(&self) -> anyhow::Result<Sinks> {
        let mut sinks: Vec<Box<dyn LogSink>> = Vec::new();
        if let Some(dir) = &self.log_dir {
            let sink = JsonDirSink::new(dir)
                .with_context(|| format!("cannot create log dir {}", dir.display()))?;
            sinks.push(Box::new(sink));
        }
        if let Some(path) = &self.journal {
            let sink = JsonLinesSink::open(path)
                .with_context(|| format!("cannot open journal {}", path.display()))?;
            sinks.push(Box::new(sink));
        }
        Ok(Sinks(sinks))
    }
}

/// Writes every record to each configured sink.
pub struct Sinks(Vec<Box<dyn LogSink>>);

impl Sinks {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl LogSink for Sinks {
    fn write(&self, entry: &LogEntry) -> Result<(), SessionError> {
        let mut first_err = None;
        for sink in &self.0 {
            if let Err(e) = sink.write(entry) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Loads the configuration.
///
/// An explicit path must exist. The default path is optional: when it is
/// missing, defaults are used.
pub fn load_config(custom_path: Option<&str>) -> anyhow::Result<Config> {
    let (config_path, required) = match custom_path {
        Some(p) => (PathBuf::from(p), true),
        None => match Config::default_config_path() {
            Some(p) => (p, false),
            None => return Ok(Config::default()),
        },
    };

    if !config_path.exists() {
        if required {
            anyhow::bail!("config file {} not found", config_path.display());
        }
        debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("cannot read {}", config_path.display()))?;
    let mut cfg: Config = serde_yaml::from_str(&content)
        .with_context(|| format!("invalid config {}", config_path.display()))?;
    cfg.session.validate()?;
    cfg.config_path = Some(config_path);
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_file_is_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(
            &path,
            "model_path: /opt/models/family.json\njournal: /tmp/j.jsonl\nsession:\n  mother_label: mama\n  raise: {min: 10, max: 20}\n",
        )
        .unwrap();

        let cfg = load_config(path.to_str()).unwrap();
        assert_eq!(cfg.model_path, PathBuf::from("/opt/models/family.json"));
        assert_eq!(cfg.journal, Some(PathBuf::from("/tmp/j.jsonl")));
        assert!(cfg.log_dir.is_none());
        assert_eq!(cfg.session.mother_label, "mama");
        assert_eq!(cfg.session.child_label, "child");
        assert_eq!(cfg.session.raise.max, 20);
        assert_eq!(cfg.path(), Some(path.as_path()));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope.yaml");
        assert!(load_config(path.to_str()).is_err());
    }

    #[test]
    fn invalid_session_section_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "session:\n  lower: {min: 9, max: 3}\n").unwrap();
        assert!(load_config(path.to_str()).is_err());
    }

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert!(cfg.sinks().unwrap().is_empty());
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(!yaml.contains("log_dir"));
    }

    #[test]
    fn sinks_fan_out() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = Config {
            log_dir: Some(tmp.path().join("logs")),
            journal: Some(tmp.path().join("journal.jsonl")),
            ..Config::default()
        };
        let sinks = cfg.sinks().unwrap();
        assert!(!sinks.is_empty());
        assert!(tmp.path().join("logs").is_dir());
        assert!(tmp.path().join("journal.jsonl").exists());
    }
}
