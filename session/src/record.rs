//! Per-event log records and where they go.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use mamaswitch_utterance::{Attitude, Command};
use mamaswitch_voiceprint::ConfidenceMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SessionError;

/// How the speaker of an event was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    ModelBased,
    Heuristic,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::ModelBased => "model-based",
            Method::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one processed event. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub speaker: String,
    pub raw_text: String,
    pub command: Option<Command>,
    pub attitude: Attitude,
    pub response: String,
    /// Sync rate after the event was applied.
    pub sync_rate: u8,
    pub audio_present: bool,
    pub confidence: Option<ConfidenceMap>,
    pub method: Method,
}

/// Append-only destination for log records.
///
/// Called on the blocking pool after the state update has committed, so a
/// slow or failing sink never rolls back an event or stalls the runtime.
pub trait LogSink: Send + Sync {
    fn write(&self, entry: &LogEntry) -> Result<(), SessionError>;
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopSink;

impl LogSink for NopSink {
    fn write(&self, _: &LogEntry) -> Result<(), SessionError> {
        Ok(())
    }
}

/// One pretty-printed JSON file per event, named
/// `YYYYMMDD_HHMMSS_<seq>.json` after the record's timestamp.
#[derive(Debug)]
pub struct JsonDirSink {
    dir: PathBuf,
    seq: AtomicU64,
}

impl JsonDirSink {
    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            seq: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl LogSink for JsonDirSink {
    fn write(&self, entry: &LogEntry) -> Result<(), SessionError> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}_{seq:04}.json", entry.timestamp.format("%Y%m%d_%H%M%S"));
        let path = self.dir.join(name);
        let mut w = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut w, entry)?;
        w.flush()?;
        debug!(path = %path.display(), "log record saved");
        Ok(())
    }
}

/// Appends one JSON object per line to a journal file.
#[derive(Debug)]
pub struct JsonLinesSink {
    file: Mutex<File>,
}

impl JsonLinesSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for JsonLinesSink {
    fn write(&self, entry: &LogEntry) -> Result<(), SessionError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| SessionError::Sink("journal lock poisoned".into()))?;
        file.write_all(&line)?;
        Ok(())
    }
}
