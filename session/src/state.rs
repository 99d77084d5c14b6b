//! Session state owned by the session task.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::LogEntry;

/// Speaker label before the first event and after a reset.
pub const UNKNOWN_SPEAKER: &str = "UNKNOWN";

/// Maximum number of log entries kept in history.
pub const HISTORY_CAPACITY: usize = 10;

/// Coarse session mode. Only `Idle` exists today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Idle,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "IDLE",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view returned by status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub sync_rate: u8,
    pub speaker: String,
    pub status: SessionStatus,
    pub log_count: usize,
}

/// Sync rate, current speaker, status and a bounded history.
#[derive(Debug, Clone)]
pub struct SessionState {
    sync_rate: u8,
    current_speaker: String,
    status: SessionStatus,
    history: VecDeque<LogEntry>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            sync_rate: 0,
            current_speaker: UNKNOWN_SPEAKER.to_string(),
            status: SessionStatus::Idle,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn sync_rate(&self) -> u8 {
        self.sync_rate
    }

    pub fn current_speaker(&self) -> &str {
        &self.current_speaker
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &LogEntry> {
        self.history.iter()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            sync_rate: self.sync_rate,
            speaker: self.current_speaker.clone(),
            status: self.status,
            log_count: self.history.len(),
        }
    }

    /// Commits one event: new sync rate and speaker plus its log entry.
    /// The oldest entry is evicted once history is full.
    pub(crate) fn commit(&mut self, entry: LogEntry) {
        self.sync_rate = entry.sync_rate.min(100);
        self.current_speaker.clone_from(&entry.speaker);
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }

    /// Restores the initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
