use serde::{Deserialize, Serialize};

use crate::SessionError;

/// Inclusive bounds of one random sync-rate step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRange {
    pub min: u8,
    pub max: u8,
}

impl StepRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }
}

/// Rules applied by [`crate::Fusion`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Registry label of the mother role. Its confidence drives the sync rate.
    pub mother_label: String,
    pub child_label: String,
    /// Imperative/chore vocabulary that marks a text-only event as the mother's.
    pub mother_keywords: Vec<String>,
    /// Heuristic increase when a mother keyword matches.
    pub raise: StepRange,
    /// Heuristic decrease otherwise.
    pub lower: StepRange,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mother_label: "mother".to_string(),
            child_label: "child".to_string(),
            mother_keywords: ["片付け", "掃除", "宿題", "やりなさい", "ダメ", "早く"]
                .into_iter()
                .map(String::from)
                .collect(),
            raise: StepRange::new(15, 30),
            lower: StepRange::new(5, 15),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.mother_label.is_empty() || self.child_label.is_empty() {
            return Err(SessionError::Config("role labels must not be empty".into()));
        }
        if self.mother_label == self.child_label {
            return Err(SessionError::Config(format!(
                "mother and child share the label {:?}",
                self.mother_label
            )));
        }
        for (name, r) in [("raise", self.raise), ("lower", self.lower)] {
            if r.min > r.max || r.max > 100 {
                return Err(SessionError::Config(format!(
                    "{name} range {}..={} is invalid",
                    r.min, r.max
                )));
            }
        }
        Ok(())
    }
}
