use thiserror::Error;

/// Errors returned by speaker identification.
#[derive(Debug, Error)]
pub enum VoiceprintError {
    /// The persisted model artifact is missing, unreadable or malformed.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("audio too short: need at least {min_samples} samples, got {got_samples}")]
    AudioTooShort { min_samples: usize, got_samples: usize },

    #[error("sample rate mismatch: model expects {expected} Hz, got {got} Hz")]
    SampleRateMismatch { expected: u32, got: u32 },

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("scoring failed: {0}")]
    Scoring(String),

    #[error("audio: {0}")]
    Audio(String),
}

impl VoiceprintError {
    /// Reports whether the error means no usable model could be loaded.
    pub fn is_model_unavailable(&self) -> bool {
        matches!(self, Self::ModelUnavailable(_))
    }

    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        Self::ModelUnavailable(reason.into())
    }
}

impl From<hound::Error> for VoiceprintError {
    fn from(err: hound::Error) -> Self {
        Self::Audio(err.to_string())
    }
}
