//! Two-speaker identification.
//!
//! # Architecture
//!
//! An utterance flows through three stages:
//!
//! 1. [`AudioSample`]: mono PCM16 audio, one owned sample per call
//! 2. [`Registry::score`]: raw per-speaker scores from the backend chosen by
//!    the model artifact's `kind`
//! 3. [`IdentificationResult::from_scores`]: shifted softmax into a
//!    [`ConfidenceMap`] and its arg-max label
//!
//! [`Identifier`] wraps the three with a lazily loaded, cached registry.
//!
//! # Backends
//!
//! ```text
//! distribution: MFCC frames -> total log-likelihood under each speaker's GMM
//! template:     encoder vector -> cosine similarity to each reference vector
//! ```
//!
//! # Feature Extraction
//!
//! The [`features`] module computes log mel filterbank energies and MFCCs:
//! - Per-frame DC removal and pre-emphasis
//! - Hamming window, FFT power spectrum
//! - Triangular mel filterbank, log with energy floor
//! - Orthonormal DCT-II for cepstra

mod audio;
mod confidence;
mod embedding;
mod error;
pub mod features;
mod gmm;
mod identifier;
mod registry;

pub use audio::{AudioSample, DEFAULT_SAMPLE_RATE};
pub use confidence::{softmax, ConfidenceMap, IdentificationResult, CONFIDENCE_FLOOR};
pub use embedding::{cosine_similarity, l2_normalize, FbankStatsEncoder, SpeakerEncoder};
pub use error::VoiceprintError;
pub use features::FeatureConfig;
pub use gmm::GaussianMixture;
pub use identifier::Identifier;
pub use registry::{BackendKind, ModelArtifact, Registry, SpeakerModel};
