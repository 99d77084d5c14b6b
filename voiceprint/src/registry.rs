//! Persisted speaker models and the two scoring backends.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embedding::{cosine_similarity, FbankStatsEncoder, SpeakerEncoder};
use crate::features::{mfcc_frames, FeatureConfig};
use crate::gmm::GaussianMixture;
use crate::{AudioSample, VoiceprintError};

/// On-disk model artifact, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// One Gaussian mixture per speaker over MFCC frames.
    Distribution {
        #[serde(default)]
        features: FeatureConfig,
        speakers: BTreeMap<String, GaussianMixture>,
    },
    /// One reference vector per speaker.
    Template {
        dimension: usize,
        speakers: BTreeMap<String, Vec<f32>>,
    },
}

impl ModelArtifact {
    /// Parses an artifact from JSON.
    pub fn from_json(data: &[u8]) -> Result<Self, VoiceprintError> {
        serde_json::from_slice(data)
            .map_err(|e| VoiceprintError::unavailable(format!("parse model artifact: {e}")))
    }

    /// Serializes the artifact as pretty JSON.
    pub fn to_json(&self) -> Result<String, VoiceprintError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| VoiceprintError::unavailable(format!("encode model artifact: {e}")))
    }
}

/// Which backend a registry was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Distribution,
    Template,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distribution => write!(f, "distribution"),
            Self::Template => write!(f, "template"),
        }
    }
}

/// A single speaker's model, borrowed from a [`Registry`].
#[derive(Debug, Clone, Copy)]
pub enum SpeakerModel<'a> {
    Distribution(&'a GaussianMixture),
    Template(&'a [f32]),
}

/// Scores audio against every registered speaker. Implemented once per
/// artifact kind; callers only ever see [`Registry`].
trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;
    fn labels(&self) -> Vec<&str>;
    fn model(&self, label: &str) -> Option<SpeakerModel<'_>>;
    fn score(&self, audio: &AudioSample) -> Result<Vec<(String, f64)>, VoiceprintError>;
}

struct DistributionBackend {
    features: FeatureConfig,
    speakers: BTreeMap<String, GaussianMixture>,
}

impl Backend for DistributionBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Distribution
    }

    fn labels(&self) -> Vec<&str> {
        self.speakers.keys().map(String::as_str).collect()
    }

    fn model(&self, label: &str) -> Option<SpeakerModel<'_>> {
        self.speakers.get(label).map(SpeakerModel::Distribution)
    }

    fn score(&self, audio: &AudioSample) -> Result<Vec<(String, f64)>, VoiceprintError> {
        let frames = mfcc_frames(audio, &self.features)?;
        self.speakers
            .iter()
            .map(|(label, gmm)| Ok((label.clone(), gmm.score(&frames)?)))
            .collect()
    }
}

struct TemplateBackend {
    encoder: Arc<dyn SpeakerEncoder>,
    speakers: BTreeMap<String, Vec<f32>>,
}

impl Backend for TemplateBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Template
    }

    fn labels(&self) -> Vec<&str> {
        self.speakers.keys().map(String::as_str).collect()
    }

    fn model(&self, label: &str) -> Option<SpeakerModel<'_>> {
        self.speakers
            .get(label)
            .map(|v| SpeakerModel::Template(v.as_slice()))
    }

    fn score(&self, audio: &AudioSample) -> Result<Vec<(String, f64)>, VoiceprintError> {
        let query = self.encoder.encode(audio)?;
        self.speakers
            .iter()
            .map(|(label, reference)| Ok((label.clone(), cosine_similarity(&query, reference)?)))
            .collect()
    }
}

/// Read-only set of registered speaker models.
///
/// The backend is chosen once from the artifact's `kind`.
pub struct Registry {
    backend: Box<dyn Backend>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind())
            .field("labels", &self.labels())
            .finish()
    }
}

impl Registry {
    /// Reads and validates an artifact file.
    ///
    /// `encoder` is only used by template artifacts; when `None`, the
    /// default [`FbankStatsEncoder`] is used.
    pub fn load(
        path: impl AsRef<Path>,
        encoder: Option<Arc<dyn SpeakerEncoder>>,
    ) -> Result<Self, VoiceprintError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| VoiceprintError::unavailable(format!("{}: {e}", path.display())))?;
        let artifact = ModelArtifact::from_json(&data)?;
        Self::from_artifact(artifact, encoder)
    }

    /// Builds a registry from an in-memory artifact.
    pub fn from_artifact(
        artifact: ModelArtifact,
        encoder: Option<Arc<dyn SpeakerEncoder>>,
    ) -> Result<Self, VoiceprintError> {
        let backend: Box<dyn Backend> = match artifact {
            ModelArtifact::Distribution { features, speakers } => {
                if speakers.is_empty() {
                    return Err(VoiceprintError::unavailable("artifact has no speakers"));
                }
                for (label, gmm) in &speakers {
                    gmm.validate().map_err(|e| {
                        VoiceprintError::unavailable(format!("speaker {label:?}: {e}"))
                    })?;
                    if gmm.dimension() != features.num_ceps {
                        return Err(VoiceprintError::unavailable(format!(
                            "speaker {label:?}: mixture dimension {} does not match num_ceps {}",
                            gmm.dimension(),
                            features.num_ceps
                        )));
                    }
                }
                Box::new(DistributionBackend { features, speakers })
            }
            ModelArtifact::Template {
                dimension,
                speakers,
            } => {
                if speakers.is_empty() {
                    return Err(VoiceprintError::unavailable("artifact has no speakers"));
                }
                for (label, v) in &speakers {
                    if v.len() != dimension {
                        return Err(VoiceprintError::unavailable(format!(
                            "speaker {label:?}: template has {} values, artifact declares {dimension}",
                            v.len()
                        )));
                    }
                }
                let encoder = encoder.unwrap_or_else(|| {
                    Arc::new(FbankStatsEncoder::default()) as Arc<dyn SpeakerEncoder>
                });
                if encoder.dimension() != dimension {
                    return Err(VoiceprintError::unavailable(format!(
                        "encoder produces {} values, artifact declares {dimension}",
                        encoder.dimension()
                    )));
                }
                Box::new(TemplateBackend { encoder, speakers })
            }
        };
        Ok(Self { backend })
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Registered labels in sorted order.
    pub fn labels(&self) -> Vec<&str> {
        self.backend.labels()
    }

    pub fn model(&self, label: &str) -> Option<SpeakerModel<'_>> {
        self.backend.model(label)
    }

    /// Raw per-speaker scores: total log-likelihood for mixtures, cosine
    /// similarity for templates.
    pub fn score(&self, audio: &AudioSample) -> Result<Vec<(String, f64)>, VoiceprintError> {
        self.backend.score(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::sine;

    fn mixture(dim: usize, center: f64) -> GaussianMixture {
        GaussianMixture::new(vec![1.0], vec![vec![center; dim]], vec![vec![4.0; dim]]).unwrap()
    }

    fn distribution() -> ModelArtifact {
        let mut speakers = BTreeMap::new();
        speakers.insert("mother".to_string(), mixture(13, 0.0));
        speakers.insert("child".to_string(), mixture(13, 3.0));
        ModelArtifact::Distribution {
            features: FeatureConfig::default(),
            speakers,
        }
    }

    #[test]
    fn parse_distribution_json() {
        let json = r#"{
            "kind": "distribution",
            "features": {"num_mels": 20, "num_ceps": 2},
            "speakers": {
                "mother": {"weights": [1.0], "means": [[0.0, 0.0]], "variances": [[1.0, 1.0]]}
            }
        }"#;
        let reg = Registry::from_artifact(ModelArtifact::from_json(json.as_bytes()).unwrap(), None)
            .unwrap();
        assert_eq!(reg.kind(), BackendKind::Distribution);
        assert_eq!(reg.labels(), vec!["mother"]);
        assert!(matches!(reg.model("mother"), Some(SpeakerModel::Distribution(_))));
        assert!(reg.model("child").is_none());
    }

    #[test]
    fn parse_template_json() {
        let json = r#"{"kind": "template", "dimension": 2, "speakers": {"a": [1.0, 0.0], "b": [0.0, 1.0]}}"#;
        let artifact = ModelArtifact::from_json(json.as_bytes()).unwrap();
        let err = Registry::from_artifact(artifact.clone(), None).unwrap_err();
        assert!(err.is_model_unavailable(), "default encoder has 80 dims");

        struct Two;
        impl SpeakerEncoder for Two {
            fn encode(&self, _: &AudioSample) -> Result<Vec<f32>, VoiceprintError> {
                Ok(vec![1.0, 0.1])
            }
            fn dimension(&self) -> usize {
                2
            }
        }
        let reg = Registry::from_artifact(artifact, Some(Arc::new(Two))).unwrap();
        assert_eq!(reg.kind(), BackendKind::Template);
        let scores = reg.score(&AudioSample::new(16000, vec![0; 10])).unwrap();
        assert_eq!(scores[0].0, "a");
        assert!(scores[0].1 > scores[1].1);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = ModelArtifact::from_json(br#"{"kind": "neural", "speakers": {}}"#).unwrap_err();
        assert!(err.is_model_unavailable());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(ModelArtifact::from_json(b"\x80\x04pickle").unwrap_err().is_model_unavailable());
    }

    #[test]
    fn empty_registry_is_rejected() {
        let artifact = ModelArtifact::Distribution {
            features: FeatureConfig::default(),
            speakers: BTreeMap::new(),
        };
        assert!(Registry::from_artifact(artifact, None).unwrap_err().is_model_unavailable());
    }

    #[test]
    fn dimension_must_match_feature_config() {
        let mut speakers = BTreeMap::new();
        speakers.insert("mother".to_string(), mixture(12, 0.0));
        let artifact = ModelArtifact::Distribution {
            features: FeatureConfig::default(),
            speakers,
        };
        assert!(Registry::from_artifact(artifact, None).unwrap_err().is_model_unavailable());
    }

    #[test]
    fn template_length_must_match_declared() {
        let mut speakers = BTreeMap::new();
        speakers.insert("mother".to_string(), vec![0.0; 79]);
        let artifact = ModelArtifact::Template {
            dimension: 80,
            speakers,
        };
        assert!(Registry::from_artifact(artifact, None).unwrap_err().is_model_unavailable());
    }

    #[test]
    fn missing_file() {
        let err = Registry::load("/nonexistent/models/speakers.json", None).unwrap_err();
        assert!(err.is_model_unavailable());
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speakers.json");
        std::fs::write(&path, distribution().to_json().unwrap()).unwrap();
        let reg = Registry::load(&path, None).unwrap();
        assert_eq!(reg.labels(), vec!["child", "mother"]);
    }

    #[test]
    fn distribution_scores_every_speaker() {
        let reg = Registry::from_artifact(distribution(), None).unwrap();
        let scores = reg.score(&sine(440.0, 8000, 16000)).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|(_, s)| s.is_finite()));
    }

    #[test]
    fn distribution_propagates_sample_rate_mismatch() {
        let reg = Registry::from_artifact(distribution(), None).unwrap();
        assert!(matches!(
            reg.score(&sine(440.0, 8000, 8000)),
            Err(VoiceprintError::SampleRateMismatch { .. })
        ));
    }
}
