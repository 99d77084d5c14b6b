use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::confidence::IdentificationResult;
use crate::embedding::SpeakerEncoder;
use crate::registry::Registry;
use crate::{AudioSample, VoiceprintError};

type Loader = Box<dyn Fn() -> Result<Registry, VoiceprintError> + Send + Sync>;

/// Identifies which registered speaker uttered a sample.
///
/// The registry is loaded on first use and cached for the lifetime of the
/// identifier. Concurrent first calls block on a single load; a failed load
/// is not cached, so the next call retries.
///
/// # Thread Safety
///
/// `Identifier` is `Send + Sync`; share it behind an `Arc` and call
/// [`Identifier::identify`] from any number of threads.
pub struct Identifier {
    loader: Loader,
    registry: OnceCell<Arc<Registry>>,
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identifier")
            .field("registry", &self.registry.get())
            .finish()
    }
}

impl Identifier {
    /// Creates an identifier that reads the artifact at `path` on first use.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::from_path_with_encoder(path, None)
    }

    /// Like [`Identifier::from_path`], with the encoder used by template artifacts.
    pub fn from_path_with_encoder(
        path: impl Into<PathBuf>,
        encoder: Option<Arc<dyn SpeakerEncoder>>,
    ) -> Self {
        let path = path.into();
        Self::with_loader(move || {
            debug!(path = %path.display(), "loading speaker models");
            Registry::load(&path, encoder.clone())
        })
    }

    /// Creates an identifier with a custom registry loader.
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Registry, VoiceprintError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            registry: OnceCell::new(),
        }
    }

    /// Creates an identifier around an already loaded registry.
    pub fn from_registry(registry: Registry) -> Self {
        let registry = Arc::new(registry);
        let cell = OnceCell::with_value(Arc::clone(&registry));
        Self {
            loader: Box::new(|| Err(VoiceprintError::unavailable("registry preloaded"))),
            registry: cell,
        }
    }

    /// Returns the cached registry, loading it if needed.
    pub fn registry(&self) -> Result<&Arc<Registry>, VoiceprintError> {
        self.registry.get_or_try_init(|| {
            let registry = (self.loader)()?;
            info!(
                kind = %registry.kind(),
                speakers = ?registry.labels(),
                "speaker models loaded"
            );
            Ok(Arc::new(registry))
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.registry.get().is_some()
    }

    /// Scores `audio` against every registered speaker.
    ///
    /// Fails with [`VoiceprintError::ModelUnavailable`] when the artifact
    /// cannot be loaded, and with the extraction error when the sample does
    /// not fit the model.
    pub fn identify(&self, audio: &AudioSample) -> Result<IdentificationResult, VoiceprintError> {
        let registry = self.registry()?;
        let scores = registry.score(audio)?;
        let result = IdentificationResult::from_scores(scores)?;
        debug!(best = %result.best_label, confidence = ?result.confidence, "identified");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::sine;
    use crate::registry::ModelArtifact;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn template_artifact() -> ModelArtifact {
        let mut speakers = BTreeMap::new();
        speakers.insert("mother".to_string(), vec![1.0, 0.0]);
        speakers.insert("child".to_string(), vec![0.0, 1.0]);
        ModelArtifact::Template {
            dimension: 2,
            speakers,
        }
    }

    struct Fixed(Vec<f32>);

    impl SpeakerEncoder for Fixed {
        fn encode(&self, _: &AudioSample) -> Result<Vec<f32>, VoiceprintError> {
            Ok(self.0.clone())
        }
        fn dimension(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn loads_once_under_concurrency() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let id = Arc::new(Identifier::with_loader(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            Registry::from_artifact(template_artifact(), Some(Arc::new(Fixed(vec![0.9, 0.1]))))
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let id = Arc::clone(&id);
                std::thread::spawn(move || {
                    let r = id.identify(&AudioSample::new(16000, vec![0; 400])).unwrap();
                    assert_eq!(r.best_label, "mother");
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(id.is_loaded());
    }

    #[test]
    fn failed_load_is_retried() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let id = Identifier::with_loader(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(VoiceprintError::unavailable("not trained yet"))
            } else {
                Registry::from_artifact(template_artifact(), Some(Arc::new(Fixed(vec![0.0, 1.0]))))
            }
        });
        let audio = AudioSample::new(16000, vec![0; 400]);
        assert!(id.identify(&audio).unwrap_err().is_model_unavailable());
        assert!(!id.is_loaded());
        assert_eq!(id.identify(&audio).unwrap().best_label, "child");
    }

    #[test]
    fn missing_artifact_is_model_unavailable() {
        let id = Identifier::from_path("/nonexistent/speakers.json");
        let err = id.identify(&sine(440.0, 8000, 16000)).unwrap_err();
        assert!(err.is_model_unavailable());
    }

    #[test]
    fn preloaded_registry() {
        let reg = Registry::from_artifact(template_artifact(), Some(Arc::new(Fixed(vec![0.2, 0.8]))))
            .unwrap();
        let id = Identifier::from_registry(reg);
        assert!(id.is_loaded());
        let r = id.identify(&AudioSample::new(16000, vec![])).unwrap();
        assert_eq!(r.best_label, "child");
        let sum: f64 = r.confidence.values().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
