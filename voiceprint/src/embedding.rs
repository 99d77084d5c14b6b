use crate::features::{log_mel_frames, FeatureConfig};
use crate::{AudioSample, VoiceprintError};

/// Turns one utterance into a fixed-length speaker vector.
///
/// Reference templates in a template artifact must come from the same
/// encoder that runs at identification time.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait SpeakerEncoder: Send + Sync {
    /// Computes the speaker vector for `audio`.
    fn encode(&self, audio: &AudioSample) -> Result<Vec<f32>, VoiceprintError>;

    /// Returns the length of the vectors produced by [`SpeakerEncoder::encode`].
    fn dimension(&self) -> usize;
}

/// Statistics-pooling encoder over log mel frames.
///
/// The vector is the per-band mean followed by the per-band standard
/// deviation, L2-normalized. Dimension is `2 * num_mels`.
#[derive(Debug, Clone, Default)]
pub struct FbankStatsEncoder {
    cfg: FeatureConfig,
}

impl FbankStatsEncoder {
    pub fn new(cfg: FeatureConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.cfg
    }
}

impl SpeakerEncoder for FbankStatsEncoder {
    fn encode(&self, audio: &AudioSample) -> Result<Vec<f32>, VoiceprintError> {
        let frames = log_mel_frames(audio, &self.cfg)?;
        let bands = self.cfg.num_mels;
        let t = frames.len() as f64;

        let mut mean = vec![0.0f64; bands];
        for f in &frames {
            for (m, v) in mean.iter_mut().zip(f) {
                *m += v;
            }
        }
        for m in mean.iter_mut() {
            *m /= t;
        }

        let mut std = vec![0.0f64; bands];
        for f in &frames {
            for ((s, v), m) in std.iter_mut().zip(f).zip(&mean) {
                *s += (v - m) * (v - m);
            }
        }
        for s in std.iter_mut() {
            *s = (*s / t).sqrt();
        }

        let mut out: Vec<f32> = mean.into_iter().chain(std).map(|v| v as f32).collect();
        l2_normalize(&mut out);
        Ok(out)
    }

    fn dimension(&self) -> usize {
        2 * self.cfg.num_mels
    }
}

/// Cosine similarity in `[-1, 1]`, computed in f64.
///
/// Returns 0 when either vector is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, VoiceprintError> {
    if a.len() != b.len() {
        return Err(VoiceprintError::DimensionMismatch {
            expected: b.len(),
            got: a.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Scales `v` to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        let scale = (1.0 / norm) as f32;
        for x in v.iter_mut() {
            *x *= scale;
        }
    }
}
