use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::VoiceprintError;

/// A diagonal-covariance Gaussian mixture fitted offline to one speaker's
/// frame-level features.
///
/// `means` and `variances` are `[components][dimension]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianMixture {
    pub weights: Vec<f64>,
    pub means: Vec<Vec<f64>>,
    pub variances: Vec<Vec<f64>>,
}

impl GaussianMixture {
    /// Builds a mixture and checks its shape.
    pub fn new(
        weights: Vec<f64>,
        means: Vec<Vec<f64>>,
        variances: Vec<Vec<f64>>,
    ) -> Result<Self, VoiceprintError> {
        let gmm = Self {
            weights,
            means,
            variances,
        };
        gmm.validate()?;
        Ok(gmm)
    }

    pub fn num_components(&self) -> usize {
        self.weights.len()
    }

    pub fn dimension(&self) -> usize {
        self.means.first().map_or(0, Vec::len)
    }

    /// Checks that the parameters describe a usable mixture.
    pub fn validate(&self) -> Result<(), VoiceprintError> {
        let k = self.weights.len();
        if k == 0 {
            return Err(VoiceprintError::unavailable("mixture has no components"));
        }
        if self.means.len() != k || self.variances.len() != k {
            return Err(VoiceprintError::unavailable(format!(
                "mixture has {k} weights but {} means and {} variances",
                self.means.len(),
                self.variances.len()
            )));
        }
        if self.weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(VoiceprintError::unavailable(
                "mixture weights must be positive and finite",
            ));
        }
        let dim = self.dimension();
        if dim == 0 {
            return Err(VoiceprintError::unavailable("mixture dimension is zero"));
        }
        for (mean, var) in self.means.iter().zip(&self.variances) {
            if mean.len() != dim || var.len() != dim {
                return Err(VoiceprintError::unavailable(format!(
                    "mixture component shape mismatch: expected {dim}"
                )));
            }
            if mean.iter().any(|m| !m.is_finite()) {
                return Err(VoiceprintError::unavailable("mixture means must be finite"));
            }
            if var.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(VoiceprintError::unavailable(
                    "mixture variances must be positive and finite",
                ));
            }
        }
        Ok(())
    }

    /// Log density of one frame, `log sum_k w_k N(x | mu_k, diag(var_k))`.
    pub fn frame_log_likelihood(&self, x: &[f64]) -> f64 {
        let total_weight: f64 = self.weights.iter().sum();
        let log_2pi = (2.0 * PI).ln();

        let comp: Vec<f64> = self
            .weights
            .iter()
            .zip(self.means.iter().zip(&self.variances))
            .map(|(w, (mean, var))| {
                let mut acc = (w / total_weight).ln();
                for ((xi, mi), vi) in x.iter().zip(mean).zip(var) {
                    let d = xi - mi;
                    acc -= 0.5 * (log_2pi + vi.ln() + d * d / vi);
                }
                acc
            })
            .collect();

        log_sum_exp(&comp)
    }

    /// Total log-likelihood of a frame sequence.
    pub fn score(&self, frames: &[Vec<f64>]) -> Result<f64, VoiceprintError> {
        let dim = self.dimension();
        let mut total = 0.0;
        for frame in frames {
            if frame.len() != dim {
                return Err(VoiceprintError::DimensionMismatch {
                    expected: dim,
                    got: frame.len(),
                });
            }
            total += self.frame_log_likelihood(frame);
        }
        Ok(total)
    }
}

fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + xs.iter().map(|x| (x - max).exp()).sum::<f64>().ln()
}
