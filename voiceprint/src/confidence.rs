//! Converts raw per-speaker scores into a probability distribution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::VoiceprintError;

/// Speaker label to probability. Keys are exactly the registered speakers and
/// the values sum to one.
pub type ConfidenceMap = BTreeMap<String, f64>;

/// Smallest probability handed out, so no speaker is ever reported as
/// impossible even when its log-likelihood is thousands of nats behind.
pub const CONFIDENCE_FLOOR: f64 = 1e-12;

/// Output of one identification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationResult {
    /// Arg-max of `confidence`.
    pub best_label: String,
    pub confidence: ConfidenceMap,
}

impl IdentificationResult {
    /// Builds a result from raw `(label, score)` pairs.
    pub fn from_scores(scores: Vec<(String, f64)>) -> Result<Self, VoiceprintError> {
        if scores.is_empty() {
            return Err(VoiceprintError::Scoring("no speakers scored".into()));
        }
        let raw: Vec<f64> = scores.iter().map(|(_, s)| *s).collect();
        let probs = softmax(&raw)?;

        let mut best = 0;
        for (i, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = i;
            }
        }
        let best_label = scores[best].0.clone();
        let confidence = scores
            .into_iter()
            .map(|(label, _)| label)
            .zip(probs)
            .collect();

        Ok(Self {
            best_label,
            confidence,
        })
    }

    pub fn confidence_for(&self, label: &str) -> Option<f64> {
        self.confidence.get(label).copied()
    }
}

/// Numerically stable softmax.
///
/// The maximum is subtracted before exponentiating, so scores of any
/// magnitude never overflow. Results are floored at [`CONFIDENCE_FLOOR`]
/// and renormalized.
pub fn softmax(scores: &[f64]) -> Result<Vec<f64>, VoiceprintError> {
    if scores.iter().any(|s| s.is_nan()) {
        return Err(VoiceprintError::Scoring("score is NaN".into()));
    }
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(VoiceprintError::Scoring(format!("maximum score is {max}")));
    }

    let exps: Vec<f64> = scores
        .iter()
        .map(|s| (s - max).exp().max(CONFIDENCE_FLOOR))
        .collect();
    let sum: f64 = exps.iter().sum();
    Ok(exps.into_iter().map(|e| e / sum).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_distribution(p: &[f64]) {
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "sum = {sum}");
        for v in p {
            assert!(*v > 0.0 && *v < 1.0, "value out of (0,1): {v}");
        }
    }

    #[test]
    fn uniform_scores() {
        let p = softmax(&[3.0, 3.0]).unwrap();
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert_distribution(&p);
    }

    #[test]
    fn matches_plain_softmax_for_small_scores() {
        let p = softmax(&[1.0, 2.0, 0.5]).unwrap();
        let e: Vec<f64> = [1.0f64, 2.0, 0.5].iter().map(|x| x.exp()).collect();
        let s: f64 = e.iter().sum();
        for (a, b) in p.iter().zip(e.iter().map(|x| x / s)) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn extreme_magnitudes_do_not_overflow() {
        let cases: &[&[f64]] = &[
            &[1e6, 1e6 - 1.0],
            &[-1e6, -1e6 - 3.0],
            &[-52_340.2, -51_998.7],
            &[1e300, -1e300],
            &[f64::MAX, f64::MAX / 2.0],
            &[-f64::MAX, -f64::MAX / 2.0, 0.0],
            &[-8_000.0, -8_000.0, -8_001.0, -20_000.0],
        ];
        for scores in cases {
            let p = softmax(scores).unwrap();
            assert_eq!(p.len(), scores.len());
            assert_distribution(&p);
        }
    }

    #[test]
    fn shift_invariance() {
        let a = softmax(&[-1000.0, -1001.0]).unwrap();
        let b = softmax(&[0.0, -1.0]).unwrap();
        assert!((a[0] - b[0]).abs() < 1e-12);
    }

    #[test]
    fn negative_infinity_is_floored() {
        let p = softmax(&[0.0, f64::NEG_INFINITY]).unwrap();
        assert_distribution(&p);
    }

    #[test]
    fn rejects_non_finite_max() {
        assert!(softmax(&[f64::NAN, 0.0]).is_err());
        assert!(softmax(&[f64::INFINITY, 0.0]).is_err());
        assert!(softmax(&[f64::NEG_INFINITY]).is_err());
        assert!(softmax(&[]).is_err());
    }

    #[test]
    fn result_picks_argmax() {
        let r = IdentificationResult::from_scores(vec![
            ("child".into(), -4200.0),
            ("mother".into(), -4100.0),
        ])
        .unwrap();
        assert_eq!(r.best_label, "mother");
        assert_eq!(r.confidence.len(), 2);
        assert!(r.confidence_for("mother").unwrap() > 0.99);
        assert!(r.confidence_for("nobody").is_none());
    }

    #[test]
    fn cosine_scores() {
        let r = IdentificationResult::from_scores(vec![
            ("mother".into(), 0.9),
            ("child".into(), -0.2),
        ])
        .unwrap();
        assert_eq!(r.best_label, "mother");
        let want = 1.0 / (1.0 + (-1.1f64).exp());
        assert!((r.confidence["mother"] - want).abs() < 1e-9);
    }
}
