//! Frame-level spectral features: log mel filterbank energies and MFCCs.
//!
//! Training and inference must run the same extraction, so a [`FeatureConfig`]
//! travels inside every mixture-model artifact and the identifier always
//! extracts with the artifact's copy.

use std::f64::consts::PI;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::{AudioSample, VoiceprintError};

/// Parameters of the feature extractor.
///
/// Defaults: 16 kHz, 25 ms frames with 10 ms shift, 40 mel bands from 20 Hz
/// to Nyquist, 13 cepstral coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Expected input sample rate in Hz.
    pub sample_rate: u32,
    /// Frame length in samples.
    pub frame_length: usize,
    /// Frame shift in samples.
    pub frame_shift: usize,
    /// Number of triangular mel bands.
    pub num_mels: usize,
    /// Number of cepstral coefficients kept per frame.
    pub num_ceps: usize,
    /// Lowest band edge in Hz.
    pub low_freq: f64,
    /// Highest band edge in Hz; zero or negative is an offset from Nyquist.
    pub high_freq: f64,
    /// Pre-emphasis coefficient, 0 disables.
    pub pre_emphasis: f64,
    /// Floor applied to band energies before the log.
    pub energy_floor: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            frame_length: 400,
            frame_shift: 160,
            num_mels: 40,
            num_ceps: 13,
            low_freq: 20.0,
            high_freq: 0.0,
            pre_emphasis: 0.97,
            energy_floor: 1e-10,
        }
    }
}

impl FeatureConfig {
    fn check(&self, audio: &AudioSample) -> Result<(), VoiceprintError> {
        if self.frame_length == 0 || self.frame_shift == 0 || self.num_mels == 0 {
            return Err(VoiceprintError::unavailable(
                "feature config: frame length, frame shift and mel count must be positive",
            ));
        }
        if audio.sample_rate() != self.sample_rate {
            return Err(VoiceprintError::SampleRateMismatch {
                expected: self.sample_rate,
                got: audio.sample_rate(),
            });
        }
        if audio.len() < self.frame_length {
            return Err(VoiceprintError::AudioTooShort {
                min_samples: self.frame_length,
                got_samples: audio.len(),
            });
        }
        Ok(())
    }

    fn resolved_high_freq(&self) -> f64 {
        let nyquist = self.sample_rate as f64 / 2.0;
        if self.high_freq <= 0.0 {
            nyquist + self.high_freq
        } else {
            self.high_freq.min(nyquist)
        }
    }
}

/// Computes `[num_frames][num_mels]` log mel energies.
pub fn log_mel_frames(
    audio: &AudioSample,
    cfg: &FeatureConfig,
) -> Result<Vec<Vec<f64>>, VoiceprintError> {
    cfg.check(audio)?;

    let samples: Vec<f64> = audio
        .samples()
        .iter()
        .map(|&s| s as f64 / 32768.0)
        .collect();
    let num_frames = (samples.len() - cfg.frame_length) / cfg.frame_shift + 1;

    let fft_size = cfg.frame_length.next_power_of_two();
    let fft = FftPlanner::<f64>::new().plan_fft_forward(fft_size);
    let window = hamming(cfg.frame_length);
    let banks = mel_banks(cfg, fft_size);

    let mut frames = Vec::with_capacity(num_frames);
    let mut buf = vec![Complex::new(0.0, 0.0); fft_size];
    let mut frame = vec![0.0f64; cfg.frame_length];

    for f in 0..num_frames {
        let offset = f * cfg.frame_shift;
        frame.copy_from_slice(&samples[offset..offset + cfg.frame_length]);

        let mean = frame.iter().sum::<f64>() / frame.len() as f64;
        for v in frame.iter_mut() {
            *v -= mean;
        }
        if cfg.pre_emphasis > 0.0 {
            for i in (1..frame.len()).rev() {
                frame[i] -= cfg.pre_emphasis * frame[i - 1];
            }
            frame[0] *= 1.0 - cfg.pre_emphasis;
        }

        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = match frame.get(i) {
                Some(v) => Complex::new(v * window[i], 0.0),
                None => Complex::new(0.0, 0.0),
            };
        }
        fft.process(&mut buf);

        let power: Vec<f64> = buf[..fft_size / 2 + 1].iter().map(|c| c.norm_sqr()).collect();
        let energies = banks
            .iter()
            .map(|bank| {
                let e: f64 = bank.iter().zip(&power).map(|(w, p)| w * p).sum();
                e.max(cfg.energy_floor).ln()
            })
            .collect();
        frames.push(energies);
    }

    Ok(frames)
}

/// Computes `[num_frames][num_ceps]` MFCCs (orthonormal DCT-II of log mel energies).
pub fn mfcc_frames(
    audio: &AudioSample,
    cfg: &FeatureConfig,
) -> Result<Vec<Vec<f64>>, VoiceprintError> {
    if cfg.num_ceps == 0 || cfg.num_ceps > cfg.num_mels {
        return Err(VoiceprintError::unavailable(format!(
            "feature config: num_ceps must be in 1..={}, got {}",
            cfg.num_mels, cfg.num_ceps
        )));
    }
    let mel = log_mel_frames(audio, cfg)?;
    let basis = dct_basis(cfg.num_ceps, cfg.num_mels);
    Ok(mel
        .iter()
        .map(|frame| {
            basis
                .iter()
                .map(|row| row.iter().zip(frame).map(|(b, x)| b * x).sum())
                .collect()
        })
        .collect())
}

fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Triangular filters evenly spaced on the mel scale, `[num_mels][fft_size / 2 + 1]`.
fn mel_banks(cfg: &FeatureConfig, fft_size: usize) -> Vec<Vec<f64>> {
    let half = fft_size / 2 + 1;
    let bin_hz = cfg.sample_rate as f64 / fft_size as f64;
    let mel_low = hz_to_mel(cfg.low_freq.max(0.0));
    let mel_high = hz_to_mel(cfg.resolved_high_freq());
    let delta = (mel_high - mel_low) / (cfg.num_mels + 1) as f64;

    (0..cfg.num_mels)
        .map(|m| {
            let left = mel_low + m as f64 * delta;
            let center = left + delta;
            let right = center + delta;
            (0..half)
                .map(|k| {
                    let mel = hz_to_mel(k as f64 * bin_hz);
                    if mel <= left || mel >= right {
                        0.0
                    } else if mel <= center {
                        (mel - left) / delta
                    } else {
                        (right - mel) / delta
                    }
                })
                .collect()
        })
        .collect()
}

fn dct_basis(num_ceps: usize, n: usize) -> Vec<Vec<f64>> {
    let n_f = n as f64;
    (0..num_ceps)
        .map(|k| {
            let scale = if k == 0 { (1.0 / n_f).sqrt() } else { (2.0 / n_f).sqrt() };
            (0..n)
                .map(|i| scale * (PI * k as f64 * (2 * i + 1) as f64 / (2.0 * n_f)).cos())
                .collect()
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sine(freq_hz: f64, n_samples: usize, sample_rate: u32) -> AudioSample {
        let samples = (0..n_samples)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (12000.0 * (2.0 * PI * freq_hz * t).sin()) as i16
            })
            .collect();
        AudioSample::new(sample_rate, samples)
    }

    #[test]
    fn frame_count() {
        let cfg = FeatureConfig::default();
        let audio = sine(440.0, 16000, 16000);
        let frames = log_mel_frames(&audio, &cfg).unwrap();
        assert_eq!(frames.len(), (16000 - 400) / 160 + 1);
        assert!(frames.iter().all(|f| f.len() == cfg.num_mels));
        assert!(frames.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn mfcc_shape() {
        let cfg = FeatureConfig::default();
        let audio = sine(300.0, 8000, 16000);
        let frames = mfcc_frames(&audio, &cfg).unwrap();
        assert!(!frames.is_empty());
        assert!(frames.iter().all(|f| f.len() == 13));
    }

    #[test]
    fn silence_hits_energy_floor() {
        let cfg = FeatureConfig::default();
        let audio = AudioSample::new(16000, vec![0; 800]);
        let frames = log_mel_frames(&audio, &cfg).unwrap();
        let floor = cfg.energy_floor.ln();
        assert!(frames.iter().flatten().all(|&v| (v - floor).abs() < 1e-9));
    }

    #[test]
    fn tone_lands_in_matching_band() {
        let cfg = FeatureConfig::default();
        let low = log_mel_frames(&sine(200.0, 4000, 16000), &cfg).unwrap();
        let high = log_mel_frames(&sine(4000.0, 4000, 16000), &cfg).unwrap();
        let argmax = |f: &Vec<f64>| {
            f.iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap()
        };
        assert!(argmax(&low[5]) < argmax(&high[5]));
    }

    #[test]
    fn rejects_short_audio() {
        let cfg = FeatureConfig::default();
        let audio = AudioSample::new(16000, vec![0; 100]);
        match log_mel_frames(&audio, &cfg) {
            Err(VoiceprintError::AudioTooShort { min_samples, got_samples }) => {
                assert_eq!(min_samples, 400);
                assert_eq!(got_samples, 100);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_wrong_sample_rate() {
        let cfg = FeatureConfig::default();
        let audio = sine(440.0, 8000, 8000);
        assert!(matches!(
            mfcc_frames(&audio, &cfg),
            Err(VoiceprintError::SampleRateMismatch { expected: 16000, got: 8000 })
        ));
    }

    #[test]
    fn dct_basis_is_orthonormal() {
        let b = dct_basis(13, 40);
        for i in 0..13 {
            for j in 0..13 {
                let dot: f64 = b[i].iter().zip(&b[j]).map(|(x, y)| x * y).sum();
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((dot - want).abs() < 1e-9, "({i},{j}) = {dot}");
            }
        }
    }

    #[test]
    fn config_roundtrips_with_defaults() {
        let cfg: FeatureConfig = serde_json::from_str(r#"{"num_ceps": 20}"#).unwrap();
        assert_eq!(cfg.num_ceps, 20);
        assert_eq!(cfg.sample_rate, 16000);
    }
}
