//! Turns identification and classification output into a state update.

use chrono::Local;
use mamaswitch_utterance::{classify, Attitude, Command};
use mamaswitch_voiceprint::{ConfidenceMap, IdentificationResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::response::{select_response, Role};
use crate::{LogEntry, Method, SessionConfig, SessionError, SessionState};

/// Source of the heuristic sync-rate steps.
pub trait RandomSource: Send {
    /// Returns a uniform integer in `min..=max`. Callers guarantee `min <= max`.
    fn between(&mut self, min: u8, max: u8) -> u8;
}

/// Thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn between(&mut self, min: u8, max: u8) -> u8 {
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Reproducible RNG for tests and replays.
#[derive(Debug, Clone)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn between(&mut self, min: u8, max: u8) -> u8 {
        self.0.gen_range(min..=max)
    }
}

/// Everything one event contributes.
#[derive(Debug, Clone, Default)]
pub struct FusionInput {
    pub text: String,
    /// `None` when no audio arrived or identification failed.
    pub identification: Option<IdentificationResult>,
    pub audio_present: bool,
}

/// Result of one applied event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventOutcome {
    pub speaker: String,
    pub role: Role,
    pub command: Option<Command>,
    pub attitude: Attitude,
    pub sync_rate: u8,
    pub response: String,
    pub method: Method,
    #[serde(skip)]
    pub entry: LogEntry,
}

struct Resolution {
    speaker: String,
    sync_rate: u8,
    method: Method,
    confidence: Option<ConfidenceMap>,
}

/// Sync-rate transition rule.
///
/// A confidence for the mother label overwrites the sync rate outright.
/// Without one, a keyword heuristic on the text nudges it up or down by a
/// random step, clamped to `0..=100`.
pub struct Fusion {
    config: SessionConfig,
    random: Box<dyn RandomSource>,
}

impl Fusion {
    pub fn new(config: SessionConfig, random: Box<dyn RandomSource>) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self { config, random })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn role_of(&self, label: &str) -> Role {
        if label == self.config.mother_label {
            Role::Mother
        } else {
            Role::Child
        }
    }

    /// Reports whether `text` contains mother-coded vocabulary.
    pub fn sounds_like_mother(&self, text: &str) -> bool {
        self.config
            .mother_keywords
            .iter()
            .any(|k| !k.is_empty() && text.contains(k.as_str()))
    }

    fn resolve(
        &mut self,
        current: u8,
        identification: Option<IdentificationResult>,
        text: &str,
    ) -> Resolution {
        if let Some(id) = identification {
            if let Some(p) = id.confidence_for(&self.config.mother_label) {
                return Resolution {
                    speaker: id.best_label,
                    sync_rate: (p * 100.0).round().clamp(0.0, 100.0) as u8,
                    method: Method::ModelBased,
                    confidence: Some(id.confidence),
                };
            }
            debug!(
                mother = %self.config.mother_label,
                "identification has no mother confidence, using keyword heuristic"
            );
        }

        if self.sounds_like_mother(text) {
            let step = self.random.between(self.config.raise.min, self.config.raise.max);
            Resolution {
                speaker: self.config.mother_label.clone(),
                sync_rate: current.saturating_add(step).min(100),
                method: Method::Heuristic,
                confidence: None,
            }
        } else {
            let step = self.random.between(self.config.lower.min, self.config.lower.max);
            Resolution {
                speaker: self.config.child_label.clone(),
                sync_rate: current.saturating_sub(step),
                method: Method::Heuristic,
                confidence: None,
            }
        }
    }

    /// Applies one event to `state` and returns what happened.
    ///
    /// The update is computed in full before `state` is touched.
    pub fn apply(&mut self, state: &mut SessionState, input: FusionInput) -> EventOutcome {
        let FusionInput {
            text,
            identification,
            audio_present,
        } = input;

        let resolved = self.resolve(state.sync_rate(), identification, &text);
        let tags = classify(text.as_str());
        let role = self.role_of(&resolved.speaker);
        let response = select_response(tags.command, tags.attitude, role);

        let entry = LogEntry {
            timestamp: Local::now(),
            speaker: resolved.speaker.clone(),
            raw_text: text,
            command: tags.command,
            attitude: tags.attitude,
            response: response.clone(),
            sync_rate: resolved.sync_rate,
            audio_present,
            confidence: resolved.confidence,
            method: resolved.method,
        };
        state.commit(entry.clone());

        EventOutcome {
            speaker: resolved.speaker,
            role,
            command: tags.command,
            attitude: tags.attitude,
            sync_rate: resolved.sync_rate,
            response,
            method: resolved.method,
            entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HISTORY_CAPACITY;

    /// Always picks one end of the range.
    struct Edge {
        high: bool,
    }

    impl RandomSource for Edge {
        fn between(&mut self, min: u8, max: u8) -> u8 {
            if self.high { max } else { min }
        }
    }

    fn fusion(high: bool) -> Fusion {
        Fusion::new(SessionConfig::default(), Box::new(Edge { high })).unwrap()
    }

    fn ident(mother: f64) -> IdentificationResult {
        let mut confidence = ConfidenceMap::new();
        confidence.insert("mother".into(), mother);
        confidence.insert("child".into(), 1.0 - mother);
        IdentificationResult {
            best_label: if mother >= 0.5 { "mother" } else { "child" }.into(),
            confidence,
        }
    }

    fn text_only(text: &str) -> FusionInput {
        FusionInput {
            text: text.into(),
            ..Default::default()
        }
    }

    fn with_sync(rate: u8) -> SessionState {
        let mut state = SessionState::new();
        let mut f = Fusion::new(SessionConfig::default(), Box::new(Edge { high: false })).unwrap();
        f.apply(
            &mut state,
            FusionInput {
                identification: Some(ident(rate as f64 / 100.0)),
                audio_present: true,
                ..Default::default()
            },
        );
        assert_eq!(state.sync_rate(), rate);
        state
    }

    #[test]
    fn confidence_overwrites_sync_rate() {
        let mut state = with_sync(5);
        let out = fusion(false).apply(
            &mut state,
            FusionInput {
                text: "電気をつけてください".into(),
                identification: Some(ident(0.82)),
                audio_present: true,
            },
        );
        assert_eq!(out.sync_rate, 82);
        assert_eq!(out.speaker, "mother");
        assert_eq!(out.role, Role::Mother);
        assert_eq!(out.method, Method::ModelBased);
        assert_eq!(out.command, Some(Command::LightOn));
        assert_eq!(out.attitude, Attitude::Polite);
        assert_eq!(out.response, "はい、お母さん。電気をつけます。");
        assert_eq!(state.sync_rate(), 82);
        assert_eq!(state.current_speaker(), "mother");
        assert!(out.entry.audio_present);
        assert_eq!(out.entry.confidence.as_ref().unwrap()["mother"], 0.82);
    }

    #[test]
    fn confidence_wins_over_keywords() {
        let mut state = with_sync(50);
        let out = fusion(true).apply(
            &mut state,
            FusionInput {
                text: "早く宿題やりなさい".into(),
                identification: Some(ident(0.1)),
                audio_present: true,
            },
        );
        assert_eq!(out.method, Method::ModelBased);
        assert_eq!(out.speaker, "child");
        assert_eq!(out.sync_rate, 10);
    }

    #[test]
    fn heuristic_decrease_bounds() {
        let mut state = with_sync(50);
        let out = fusion(false).apply(&mut state, text_only("テレビつけて"));
        assert_eq!(out.speaker, "child");
        assert_eq!(out.role, Role::Child);
        assert_eq!(out.method, Method::Heuristic);
        assert_eq!(out.sync_rate, 45);
        assert!(out.entry.confidence.is_none());
        assert!(!out.entry.audio_present);

        let out = fusion(true).apply(&mut state, text_only("テレビつけて"));
        assert_eq!(out.sync_rate, 30);
    }

    #[test]
    fn heuristic_decrease_clamps_at_zero() {
        let mut state = with_sync(3);
        let out = fusion(true).apply(&mut state, text_only("ねえねえ"));
        assert_eq!(out.sync_rate, 0);
        let out = fusion(false).apply(&mut state, text_only(""));
        assert_eq!(out.sync_rate, 0);
        assert_eq!(out.speaker, "child");
    }

    #[test]
    fn heuristic_increase_bounds() {
        let mut state = with_sync(40);
        let out = fusion(false).apply(&mut state, text_only("部屋を片付けなさい"));
        assert_eq!(out.speaker, "mother");
        assert_eq!(out.sync_rate, 55);

        let mut state = with_sync(90);
        let out = fusion(true).apply(&mut state, text_only("早く寝なさい"));
        assert_eq!(out.sync_rate, 100);
        assert_eq!(out.role, Role::Mother);
    }

    #[test]
    fn identification_without_mother_label_falls_back() {
        let mut confidence = ConfidenceMap::new();
        confidence.insert("alice".into(), 0.7);
        confidence.insert("bob".into(), 0.3);
        let id = IdentificationResult {
            best_label: "alice".into(),
            confidence,
        };
        let mut state = with_sync(20);
        let out = fusion(false).apply(
            &mut state,
            FusionInput {
                text: "宿題して".into(),
                identification: Some(id),
                audio_present: true,
            },
        );
        assert_eq!(out.method, Method::Heuristic);
        assert_eq!(out.speaker, "mother");
        assert_eq!(out.sync_rate, 35);
    }

    #[test]
    fn seeded_walk_stays_in_range() {
        let mut f = Fusion::new(SessionConfig::default(), Box::new(SeededRandom::new(7))).unwrap();
        let mut state = SessionState::new();
        let texts = ["宿題やりなさい", "おやつちょうだい", "早く", "テレビつけろ", ""];
        for i in 0..500 {
            let before = state.sync_rate() as i32;
            let out = f.apply(&mut state, text_only(texts[i % texts.len()]));
            let after = out.sync_rate as i32;
            assert!(after <= 100);
            match out.speaker.as_str() {
                "mother" => assert!(after == 100 || (15..=30).contains(&(after - before))),
                "child" => assert!(after == 0 || (5..=15).contains(&(before - after))),
                other => panic!("unexpected speaker {other}"),
            }
            assert!(state.history().len() <= HISTORY_CAPACITY);
        }
    }

    #[test]
    fn seeded_sources_repeat() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..50 {
            let x = a.between(5, 15);
            assert_eq!(x, b.between(5, 15));
            assert!((5..=15).contains(&x));
        }
        assert_eq!(ThreadRandom.between(3, 3), 3);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut cfg = SessionConfig::default();
        cfg.lower.min = 20;
        assert!(Fusion::new(cfg, Box::new(ThreadRandom)).is_err());
    }
}
