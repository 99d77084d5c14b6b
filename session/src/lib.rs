//! Session core: confidence fusion, sync-rate state, response selection.
//!
//! A [`SessionHandle`] fronts one tokio task that owns the
//! [`SessionState`]. Each submitted [`Event`] is identified (when it carries
//! audio), classified, fused into a new sync rate, answered and logged, all
//! as one serialized update.
//!
//! ```text
//! audio ──► Identifier ──┐
//!                        ├──► Fusion ──► SessionState + LogEntry ──► LogSink
//! text ───► classify ────┘        └────► select_response
//! ```

mod config;
mod error;
mod fusion;
mod record;
mod response;
mod session;
mod state;

pub use config::{SessionConfig, StepRange};
pub use error::SessionError;
pub use fusion::{EventOutcome, Fusion, FusionInput, RandomSource, SeededRandom, ThreadRandom};
pub use record::{JsonDirSink, JsonLinesSink, LogEntry, LogSink, Method, NopSink};
pub use response::{base_phrase, select_response, Role, FALLBACK_PHRASE};
pub use session::{Event, SessionBuilder, SessionHandle};
pub use state::{SessionState, SessionStatus, StatusSnapshot, HISTORY_CAPACITY, UNKNOWN_SPEAKER};
