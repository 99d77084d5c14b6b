use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mamaswitch_voiceprint::{AudioSample, IdentificationResult, Identifier};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::fusion::{EventOutcome, Fusion, FusionInput, RandomSource, ThreadRandom};
use crate::record::{LogEntry, LogSink, NopSink};
use crate::state::{SessionState, StatusSnapshot};
use crate::{SessionConfig, SessionError};

const QUEUE_SIZE: usize = 64;

/// One incoming event: recognized text and, optionally, the utterance audio.
#[derive(Debug, Clone, Default)]
pub struct Event {
    pub text: String,
    pub audio: Option<AudioSample>,
}

impl Event {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio: None,
        }
    }

    pub fn with_audio(mut self, audio: AudioSample) -> Self {
        self.audio = Some(audio);
        self
    }
}

enum Request {
    Submit {
        input: FusionInput,
        reply: oneshot::Sender<EventOutcome>,
    },
    Status(oneshot::Sender<StatusSnapshot>),
    History(oneshot::Sender<Vec<LogEntry>>),
    Reset(oneshot::Sender<StatusSnapshot>),
}

/// Configures and starts a session task.
pub struct SessionBuilder {
    config: SessionConfig,
    identifier: Option<Arc<Identifier>>,
    sink: Arc<dyn LogSink>,
    random: Box<dyn RandomSource>,
}

impl SessionBuilder {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            identifier: None,
            sink: Arc::new(NopSink),
            random: Box::new(ThreadRandom),
        }
    }

    /// Speaker identifier used for events that carry audio. Without one,
    /// every event is resolved by the keyword heuristic.
    pub fn identifier(mut self, identifier: Arc<Identifier>) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// Destination for log records. Writes run on the blocking pool.
    pub fn sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Box::new(random);
        self
    }

    /// Spawns the session task on the current tokio runtime.
    pub fn spawn(self) -> Result<SessionHandle, SessionError> {
        let fusion = Fusion::new(self.config, self.random)?;
        let (tx, rx) = mpsc::channel(QUEUE_SIZE);
        let task = SessionTask {
            fusion,
            state: SessionState::new(),
            sink: self.sink,
        };
        tokio::spawn(task.run(rx));
        Ok(SessionHandle {
            tx,
            identifier: self.identifier,
            unavailable_reported: Arc::new(AtomicBool::new(false)),
        })
    }
}

/// Owns the state. Every mutation happens inside `run`, one request at a
/// time, so events and resets never interleave.
struct SessionTask {
    fusion: Fusion,
    state: SessionState,
    sink: Arc<dyn LogSink>,
}

impl SessionTask {
    async fn run(mut self, mut rx: mpsc::Receiver<Request>) {
        while let Some(req) = rx.recv().await {
            match req {
                Request::Submit { input, reply } => {
                    let outcome = self.fusion.apply(&mut self.state, input);
                    info!(
                        speaker = %outcome.speaker,
                        sync_rate = outcome.sync_rate,
                        method = %outcome.method,
                        command = ?outcome.command,
                        attitude = %outcome.attitude,
                        "event applied"
                    );
                    persist(Arc::clone(&self.sink), outcome.entry.clone()).await;
                    let _ = reply.send(outcome);
                }
                Request::Status(reply) => {
                    let _ = reply.send(self.state.snapshot());
                }
                Request::History(reply) => {
                    let _ = reply.send(self.state.history().cloned().collect());
                }
                Request::Reset(reply) => {
                    self.state.reset();
                    info!("session reset");
                    let _ = reply.send(self.state.snapshot());
                }
            }
        }
        debug!("session task stopped");
    }
}

/// Hands a committed entry to the sink off the runtime threads. The session
/// task waits for it, so records reach the sink in commit order.
async fn persist(sink: Arc<dyn LogSink>, entry: LogEntry) {
    match tokio::task::spawn_blocking(move || sink.write(&entry)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "log record not persisted"),
        Err(e) => warn!(error = %e, "log writer task failed"),
    }
}

/// Cloneable front end of a running session.
///
/// Identification runs on the blocking pool in the caller's context; only
/// its result is handed to the session task. Dropping a pending call after
/// the request was queued does not cancel the update.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Request>,
    identifier: Option<Arc<Identifier>>,
    unavailable_reported: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Processes one event and returns its outcome.
    pub async fn submit(&self, event: Event) -> Result<EventOutcome, SessionError> {
        let audio_present = event.audio.is_some();
        let identification = match event.audio {
            Some(audio) => self.identify(audio).await,
            None => None,
        };
        let input = FusionInput {
            text: event.text,
            identification,
            audio_present,
        };
        self.request(|reply| Request::Submit { input, reply }).await
    }

    pub async fn status(&self) -> Result<StatusSnapshot, SessionError> {
        self.request(Request::Status).await
    }

    /// Retained log entries, oldest first.
    pub async fn history(&self) -> Result<Vec<LogEntry>, SessionError> {
        self.request(Request::History).await
    }

    /// Restores the initial state and returns it.
    pub async fn reset(&self) -> Result<StatusSnapshot, SessionError> {
        self.request(Request::Reset).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(make(tx))
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    async fn identify(&self, audio: AudioSample) -> Option<IdentificationResult> {
        let identifier = Arc::clone(self.identifier.as_ref()?);
        let joined = tokio::task::spawn_blocking(move || identifier.identify(&audio)).await;
        match joined {
            Ok(Ok(result)) => Some(result),
            Ok(Err(e)) if e.is_model_unavailable() => {
                if !self.unavailable_reported.swap(true, Ordering::SeqCst) {
                    warn!(error = %e, "speaker model unavailable, falling back to keyword heuristic");
                } else {
                    debug!(error = %e, "speaker model still unavailable");
                }
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "speaker identification failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "identification task failed");
                None
            }
        }
    }
}
