use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session: closed")]
    Closed,

    #[error("session: invalid config: {0}")]
    Config(String),

    #[error("session: sink: {0}")]
    Sink(String),

    #[error("session: io: {0}")]
    Io(#[from] std::io::Error),

    #[error("session: json: {0}")]
    Json(#[from] serde_json::Error),
}
