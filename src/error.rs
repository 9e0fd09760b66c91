use thiserror::Error;

/// Transaction-level failure reported by the underlying engine.
///
/// The engine delivers this through its transaction-error callback; the
/// message is the driver's own text, carried unchanged. `Clone` because the
/// same error can need to travel both through the raw result's insert-id
/// accessor and through the completion channel.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::new(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SqlAdapterError {
    /// Missing or malformed connection string; raised synchronously at
    /// construction and never retried.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The engine reported a transaction-level failure.
    #[error(transparent)]
    EngineError(#[from] EngineError),

    /// The engine worker is gone or its channel broke down.
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
