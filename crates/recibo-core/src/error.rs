use thiserror::Error;

/// Top-level error type for recibo.
#[derive(Debug, Error)]
pub enum ReciboError {
    /// Error from the messaging gateway.
    #[error("channel error: {0}")]
    Channel(String),

    /// Relational store error.
    #[error("store error: {0}")]
    Store(String),

    /// Remote document archive error.
    #[error("archive error: {0}")]
    Archive(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
