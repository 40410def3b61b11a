use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request limit must be positive, got {0}")]
    InvalidCapacity(usize),

    #[error("Refill period must be non-zero")]
    InvalidPeriod,

    #[error("Cancelled while waiting for a permit")]
    Cancelled,

    #[error("Permit gate is closed")]
    GateClosed,

    #[error("Background task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Initialization error: {0}")]
    Init(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
