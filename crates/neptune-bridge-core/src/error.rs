use thiserror::Error;

/// Top-level error type for the Neptune bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Submission error: {0}")]
    Submission(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
