use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RollupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Range start {start} is after range end {end}")]
    RangeInversion { start: NaiveDateTime, end: NaiveDateTime },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl RollupError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        RollupError::InvalidInput { message: message.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        RollupError::Storage { message: message.into() }
    }

    /// Errors caused by the caller's request rather than by the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RollupError::InvalidInput { .. }
                | RollupError::RangeInversion { .. }
                | RollupError::Serialization(_)
        )
    }
}

pub type RollupResult<T> = Result<T, RollupError>;
