//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Entry not found")]
    NotFound(i64),

    #[error("Sentiment classification failed: {0}")]
    Classification(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Server error: {0}")]
    Server(String),
}

impl DomainError {
    /// HTTP status the API layer reports for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            DomainError::Validation(_) => 422,
            DomainError::NotFound(_) => 404,
            DomainError::PayloadTooLarge { .. } => 413,
            DomainError::Classification(_) => 502,
            DomainError::Storage(_) | DomainError::Server(_) => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
