//! Error types for store access and command execution.
//!
//! Validation failures are raised before any store call is attempted. Store
//! failures propagate to the caller as-is; nothing here retries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required identifier or text field was missing before a write.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// Backend or transport failure surfaced to the caller.
    #[error("Store unavailable: {0}")]
    Transient(String),

    /// A remote-shaped record failed to decode into the data model.
    #[error("Invalid record: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::NotFound { entity, id: id.to_string() }
    }

    /// Returns true for failures the caller fixes by changing its input.
    pub fn is_user_error(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::NotFound { .. } | AppError::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
