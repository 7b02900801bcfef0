//! Error types module
//!
//! This module provides the core error types used throughout the milkslip
//! pipeline. All errors are unified under the `AppError` enum which can
//! represent configuration, extraction, validation, storage, and database
//! errors.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature. With `default-features = false` there is no database variant.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

use crate::validation::FieldViolation;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a flaky vision call
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or unusable credential/configuration. Must surface before any
    /// network call is attempted, not mid-pipeline.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The image could not be decoded or re-encoded. The caller aborts the
    /// ingestion attempt; the original bytes are never used as a fallback.
    #[error("Image encoding failed: {0}")]
    EncodeFailed(String),

    /// Transient network or service failure talking to the vision API.
    /// Retryable by re-invoking the extraction.
    #[error("Extraction unavailable: {0}")]
    ExtractionUnavailable(String),

    /// The vision model produced no recoverable structured payload. Not
    /// retryable without a new attempt; there is no partial-field fallback.
    #[error("Extraction malformed: {0}")]
    ExtractionMalformed(String),

    /// One or more fields are outside their allowed range or format. Blocks
    /// submission only; never fatal.
    #[error("Validation failed: {} field(s) out of range", .0.len())]
    Validation(Vec<FieldViolation>),

    /// The persistence layer rejected the write (authorization or constraint
    /// failure). Terminal for the attempt; no local retry of a rejected write.
    #[error("Persistence rejected: {0}")]
    PersistenceRejected(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ExtractionMalformed(format!("JSON parsing error: {}", err))
    }
}

impl AppError {
    /// Whether re-invoking the failed operation with the same inputs can
    /// reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::ExtractionUnavailable(_) | AppError::Database(_) | AppError::Storage(_)
        )
    }

    /// Log level for this error.
    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::Configuration(_) => LogLevel::Error,
            AppError::EncodeFailed(_) => LogLevel::Warn,
            AppError::ExtractionUnavailable(_) => LogLevel::Warn,
            AppError::ExtractionMalformed(_) => LogLevel::Warn,
            AppError::Validation(_) => LogLevel::Debug,
            AppError::PersistenceRejected(_) => LogLevel::Warn,
            AppError::Unauthorized(_) => LogLevel::Debug,
            AppError::NotFound(_) => LogLevel::Debug,
            AppError::Database(_) => LogLevel::Error,
            AppError::Storage(_) => LogLevel::Error,
            AppError::Internal(_) => LogLevel::Error,
        }
    }

    /// Client-facing message (may differ from the internal error message).
    pub fn client_message(&self) -> String {
        match self {
            AppError::Configuration(_) => {
                "Vision API key is not configured. Set it before capturing a receipt.".to_string()
            }
            AppError::EncodeFailed(_) => {
                "Could not process this photo. Try capturing it again.".to_string()
            }
            AppError::ExtractionUnavailable(_) => {
                "Could not reach the extraction service. Try again.".to_string()
            }
            AppError::ExtractionMalformed(_) => {
                "Could not read values from this photo. Try capturing it again.".to_string()
            }
            AppError::Validation(violations) => violations
                .iter()
                .map(|v| v.message.clone())
                .collect::<Vec<_>>()
                .join("; "),
            AppError::PersistenceRejected(msg) => msg.clone(),
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Internal(_) => "Internal error".to_string(),
        }
    }

    /// Get detailed error information including the source chain.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_unavailable_is_retryable() {
        let err = AppError::ExtractionUnavailable("connection refused".to_string());
        assert!(err.is_retryable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_extraction_malformed_is_not_retryable() {
        let err = AppError::ExtractionMalformed("no JSON object in response".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_validation_error_joins_messages() {
        let err = AppError::Validation(vec![
            FieldViolation::new("quantity", "Quantity must be between 0.1 and 500"),
            FieldViolation::new("fat", "Fat % must be between 2 and 11"),
        ]);
        assert!(!err.is_retryable());
        assert_eq!(err.log_level(), LogLevel::Debug);
        let msg = err.client_message();
        assert!(msg.contains("Quantity"));
        assert!(msg.contains("Fat %"));
    }

    #[test]
    fn test_configuration_error_hides_internal_detail() {
        let err = AppError::Configuration("ANTHROPIC_API_KEY unset".to_string());
        assert!(err.client_message().contains("not configured"));
        assert_eq!(err.log_level(), LogLevel::Error);
    }
}
