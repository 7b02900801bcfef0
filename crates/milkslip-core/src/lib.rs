//! Milkslip Core Library
//!
//! This crate provides the domain models, error types, configuration, field
//! normalization, and validation shared across all milkslip components.

pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod validation;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, LogLevel};
pub use models::{
    BreedingRecord, CanonicalReceipt, Extraction, ExtractionFields, ExtractionSource, Profile,
    ReceiptDraft, Role, MANUAL_IMAGE_REF,
};
pub use reconcile::{format_receipt_date, reconcile};
pub use validation::{validate_draft, validate_field, EntryMode, FieldViolation};
