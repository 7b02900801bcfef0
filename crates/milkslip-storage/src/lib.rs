//! Milkslip Storage Library
//!
//! Storage abstraction for receipt images: the `Storage` trait plus the
//! local-filesystem backend.
//!
//! # Storage key format
//!
//! Keys are owner-scoped and all backends use the same layout:
//! `{owner_id}/{epoch_millis}.jpg`. Keys must not contain `..` or a leading
//! `/`. Key generation is centralized in the `keys` module.

pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use keys::receipt_image_key;
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
