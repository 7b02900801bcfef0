//! Shared key generation for storage backends.
//!
//! Key format: `{owner_id}/{epoch_millis}.jpg`. The epoch-millisecond suffix
//! is collision avoidance for one owner submitting in quick succession, not a
//! security measure.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate the storage key for a receipt image captured by `owner_id` at
/// `submitted_at`.
pub fn receipt_image_key(owner_id: Uuid, submitted_at: DateTime<Utc>) -> String {
    format!("{}/{}.jpg", owner_id, submitted_at.timestamp_millis())
}
