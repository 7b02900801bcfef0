use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Artificial-insemination event for one animal.
///
/// Unrelated to receipts, and owner-scoped for every operation: only the
/// owning user may read, create, update, or delete a record. Deliberately
/// stricter than the tenant-wide receipt visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BreedingRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub animal_tag: String,
    pub insemination_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
