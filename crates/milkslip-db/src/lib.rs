//! Milkslip Database Library
//!
//! Repositories for the shared datastore. The role model lives here, in
//! front of the rows: tenant-wide receipt reads, role-gated receipt writes,
//! and owner-scoped breeding records.

pub mod breeding;
pub mod profiles;
pub mod receipts;

pub use breeding::BreedingRepository;
pub use profiles::ProfileRepository;
pub use receipts::{ReceiptImage, ReceiptRepository};

use milkslip_core::AppError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Connect to the database and run pending migrations.
pub async fn connect(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;

    Ok(pool)
}
