use chrono::NaiveDate;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use milkslip_core::{AppError, BreedingRecord};

/// Breeding (artificial insemination) record repository.
///
/// Every operation is owner-scoped: the queries themselves filter on
/// `owner_id`, so a caller can never read or touch another user's records.
/// Deliberately stricter than receipt visibility.
#[derive(Clone)]
pub struct BreedingRepository {
    pool: PgPool,
}

impl BreedingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "ai_records", db.operation = "select"))]
    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<BreedingRecord>, AppError> {
        let records = sqlx::query_as::<Postgres, BreedingRecord>(
            "SELECT id, owner_id, animal_tag, insemination_date, created_at
             FROM ai_records WHERE owner_id = $1
             ORDER BY insemination_date DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    #[tracing::instrument(skip(self), fields(db.table = "ai_records", db.operation = "insert"))]
    pub async fn create(
        &self,
        owner_id: Uuid,
        animal_tag: &str,
        insemination_date: NaiveDate,
    ) -> Result<BreedingRecord, AppError> {
        if animal_tag.trim().is_empty() {
            return Err(AppError::PersistenceRejected(
                "Animal tag must not be empty".to_string(),
            ));
        }

        let record = sqlx::query_as::<Postgres, BreedingRecord>(
            "INSERT INTO ai_records (id, owner_id, animal_tag, insemination_date)
             VALUES ($1, $2, $3, $4)
             RETURNING id, owner_id, animal_tag, insemination_date, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(animal_tag.trim())
        .bind(insemination_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    #[tracing::instrument(skip(self), fields(db.table = "ai_records", db.operation = "update"))]
    pub async fn update(
        &self,
        owner_id: Uuid,
        record_id: Uuid,
        animal_tag: &str,
        insemination_date: NaiveDate,
    ) -> Result<BreedingRecord, AppError> {
        if animal_tag.trim().is_empty() {
            return Err(AppError::PersistenceRejected(
                "Animal tag must not be empty".to_string(),
            ));
        }

        sqlx::query_as::<Postgres, BreedingRecord>(
            "UPDATE ai_records SET animal_tag = $3, insemination_date = $4
             WHERE id = $1 AND owner_id = $2
             RETURNING id, owner_id, animal_tag, insemination_date, created_at",
        )
        .bind(record_id)
        .bind(owner_id)
        .bind(animal_tag.trim())
        .bind(insemination_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Breeding record {} not found", record_id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "ai_records", db.operation = "delete"))]
    pub async fn delete(&self, owner_id: Uuid, record_id: Uuid) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM ai_records WHERE id = $1 AND owner_id = $2")
            .bind(record_id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Breeding record {} not found",
                record_id
            )));
        }
        Ok(())
    }
}
