use std::sync::Arc;

use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use milkslip_core::{
    validate_draft, AppError, CanonicalReceipt, EntryMode, ReceiptDraft, MANUAL_IMAGE_REF,
};
use milkslip_storage::Storage;

use crate::profiles::ProfileRepository;

/// Image bytes accompanying a camera-path save.
#[derive(Debug, Clone)]
pub struct ReceiptImage {
    pub key: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Receipt repository.
///
/// Enforces the tenant role model in front of the rows: every authenticated
/// profile reads every receipt, Admin or Member may create, only Admin may
/// update or delete. Deletion is physical; records are never soft-deleted.
#[derive(Clone)]
pub struct ReceiptRepository {
    pool: PgPool,
    storage: Arc<dyn Storage>,
    profiles: ProfileRepository,
}

impl ReceiptRepository {
    pub fn new(pool: PgPool, storage: Arc<dyn Storage>) -> Self {
        Self {
            pool: pool.clone(),
            storage,
            profiles: ProfileRepository::new(pool),
        }
    }

    /// Persist a validated draft, uploading its image first when present.
    ///
    /// A rejection here (role, validation, storage, or constraint failure) is
    /// terminal for the attempt: the caller keeps the draft in session state
    /// and must not retry the write locally.
    #[tracing::instrument(skip(self, draft, image), fields(db.table = "receipts", db.operation = "insert"))]
    pub async fn save(
        &self,
        owner_id: Uuid,
        draft: &ReceiptDraft,
        image: Option<ReceiptImage>,
    ) -> Result<Uuid, AppError> {
        let profile = self.profiles.require(owner_id).await?;
        if !profile.role.can_create() {
            return Err(AppError::PersistenceRejected(format!(
                "Role {:?} may not create receipts",
                profile.role
            )));
        }

        validate_draft(draft, EntryMode::of(draft)).map_err(AppError::Validation)?;

        let image_reference = match (&image, draft.image_reference.as_deref()) {
            (Some(img), _) => self
                .storage
                .upload(&img.key, img.bytes.clone(), &img.content_type)
                .await
                .map_err(|e| {
                    AppError::PersistenceRejected(format!("Image upload failed: {}", e))
                })?,
            (None, Some(reference)) => reference.to_string(),
            (None, None) => {
                return Err(AppError::PersistenceRejected(
                    "Camera-path draft has no image bytes to upload".to_string(),
                ))
            }
        };

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO receipts
                (id, owner_id, date, quantity, fat, clr, fat_kg, snf_kg,
                 base_rate, rate, amount, image_reference)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(id)
        .bind(owner_id)
        .bind(&draft.date)
        .bind(&draft.quantity)
        .bind(&draft.fat)
        .bind(&draft.clr)
        .bind(&draft.fat_kg)
        .bind(&draft.snf_kg)
        .bind(&draft.base_rate)
        .bind(&draft.rate)
        .bind(&draft.amount)
        .bind(&image_reference)
        .execute(&self.pool)
        .await?;

        tracing::info!(receipt_id = %id, owner_id = %owner_id, "Receipt persisted");
        Ok(id)
    }

    /// Tenant-wide listing: every authenticated profile sees every record,
    /// in insertion order.
    #[tracing::instrument(skip(self), fields(db.table = "receipts", db.operation = "select"))]
    pub async fn list_visible(&self, caller_id: Uuid) -> Result<Vec<CanonicalReceipt>, AppError> {
        self.profiles.require(caller_id).await?;

        let receipts = sqlx::query_as::<Postgres, CanonicalReceipt>(
            "SELECT id, owner_id, date, quantity, fat, clr, fat_kg, snf_kg,
                    base_rate, rate, amount, image_reference, created_at
             FROM receipts ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(receipts)
    }

    /// Amend a persisted record's fields. Admin only; owner, creation time,
    /// and image reference are immutable.
    #[tracing::instrument(skip(self, draft), fields(db.table = "receipts", db.operation = "update"))]
    pub async fn update(
        &self,
        caller_id: Uuid,
        receipt_id: Uuid,
        draft: &ReceiptDraft,
    ) -> Result<CanonicalReceipt, AppError> {
        let caller = self.profiles.require(caller_id).await?;
        if !caller.role.can_mutate() {
            return Err(AppError::PersistenceRejected(
                "Only an admin may amend a persisted receipt".to_string(),
            ));
        }

        validate_draft(draft, EntryMode::of(draft)).map_err(AppError::Validation)?;

        sqlx::query_as::<Postgres, CanonicalReceipt>(
            "UPDATE receipts SET
                date = $2, quantity = $3, fat = $4, clr = $5, fat_kg = $6,
                snf_kg = $7, base_rate = $8, rate = $9, amount = $10
             WHERE id = $1
             RETURNING id, owner_id, date, quantity, fat, clr, fat_kg, snf_kg,
                       base_rate, rate, amount, image_reference, created_at",
        )
        .bind(receipt_id)
        .bind(&draft.date)
        .bind(&draft.quantity)
        .bind(&draft.fat)
        .bind(&draft.clr)
        .bind(&draft.fat_kg)
        .bind(&draft.snf_kg)
        .bind(&draft.base_rate)
        .bind(&draft.rate)
        .bind(&draft.amount)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Receipt {} not found", receipt_id)))
    }

    /// Physically delete a record and, for camera-path records, its stored
    /// image. Admin only.
    #[tracing::instrument(skip(self), fields(db.table = "receipts", db.operation = "delete"))]
    pub async fn delete(&self, caller_id: Uuid, receipt_id: Uuid) -> Result<(), AppError> {
        let caller = self.profiles.require(caller_id).await?;
        if !caller.role.can_mutate() {
            return Err(AppError::PersistenceRejected(
                "Only an admin may delete a persisted receipt".to_string(),
            ));
        }

        let image_reference: Option<String> =
            sqlx::query_scalar("DELETE FROM receipts WHERE id = $1 RETURNING image_reference")
                .bind(receipt_id)
                .fetch_optional(&self.pool)
                .await?;

        let reference = image_reference
            .ok_or_else(|| AppError::NotFound(format!("Receipt {} not found", receipt_id)))?;

        // The row is the record of truth; a failed object delete leaves a
        // harmless orphan and is logged, not surfaced.
        if let Some(key) = storage_key_from_reference(&reference) {
            if let Err(e) = self.storage.delete(&key).await {
                tracing::warn!(receipt_id = %receipt_id, key = %key, error = %e,
                    "Receipt image could not be deleted from storage");
            }
        }

        tracing::info!(receipt_id = %receipt_id, "Receipt deleted");
        Ok(())
    }
}

/// Recover the `{owner_id}/{epoch_millis}.jpg` storage key from a stored
/// public URL. Manual-entry records have no stored object.
fn storage_key_from_reference(reference: &str) -> Option<String> {
    if reference == MANUAL_IMAGE_REF {
        return None;
    }
    let mut segments = reference.rsplitn(3, '/');
    let filename = segments.next()?;
    let owner = segments.next()?;
    if filename.is_empty() || owner.is_empty() || Uuid::parse_str(owner).is_err() {
        return None;
    }
    Some(format!("{}/{}", owner, filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_recovered_from_public_url() {
        let owner = Uuid::new_v4();
        let reference = format!("http://localhost:3000/receipts/{}/1704447000000.jpg", owner);
        assert_eq!(
            storage_key_from_reference(&reference),
            Some(format!("{}/1704447000000.jpg", owner))
        );
    }

    #[test]
    fn test_manual_sentinel_has_no_storage_key() {
        assert_eq!(storage_key_from_reference(MANUAL_IMAGE_REF), None);
    }

    #[test]
    fn test_unrecognized_reference_has_no_storage_key() {
        assert_eq!(storage_key_from_reference("not-a-url"), None);
        assert_eq!(
            storage_key_from_reference("http://localhost/other/1.jpg"),
            None
        );
    }
}
