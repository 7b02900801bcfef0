use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel stored in `image_reference` for records entered by hand, with no
/// photographic source.
pub const MANUAL_IMAGE_REF: &str = "manual-entry";

/// A persisted receipt record.
///
/// Measurement and monetary fields are decimal-formatted text, not binary
/// floats, so values survive display/edit round-trips without rounding drift.
/// `owner_id` and `created_at` are assigned at persistence time and are
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CanonicalReceipt {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// DD/MM/YYYY
    pub date: String,
    /// Liters
    pub quantity: String,
    /// Fat percentage
    pub fat: String,
    /// Corrected lactometer reading; extracted or derived from SNF and fat.
    pub clr: String,
    pub fat_kg: Option<String>,
    pub snf_kg: Option<String>,
    /// Printed per-unit rate in minor currency units (paise).
    pub base_rate: String,
    /// Actually billed per-unit rate in major currency units (rupees).
    pub rate: String,
    /// Total billed amount.
    pub amount: String,
    /// Public URL of the stored source image, or [`MANUAL_IMAGE_REF`].
    pub image_reference: String,
    pub created_at: DateTime<Utc>,
}

impl CanonicalReceipt {
    /// Whether this record was entered by hand rather than captured.
    pub fn is_manual(&self) -> bool {
        self.image_reference == MANUAL_IMAGE_REF
    }

    /// Rendered text of every field, used for free-text filtering.
    pub fn rendered_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.date.as_str(),
            self.quantity.as_str(),
            self.fat.as_str(),
            self.clr.as_str(),
            self.base_rate.as_str(),
            self.rate.as_str(),
            self.amount.as_str(),
        ];
        if let Some(ref fat_kg) = self.fat_kg {
            fields.push(fat_kg.as_str());
        }
        if let Some(ref snf_kg) = self.snf_kg {
            fields.push(snf_kg.as_str());
        }
        fields
    }
}

/// A receipt under construction, before validation and persistence.
///
/// Every field is optional until validation; unset is distinct from zero.
/// `image_reference` holds [`MANUAL_IMAGE_REF`] for the manual-entry path and
/// stays `None` for the camera path until the image is uploaded at save time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDraft {
    pub date: Option<String>,
    pub quantity: Option<String>,
    pub fat: Option<String>,
    pub clr: Option<String>,
    pub fat_kg: Option<String>,
    pub snf_kg: Option<String>,
    pub base_rate: Option<String>,
    pub rate: Option<String>,
    pub amount: Option<String>,
    pub image_reference: Option<String>,
}

impl ReceiptDraft {
    pub fn is_manual(&self) -> bool {
        self.image_reference.as_deref() == Some(MANUAL_IMAGE_REF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_sentinel_detection() {
        let draft = ReceiptDraft {
            image_reference: Some(MANUAL_IMAGE_REF.to_string()),
            ..Default::default()
        };
        assert!(draft.is_manual());

        let camera = ReceiptDraft::default();
        assert!(!camera.is_manual());
    }

    #[test]
    fn test_rendered_fields_includes_optional_values() {
        let receipt = CanonicalReceipt {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            date: "05/01/2024".to_string(),
            quantity: "12.5".to_string(),
            fat: "4.0".to_string(),
            clr: "27.00".to_string(),
            fat_kg: Some("0.50".to_string()),
            snf_kg: None,
            base_rate: "7.5".to_string(),
            rate: "42.00".to_string(),
            amount: "525.00".to_string(),
            image_reference: MANUAL_IMAGE_REF.to_string(),
            created_at: Utc::now(),
        };
        let rendered = receipt.rendered_fields();
        assert!(rendered.contains(&"05/01/2024"));
        assert!(rendered.contains(&"0.50"));
        assert_eq!(rendered.len(), 8);
    }
}
