use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The sparse set of named fields a vision extraction attempt may yield.
///
/// Any subset may be absent; the model is not guaranteed to return all nine
/// fields. Unset is distinct from zero: zero is a valid measurement, so no
/// field is ever defaulted. All values are text-typed in the wire format,
/// even numeric ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionFields {
    pub date: Option<String>,
    pub quantity: Option<String>,
    pub fat: Option<String>,
    pub clr: Option<String>,
    pub fat_kg: Option<String>,
    pub snf_kg: Option<String>,
    pub base_rate: Option<String>,
    pub rate: Option<String>,
    pub amount: Option<String>,
}

impl ExtractionFields {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.quantity.is_none()
            && self.fat.is_none()
            && self.clr.is_none()
            && self.fat_kg.is_none()
            && self.snf_kg.is_none()
            && self.base_rate.is_none()
            && self.rate.is_none()
            && self.amount.is_none()
    }
}

/// Where an extraction's fields came from.
///
/// The camera path and the manual-entry path are two constructors of the same
/// shape; downstream code must not distinguish them except through the
/// record's image reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExtractionSource {
    /// Fields read from a captured photo; carries the capture timestamp used
    /// as the date fallback.
    Camera { taken_at: DateTime<Utc> },
    /// Fields typed in by the user with no photographic source.
    Manual,
}

/// One extraction attempt's outcome: its fields plus their provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub source: ExtractionSource,
    pub fields: ExtractionFields,
}

impl Extraction {
    pub fn from_camera(fields: ExtractionFields, taken_at: DateTime<Utc>) -> Self {
        Self {
            source: ExtractionSource::Camera { taken_at },
            fields,
        }
    }

    pub fn from_manual(fields: ExtractionFields) -> Self {
        Self {
            source: ExtractionSource::Manual,
            fields,
        }
    }
}
