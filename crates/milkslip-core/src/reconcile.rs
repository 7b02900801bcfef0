//! Field normalization: the single place where the camera and manual-entry
//! paths converge into one canonical receipt shape.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{Extraction, ExtractionFields, ExtractionSource, ReceiptDraft, MANUAL_IMAGE_REF};

/// Multiplier relating fat % to the lactometer correction: CLR = SNF + 0.25 x fat.
const CLR_FAT_FACTOR: &str = "0.25";

/// Reconcile extracted fields with manual overrides into a receipt draft.
///
/// Pure and idempotent. Applies, in order:
/// 1. extracted fields as the base;
/// 2. manual override values field-by-field, each completely replacing the
///    corresponding extracted value when present;
/// 3. date fallback to the capture timestamp (DD/MM/YYYY) when no date was
///    extracted or entered;
/// 4. CLR derivation from SNF and fat when CLR is still absent;
/// 5. anything still absent stays unset.
pub fn reconcile(extraction: &Extraction, overrides: &ExtractionFields) -> ReceiptDraft {
    let base = &extraction.fields;

    let pick = |extracted: &Option<String>, manual: &Option<String>| -> Option<String> {
        manual.clone().or_else(|| extracted.clone())
    };

    let mut draft = ReceiptDraft {
        date: pick(&base.date, &overrides.date),
        quantity: pick(&base.quantity, &overrides.quantity),
        fat: pick(&base.fat, &overrides.fat),
        clr: pick(&base.clr, &overrides.clr),
        fat_kg: pick(&base.fat_kg, &overrides.fat_kg),
        snf_kg: pick(&base.snf_kg, &overrides.snf_kg),
        base_rate: pick(&base.base_rate, &overrides.base_rate),
        rate: pick(&base.rate, &overrides.rate),
        amount: pick(&base.amount, &overrides.amount),
        image_reference: match extraction.source {
            ExtractionSource::Camera { .. } => None,
            ExtractionSource::Manual => Some(MANUAL_IMAGE_REF.to_string()),
        },
    };

    if draft.date.is_none() {
        if let ExtractionSource::Camera { taken_at } = extraction.source {
            draft.date = Some(format_receipt_date(taken_at));
        }
    }

    if draft.clr.is_none() {
        if let (Some(snf), Some(fat)) = (draft.snf_kg.as_deref(), draft.fat.as_deref()) {
            draft.clr = derive_clr(snf, fat);
        }
    }

    draft
}

/// Format a capture timestamp the way receipts print dates.
pub fn format_receipt_date(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y").to_string()
}

/// CLR = SNF + 0.25 x fat, rounded to two decimal places.
///
/// Returns `None` when either input fails to parse as a decimal; a garbled
/// extraction must not produce a fabricated reading.
fn derive_clr(snf: &str, fat: &str) -> Option<String> {
    let snf: Decimal = snf.trim().parse().ok()?;
    let fat: Decimal = fat.trim().parse().ok()?;
    let factor: Decimal = CLR_FAT_FACTOR.parse().expect("static decimal literal");
    let mut clr = (snf + factor * fat).round_dp(2);
    clr.rescale(2);
    Some(clr.to_string())
}
