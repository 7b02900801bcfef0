//! Receipt field validation.
//!
//! Ranges are policy, not mechanism: they live in one rule table so product
//! tuning never touches pipeline code. Validation is advisory at the UI layer
//! (per-field, inline) and mandatory before persistence.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::models::ReceiptDraft;

/// How the draft was produced. The base-rate range differs between the two
/// because manual entry takes the rate in major currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    Camera,
    Manual,
}

impl EntryMode {
    /// Derive the entry mode from a draft's image reference.
    pub fn of(draft: &ReceiptDraft) -> Self {
        if draft.is_manual() {
            EntryMode::Manual
        } else {
            EntryMode::Camera
        }
    }
}

/// One field outside its allowed range or format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Closed numeric range for one field.
#[derive(Debug, Clone, Copy)]
pub struct RangeRule {
    pub field: &'static str,
    pub label: &'static str,
    pub min: &'static str,
    pub max: &'static str,
    pub required: bool,
}

/// The validation rule table for a given entry mode.
pub fn range_rules(mode: EntryMode) -> Vec<RangeRule> {
    let base_rate_rule = match mode {
        EntryMode::Manual => RangeRule {
            field: "base_rate",
            label: "Base rate",
            min: "0.1",
            max: "5",
            required: true,
        },
        EntryMode::Camera => RangeRule {
            field: "base_rate",
            label: "Base rate",
            min: "0.1",
            max: "100",
            required: true,
        },
    };
    vec![
        RangeRule {
            field: "quantity",
            label: "Quantity",
            min: "0.1",
            max: "500",
            required: true,
        },
        RangeRule {
            field: "fat",
            label: "Fat %",
            min: "2",
            max: "11",
            required: true,
        },
        RangeRule {
            field: "clr",
            label: "Lactometer reading",
            min: "15",
            max: "40",
            required: true,
        },
        RangeRule {
            field: "fat_kg",
            label: "Fat kg",
            min: "0.01",
            max: "50",
            required: false,
        },
        RangeRule {
            field: "snf_kg",
            label: "SNF kg",
            min: "0.01",
            max: "50",
            required: false,
        },
        base_rate_rule,
        RangeRule {
            field: "rate",
            label: "Rate",
            min: "1",
            max: "200",
            required: true,
        },
        RangeRule {
            field: "amount",
            label: "Amount",
            min: "1",
            max: "100000",
            required: true,
        },
    ]
}

fn date_format() -> &'static Regex {
    static DATE_RE: OnceLock<Regex> = OnceLock::new();
    DATE_RE.get_or_init(|| {
        Regex::new(r"^(0[1-9]|[12][0-9]|3[01])/(0[1-9]|1[0-2])/\d{4}$").expect("static regex")
    })
}

fn field_value<'a>(draft: &'a ReceiptDraft, field: &str) -> Option<&'a str> {
    match field {
        "quantity" => draft.quantity.as_deref(),
        "fat" => draft.fat.as_deref(),
        "clr" => draft.clr.as_deref(),
        "fat_kg" => draft.fat_kg.as_deref(),
        "snf_kg" => draft.snf_kg.as_deref(),
        "base_rate" => draft.base_rate.as_deref(),
        "rate" => draft.rate.as_deref(),
        "amount" => draft.amount.as_deref(),
        _ => None,
    }
}

/// Validate one field of a draft, for inline per-field feedback.
pub fn validate_field(draft: &ReceiptDraft, field: &str, mode: EntryMode) -> Option<FieldViolation> {
    if field == "date" {
        return validate_date(draft.date.as_deref());
    }
    let rule = range_rules(mode).into_iter().find(|r| r.field == field)?;
    check_rule(&rule, field_value(draft, field))
}

/// Validate a whole draft. Mandatory before persistence: a draft with any
/// violation must never reach the repository insert.
pub fn validate_draft(draft: &ReceiptDraft, mode: EntryMode) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();

    if let Some(v) = validate_date(draft.date.as_deref()) {
        violations.push(v);
    }

    for rule in range_rules(mode) {
        if let Some(v) = check_rule(&rule, field_value(draft, rule.field)) {
            violations.push(v);
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn validate_date(date: Option<&str>) -> Option<FieldViolation> {
    match date {
        None => Some(FieldViolation::new("date", "Date is required")),
        Some(d) if date_format().is_match(d) => None,
        Some(_) => Some(FieldViolation::new("date", "Date must be DD/MM/YYYY")),
    }
}

fn check_rule(rule: &RangeRule, value: Option<&str>) -> Option<FieldViolation> {
    let raw = match value {
        Some(raw) => raw,
        None if rule.required => {
            return Some(FieldViolation::new(
                rule.field,
                format!("{} is required", rule.label),
            ))
        }
        None => return None,
    };

    let out_of_range = || {
        FieldViolation::new(
            rule.field,
            format!("{} must be between {} and {}", rule.label, rule.min, rule.max),
        )
    };

    let parsed: Decimal = match raw.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            return Some(FieldViolation::new(
                rule.field,
                format!("{} must be a number", rule.label),
            ))
        }
    };
    let min: Decimal = rule.min.parse().expect("static decimal literal");
    let max: Decimal = rule.max.parse().expect("static decimal literal");

    if parsed < min || parsed > max {
        return Some(out_of_range());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> ReceiptDraft {
        ReceiptDraft {
            date: Some("05/01/2024".to_string()),
            quantity: Some("12.5".to_string()),
            fat: Some("4.0".to_string()),
            clr: Some("27.00".to_string()),
            fat_kg: None,
            snf_kg: None,
            base_rate: Some("7.5".to_string()),
            rate: Some("42.00".to_string()),
            amount: Some("525.00".to_string()),
            image_reference: None,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate_draft(&valid_draft(), EntryMode::Camera).is_ok());
    }

    #[test]
    fn test_quantity_boundaries() {
        let mut draft = valid_draft();

        draft.quantity = Some("0.1".to_string());
        assert!(validate_draft(&draft, EntryMode::Camera).is_ok());

        draft.quantity = Some("0.099".to_string());
        let violations = validate_draft(&draft, EntryMode::Camera).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "quantity");

        draft.quantity = Some("500".to_string());
        assert!(validate_draft(&draft, EntryMode::Camera).is_ok());

        draft.quantity = Some("500.01".to_string());
        assert!(validate_draft(&draft, EntryMode::Camera).is_err());
    }

    #[test]
    fn test_base_rate_range_depends_on_entry_mode() {
        let mut draft = valid_draft();
        draft.base_rate = Some("7.5".to_string());

        assert!(validate_draft(&draft, EntryMode::Camera).is_ok());
        let violations = validate_draft(&draft, EntryMode::Manual).unwrap_err();
        assert_eq!(violations[0].field, "base_rate");
    }

    #[test]
    fn test_date_format() {
        let mut draft = valid_draft();

        for bad in ["5/1/2024", "32/01/2024", "01/13/2024", "2024-01-05", "birthday"] {
            draft.date = Some(bad.to_string());
            let violations = validate_draft(&draft, EntryMode::Camera).unwrap_err();
            assert_eq!(violations[0].field, "date", "expected {} to fail", bad);
        }

        draft.date = Some("31/12/2024".to_string());
        assert!(validate_draft(&draft, EntryMode::Camera).is_ok());
    }

    #[test]
    fn test_missing_required_field_reported() {
        let mut draft = valid_draft();
        draft.amount = None;
        let violations = validate_draft(&draft, EntryMode::Camera).unwrap_err();
        assert!(violations.iter().any(|v| v.field == "amount"));
    }

    #[test]
    fn test_optional_fields_checked_only_when_present() {
        let mut draft = valid_draft();
        assert!(validate_draft(&draft, EntryMode::Camera).is_ok());

        draft.fat_kg = Some("0.005".to_string());
        let violations = validate_draft(&draft, EntryMode::Camera).unwrap_err();
        assert_eq!(violations[0].field, "fat_kg");
    }

    #[test]
    fn test_non_numeric_value_reported() {
        let mut draft = valid_draft();
        draft.fat = Some("four".to_string());
        let violations = validate_draft(&draft, EntryMode::Camera).unwrap_err();
        assert_eq!(violations[0].field, "fat");
        assert!(violations[0].message.contains("number"));
    }

    #[test]
    fn test_validate_single_field() {
        let mut draft = valid_draft();
        draft.fat = Some("12".to_string());
        let violation = validate_field(&draft, "fat", EntryMode::Camera).unwrap();
        assert_eq!(violation.field, "fat");
        assert!(validate_field(&draft, "quantity", EntryMode::Camera).is_none());
    }
}
