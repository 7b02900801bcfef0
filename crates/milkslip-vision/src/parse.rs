//! Best-effort isolation of the structured payload from a model response.
//!
//! The model is asked for exactly one JSON object, but the response is free
//! text and non-deterministic. Parsing isolates the first balanced `{...}`
//! span and parses that; if no span can be isolated, the attempt fails hard.
//! There is no partial-field fallback from a malformed payload.

use milkslip_core::{AppError, ExtractionFields};
use serde_json::Value;

/// Parse an extraction response body into its sparse field set.
///
/// Any field absent from the isolated object stays unset; unset is distinct
/// from zero.
pub fn parse_fields(text: &str) -> Result<ExtractionFields, AppError> {
    let span = isolate_json_span(text).ok_or_else(|| {
        AppError::ExtractionMalformed("Response contains no JSON object".to_string())
    })?;

    let value: Value = serde_json::from_str(span).map_err(|e| {
        AppError::ExtractionMalformed(format!("Response JSON failed to parse: {}", e))
    })?;

    let object = value.as_object().ok_or_else(|| {
        AppError::ExtractionMalformed("Response JSON is not an object".to_string())
    })?;

    let field = |key: &str| -> Option<String> {
        match object.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            // The prompt asks for strings, but tolerate bare numbers.
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    };

    Ok(ExtractionFields {
        date: field("date"),
        quantity: field("quantity"),
        fat: field("fat"),
        clr: field("clr"),
        fat_kg: field("fat_kg"),
        snf_kg: field("snf_kg"),
        base_rate: field("base_rate"),
        rate: field("rate"),
        amount: field("amount"),
    })
}

/// Find the first balanced `{...}` span in `text`.
///
/// Scans with a brace-depth counter that is string- and escape-aware, so
/// braces inside JSON string values do not end the span early.
fn isolate_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json_object() {
        let fields =
            parse_fields(r#"{"quantity": "12.5", "fat": "4.0", "amount": "525.00"}"#).unwrap();
        assert_eq!(fields.quantity.as_deref(), Some("12.5"));
        assert_eq!(fields.fat.as_deref(), Some("4.0"));
        assert_eq!(fields.amount.as_deref(), Some("525.00"));
        assert_eq!(fields.date, None);
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let text = "Here is what I can read from the receipt:\n\
                    {\"date\": \"05/01/2024\", \"quantity\": \"10\"}\n\
                    Let me know if you need anything else.";
        let fields = parse_fields(text).unwrap();
        assert_eq!(fields.date.as_deref(), Some("05/01/2024"));
        assert_eq!(fields.quantity.as_deref(), Some("10"));
    }

    #[test]
    fn test_braces_inside_string_values() {
        let text = r#"{"date": "05/01/2024", "quantity": "1{2}"}"#;
        let fields = parse_fields(text).unwrap();
        assert_eq!(fields.quantity.as_deref(), Some("1{2}"));
    }

    #[test]
    fn test_no_span_is_malformed() {
        let err = parse_fields("I could not read anything from this image.").unwrap_err();
        assert!(matches!(err, AppError::ExtractionMalformed(_)));
    }

    #[test]
    fn test_unparseable_span_is_malformed() {
        let err = parse_fields("{date: definitely not json}").unwrap_err();
        assert!(matches!(err, AppError::ExtractionMalformed(_)));
    }

    #[test]
    fn test_unterminated_span_is_malformed() {
        let err = parse_fields(r#"{"date": "05/01/2024""#).unwrap_err();
        assert!(matches!(err, AppError::ExtractionMalformed(_)));
    }

    #[test]
    fn test_numeric_values_tolerated() {
        let fields = parse_fields(r#"{"quantity": 12.5, "rate": 42}"#).unwrap();
        assert_eq!(fields.quantity.as_deref(), Some("12.5"));
        assert_eq!(fields.rate.as_deref(), Some("42"));
    }

    #[test]
    fn test_null_and_empty_values_stay_unset() {
        let fields = parse_fields(r#"{"fat": null, "clr": "", "quantity": "0"}"#).unwrap();
        assert_eq!(fields.fat, None);
        assert_eq!(fields.clr, None);
        // Zero is a measurement, not an absence.
        assert_eq!(fields.quantity.as_deref(), Some("0"));
    }

    #[test]
    fn test_non_object_json_is_malformed() {
        let err = parse_fields(r#"["quantity", "12.5"]"#).unwrap_err();
        assert!(matches!(err, AppError::ExtractionMalformed(_)));
    }
}
