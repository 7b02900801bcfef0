//! Month-wise grouping of persisted receipts for display.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use milkslip_core::CanonicalReceipt;

/// One calendar month of receipts with its monetary total.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup {
    /// Human label, e.g. "January 2024".
    pub label: String,
    /// Receipts in source order; never re-sorted by day.
    pub receipts: Vec<CanonicalReceipt>,
    /// Sum of `amount`, rendered to two decimal places.
    pub total: String,
}

/// The grouped view plus accounting for records that could not be placed.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedReceipts {
    pub groups: Vec<MonthGroup>,
    /// Records whose `date` failed to parse. Dropped from the view, but
    /// never silently: the count is reported to the caller and logged.
    pub dropped: usize,
}

/// Group receipts by calendar month with an optional free-text filter.
///
/// The filter is a case-insensitive substring match across every field's
/// rendered text, applied *before* grouping so filtered-out records do not
/// contribute to group totals. Groups appear in first-seen order of the
/// filtered input.
pub fn group(records: &[CanonicalReceipt], text_filter: Option<&str>) -> GroupedReceipts {
    let needle = text_filter
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase);

    let mut groups: Vec<(NaiveDate, MonthGroup)> = Vec::new();
    let mut dropped = 0usize;

    for record in records {
        if let Some(ref needle) = needle {
            let matches = record
                .rendered_fields()
                .iter()
                .any(|f| f.to_lowercase().contains(needle));
            if !matches {
                continue;
            }
        }

        let month = match NaiveDate::parse_from_str(&record.date, "%d/%m/%Y") {
            Ok(date) => date.with_day(1).expect("day 1 exists in every month"),
            Err(_) => {
                dropped += 1;
                tracing::warn!(receipt_id = %record.id, date = %record.date,
                    "Receipt date failed to parse; excluded from grouped view");
                continue;
            }
        };

        let entry = match groups.iter_mut().find(|(key, _)| *key == month) {
            Some((_, group)) => group,
            None => {
                groups.push((
                    month,
                    MonthGroup {
                        label: month.format("%B %Y").to_string(),
                        receipts: Vec::new(),
                        total: String::new(),
                    },
                ));
                &mut groups.last_mut().expect("just pushed").1
            }
        };
        entry.receipts.push(record.clone());
    }

    let groups = groups
        .into_iter()
        .map(|(_, mut group)| {
            group.total = format_total(&group.receipts);
            group
        })
        .collect();

    GroupedReceipts { groups, dropped }
}

fn format_total(receipts: &[CanonicalReceipt]) -> String {
    let mut total = Decimal::ZERO;
    for receipt in receipts {
        match receipt.amount.trim().parse::<Decimal>() {
            Ok(amount) => total += amount,
            Err(_) => {
                tracing::warn!(receipt_id = %receipt.id, amount = %receipt.amount,
                    "Receipt amount failed to parse; excluded from group total");
            }
        }
    }
    let mut total = total.round_dp(2);
    total.rescale(2);
    total.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use milkslip_core::MANUAL_IMAGE_REF;
    use uuid::Uuid;

    fn receipt(date: &str, amount: &str) -> CanonicalReceipt {
        CanonicalReceipt {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            date: date.to_string(),
            quantity: "10".to_string(),
            fat: "4.0".to_string(),
            clr: "27.00".to_string(),
            fat_kg: None,
            snf_kg: None,
            base_rate: "7.5".to_string(),
            rate: "42.00".to_string(),
            amount: amount.to_string(),
            image_reference: MANUAL_IMAGE_REF.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_monthly_grouping_and_totals() {
        let records = vec![
            receipt("05/01/2024", "100"),
            receipt("20/01/2024", "200"),
            receipt("01/02/2024", "300"),
        ];
        let grouped = group(&records, None);

        assert_eq!(grouped.dropped, 0);
        assert_eq!(grouped.groups.len(), 2);

        let january = &grouped.groups[0];
        assert_eq!(january.label, "January 2024");
        assert_eq!(january.receipts.len(), 2);
        assert_eq!(january.total, "300.00");
        // Source order within the group, not re-sorted by day.
        assert_eq!(january.receipts[0].date, "05/01/2024");
        assert_eq!(january.receipts[1].date, "20/01/2024");

        let february = &grouped.groups[1];
        assert_eq!(february.label, "February 2024");
        assert_eq!(february.receipts.len(), 1);
        assert_eq!(february.total, "300.00");
    }

    #[test]
    fn test_filter_applies_before_totals() {
        let records = vec![
            receipt("05/01/2024", "100"),
            receipt("20/01/2024", "200"),
            receipt("01/02/2024", "300"),
        ];
        let grouped = group(&records, Some("05/01/2024"));

        assert_eq!(grouped.groups.len(), 1);
        assert_eq!(grouped.groups[0].label, "January 2024");
        assert_eq!(grouped.groups[0].receipts.len(), 1);
        assert_eq!(grouped.groups[0].total, "100.00");
    }

    #[test]
    fn test_filter_is_case_insensitive_and_spans_all_fields() {
        let mut with_note = receipt("05/01/2024", "100");
        with_note.quantity = "12.5".to_string();
        let records = vec![with_note, receipt("20/01/2024", "200")];

        let grouped = group(&records, Some("12.5"));
        assert_eq!(grouped.groups[0].receipts.len(), 1);
        assert_eq!(grouped.groups[0].total, "100.00");

        // Month labels are not part of any field; filtering on amounts works.
        let grouped = group(&records, Some("200"));
        assert_eq!(grouped.groups[0].total, "200.00");
    }

    #[test]
    fn test_blank_filter_means_no_filter() {
        let records = vec![receipt("05/01/2024", "100")];
        let grouped = group(&records, Some("   "));
        assert_eq!(grouped.groups.len(), 1);
    }

    #[test]
    fn test_unparseable_dates_are_dropped_and_counted() {
        let records = vec![
            receipt("05/01/2024", "100"),
            receipt("someday", "999"),
            receipt("2024-01-05", "999"),
        ];
        let grouped = group(&records, None);

        assert_eq!(grouped.dropped, 2);
        assert_eq!(grouped.groups.len(), 1);
        assert_eq!(grouped.groups[0].total, "100.00");
    }

    #[test]
    fn test_unfiltered_record_sets_stay_in_source_order_across_months() {
        // A February record arriving between two January ones still groups
        // into one January group, in source order.
        let records = vec![
            receipt("20/01/2024", "200"),
            receipt("01/02/2024", "300"),
            receipt("05/01/2024", "100"),
        ];
        let grouped = group(&records, None);

        assert_eq!(grouped.groups[0].label, "January 2024");
        assert_eq!(grouped.groups[0].receipts[0].date, "20/01/2024");
        assert_eq!(grouped.groups[0].receipts[1].date, "05/01/2024");
        assert_eq!(grouped.groups[1].label, "February 2024");
    }
}
