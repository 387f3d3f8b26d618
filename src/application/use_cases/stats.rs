// ============================================================
// PROJECT STATS USE CASE
// ============================================================
// Grouped counts over one project's persisted records

use crate::domain::record::StoredRecord;
use crate::domain::stats::{GroupedCounts, ProjectStats};

/// Compute the six grouped counts for a project. Records with a
/// missing or empty company/field/formation are excluded from that
/// grouping only; every record still counts toward the sheet and
/// row-bucket groupings. Records whose sheet relation is unresolved
/// are grouped under "Unknown". Keys keep first-seen order.
pub fn compute_stats(records: &[StoredRecord]) -> ProjectStats {
    let mut by_company = GroupedCounts::new();
    let mut by_field = GroupedCounts::new();
    let mut by_formation = GroupedCounts::new();
    let mut by_sheet = GroupedCounts::new();
    let mut row_buckets = GroupedCounts::new();
    let mut sheet_rows = GroupedCounts::new();

    for record in records {
        let sheet_name = record.sheet_name.as_deref().unwrap_or("Unknown");
        by_sheet.increment(sheet_name);
        sheet_rows.increment(sheet_name);

        if let Some(company) = non_empty(&record.company) {
            by_company.increment(company);
        }
        if let Some(field) = non_empty(&record.field) {
            by_field.increment(field);
        }
        if let Some(formation) = non_empty(&record.formation) {
            by_formation.increment(formation);
        }

        let floor = (record.row_index / 10) * 10;
        row_buckets.increment(&format!("{}-{}", floor, floor + 9));
    }

    ProjectStats {
        wells_by_company: by_company,
        wells_by_field: by_field,
        wells_by_formation: by_formation,
        wells_by_sheet: by_sheet,
        wells_per_row_bucket: row_buckets,
        sheet_row_counts: sheet_rows,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::AttributeBag;

    fn record(
        sheet_name: Option<&str>,
        row_index: i64,
        company: Option<&str>,
        formation: Option<&str>,
    ) -> StoredRecord {
        StoredRecord {
            id: 0,
            sheet_id: 0,
            row_index,
            sheet_name: sheet_name.map(str::to_string),
            company: company.map(str::to_string),
            field: None,
            well_name: None,
            formation: formation.map(str::to_string),
            data: AttributeBag::new(),
        }
    }

    #[test]
    fn test_grouping_example() {
        let records = vec![
            record(Some("A"), 5, Some("X"), None),
            record(Some("A"), 15, Some("Y"), None),
            record(Some("B"), 7, Some("X"), None),
        ];

        let stats = compute_stats(&records);

        assert_eq!(stats.wells_by_company.get("X"), Some(2));
        assert_eq!(stats.wells_by_company.get("Y"), Some(1));
        assert_eq!(stats.wells_by_sheet.get("A"), Some(2));
        assert_eq!(stats.wells_by_sheet.get("B"), Some(1));
        assert_eq!(stats.wells_per_row_bucket.get("0-9"), Some(2));
        assert_eq!(stats.wells_per_row_bucket.get("10-19"), Some(1));
        assert_eq!(stats.sheet_row_counts, stats.wells_by_sheet);
    }

    #[test]
    fn test_missing_fields_excluded_from_their_grouping_only() {
        let records = vec![
            record(Some("A"), 0, None, Some("Shale")),
            record(Some("A"), 1, Some(""), None),
        ];

        let stats = compute_stats(&records);

        assert!(stats.wells_by_company.is_empty());
        assert_eq!(stats.wells_by_formation.get("Shale"), Some(1));
        assert_eq!(stats.wells_by_sheet.get("A"), Some(2));
        assert_eq!(stats.wells_per_row_bucket.get("0-9"), Some(2));
    }

    #[test]
    fn test_unresolved_sheet_groups_as_unknown() {
        let records = vec![record(None, 3, Some("X"), None)];
        let stats = compute_stats(&records);
        assert_eq!(stats.wells_by_sheet.get("Unknown"), Some(1));
    }

    #[test]
    fn test_keys_keep_first_seen_order() {
        let records = vec![
            record(Some("Zeta"), 0, None, None),
            record(Some("Alpha"), 1, None, None),
            record(Some("Zeta"), 2, None, None),
        ];

        let stats = compute_stats(&records);
        let keys: Vec<&str> = stats.wells_by_sheet.keys().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);
    }
}
