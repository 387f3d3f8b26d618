// ============================================================
// EXCEL INGESTION USE CASE
// ============================================================
// Flatten workbook rows into canonical well/field records

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::record::{AttributeBag, CanonicalRecord, CellValue};

const COMPANY_ALIASES: &[&str] = &["company"];
const FIELD_ALIASES: &[&str] = &["field"];
const WELL_NAME_ALIASES: &[&str] = &["well_name", "well"];
const FORMATION_ALIASES: &[&str] = &["formation", "formation_name"];

/// Lowercase, trim, and collapse internal whitespace runs to a single
/// underscore. Idempotent.
pub fn normalize_header(header: &str) -> String {
    header
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Open a workbook (`.xls`/`.xlsx`/`.xlsm`) and normalize every
/// worksheet, in workbook order. An unreadable workbook aborts the
/// whole import with an ingestion error.
pub fn load_workbook(path: &Path) -> Result<Vec<(String, Vec<CanonicalRecord>)>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::IngestionError(format!("Failed to read Excel file: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in sheet_names {
        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            AppError::IngestionError(format!(
                "Failed to read worksheet {}: {}",
                sheet_name, e
            ))
        })?;

        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
        let records = normalize_worksheet(&rows);
        info!(
            sheet = %sheet_name,
            records = records.len(),
            "normalized worksheet"
        );
        sheets.push((sheet_name, records));
    }

    Ok(sheets)
}

/// Normalize one worksheet. The first row is the header row; every
/// following row becomes a canonical record whose `row_index` is its
/// 0-based position among the data rows. A worksheet without data
/// rows yields an empty list.
pub fn normalize_worksheet(rows: &[Vec<Data>]) -> Vec<CanonicalRecord> {
    let Some((header_row, data_rows)) = rows.split_first() else {
        return Vec::new();
    };

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| normalize_header(&header_text(cell)))
        .collect();

    data_rows
        .iter()
        .enumerate()
        .map(|(index, row)| normalize_row(index as i64, &headers, row))
        .collect()
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => format!("{}", other),
    }
}

fn normalize_row(row_index: i64, headers: &[String], row: &[Data]) -> CanonicalRecord {
    let mut data = AttributeBag::new();
    for (column, cell) in row.iter().enumerate() {
        let Some(key) = headers.get(column) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        if let Some(value) = clean_cell(cell) {
            data.insert(key.clone(), value);
        }
    }

    CanonicalRecord {
        row_index,
        company: first_non_null(&data, COMPANY_ALIASES),
        field: first_non_null(&data, FIELD_ALIASES),
        well_name: first_non_null(&data, WELL_NAME_ALIASES),
        formation: first_non_null(&data, FORMATION_ALIASES),
        data,
    }
}

/// Unbox a cell to a plain scalar. Missing sentinels (empty cells,
/// cell errors, NaN) are dropped from the attribute bag entirely.
fn clean_cell(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Float(f) if f.is_nan() => None,
        Data::Float(f) => Some(CellValue::Float(*f)),
        Data::Int(i) => Some(CellValue::Int(*i)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::DateTime(_) => Some(CellValue::Text(format!("{}", cell))),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
    }
}

/// First alias present in the bag wins: a non-blank text value is
/// trimmed, anything else present coerces to its display string.
fn first_non_null(data: &AttributeBag, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = data.get(*key) {
            if let CellValue::Text(s) = value {
                if !s.trim().is_empty() {
                    return Some(s.trim().to_string());
                }
            }
            if !matches!(value, CellValue::Null) {
                return Some(value.display_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    fn header_row(names: &[&str]) -> Vec<Data> {
        names.iter().map(|n| text(n)).collect()
    }

    #[test]
    fn test_normalize_header_cleans_and_collapses() {
        assert_eq!(normalize_header("  Well  Name "), "well_name");
        assert_eq!(normalize_header("Company"), "company");
        assert_eq!(normalize_header("Formation\tName"), "formation_name");
    }

    #[test]
    fn test_normalize_header_is_idempotent() {
        let once = normalize_header("  Well  Name ");
        assert_eq!(normalize_header(&once), once);
    }

    #[test]
    fn test_roundtrip_record() {
        let rows = vec![
            header_row(&["Company", "Field", "Well Name", "Formation", "Pressure"]),
            vec![
                text("Acme"),
                text("North"),
                text("W-1"),
                text("Shale"),
                Data::Float(12.5),
            ],
        ];

        let records = normalize_worksheet(&rows);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.row_index, 0);
        assert_eq!(record.company.as_deref(), Some("Acme"));
        assert_eq!(record.field.as_deref(), Some("North"));
        assert_eq!(record.well_name.as_deref(), Some("W-1"));
        assert_eq!(record.formation.as_deref(), Some("Shale"));
        assert_eq!(record.data.get("pressure"), Some(&CellValue::Float(12.5)));
        assert_eq!(record.data.len(), 5);
    }

    #[test]
    fn test_record_count_matches_data_rows() {
        let mut rows = vec![header_row(&["Well"])];
        for i in 0..7 {
            rows.push(vec![text(&format!("W-{}", i))]);
        }

        let records = normalize_worksheet(&rows);
        assert_eq!(records.len(), 7);
        let indexes: Vec<i64> = records.iter().map(|r| r.row_index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_empty_worksheet_yields_no_records() {
        assert!(normalize_worksheet(&[]).is_empty());
        assert!(normalize_worksheet(&[header_row(&["Company"])]).is_empty());
    }

    #[test]
    fn test_missing_sentinels_are_dropped() {
        let rows = vec![
            header_row(&["Company", "Porosity", "Notes"]),
            vec![text("Acme"), Data::Float(f64::NAN), Data::Empty],
        ];

        let records = normalize_worksheet(&rows);
        assert_eq!(records[0].data.len(), 1);
        assert!(records[0].data.contains_key("company"));
    }

    #[test]
    fn test_well_name_alias_fallback() {
        let rows = vec![
            header_row(&["Well"]),
            vec![text("Alpha-1")],
        ];
        let records = normalize_worksheet(&rows);
        assert_eq!(records[0].well_name.as_deref(), Some("Alpha-1"));

        let rows = vec![
            header_row(&["Well Name", "Well"]),
            vec![text("Primary"), text("Secondary")],
        ];
        let records = normalize_worksheet(&rows);
        assert_eq!(records[0].well_name.as_deref(), Some("Primary"));
    }

    #[test]
    fn test_unreadable_workbook_is_an_ingestion_error() {
        use std::io::Write;

        let mut file = tempfile::Builder::new()
            .suffix(".xlsx")
            .tempfile()
            .unwrap();
        file.write_all(b"this is not a workbook").unwrap();

        let err = load_workbook(file.path()).unwrap_err();
        assert!(matches!(err, AppError::IngestionError(_)));
    }

    #[test]
    fn test_non_text_field_values_are_coerced() {
        let rows = vec![
            header_row(&["Company", "Formation Name"]),
            vec![Data::Int(42), text("Sandstone")],
        ];
        let records = normalize_worksheet(&rows);
        assert_eq!(records[0].company.as_deref(), Some("42"));
        assert_eq!(records[0].formation.as_deref(), Some("Sandstone"));
        assert_eq!(records[0].data.get("company"), Some(&CellValue::Int(42)));
    }
}
