use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single scalar cell value as stored in a record's attribute bag.
/// Serializes to a plain JSON scalar (string | number | boolean | null).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Coerce to the string form used when a non-text cell backs an
    /// extracted semantic field.
    pub fn display_string(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Bool(v) => v.to_string(),
            CellValue::Int(v) => v.to_string(),
            CellValue::Float(v) => v.to_string(),
            CellValue::Text(v) => v.clone(),
        }
    }
}

/// Schemaless column bag keyed by normalized header.
pub type AttributeBag = BTreeMap<String, CellValue>;

/// Normalized worksheet row, ready to persist.
///
/// `row_index` is the 0-based position of the row among the data rows
/// of its source worksheet at import time; it is never renumbered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub row_index: i64,
    pub company: Option<String>,
    pub field: Option<String>,
    pub well_name: Option<String>,
    pub formation: Option<String>,
    pub data: AttributeBag,
}

/// Persisted record with its parent sheet resolved. `sheet_name` is
/// `None` when the sheet relation cannot be resolved.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    pub sheet_id: i64,
    pub row_index: i64,
    pub sheet_name: Option<String>,
    pub company: Option<String>,
    pub field: Option<String>,
    pub well_name: Option<String>,
    pub formation: Option<String>,
    pub data: AttributeBag,
}
