use serde::{Deserialize, Serialize};

/// An imported workbook. Created once per import, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One worksheet of an imported workbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
}
