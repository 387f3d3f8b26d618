use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::domain::error::{AppError, Result};
use crate::domain::project::{Project, Sheet};
use crate::domain::record::{AttributeBag, CanonicalRecord, StoredRecord};

/// Filters for the record listing endpoint. `row_start`/`row_end`
/// are inclusive bounds on `row_index`.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    pub sheet_name: Option<String>,
    pub offset: i64,
    pub limit: i64,
    pub row_start: Option<i64>,
    pub row_end: Option<i64>,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            sheet_name: None,
            offset: 0,
            limit: 200,
            row_start: None,
            row_end: None,
        }
    }
}

/// Store handle for projects, sheets and records. Constructed once at
/// startup and passed down; there is no process-wide instance.
#[derive(Clone)]
pub struct WellRepository {
    pool: Pool<Sqlite>,
}

impl WellRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Persist one import: the project, its sheets, and their records
    /// commit together or not at all.
    pub async fn insert_project_with_sheets(
        &self,
        name: &str,
        description: Option<&str>,
        sheets: &[(String, Vec<CanonicalRecord>)],
    ) -> Result<Project> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO projects (name, description, created_at) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(description)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert project: {}", e)))?;
        let project_id = result.last_insert_rowid();

        for (sheet_name, records) in sheets {
            let result = sqlx::query("INSERT INTO sheets (project_id, name) VALUES (?, ?)")
                .bind(project_id)
                .bind(sheet_name)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to insert sheet: {}", e)))?;
            let sheet_id = result.last_insert_rowid();

            for record in records {
                let data_json = serde_json::to_string(&record.data).map_err(|e| {
                    AppError::Internal(format!("Failed to serialize record data: {}", e))
                })?;
                sqlx::query(
                    "INSERT INTO records (sheet_id, row_index, company, field, well_name, formation, data)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(sheet_id)
                .bind(record.row_index)
                .bind(record.company.as_deref())
                .bind(record.field.as_deref())
                .bind(record.well_name.as_deref())
                .bind(record.formation.as_deref())
                .bind(data_json)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to insert record: {}", e))
                })?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit import: {}", e)))?;

        Ok(Project {
            id: project_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at,
        })
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        sqlx::query_as::<_, ProjectEntity>(
            "SELECT id, name, description, created_at FROM projects ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list projects: {}", e)))
        .map(|entities| entities.into_iter().map(Into::into).collect())
    }

    pub async fn get_project(&self, project_id: i64) -> Result<Option<Project>> {
        sqlx::query_as::<_, ProjectEntity>(
            "SELECT id, name, description, created_at FROM projects WHERE id = ?",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch project: {}", e)))
        .map(|entity| entity.map(Into::into))
    }

    pub async fn list_sheets(&self, project_id: i64) -> Result<Vec<Sheet>> {
        sqlx::query_as::<_, SheetEntity>(
            "SELECT id, project_id, name FROM sheets WHERE project_id = ? ORDER BY name",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list sheets: {}", e)))
        .map(|entities| entities.into_iter().map(Into::into).collect())
    }

    pub async fn list_records(
        &self,
        project_id: i64,
        filter: &RecordFilter,
    ) -> Result<Vec<StoredRecord>> {
        let mut sql = String::from(
            "SELECT r.id, r.sheet_id, r.row_index, r.company, r.field, r.well_name, r.formation, r.data,
                    s.name AS sheet_name
             FROM records r
             LEFT JOIN sheets s ON r.sheet_id = s.id
             WHERE s.project_id = ?",
        );
        if filter.sheet_name.is_some() {
            sql.push_str(" AND s.name = ?");
        }
        if filter.row_start.is_some() {
            sql.push_str(" AND r.row_index >= ?");
        }
        if filter.row_end.is_some() {
            sql.push_str(" AND r.row_index <= ?");
        }
        sql.push_str(" ORDER BY r.row_index LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, RecordEntity>(&sql).bind(project_id);
        if let Some(sheet_name) = &filter.sheet_name {
            query = query.bind(sheet_name);
        }
        if let Some(row_start) = filter.row_start {
            query = query.bind(row_start);
        }
        if let Some(row_end) = filter.row_end {
            query = query.bind(row_end);
        }
        query = query.bind(filter.limit).bind(filter.offset);

        let entities = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list records: {}", e)))?;
        entities.into_iter().map(RecordEntity::into_domain).collect()
    }

    /// Every record of the project with its sheet resolved, for the
    /// stats aggregator.
    pub async fn records_for_project(&self, project_id: i64) -> Result<Vec<StoredRecord>> {
        let entities = sqlx::query_as::<_, RecordEntity>(
            "SELECT r.id, r.sheet_id, r.row_index, r.company, r.field, r.well_name, r.formation, r.data,
                    s.name AS sheet_name
             FROM records r
             LEFT JOIN sheets s ON r.sheet_id = s.id
             WHERE s.project_id = ?
             ORDER BY r.row_index",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch project records: {}", e)))?;
        entities.into_iter().map(RecordEntity::into_domain).collect()
    }
}

// Internal entities for database mapping

#[derive(sqlx::FromRow)]
struct ProjectEntity {
    id: i64,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProjectEntity> for Project {
    fn from(e: ProjectEntity) -> Self {
        Self {
            id: e.id,
            name: e.name,
            description: e.description,
            created_at: e.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SheetEntity {
    id: i64,
    project_id: i64,
    name: String,
}

impl From<SheetEntity> for Sheet {
    fn from(e: SheetEntity) -> Self {
        Self {
            id: e.id,
            project_id: e.project_id,
            name: e.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecordEntity {
    id: i64,
    sheet_id: i64,
    row_index: i64,
    company: Option<String>,
    field: Option<String>,
    well_name: Option<String>,
    formation: Option<String>,
    data: String,
    sheet_name: Option<String>,
}

impl RecordEntity {
    fn into_domain(self) -> Result<StoredRecord> {
        let data: AttributeBag = serde_json::from_str(&self.data)
            .map_err(|e| AppError::Internal(format!("Corrupt record data blob: {}", e)))?;
        Ok(StoredRecord {
            id: self.id,
            sheet_id: self.sheet_id,
            row_index: self.row_index,
            sheet_name: self.sheet_name,
            company: self.company,
            field: self.field,
            well_name: self.well_name,
            formation: self.formation,
            data,
        })
    }
}
