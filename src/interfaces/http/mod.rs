use std::path::Path;

use actix_cors::Cors;
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::application::use_cases::excel_ingestion;
use crate::application::use_cases::stats::compute_stats;
use crate::application::LogMetadataService;
use crate::domain::error::{AppError, Result};
use crate::domain::project::Project;
use crate::domain::record::{AttributeBag, StoredRecord};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::repository::{RecordFilter, WellRepository};

const EXCEL_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm"];
const DEFAULT_RECORD_PAGE: i64 = 200;
const MAX_RECORD_PAGE: i64 = 500;

pub struct HttpState {
    pub repo: WellRepository,
    pub log_metadata: LogMetadataService,
}

#[derive(Debug, MultipartForm)]
pub struct ImportForm {
    pub project_name: Text<String>,
    pub description: Option<Text<String>>,
    pub file: TempFile,
}

#[derive(Debug, MultipartForm)]
pub struct LogPreviewForm {
    pub file: TempFile,
}

#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    pub sheet: Option<String>,
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
    pub row_start: Option<i64>,
    pub row_end: Option<i64>,
}

#[derive(Serialize)]
pub struct RecordRead {
    pub id: i64,
    pub sheet_id: i64,
    pub row_index: i64,
    pub sheet_name: Option<String>,
    pub company: Option<String>,
    pub field: Option<String>,
    #[serde(rename = "wellName")]
    pub well_name: Option<String>,
    pub formation: Option<String>,
    pub data: AttributeBag,
}

impl From<StoredRecord> for RecordRead {
    fn from(record: StoredRecord) -> Self {
        Self {
            id: record.id,
            sheet_id: record.sheet_id,
            row_index: record.row_index,
            sheet_name: record.sheet_name,
            company: record.company,
            field: record.field,
            well_name: record.well_name,
            formation: record.formation,
            data: record.data,
        }
    }
}

fn error_response(err: &AppError) -> HttpResponse {
    let body = json!({ "detail": err.to_string() });
    match err {
        AppError::NotFound(_) => HttpResponse::NotFound().json(body),
        AppError::IngestionError(_)
        | AppError::UnsupportedFormat(_)
        | AppError::WellLogError(_)
        | AppError::ValidationError(_) => HttpResponse::BadRequest().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

fn uploaded_file_name(file: &TempFile) -> Result<String> {
    match file.file_name.as_deref() {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(AppError::ValidationError("No file provided".to_string())),
    }
}

fn has_extension(file_name: &str, allowed: &[&str]) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

async fn require_project(state: &HttpState, project_id: i64) -> Result<Project> {
    state
        .repo
        .get_project(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

#[post("/projects/import")]
async fn import_project(
    data: web::Data<HttpState>,
    MultipartForm(form): MultipartForm<ImportForm>,
) -> impl Responder {
    let file_name = match uploaded_file_name(&form.file) {
        Ok(name) => name,
        Err(e) => return error_response(&e),
    };
    if !has_extension(&file_name, EXCEL_EXTENSIONS) {
        return error_response(&AppError::UnsupportedFormat(
            "Unsupported file type".to_string(),
        ));
    }

    info!(
        project_name = %form.project_name.0,
        file_name = %file_name,
        "importing workbook"
    );

    // The spooled upload is removed when `form` drops, on every path.
    let sheets = match excel_ingestion::load_workbook(form.file.file.path()) {
        Ok(sheets) => sheets,
        Err(e) => {
            error!(error = %e, file_name = %file_name, "workbook ingestion failed");
            return error_response(&e);
        }
    };

    let description = form.description.map(|text| text.0);
    match data
        .repo
        .insert_project_with_sheets(&form.project_name.0, description.as_deref(), &sheets)
        .await
    {
        Ok(project) => {
            info!(project_id = project.id, "import complete");
            HttpResponse::Ok().json(project)
        }
        Err(e) => {
            error!(error = %e, "import failed");
            error_response(&e)
        }
    }
}

#[post("/logs/preview")]
async fn preview_log(
    data: web::Data<HttpState>,
    MultipartForm(form): MultipartForm<LogPreviewForm>,
) -> impl Responder {
    let file_name = match uploaded_file_name(&form.file) {
        Ok(name) => name,
        Err(e) => return error_response(&e),
    };

    match data
        .log_metadata
        .load_summary(form.file.file.path(), &file_name)
    {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => error_response(&e),
    }
}

#[get("/projects")]
async fn get_projects(data: web::Data<HttpState>) -> impl Responder {
    match data.repo.list_projects().await {
        Ok(projects) => HttpResponse::Ok().json(projects),
        Err(e) => {
            error!(error = %e, "failed to list projects");
            error_response(&e)
        }
    }
}

#[get("/projects/{id}/sheets")]
async fn get_project_sheets(data: web::Data<HttpState>, path: web::Path<i64>) -> impl Responder {
    let project_id = path.into_inner();
    if let Err(e) = require_project(&data, project_id).await {
        return error_response(&e);
    }

    match data.repo.list_sheets(project_id).await {
        Ok(sheets) => HttpResponse::Ok().json(sheets),
        Err(e) => {
            error!(error = %e, project_id, "failed to list sheets");
            error_response(&e)
        }
    }
}

#[get("/projects/{id}/records")]
async fn get_project_records(
    data: web::Data<HttpState>,
    path: web::Path<i64>,
    query: web::Query<RecordQuery>,
) -> impl Responder {
    let project_id = path.into_inner();
    if let Err(e) = require_project(&data, project_id).await {
        return error_response(&e);
    }

    let filter = RecordFilter {
        sheet_name: query.sheet.clone(),
        offset: query.offset,
        limit: query
            .limit
            .unwrap_or(DEFAULT_RECORD_PAGE)
            .min(MAX_RECORD_PAGE),
        row_start: query.row_start,
        row_end: query.row_end,
    };

    match data.repo.list_records(project_id, &filter).await {
        Ok(records) => {
            let records: Vec<RecordRead> = records.into_iter().map(Into::into).collect();
            HttpResponse::Ok().json(records)
        }
        Err(e) => {
            error!(error = %e, project_id, "failed to list records");
            error_response(&e)
        }
    }
}

#[get("/projects/{id}/stats")]
async fn get_project_stats(data: web::Data<HttpState>, path: web::Path<i64>) -> impl Responder {
    let project_id = path.into_inner();
    if let Err(e) = require_project(&data, project_id).await {
        return error_response(&e);
    }

    match data.repo.records_for_project(project_id).await {
        Ok(records) => HttpResponse::Ok().json(compute_stats(&records)),
        Err(e) => {
            error!(error = %e, project_id, "failed to compute stats");
            error_response(&e)
        }
    }
}

pub fn start_server(config: &AppConfig, repo: WellRepository) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState {
        repo,
        log_metadata: LogMetadataService::new(config.log_parser_cmd.clone()),
    });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new().wrap(cors).app_data(state.clone()).service(
            web::scope("/api")
                .service(import_project)
                .service(preview_log)
                .service(get_projects)
                .service(get_project_sheets)
                .service(get_project_records)
                .service(get_project_stats),
        )
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run();

    Ok(server)
}
