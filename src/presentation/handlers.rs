// HTTP request handlers
use crate::application::error::CatalogError;
use crate::domain::dashboard::Dashboard;
use crate::domain::dataset::Dataset;
use crate::domain::tabular::{ProcedureParams, Record};
use crate::presentation::app_state::AppState;
use crate::presentation::dto::{
    DashboardDto, DatasetDto, ExcelReadQuery, ProcedureQuery, RegisterProcedureRequest, SaveDashboardRequest,
};
use crate::presentation::error::ApiError;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all datasets (empty on storage failure)
pub async fn list_datasets(State(state): State<Arc<AppState>>) -> Json<Vec<DatasetDto>> {
    let datasets = state.datasets.list().await;
    Json(datasets.into_iter().map(DatasetDto::from).collect())
}

/// Register a stored-procedure backed dataset
pub async fn register_dataset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterProcedureRequest>,
) -> Result<(StatusCode, Json<DatasetDto>), ApiError> {
    if req.stored_procedure_name.trim().is_empty() {
        return Err(CatalogError::Validation("storedProcedureName is required".to_string()).into());
    }

    let dataset = Dataset::from_stored_procedure(req.dataset_name, req.stored_procedure_name);
    state.datasets.register(dataset.clone()).await?;
    Ok((StatusCode::CREATED, Json(dataset.into())))
}

/// Upload a spreadsheet (multipart `file` + `datasetName`) and register it
pub async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DatasetDto>), ApiError> {
    let mut dataset_name: Option<String> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("datasetName") => dataset_name = Some(field.text().await.map_err(bad_multipart)?),
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let contents = field.bytes().await.map_err(bad_multipart)?;
                file = Some((file_name, contents));
            }
            _ => {}
        }
    }

    let (file_name, contents) =
        file.ok_or_else(|| CatalogError::Validation("multipart field `file` is required".to_string()))?;
    if contents.is_empty() {
        return Err(CatalogError::Validation("uploaded file is empty".to_string()).into());
    }

    // The front end derives the name from the file stem; do the same when it is absent.
    let dataset_name = dataset_name
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            std::path::Path::new(&file_name)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .unwrap_or_default();

    let dataset = state.uploads.upload(&dataset_name, &file_name, &contents).await?;
    Ok((StatusCode::CREATED, Json(dataset.into())))
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> ApiError {
    CatalogError::Validation(format!("malformed upload: {e}")).into()
}

/// Materialize the rows of a registered dataset
pub async fn dataset_rows(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.gateway.fetch_rows_by_name(&name).await?))
}

/// List all dashboards (empty on storage failure)
pub async fn list_dashboards(State(state): State<Arc<AppState>>) -> Json<Vec<DashboardDto>> {
    let dashboards = state.dashboards.list().await;
    Json(dashboards.into_iter().map(DashboardDto::from).collect())
}

pub async fn get_dashboard(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardDto>, ApiError> {
    Ok(Json(state.dashboards.get(&name).await?.into()))
}

pub async fn save_dashboard(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveDashboardRequest>,
) -> Result<(StatusCode, Json<DashboardDto>), ApiError> {
    let dashboard = Dashboard::from(req);
    state.dashboards.save(dashboard.clone()).await?;
    Ok((StatusCode::CREATED, Json(dashboard.into())))
}

/// Read a spreadsheet by path
pub async fn read_excel(
    Query(query): Query<ExcelReadQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.gateway.read_excel(&query.excel_path).await?))
}

/// Execute a stored procedure without arguments
pub async fn execute_procedure(
    Query(query): Query<ProcedureQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let rows = state
        .gateway
        .execute_procedure(&query.stored_procedure_name, &ProcedureParams::new())
        .await?;
    Ok(Json(rows))
}
