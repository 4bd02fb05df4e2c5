// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    dataset_rows, execute_procedure, get_dashboard, health_check, list_dashboards, list_datasets, read_excel,
    register_dataset, save_dashboard, upload_dataset,
};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/Dataset", get(list_datasets).post(register_dataset))
        .route("/Dataset/Upload", post(upload_dataset))
        .route("/Dataset/:name/rows", get(dataset_rows))
        .route("/Dashboard", get(list_dashboards).post(save_dashboard))
        .route("/Dashboard/:name", get(get_dashboard))
        .route("/api/excel/read", get(read_excel))
        .route("/api/storedprocedure/execute", get(execute_procedure))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
