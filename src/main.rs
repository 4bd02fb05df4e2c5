// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;

use crate::application::catalog_repository::{DashboardRepository, DatasetRepository, ProcedureExecutor};
use crate::application::dashboard_service::DashboardRegistry;
use crate::application::dataset_service::DatasetRegistry;
use crate::application::gateway::DataAccessGateway;
use crate::application::upload_service::UploadService;
use crate::infrastructure::config::{load_app_config, DatabaseKind};
use crate::infrastructure::encryption::{EnvKeyProvider, FileCipher};
use crate::infrastructure::excel_reader::CalamineReader;
use crate::infrastructure::postgres_repository::PgCatalog;
use crate::infrastructure::sqlite_repository::SqliteCatalog;
use crate::infrastructure::telemetry::init_tracing;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

type Repositories = (
    Arc<dyn DatasetRepository>,
    Arc<dyn DashboardRepository>,
    Arc<dyn ProcedureExecutor>,
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = load_app_config().context("failed to load configuration")?;

    // Create repositories (infrastructure layer)
    let (dataset_repo, dashboard_repo, executor) = match config.database.kind()? {
        DatabaseKind::Postgres => {
            let catalog = Arc::new(
                PgCatalog::connect(&config.database.url, config.database.max_connections)
                    .await
                    .context("failed to connect to postgres catalog")?,
            );
            let repositories: Repositories = (catalog.clone(), catalog.clone(), catalog);
            repositories
        }
        DatabaseKind::Sqlite => {
            tracing::warn!("Using sqlite catalog; stored procedure datasets are unavailable");
            let catalog = Arc::new(
                SqliteCatalog::connect(&config.database.url, config.database.max_connections)
                    .await
                    .context("failed to open sqlite catalog")?,
            );
            let repositories: Repositories = (catalog.clone(), catalog.clone(), catalog);
            repositories
        }
    };

    let cipher = if config.encryption.enabled {
        let provider = EnvKeyProvider::new(config.encryption.key_env.clone());
        Some(FileCipher::new(&provider).context("failed to initialise upload encryption")?)
    } else {
        None
    };

    // Create services (application layer)
    let datasets = DatasetRegistry::new(dataset_repo);
    let dashboards = DashboardRegistry::new(dashboard_repo);
    let reader = Arc::new(CalamineReader::new(cipher.clone()));
    let gateway = DataAccessGateway::new(datasets.clone(), reader, executor);
    let uploads = UploadService::new(datasets.clone(), config.uploads.directory.clone(), cipher);

    // Create application state
    let state = Arc::new(AppState {
        datasets,
        dashboards,
        gateway,
        uploads,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting chart-catalog service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
