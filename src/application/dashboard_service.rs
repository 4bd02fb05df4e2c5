// Dashboard registry - Use cases for listing, reading and saving dashboards
use crate::application::catalog_repository::DashboardRepository;
use crate::application::error::{CatalogError, CatalogResult};
use crate::domain::dashboard::Dashboard;
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardRegistry {
    repository: Arc<dyn DashboardRepository>,
}

impl DashboardRegistry {
    pub fn new(repository: Arc<dyn DashboardRepository>) -> Self {
        Self { repository }
    }

    /// Storage failures are logged and reported as an empty catalog.
    pub async fn list(&self) -> Vec<Dashboard> {
        match self.repository.list_dashboards().await {
            Ok(dashboards) => {
                tracing::info!("Retrieved {} dashboards", dashboards.len());
                dashboards
            }
            Err(e) => {
                tracing::error!("Error retrieving dashboards: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn get(&self, name: &str) -> CatalogResult<Dashboard> {
        self.repository
            .find_dashboard(name)
            .await?
            .ok_or_else(|| CatalogError::dashboard_not_found(name))
    }

    pub async fn save(&self, dashboard: Dashboard) -> CatalogResult<()> {
        if dashboard.name.trim().is_empty() {
            return Err(CatalogError::Validation("dashboard name must not be empty".to_string()));
        }

        if self.repository.dashboard_exists(&dashboard.name).await.map_err(wrap_save_error)? {
            return Err(CatalogError::duplicate_dashboard(&dashboard.name));
        }

        self.repository
            .insert_dashboard(&dashboard)
            .await
            .map_err(wrap_save_error)?;

        tracing::info!(
            "Dashboard {} saved for dataset {} (multiple: {})",
            dashboard.name,
            dashboard.dataset_name,
            dashboard.is_multiple
        );
        Ok(())
    }
}

fn wrap_save_error(e: CatalogError) -> CatalogError {
    match e {
        CatalogError::Storage(message) => CatalogError::Storage(format!("error saving dashboard: {message}")),
        other => other,
    }
}
