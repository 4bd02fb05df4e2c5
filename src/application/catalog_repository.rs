// Repository traits for catalog storage and data sources
use crate::application::error::CatalogResult;
use crate::domain::dashboard::Dashboard;
use crate::domain::dataset::Dataset;
use crate::domain::tabular::{ProcedureParams, Record};
use async_trait::async_trait;

#[async_trait]
pub trait DatasetRepository: Send + Sync {
    /// All datasets with a non-empty name
    async fn list_datasets(&self) -> CatalogResult<Vec<Dataset>>;

    async fn find_dataset(&self, name: &str) -> CatalogResult<Option<Dataset>>;

    async fn dataset_exists(&self, name: &str) -> CatalogResult<bool>;

    /// Insert a new row. A uniqueness violation maps to `DuplicateName`.
    async fn insert_dataset(&self, dataset: &Dataset) -> CatalogResult<()>;
}

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    async fn list_dashboards(&self) -> CatalogResult<Vec<Dashboard>>;

    async fn find_dashboard(&self, name: &str) -> CatalogResult<Option<Dashboard>>;

    async fn dashboard_exists(&self, name: &str) -> CatalogResult<bool>;

    /// Insert a new row. A uniqueness violation maps to `DuplicateName`.
    async fn insert_dashboard(&self, dashboard: &Dashboard) -> CatalogResult<()>;
}

#[async_trait]
pub trait ProcedureExecutor: Send + Sync {
    /// Run a stored procedure with named arguments and collect every result row
    async fn execute(&self, procedure: &str, params: &ProcedureParams) -> CatalogResult<Vec<Record>>;
}

#[async_trait]
pub trait SpreadsheetReader: Send + Sync {
    /// Read the first worksheet; a missing file yields no rows
    async fn read(&self, path: &str) -> CatalogResult<Vec<Record>>;
}
