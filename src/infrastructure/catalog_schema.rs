// Table layout and row mapping shared by the SQL catalog backends
use crate::application::error::CatalogError;
use crate::domain::dashboard::Dashboard;
use crate::domain::dataset::Dataset;

pub const CREATE_DATASETS: &str = "CREATE TABLE IF NOT EXISTS datasets (
    dataset_name TEXT PRIMARY KEY,
    stored_procedure TEXT NULL,
    excel_path TEXT NULL,
    is_from_excel BOOLEAN NOT NULL
)";

pub const CREATE_DASHBOARDS: &str = "CREATE TABLE IF NOT EXISTS dashboards (
    dashboard_name TEXT PRIMARY KEY,
    json_format TEXT NOT NULL,
    is_multiple BOOLEAN NOT NULL,
    dataset_name TEXT NOT NULL
)";

// Placeholders use `$N`, which both the postgres and sqlite drivers accept.
pub const SELECT_DATASETS: &str = "SELECT dataset_name, stored_procedure, excel_path, is_from_excel \
     FROM datasets WHERE dataset_name IS NOT NULL AND dataset_name <> '' ORDER BY dataset_name";

pub const SELECT_DATASET: &str =
    "SELECT dataset_name, stored_procedure, excel_path, is_from_excel FROM datasets WHERE dataset_name = $1";

pub const COUNT_DATASET: &str = "SELECT COUNT(*) FROM datasets WHERE dataset_name = $1";

pub const INSERT_DATASET: &str =
    "INSERT INTO datasets (dataset_name, stored_procedure, excel_path, is_from_excel) VALUES ($1, $2, $3, $4)";

pub const SELECT_DASHBOARDS: &str =
    "SELECT dashboard_name, json_format, is_multiple, dataset_name FROM dashboards ORDER BY dashboard_name";

pub const SELECT_DASHBOARD: &str =
    "SELECT dashboard_name, json_format, is_multiple, dataset_name FROM dashboards WHERE dashboard_name = $1";

pub const COUNT_DASHBOARD: &str = "SELECT COUNT(*) FROM dashboards WHERE dashboard_name = $1";

pub const INSERT_DASHBOARD: &str =
    "INSERT INTO dashboards (dashboard_name, json_format, is_multiple, dataset_name) VALUES ($1, $2, $3, $4)";

#[derive(Debug, sqlx::FromRow)]
pub struct DatasetRow {
    pub dataset_name: String,
    pub stored_procedure: Option<String>,
    pub excel_path: Option<String>,
    pub is_from_excel: Option<bool>,
}

impl From<DatasetRow> for Dataset {
    fn from(row: DatasetRow) -> Self {
        Dataset {
            name: row.dataset_name,
            stored_procedure_name: row.stored_procedure,
            excel_path: row.excel_path,
            is_from_excel: row.is_from_excel.unwrap_or(false),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct DashboardRow {
    pub dashboard_name: String,
    pub json_format: String,
    pub is_multiple: bool,
    pub dataset_name: String,
}

impl From<DashboardRow> for Dashboard {
    fn from(row: DashboardRow) -> Self {
        Dashboard::new(row.dashboard_name, row.dataset_name, row.json_format, row.is_multiple)
    }
}

/// Map an insert failure, turning a primary-key collision into `DuplicateName`.
pub fn map_insert_error(e: sqlx::Error, duplicate: impl FnOnce() -> CatalogError) -> CatalogError {
    match &e {
        sqlx::Error::Database(db)
            if db.is_unique_violation() || db.message().contains("UNIQUE constraint failed") =>
        {
            duplicate()
        }
        _ => CatalogError::Storage(e.to_string()),
    }
}

/// Implements `DatasetRepository` and `DashboardRepository` for a catalog
/// struct holding a sqlx pool in a field named `pool`.
macro_rules! sql_catalog_repositories {
    ($catalog:ty) => {
        #[::async_trait::async_trait]
        impl $crate::application::catalog_repository::DatasetRepository for $catalog {
            async fn list_datasets(
                &self,
            ) -> $crate::application::error::CatalogResult<Vec<$crate::domain::dataset::Dataset>> {
                let rows: Vec<$crate::infrastructure::catalog_schema::DatasetRow> =
                    ::sqlx::query_as($crate::infrastructure::catalog_schema::SELECT_DATASETS)
                        .fetch_all(&self.pool)
                        .await?;
                Ok(rows.into_iter().map($crate::domain::dataset::Dataset::from).collect())
            }

            async fn find_dataset(
                &self,
                name: &str,
            ) -> $crate::application::error::CatalogResult<Option<$crate::domain::dataset::Dataset>> {
                let row: Option<$crate::infrastructure::catalog_schema::DatasetRow> =
                    ::sqlx::query_as($crate::infrastructure::catalog_schema::SELECT_DATASET)
                        .bind(name)
                        .fetch_optional(&self.pool)
                        .await?;
                Ok(row.map($crate::domain::dataset::Dataset::from))
            }

            async fn dataset_exists(&self, name: &str) -> $crate::application::error::CatalogResult<bool> {
                let count: i64 = ::sqlx::query_scalar($crate::infrastructure::catalog_schema::COUNT_DATASET)
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(count > 0)
            }

            async fn insert_dataset(
                &self,
                dataset: &$crate::domain::dataset::Dataset,
            ) -> $crate::application::error::CatalogResult<()> {
                ::sqlx::query($crate::infrastructure::catalog_schema::INSERT_DATASET)
                    .bind(&dataset.name)
                    .bind(dataset.persisted_procedure())
                    .bind(dataset.excel_path.as_deref())
                    .bind(dataset.is_from_excel)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        $crate::infrastructure::catalog_schema::map_insert_error(e, || {
                            $crate::application::error::CatalogError::duplicate_dataset(&dataset.name)
                        })
                    })?;
                Ok(())
            }
        }

        #[::async_trait::async_trait]
        impl $crate::application::catalog_repository::DashboardRepository for $catalog {
            async fn list_dashboards(
                &self,
            ) -> $crate::application::error::CatalogResult<Vec<$crate::domain::dashboard::Dashboard>> {
                let rows: Vec<$crate::infrastructure::catalog_schema::DashboardRow> =
                    ::sqlx::query_as($crate::infrastructure::catalog_schema::SELECT_DASHBOARDS)
                        .fetch_all(&self.pool)
                        .await?;
                Ok(rows.into_iter().map($crate::domain::dashboard::Dashboard::from).collect())
            }

            async fn find_dashboard(
                &self,
                name: &str,
            ) -> $crate::application::error::CatalogResult<Option<$crate::domain::dashboard::Dashboard>> {
                let row: Option<$crate::infrastructure::catalog_schema::DashboardRow> =
                    ::sqlx::query_as($crate::infrastructure::catalog_schema::SELECT_DASHBOARD)
                        .bind(name)
                        .fetch_optional(&self.pool)
                        .await?;
                Ok(row.map($crate::domain::dashboard::Dashboard::from))
            }

            async fn dashboard_exists(&self, name: &str) -> $crate::application::error::CatalogResult<bool> {
                let count: i64 = ::sqlx::query_scalar($crate::infrastructure::catalog_schema::COUNT_DASHBOARD)
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?;
                Ok(count > 0)
            }

            async fn insert_dashboard(
                &self,
                dashboard: &$crate::domain::dashboard::Dashboard,
            ) -> $crate::application::error::CatalogResult<()> {
                ::sqlx::query($crate::infrastructure::catalog_schema::INSERT_DASHBOARD)
                    .bind(&dashboard.name)
                    .bind(&dashboard.chart_spec)
                    .bind(dashboard.is_multiple)
                    .bind(&dashboard.dataset_name)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        $crate::infrastructure::catalog_schema::map_insert_error(e, || {
                            $crate::application::error::CatalogError::duplicate_dashboard(&dashboard.name)
                        })
                    })?;
                Ok(())
            }
        }
    };
}

pub(crate) use sql_catalog_repositories;
