// SQLite catalog implementation (local deployments and tests)
use crate::application::catalog_repository::ProcedureExecutor;
use crate::application::error::{CatalogError, CatalogResult};
use crate::domain::tabular::{ProcedureParams, Record};
use crate::infrastructure::catalog_schema::{sql_catalog_repositories, CREATE_DASHBOARDS, CREATE_DATASETS};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub async fn connect(url: &str, max_connections: u32) -> CatalogResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let catalog = Self { pool };
        catalog.ensure_schema().await?;
        Ok(catalog)
    }

    /// Private in-memory database. A single connection is kept open for the
    /// pool's lifetime since the data disappears with it.
    pub async fn in_memory() -> CatalogResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let catalog = Self { pool };
        catalog.ensure_schema().await?;
        Ok(catalog)
    }

    async fn ensure_schema(&self) -> CatalogResult<()> {
        sqlx::query(CREATE_DATASETS).execute(&self.pool).await?;
        sqlx::query(CREATE_DASHBOARDS).execute(&self.pool).await?;
        Ok(())
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

sql_catalog_repositories!(SqliteCatalog);

#[async_trait]
impl ProcedureExecutor for SqliteCatalog {
    async fn execute(&self, procedure: &str, _params: &ProcedureParams) -> CatalogResult<Vec<Record>> {
        tracing::error!("Cannot execute stored procedure {} on a sqlite catalog", procedure);
        Err(CatalogError::SourceRead(
            "stored procedures are not supported by the sqlite backend".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::catalog_repository::{DashboardRepository, DatasetRepository};
    use crate::domain::dashboard::Dashboard;
    use crate::domain::dataset::Dataset;

    #[tokio::test]
    async fn test_dataset_insert_and_find() {
        let catalog = SqliteCatalog::in_memory().await.unwrap();
        let dataset = Dataset::from_excel("sales", "uploads/sales.xlsx");

        catalog.insert_dataset(&dataset).await.unwrap();

        assert!(catalog.dataset_exists("sales").await.unwrap());
        assert!(!catalog.dataset_exists("other").await.unwrap());
        assert_eq!(catalog.find_dataset("sales").await.unwrap(), Some(dataset));
    }

    #[tokio::test]
    async fn test_excel_dataset_stores_null_procedure() {
        let catalog = SqliteCatalog::in_memory().await.unwrap();
        let mut dataset = Dataset::from_excel("sales", "uploads/sales.xlsx");
        dataset.stored_procedure_name = Some("ignored".to_string());

        catalog.insert_dataset(&dataset).await.unwrap();

        let stored: Option<String> =
            sqlx::query_scalar("SELECT stored_procedure FROM datasets WHERE dataset_name = 'sales'")
                .fetch_one(catalog.pool())
                .await
                .unwrap();
        assert_eq!(stored, None);
    }

    #[tokio::test]
    async fn test_primary_key_collision_maps_to_duplicate() {
        let catalog = SqliteCatalog::in_memory().await.unwrap();
        let dashboard = Dashboard::new("d1".into(), "sales".into(), "{}".into(), false);

        catalog.insert_dashboard(&dashboard).await.unwrap();
        let err = catalog.insert_dashboard(&dashboard).await.unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateName { kind: "Dashboard", .. }));
    }

    #[tokio::test]
    async fn test_list_skips_empty_names() {
        let catalog = SqliteCatalog::in_memory().await.unwrap();
        sqlx::query("INSERT INTO datasets (dataset_name, excel_path, is_from_excel) VALUES ('', 'x.xlsx', 1)")
            .execute(catalog.pool())
            .await
            .unwrap();
        catalog
            .insert_dataset(&Dataset::from_stored_procedure("orders", "get_orders"))
            .await
            .unwrap();

        let names: Vec<String> = catalog
            .list_datasets()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["orders".to_string()]);
    }

    #[tokio::test]
    async fn test_procedures_unsupported() {
        let catalog = SqliteCatalog::in_memory().await.unwrap();
        let err = catalog.execute("get_orders", &ProcedureParams::new()).await.unwrap_err();
        assert!(matches!(err, CatalogError::SourceRead(_)));
    }
}
