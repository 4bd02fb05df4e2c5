// Dataset registry - Use cases for listing and registering datasets
use crate::application::catalog_repository::DatasetRepository;
use crate::application::error::{CatalogError, CatalogResult};
use crate::domain::dataset::Dataset;
use std::sync::Arc;

#[derive(Clone)]
pub struct DatasetRegistry {
    repository: Arc<dyn DatasetRepository>,
}

impl DatasetRegistry {
    pub fn new(repository: Arc<dyn DatasetRepository>) -> Self {
        Self { repository }
    }

    /// Storage failures are logged and reported as an empty catalog.
    pub async fn list(&self) -> Vec<Dataset> {
        match self.repository.list_datasets().await {
            Ok(datasets) => {
                let datasets: Vec<Dataset> = datasets.into_iter().filter(|d| !d.name.is_empty()).collect();
                tracing::info!("Retrieved {} datasets", datasets.len());
                datasets
            }
            Err(e) => {
                tracing::error!("Error retrieving datasets: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn get(&self, name: &str) -> CatalogResult<Dataset> {
        self.repository
            .find_dataset(name)
            .await?
            .ok_or_else(|| CatalogError::dataset_not_found(name))
    }

    pub async fn exists(&self, name: &str) -> CatalogResult<bool> {
        self.repository.dataset_exists(name).await
    }

    pub async fn register(&self, dataset: Dataset) -> CatalogResult<()> {
        if dataset.name.trim().is_empty() {
            return Err(CatalogError::Validation("dataset name must not be empty".to_string()));
        }

        let result = self.insert_unique(&dataset).await;
        match &result {
            Ok(()) => tracing::info!("Dataset {} saved successfully", dataset.name),
            Err(e) => tracing::error!("Error saving dataset {}: {}", dataset.name, e),
        }
        result
    }

    async fn insert_unique(&self, dataset: &Dataset) -> CatalogResult<()> {
        if self.repository.dataset_exists(&dataset.name).await? {
            return Err(CatalogError::duplicate_dataset(&dataset.name));
        }
        self.repository.insert_dataset(dataset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::DatasetSource;
    use crate::infrastructure::sqlite_repository::SqliteCatalog;
    use async_trait::async_trait;

    async fn registry() -> DatasetRegistry {
        DatasetRegistry::new(Arc::new(SqliteCatalog::in_memory().await.unwrap()))
    }

    struct BrokenStore;

    #[async_trait]
    impl DatasetRepository for BrokenStore {
        async fn list_datasets(&self) -> CatalogResult<Vec<Dataset>> {
            Err(CatalogError::Storage("connection refused".to_string()))
        }

        async fn find_dataset(&self, _name: &str) -> CatalogResult<Option<Dataset>> {
            Err(CatalogError::Storage("connection refused".to_string()))
        }

        async fn dataset_exists(&self, _name: &str) -> CatalogResult<bool> {
            Err(CatalogError::Storage("connection refused".to_string()))
        }

        async fn insert_dataset(&self, _dataset: &Dataset) -> CatalogResult<()> {
            Err(CatalogError::Storage("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_register_then_list_includes_dataset_once() {
        let registry = registry().await;
        registry
            .register(Dataset::from_stored_procedure("orders", "get_orders"))
            .await
            .unwrap();
        registry
            .register(Dataset::from_excel("sales", "uploads/sales.xlsx"))
            .await
            .unwrap();

        let datasets = registry.list().await;
        assert_eq!(datasets.iter().filter(|d| d.name == "orders").count(), 1);
        assert_eq!(datasets.iter().filter(|d| d.name == "sales").count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_register_leaves_registry_unchanged() {
        let registry = registry().await;
        let original = Dataset::from_excel("sales", "uploads/sales.xlsx");
        registry.register(original.clone()).await.unwrap();

        let err = registry
            .register(Dataset::from_stored_procedure("sales", "get_sales"))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateName { .. }));
        assert_eq!(registry.list().await, vec![original]);
    }

    #[tokio::test]
    async fn test_register_rejects_empty_name() {
        let registry = registry().await;
        let err = registry.register(Dataset::from_excel("  ", "a.xlsx")).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn test_excel_registration_drops_procedure_name() {
        let registry = registry().await;
        let mut dataset = Dataset::from_excel("sales", "uploads/sales.xlsx");
        dataset.stored_procedure_name = Some("get_sales".to_string());
        registry.register(dataset).await.unwrap();

        let stored = registry.get("sales").await.unwrap();
        assert_eq!(stored.stored_procedure_name, None);
        assert_eq!(stored.source(), DatasetSource::Excel("uploads/sales.xlsx"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let registry = registry().await;
        let err = registry.get("nope").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { kind: "Dataset", .. }));
    }

    #[tokio::test]
    async fn test_list_is_fail_soft_but_register_is_not() {
        let registry = DatasetRegistry::new(Arc::new(BrokenStore));

        assert!(registry.list().await.is_empty());

        let err = registry
            .register(Dataset::from_excel("sales", "a.xlsx"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Storage(_)));
    }

    #[tokio::test]
    async fn test_concurrent_register_same_name_single_winner() {
        let registry = registry().await;
        let a = registry.clone();
        let b = registry.clone();

        let (ra, rb) = tokio::join!(
            a.register(Dataset::from_excel("sales", "a.xlsx")),
            b.register(Dataset::from_excel("sales", "b.xlsx")),
        );

        let successes = [ra.is_ok(), rb.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        assert_eq!(registry.list().await.len(), 1);
    }
}
