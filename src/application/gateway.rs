// Data-access gateway - Materializes rows for a dataset from its backing source
use crate::application::catalog_repository::{ProcedureExecutor, SpreadsheetReader};
use crate::application::dataset_service::DatasetRegistry;
use crate::application::error::CatalogResult;
use crate::domain::dataset::{Dataset, DatasetSource};
use crate::domain::tabular::{ProcedureParams, Record};
use std::sync::Arc;

/// Every call re-reads the file or re-runs the procedure; nothing is cached.
#[derive(Clone)]
pub struct DataAccessGateway {
    datasets: DatasetRegistry,
    reader: Arc<dyn SpreadsheetReader>,
    executor: Arc<dyn ProcedureExecutor>,
}

impl DataAccessGateway {
    pub fn new(
        datasets: DatasetRegistry,
        reader: Arc<dyn SpreadsheetReader>,
        executor: Arc<dyn ProcedureExecutor>,
    ) -> Self {
        Self {
            datasets,
            reader,
            executor,
        }
    }

    pub async fn fetch_rows(&self, dataset: &Dataset) -> CatalogResult<Vec<Record>> {
        match dataset.source() {
            DatasetSource::Excel(path) => self.reader.read(path).await,
            // Callers never supply procedure arguments for a registered dataset.
            DatasetSource::StoredProcedure(procedure) => {
                self.executor.execute(procedure, &ProcedureParams::new()).await
            }
        }
    }

    pub async fn fetch_rows_by_name(&self, name: &str) -> CatalogResult<Vec<Record>> {
        let dataset = self.datasets.get(name).await?;
        self.fetch_rows(&dataset).await
    }

    pub async fn read_excel(&self, path: &str) -> CatalogResult<Vec<Record>> {
        self.reader.read(path).await
    }

    pub async fn execute_procedure(&self, procedure: &str, params: &ProcedureParams) -> CatalogResult<Vec<Record>> {
        self.executor.execute(procedure, params).await
    }
}
