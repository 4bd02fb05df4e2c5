// Upload service - Stores an uploaded spreadsheet and registers it as a dataset
use crate::application::dataset_service::DatasetRegistry;
use crate::application::error::{CatalogError, CatalogResult};
use crate::domain::dataset::Dataset;
use crate::infrastructure::encryption::FileCipher;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

#[derive(Clone)]
pub struct UploadService {
    datasets: DatasetRegistry,
    directory: PathBuf,
    cipher: Option<FileCipher>,
}

impl UploadService {
    pub fn new(datasets: DatasetRegistry, directory: PathBuf, cipher: Option<FileCipher>) -> Self {
        Self {
            datasets,
            directory,
            cipher,
        }
    }

    pub async fn upload(&self, dataset_name: &str, file_name: &str, contents: &[u8]) -> CatalogResult<Dataset> {
        validate_dataset_name(dataset_name)?;
        let extension = spreadsheet_extension(file_name)?;

        if self.datasets.exists(dataset_name).await? {
            return Err(CatalogError::duplicate_dataset(dataset_name));
        }

        let path = self.directory.join(format!("{dataset_name}.{extension}"));
        self.store(dataset_name, &path, contents).await?;

        let dataset = Dataset::from_excel(dataset_name, path.to_string_lossy());
        if let Err(e) = self.datasets.register(dataset.clone()).await {
            remove_orphan(&path).await;
            return Err(e);
        }

        tracing::info!(
            "Uploaded {} ({} bytes) as dataset {}",
            file_name,
            contents.len(),
            dataset_name
        );
        Ok(dataset)
    }

    /// Creates the file exclusively. An existing file belongs to another
    /// upload of the same name and is never overwritten.
    async fn store(&self, dataset_name: &str, path: &Path, contents: &[u8]) -> CatalogResult<()> {
        let data = match &self.cipher {
            Some(cipher) => cipher.encrypt(contents)?,
            None => contents.to_vec(),
        };

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| CatalogError::Storage(format!("{}: {e}", self.directory.display())))?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(CatalogError::duplicate_dataset(dataset_name));
            }
            Err(e) => return Err(CatalogError::Storage(format!("{}: {e}", path.display()))),
        };

        let written = async {
            file.write_all(&data).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            remove_orphan(path).await;
            return Err(CatalogError::Storage(format!("{}: {e}", path.display())));
        }
        Ok(())
    }
}

/// Only called for files created by the same upload.
async fn remove_orphan(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!("Could not remove orphaned upload {}: {}", path.display(), e);
    }
}

/// Dataset names double as file names, so path syntax is refused.
fn validate_dataset_name(name: &str) -> CatalogResult<()> {
    if name.trim().is_empty() {
        return Err(CatalogError::Validation("datasetName is required".to_string()));
    }
    if name.starts_with('.') || name.contains(['/', '\\', '\0']) {
        return Err(CatalogError::Validation(format!("invalid dataset name: {name:?}")));
    }
    Ok(())
}

fn spreadsheet_extension(file_name: &str) -> CatalogResult<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(CatalogError::Validation(format!(
            "unsupported file type {file_name:?}; expected one of {}",
            SPREADSHEET_EXTENSIONS.join(", ")
        )))
    }
}
