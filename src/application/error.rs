// Catalog error taxonomy shared by services and adapters
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{kind} name already exists: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("source read error: {0}")]
    SourceRead(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    pub fn duplicate_dataset(name: &str) -> Self {
        Self::DuplicateName {
            kind: "Dataset",
            name: name.to_string(),
        }
    }

    pub fn duplicate_dashboard(name: &str) -> Self {
        Self::DuplicateName {
            kind: "Dashboard",
            name: name.to_string(),
        }
    }

    pub fn dataset_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: "Dataset",
            name: name.to_string(),
        }
    }

    pub fn dashboard_not_found(name: &str) -> Self {
        Self::NotFound {
            kind: "Dashboard",
            name: name.to_string(),
        }
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::Storage(e.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
