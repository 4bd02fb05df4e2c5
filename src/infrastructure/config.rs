use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub uploads: UploadSettings,
    #[serde(default)]
    pub encryption: EncryptionSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    /// `postgres://...` or `sqlite:...`
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadSettings {
    #[serde(default = "default_upload_dir")]
    pub directory: PathBuf,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            directory: default_upload_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EncryptionSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Environment variable holding the base64 AES-256 key
    #[serde(default = "default_key_env")]
    pub key_env: String,
}

impl Default for EncryptionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            key_env: default_key_env(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5246".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_key_env() -> String {
    "CATALOG_ENCRYPTION_KEY".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    Sqlite,
}

impl DatabaseSettings {
    pub fn kind(&self) -> anyhow::Result<DatabaseKind> {
        if self.url.starts_with("postgres://") || self.url.starts_with("postgresql://") {
            Ok(DatabaseKind::Postgres)
        } else if self.url.starts_with("sqlite:") {
            Ok(DatabaseKind::Sqlite)
        } else {
            anyhow::bail!("unsupported database url scheme: {}", self.url)
        }
    }
}

/// Load `config/app.toml` (optional) with `CATALOG__SECTION__KEY` environment overrides.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/app").required(false))
        .add_source(config::Environment::with_prefix("CATALOG").separator("__").try_parsing(true))
        .build()?;

    Ok(settings.try_deserialize()?)
}
