// Symmetric encryption for uploaded spreadsheets (AES-256-GCM)
use crate::application::error::{CatalogError, CatalogResult};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

const NONCE_LEN: usize = 12;

/// Source of the 256-bit data key.
pub trait KeyProvider: Send + Sync {
    fn key(&self) -> CatalogResult<[u8; 32]>;
}

/// Reads a base64-encoded key from an environment variable.
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    variable: String,
}

impl EnvKeyProvider {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl KeyProvider for EnvKeyProvider {
    fn key(&self) -> CatalogResult<[u8; 32]> {
        let encoded = std::env::var(&self.variable)
            .map_err(|_| CatalogError::Config(format!("encryption key variable {} is not set", self.variable)))?;
        decode_key(&encoded)
    }
}

fn decode_key(encoded: &str) -> CatalogResult<[u8; 32]> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CatalogError::Config(format!("encryption key is not valid base64: {e}")))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| CatalogError::Config(format!("encryption key must be 32 bytes, got {}", b.len())))
}

/// Output layout: 12-byte random nonce followed by the ciphertext and tag.
#[derive(Clone)]
pub struct FileCipher {
    cipher: Aes256Gcm,
}

impl FileCipher {
    pub fn new(provider: &dyn KeyProvider) -> CatalogResult<Self> {
        let key = provider.key()?;
        Ok(Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
        })
    }

    pub fn encrypt(&self, data: &[u8]) -> CatalogResult<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, data)
            .map_err(|e| CatalogError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, data: &[u8]) -> CatalogResult<Vec<u8>> {
        if data.len() < NONCE_LEN {
            return Err(CatalogError::Encryption("ciphertext too short".to_string()));
        }
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CatalogError::Encryption("ciphertext failed authentication".to_string()))
    }

    pub async fn decrypt_file_to_bytes(&self, path: &Path) -> CatalogResult<Vec<u8>> {
        let data = read_file(path).await?;
        self.decrypt(&data)
    }
}

async fn read_file(path: &Path) -> CatalogResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| CatalogError::SourceRead(format!("{}: {e}", path.display())))
}
