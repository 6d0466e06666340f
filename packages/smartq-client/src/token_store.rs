//! Durable bearer-token storage.
//!
//! A single key/value pair survives restarts until explicitly removed. The file
//! store writes `{"@auth_token": "..."}` with restricted permissions (0600).
//! Tokens are never logged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "@auth_token";

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("token store unavailable")]
    Unavailable,
}

/// Get/save/remove of the persisted token.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self) -> Result<Option<SecretString>, TokenStoreError>;

    async fn save(&self, token: &SecretString) -> Result<(), TokenStoreError>;

    async fn remove(&self) -> Result<(), TokenStoreError>;
}

/// Token store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, TokenStoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(TokenStoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&contents).map_err(|source| TokenStoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn store(&self, entries: &HashMap<String, String>) -> Result<(), TokenStoreError> {
        let io_err = |source| TokenStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(entries).map_err(|source| {
            TokenStoreError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await.map_err(io_err)?;
        file.write_all(contents.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> Result<Option<SecretString>, TokenStoreError> {
        let entries = self.load().await?;
        Ok(entries
            .get(TOKEN_KEY)
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::from(t.clone())))
    }

    async fn save(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        let mut entries = self.load().await.unwrap_or_default();
        entries.insert(TOKEN_KEY.to_string(), token.expose_secret().to_string());
        self.store(&entries).await
    }

    async fn remove(&self) -> Result<(), TokenStoreError> {
        let mut entries = self.load().await.unwrap_or_default();
        if entries.remove(TOKEN_KEY).is_none() && !self.path.exists() {
            return Ok(());
        }
        self.store(&entries).await
    }
}

/// In-memory token store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Result<Option<SecretString>, TokenStoreError> {
        let guard = self.token.lock().map_err(|_| TokenStoreError::Unavailable)?;
        Ok(guard.clone().map(SecretString::from))
    }

    async fn save(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        let mut guard = self.token.lock().map_err(|_| TokenStoreError::Unavailable)?;
        *guard = Some(token.expose_secret().to_string());
        Ok(())
    }

    async fn remove(&self) -> Result<(), TokenStoreError> {
        let mut guard = self.token.lock().map_err(|_| TokenStoreError::Unavailable)?;
        *guard = None;
        Ok(())
    }
}
