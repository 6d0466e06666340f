//! Profile cache so `account` can show who is logged in across runs.
//!
//! Only the session token is persisted by the client library; the CLI keeps
//! the display profile next to it. The password field is never written.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use smartq_client::UserData;

pub struct ProfileCache {
    path: PathBuf,
}

impl ProfileCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Option<UserData>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        match serde_json::from_str(&content) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable profile cache");
                Ok(None)
            }
        }
    }

    /// Write the profile, or remove the cache when the profile is empty.
    pub fn save(&self, user: &UserData) -> Result<()> {
        if user.is_empty() {
            return self.clear();
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(user)?;
        fs::write(&self.path, content).with_context(|| format!("write {}", self.path.display()))
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", self.path.display())),
        }
    }
}
