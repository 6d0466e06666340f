use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::{ClientError, Result};

/// Production backend host. Requests go to `<base_url>/api/...`.
pub const DEFAULT_BASE_URL: &str = "https://smart-q-backend-nestjs.onrender.com";

/// Per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// File holding the persisted bearer token, inside the SmartQ home directory.
pub const TOKEN_FILE: &str = "auth.json";

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub token_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            token_path: smartq_home().join(TOKEN_FILE),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let timeout = match env::var("SMARTQ_TIMEOUT_MS") {
            Ok(raw) => Duration::from_millis(raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("SMARTQ_TIMEOUT_MS must be a number, got {raw:?}"))
            })?),
            Err(_) => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            base_url: env::var("SMARTQ_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout,
            token_path: smartq_home().join(TOKEN_FILE),
        })
    }

    /// Set a custom backend host (staging, local NestJS, mock server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }
}

/// Directory for local SmartQ state. `SMARTQ_HOME` wins over `~/.config/smartq`.
pub fn smartq_home() -> PathBuf {
    if let Ok(home) = env::var("SMARTQ_HOME") {
        return PathBuf::from(home);
    }

    dirs::home_dir()
        .map(|h| h.join(".config").join("smartq"))
        .unwrap_or_else(|| PathBuf::from(".smartq"))
}
