//! Shared state for every subcommand

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::theme::ColorfulTheme;
use smartq_client::{ClientConfig, FileTokenStore, HttpClient, SessionContext, SmartQApi};

use crate::profile::ProfileCache;

pub struct AppContext {
    pub config: ClientConfig,
    pub api: SmartQApi,
    pub session: SessionContext,
    pub profile: ProfileCache,
}

impl AppContext {
    /// Build the client stack from the environment, applying flag overrides,
    /// and restore any persisted session.
    pub async fn new(api_url: Option<String>, timeout_ms: Option<u64>) -> Result<Self> {
        let mut config = ClientConfig::from_env().context("failed to load configuration")?;
        if let Some(url) = api_url {
            config = config.with_base_url(url);
        }
        if let Some(ms) = timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }

        let http = HttpClient::from_config(&config);
        let store = Arc::new(FileTokenStore::new(&config.token_path));
        let session = SessionContext::new(http.clone(), store);
        session.activate().await;

        let profile = ProfileCache::new(config.token_path.with_file_name("profile.json"));
        if let Some(user) = profile.load()? {
            session.set_user_data(user);
        }

        Ok(Self {
            config,
            api: SmartQApi::new(http),
            session,
            profile,
        })
    }

    pub fn theme(&self) -> ColorfulTheme {
        ColorfulTheme::default()
    }

    /// Persist whatever profile the session currently holds.
    pub fn save_profile(&self) -> Result<()> {
        self.profile.save(&self.session.user_data())
    }

    /// Print one line of command output in the given tone.
    pub fn say(&self, tone: Tone, msg: &str) {
        println!("{}", tone.render(msg));
    }
}

/// How a line of command output is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Bold, preceded by a blank line.
    Header,
    Success,
    Warning,
    Info,
}

impl Tone {
    pub fn render(self, msg: &str) -> String {
        match self {
            Tone::Header => format!("\n{}", style(msg).bold()),
            Tone::Success => style(msg).green().to_string(),
            Tone::Warning => style(msg).yellow().to_string(),
            Tone::Info => style(msg).cyan().to_string(),
        }
    }
}
