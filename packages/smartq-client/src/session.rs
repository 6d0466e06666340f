//! Session context: the current user profile and bearer token.
//!
//! One context per app instance. Setting a token persists it, keeps it in
//! memory and configures the HTTP client's default auth header; clearing does
//! the reverse. Storage failures are logged and swallowed so the running
//! session keeps working with memory-only state.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::api::SmartQApi;
use crate::error::Result;
use crate::http::HttpClient;
use crate::token_store::TokenStore;
use crate::types::{LoginCredentials, UserData};

#[derive(Default)]
struct SessionState {
    user: UserData,
    token: Option<SecretString>,
}

struct Inner {
    http: HttpClient,
    store: Arc<dyn TokenStore>,
    state: RwLock<SessionState>,
    activated: OnceCell<()>,
}

/// Process-wide session holder. Clones share state.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

impl SessionContext {
    pub fn new(http: HttpClient, store: Arc<dyn TokenStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                store,
                state: RwLock::new(SessionState::default()),
                activated: OnceCell::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        match self.inner.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        match self.inner.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Load the persisted token once and apply it without writing it back.
    ///
    /// Later calls are no-ops.
    pub async fn activate(&self) {
        self.inner
            .activated
            .get_or_init(|| async {
                match self.inner.store.get().await {
                    Ok(Some(token)) => {
                        info!("Restored persisted session token");
                        self.apply_token(Some(token));
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Failed to load persisted token"),
                }
            })
            .await;
    }

    fn apply_token(&self, token: Option<SecretString>) {
        let for_http = token
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_string()));
        self.write().token = token;
        self.inner.http.set_token(for_http);
    }

    pub fn user_data(&self) -> UserData {
        self.read().user.clone()
    }

    /// Replace the profile. No merging, no validation.
    pub fn set_user_data(&self, data: UserData) {
        self.write().user = data;
    }

    pub fn token(&self) -> Option<SecretString> {
        self.read()
            .token
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_string()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().token.is_some()
    }

    /// Set or clear the bearer token.
    pub async fn set_token(&self, token: Option<String>) {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => {
                let token = SecretString::from(token);
                if let Err(e) = self.inner.store.save(&token).await {
                    warn!(error = %e, "Failed to persist token; keeping it in memory only");
                }
                self.apply_token(Some(token));
            }
            None => {
                if let Err(e) = self.inner.store.remove().await {
                    warn!(error = %e, "Failed to remove persisted token");
                }
                self.apply_token(None);
            }
        }
    }

    pub async fn clear_token(&self) {
        self.set_token(None).await;
    }

    /// Clear the token and reset the profile.
    pub async fn logout(&self) {
        self.clear_token().await;
        self.set_user_data(UserData::default());
        info!("Logged out");
    }

    /// Log in and commit the session. On failure the context is left untouched.
    pub async fn login(&self, api: &SmartQApi, credentials: &LoginCredentials) -> Result<UserData> {
        let session = api.login(credentials).await?;

        let mut user = UserData::from_user_record(&session.user);
        if user.is_empty() {
            match credentials {
                LoginCredentials::Phone { phone_number, .. } => {
                    user.phone_number = phone_number.clone()
                }
                LoginCredentials::Email { email, .. } => user.email = email.clone(),
                LoginCredentials::UsernameOrEmail {
                    username_or_email, ..
                } => user.username = username_or_email.clone(),
            }
        }

        self.set_token(Some(session.token)).await;
        self.set_user_data(user.clone());
        Ok(user)
    }

    /// Account-view edit: change the displayed username and email, keep the rest.
    pub fn update_profile(&self, username: impl Into<String>, email: impl Into<String>) {
        let mut state = self.write();
        state.user.username = username.into();
        state.user.email = email.into();
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("SessionContext")
            .field("user", &state.user)
            .field("authenticated", &state.token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::{MemoryTokenStore, TokenStoreError};
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl TokenStore for BrokenStore {
        async fn get(&self) -> std::result::Result<Option<SecretString>, TokenStoreError> {
            Err(TokenStoreError::Unavailable)
        }

        async fn save(&self, _token: &SecretString) -> std::result::Result<(), TokenStoreError> {
            Err(TokenStoreError::Unavailable)
        }

        async fn remove(&self) -> std::result::Result<(), TokenStoreError> {
            Err(TokenStoreError::Unavailable)
        }
    }

    fn context(store: Arc<dyn TokenStore>) -> (SessionContext, HttpClient) {
        let http = HttpClient::new("http://localhost");
        (SessionContext::new(http.clone(), store), http)
    }

    #[tokio::test]
    async fn test_set_token_persists_and_configures_http() {
        let store = Arc::new(MemoryTokenStore::new());
        let (session, http) = context(store.clone());

        session.set_token(Some("abc".into())).await;
        assert!(http.has_token());
        assert_eq!(session.token().unwrap().expose_secret(), "abc");
        assert_eq!(store.get().await.unwrap().unwrap().expose_secret(), "abc");

        session.clear_token().await;
        assert!(!http.has_token());
        assert!(session.token().is_none());
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_activate_restores_persisted_token_once() {
        let store = Arc::new(MemoryTokenStore::with_token("persisted"));
        let (session, http) = context(store.clone());

        assert!(!http.has_token());
        session.activate().await;
        assert!(http.has_token());
        assert_eq!(session.token().unwrap().expose_secret(), "persisted");

        // A second activation does not reload a token that changed underneath.
        store.save(&SecretString::from("other")).await.unwrap();
        session.activate().await;
        assert_eq!(session.token().unwrap().expose_secret(), "persisted");
    }

    #[tokio::test]
    async fn test_storage_failures_keep_memory_state() {
        let (session, http) = context(Arc::new(BrokenStore));

        session.activate().await;
        assert!(!session.is_authenticated());

        session.set_token(Some("abc".into())).await;
        assert!(session.is_authenticated());
        assert!(http.has_token());

        session.set_token(None).await;
        assert!(!session.is_authenticated());
        assert!(!http.has_token());
    }

    #[tokio::test]
    async fn test_user_data_is_replaced_not_merged() {
        let (session, _) = context(Arc::new(MemoryTokenStore::new()));
        session.set_user_data(UserData {
            username: "bob".into(),
            email: "bob@example.com".into(),
            ..Default::default()
        });
        session.set_user_data(UserData {
            username: "alice".into(),
            ..Default::default()
        });

        let user = session.user_data();
        assert_eq!(user.username, "alice");
        assert!(user.email.is_empty());
    }

    #[tokio::test]
    async fn test_logout_resets_everything() {
        let (session, http) = context(Arc::new(MemoryTokenStore::new()));
        session.set_token(Some("abc".into())).await;
        session.update_profile("bob", "bob@example.com");

        session.logout().await;
        assert!(!http.has_token());
        assert_eq!(session.user_data(), UserData::default());
    }

    #[tokio::test]
    async fn test_empty_token_clears() {
        let (session, _) = context(Arc::new(MemoryTokenStore::new()));
        session.set_token(Some("abc".into())).await;
        session.set_token(Some(String::new())).await;
        assert!(!session.is_authenticated());
    }
}
