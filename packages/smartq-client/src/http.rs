//! HTTP transport for the SmartQ REST API.
//!
//! Every call goes to `<base_url>/api<endpoint>` with a JSON content type, the
//! bearer token when one is configured, and a hard deadline. Responses are
//! normalized: 2xx bodies are returned as JSON (an empty or malformed body is
//! `{}`), anything else becomes a [`ClientError`].

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ClientConfig, DEFAULT_TIMEOUT};
use crate::error::{ClientError, Result};
use crate::normalize;

/// Default auth header source, shared by every clone of one [`HttpClient`].
///
/// Only [`HttpClient::set_token`] writes it; separate clients never share a token.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    token: Arc<RwLock<Option<SecretString>>>,
}

impl AuthConfig {
    fn set(&self, token: Option<SecretString>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    fn bearer(&self) -> Option<String> {
        let guard = match self.token.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard
            .as_ref()
            .map(|t| format!("Bearer {}", t.expose_secret()))
    }

    fn is_set(&self) -> bool {
        match self.token.read() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }
}

/// Stand-in for secret values in request logs.
const REDACTED: &str = "***";

fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if key.to_ascii_lowercase().contains("password") {
                    *field = Value::String(REDACTED.to_string());
                } else {
                    redact(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

/// Request body as logged: password fields at any depth are masked.
fn loggable_body(body: &Value) -> String {
    let mut body = body.clone();
    redact(&mut body);
    body.to_string()
}

/// SmartQ HTTP client.
#[derive(Clone)]
pub struct HttpClient {
    http_client: Client,
    base_url: String,
    timeout: Duration,
    auth: AuthConfig,
}

impl HttpClient {
    /// Create a client for the given backend host.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            auth: AuthConfig::default(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.base_url.clone()).with_timeout(config.timeout)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom reqwest client (proxies, TLS settings).
    pub fn with_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Configure or clear the default `Authorization` header.
    pub fn set_token(&self, token: Option<SecretString>) {
        self.auth.set(token);
    }

    pub fn has_token(&self) -> bool {
        self.auth.is_set()
    }

    /// Absolute URL for an API endpoint.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/api{}", self.base_url, endpoint)
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(bearer) = self.auth.bearer() {
            match HeaderValue::from_str(&bearer) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token is not a valid header value; sending without auth"),
            }
        }
        headers
    }

    /// Issue a request and normalize the response.
    ///
    /// Caller headers override the defaults, `Authorization` included.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        headers: &HeaderMap,
    ) -> Result<Value> {
        let url = self.url(endpoint);

        let mut merged = self.default_headers();
        for (name, value) in headers {
            merged.insert(name.clone(), value.clone());
        }

        debug!(
            method = %method,
            url = %url,
            body = %body.map(loggable_body).unwrap_or_default(),
            "API request"
        );

        let mut req = self.http_client.request(method.clone(), &url).headers(merged);
        if let Some(body) = body {
            req = req.body(serde_json::to_vec(body)?);
        }

        let exchange = async {
            let response = req.send().await?;
            let status = response.status();
            let bytes = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, bytes))
        };

        // Dropping the exchange future on expiry aborts the in-flight request.
        let (status, bytes) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(settled)) => settled,
            Ok(Err(e)) => {
                let err = ClientError::from(e);
                warn!(method = %method, url = %url, error = %err, "API fetch error");
                return Err(err);
            }
            Err(_) => {
                warn!(method = %method, url = %url, timeout_ms = self.timeout.as_millis() as u64, "API request timed out");
                return Err(ClientError::Timeout);
            }
        };

        let data = normalize::parse_body(&bytes);

        if !status.is_success() {
            let message = normalize::error_message(&data, status.as_u16());
            warn!(method = %method, url = %url, status = status.as_u16(), error = %message, "API error");
            return Err(ClientError::Request {
                status: status.as_u16(),
                message,
            });
        }

        Ok(data)
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value> {
        self.request(Method::GET, endpoint, None, &HeaderMap::new())
            .await
    }

    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        self.request(Method::POST, endpoint, Some(body), &HeaderMap::new())
            .await
    }

    pub async fn patch(&self, endpoint: &str, body: &Value) -> Result<Value> {
        self.request(Method::PATCH, endpoint, Some(body), &HeaderMap::new())
            .await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("authenticated", &self.has_token())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = HttpClient::new("https://api.example.com/");
        assert_eq!(
            client.url("/customers/login"),
            "https://api.example.com/api/customers/login"
        );
    }

    #[test]
    fn test_default_headers_follow_token() {
        let client = HttpClient::new("http://localhost");
        let headers = client.default_headers();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(headers.get(AUTHORIZATION).is_none());

        client.set_token(Some(SecretString::from("abc")));
        assert_eq!(client.default_headers()[AUTHORIZATION], "Bearer abc");

        client.set_token(None);
        assert!(client.default_headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_clones_share_auth_but_instances_do_not() {
        let a = HttpClient::new("http://localhost");
        let a_clone = a.clone();
        let b = HttpClient::new("http://localhost");

        a.set_token(Some(SecretString::from("abc")));
        assert!(a_clone.has_token());
        assert!(!b.has_token());
    }

    #[test]
    fn test_loggable_body_masks_passwords() {
        let body = serde_json::json!({
            "usernameOrEmail": "bob",
            "password": "hunter2",
            "nested": {"newPassword": "s3cret"},
            "list": [{"confirmPassword": "s3cret"}]
        });

        let logged = loggable_body(&body);
        assert!(!logged.contains("hunter2"));
        assert!(!logged.contains("s3cret"));
        assert!(logged.contains(r#""usernameOrEmail":"bob""#));
        assert!(logged.contains(r#""password":"***""#));

        // The outgoing body itself is untouched.
        assert_eq!(body["password"], "hunter2");
    }

    #[test]
    fn test_debug_hides_token() {
        let client = HttpClient::new("http://localhost");
        client.set_token(Some(SecretString::from("super-secret")));
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("authenticated: true"));
    }
}
