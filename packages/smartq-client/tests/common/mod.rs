//! Shared helpers for SmartQ client integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use smartq_client::{HttpClient, MemoryTokenStore, SessionContext, SmartQApi};
use wiremock::MockServer;

/// Client pointed at a mock server, with a short deadline so timeout tests stay fast.
pub fn http_client(server: &MockServer) -> HttpClient {
    HttpClient::new(server.uri()).with_timeout(Duration::from_millis(500))
}

pub fn api(server: &MockServer) -> SmartQApi {
    SmartQApi::new(http_client(server))
}

/// API and session sharing one transport, backed by an in-memory token store.
pub fn session(server: &MockServer) -> (SmartQApi, SessionContext, Arc<MemoryTokenStore>) {
    let http = http_client(server);
    let store = Arc::new(MemoryTokenStore::new());
    let session = SessionContext::new(http.clone(), store.clone());
    (SmartQApi::new(http), session, store)
}
