// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::types::VendorConfig;
use crate::credentials::manager::TokenManager;
use crate::credentials::store::CredentialStore;
use crate::credentials::token::TokenSet;
use crate::helpers::time::now_i64;
use crate::resilience::retry::RetrySettings;
use crate::vendor::dispatcher::Dispatcher;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn test_vendor_config(base_url: &str) -> VendorConfig {
    VendorConfig {
        base_url: base_url.to_owned(),
        client_id: "cid".to_owned(),
        client_secret: "csecret".to_owned(),
        request_timeout_seconds: 5,
    }
}

/// A TokenSet expiring `seconds` from now (negative for already expired).
pub fn token_valid_for(seconds: i64) -> TokenSet {
    TokenSet {
        access_token: "tok-1".to_owned(),
        refresh_token: "ref-1".to_owned(),
        uid: 42,
        expires_at: now_i64() + seconds,
    }
}

/// Manager backed by a credential file under `dir`, optionally seeded.
pub async fn manager_with(
    base_url: &str,
    dir: &Path,
    seeded: Option<TokenSet>,
) -> TokenManager {
    let store = CredentialStore::new(dir.join("credentials.json"));
    if let Some(token) = &seeded {
        store.save(token).await.expect("seed credentials");
    }
    TokenManager::new(
        build_reqwest_client(),
        &test_vendor_config(base_url),
        store,
        300,
    )
    .await
    .expect("token manager")
}

pub fn dispatcher_with(manager: Arc<TokenManager>, base_url: &str, attempts: u32) -> Dispatcher {
    Dispatcher::new(
        build_reqwest_client(),
        &test_vendor_config(base_url),
        manager,
        RetrySettings {
            attempts,
            base_delay_ms: 10,
            max_delay_ms: 50,
        },
    )
}
