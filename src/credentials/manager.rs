use md5::{Digest, Md5};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::types::VendorConfig;
use crate::credentials::store::CredentialStore;
use crate::credentials::token::TokenSet;
use crate::error::Error;
use crate::helpers::time::now_i64;
use crate::observability::metrics::get_metrics;

const TOKEN_ENDPOINT: &str = "/oauth2/token";

#[derive(Debug, Deserialize)]
struct GrantResponse {
    access_token: String,
    refresh_token: String,
    uid: i64,
    /// TTL in seconds, as issued by the vendor.
    expires_in: u64,
}

/// Owner of the one live TokenSet per process.
///
/// Guarantees a valid, unexpired token for every outbound call: initial
/// acquisition via the password grant, proactive refresh once the
/// margin-adjusted expiry passes. Refresh is single-flight — concurrent
/// callers that observe expiry await the one in-flight refresh instead
/// of each issuing their own.
pub struct TokenManager {
    http: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    safety_margin_seconds: u64,
    store: CredentialStore,
    current: RwLock<Option<TokenSet>>,
    refresh_gate: Mutex<()>,
}

impl TokenManager {
    /// Build a manager, restoring any persisted TokenSet from the store.
    pub async fn new(
        http: Client,
        vendor: &VendorConfig,
        store: CredentialStore,
        safety_margin_seconds: u64,
    ) -> Result<Self, Error> {
        let current = store.load().await?;
        if let Some(token) = &current {
            info!(
                "restored persisted credentials (uid {}, expires_at {})",
                token.uid, token.expires_at
            );
        }
        Ok(Self {
            http,
            base_url: vendor.base_url.trim_end_matches('/').to_owned(),
            client_id: vendor.client_id.clone(),
            client_secret: vendor.client_secret.clone(),
            safety_margin_seconds,
            store,
            current: RwLock::new(current),
            refresh_gate: Mutex::new(()),
        })
    }

    /// Read-only snapshot of the live TokenSet.
    pub async fn current(&self) -> Option<TokenSet> {
        self.current.read().await.clone()
    }

    /// Password-grant acquisition.
    ///
    /// The vendor mandates MD5 over the plaintext password on this grant;
    /// that digest is a wire-compatibility requirement, not a security
    /// control, and must not be reused for any locally-controlled secret.
    /// On vendor rejection nothing is stored or persisted.
    pub async fn acquire(&self, username: &str, password: &str) -> Result<TokenSet, Error> {
        let hashed = hash_vendor_password(password);
        let form = [
            ("clientId", self.client_id.clone()),
            ("clientSecret", self.client_secret.clone()),
            ("username", username.to_owned()),
            ("password", hashed),
            ("grant_type", "password".to_owned()),
        ];

        let grant = self.token_grant(&form).await?;
        let token = self.install(grant).await?;
        info!("acquired credentials for uid {}", token.uid);
        Ok(token)
    }

    /// Return the current TokenSet while `now < expires_at`; otherwise
    /// refresh. Never acquires implicitly — with no credentials this
    /// fails until `acquire` succeeds.
    pub async fn ensure_valid(&self) -> Result<TokenSet, Error> {
        {
            let guard = self.current.read().await;
            match guard.as_ref() {
                Some(token) if token.is_valid_at(now_i64()) => return Ok(token.clone()),
                Some(_) => {}
                None => return Err(Error::auth("no credentials")),
            }
        }

        // Expired: one caller refreshes, the rest queue on the gate and
        // observe the fresh token on re-check.
        let _gate = self.refresh_gate.lock().await;
        {
            let guard = self.current.read().await;
            match guard.as_ref() {
                Some(token) if token.is_valid_at(now_i64()) => return Ok(token.clone()),
                Some(_) => {}
                None => return Err(Error::auth("no credentials")),
            }
        }
        self.refresh_locked().await
    }

    /// Exchange the stored refresh token for a new TokenSet.
    pub async fn refresh(&self) -> Result<TokenSet, Error> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<TokenSet, Error> {
        let refresh_token = self
            .current
            .read()
            .await
            .as_ref()
            .map(|token| token.refresh_token.clone())
            .ok_or_else(|| Error::auth("no credentials"))?;

        let metrics = get_metrics().await;
        metrics.token_refreshes.inc();
        debug!("refreshing vendor credentials");

        let form = [
            ("clientId", self.client_id.clone()),
            ("clientSecret", self.client_secret.clone()),
            ("grant_type", "refresh_token".to_owned()),
            ("refresh_token", refresh_token),
        ];

        match self.token_grant(&form).await {
            Ok(grant) => {
                let token = self.install(grant).await?;
                info!("credentials refreshed, expires_at {}", token.expires_at);
                Ok(token)
            }
            Err(e @ Error::Auth { .. }) => {
                // Refresh token revoked vendor-side. Drop state so the
                // next call reports "no credentials" and the operator
                // re-logs-in instead of looping on a dead token.
                warn!("vendor rejected refresh token: {}", e);
                metrics.token_refresh_failures.inc();
                *self.current.write().await = None;
                self.store.clear().await?;
                Err(e)
            }
            Err(e) => {
                // Transport-class failure: the stored token stays as-is,
                // a timed-out call must not invalidate it.
                metrics.token_refresh_failures.inc();
                Err(e)
            }
        }
    }

    /// Store and persist a freshly granted TokenSet. The in-memory value
    /// is only replaced once the durable write has succeeded.
    async fn install(&self, grant: GrantResponse) -> Result<TokenSet, Error> {
        let token = TokenSet::from_grant(
            grant.access_token,
            grant.refresh_token,
            grant.uid,
            now_i64(),
            grant.expires_in,
            self.safety_margin_seconds,
        );
        self.store.save(&token).await?;
        *self.current.write().await = Some(token.clone());
        get_metrics()
            .await
            .token_expiry_unix
            .set(token.expires_at);
        Ok(token)
    }

    /// One call against the vendor token endpoint. The endpoint signals
    /// failure both via HTTP status and via `errcode` inside a 200 body;
    /// both auth-class shapes collapse to `Error::Auth` here.
    async fn token_grant(&self, form: &[(&str, String)]) -> Result<GrantResponse, Error> {
        let url = format!("{}{}", self.base_url, TOKEN_ENDPOINT);
        let resp = self.http.post(&url).form(form).send().await?;

        let status = resp.status();
        if let Err(e) = resp.error_for_status_ref() {
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                let body = resp.text().await.unwrap_or_default();
                return Err(Error::auth(format!(
                    "token grant rejected (HTTP {}): {}",
                    status, body
                )));
            }
            return Err(Error::Transport(e));
        }

        let body = resp.text().await?;
        let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("token grant response: {}", e),
        })?;

        if let Some(code) = value.get("errcode").and_then(Value::as_i64).filter(|c| *c != 0) {
            let message = value
                .get("errmsg")
                .and_then(Value::as_str)
                .unwrap_or("vendor rejected the grant")
                .to_owned();
            return Err(Error::auth(format!("{} (errcode {})", message, code)));
        }

        serde_json::from_value(value).map_err(|e| Error::Deserialization {
            message: format!("token grant response: {}", e),
        })
    }
}

/// MD5 lowercase hex, exactly as the vendor's password grant requires.
fn hash_vendor_password(password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
