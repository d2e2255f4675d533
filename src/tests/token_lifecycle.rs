#[cfg(test)]
mod test {
    use std::sync::Arc;

    use serde_json::json;
    use serial_test::serial;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::error::Error;
    use crate::helpers::time::now_i64;
    use crate::tests::common::{manager_with, token_valid_for};

    #[tokio::test]
    async fn ensure_valid_without_credentials_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_with("http://127.0.0.1:1", dir.path(), None).await;

        let err = manager.ensure_valid().await.unwrap_err();
        assert!(matches!(err, Error::Auth { .. }), "got: {err:?}");
        assert!(err.to_string().contains("no credentials"));
    }

    #[tokio::test]
    async fn ensure_valid_returns_same_token_while_unexpired() {
        let dir = tempfile::tempdir().unwrap();
        // No vendor reachable: a valid token must never trigger a call.
        let manager =
            manager_with("http://127.0.0.1:1", dir.path(), Some(token_valid_for(3600))).await;

        let first = manager.ensure_valid().await.unwrap();
        let second = manager.ensure_valid().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.access_token, "tok-1");
    }

    #[tokio::test]
    async fn acquire_success_applies_margin_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=password"))
            // MD5("hunter2"), lowercase hex, per the vendor contract
            .and(body_string_contains("2ab96390c7dbe3439de74d0c9b0b1767"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "acc-new",
                "refresh_token": "ref-new",
                "uid": 1001,
                "expires_in": 7200,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let manager = manager_with(&server.uri(), dir.path(), None).await;

        let before = now_i64();
        let token = manager.acquire("desk@hotel.test", "hunter2").await.unwrap();
        let after = now_i64();

        // ttl 7200, margin 300 -> 6900 seconds from issuance
        assert!(token.expires_at >= before + 6900 && token.expires_at <= after + 6900);
        assert_eq!(token.uid, 1001);

        // persisted: a fresh manager over the same file restores it
        let restored = manager_with("http://127.0.0.1:1", dir.path(), None).await;
        assert_eq!(restored.current().await.unwrap(), token);
    }

    #[tokio::test]
    async fn rejected_acquire_persists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errcode": 10007,
                "errmsg": "invalid username or password",
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let manager = manager_with(&server.uri(), dir.path(), None).await;

        let err = manager.acquire("desk@hotel.test", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::Auth { .. }), "got: {err:?}");
        assert!(err.to_string().contains("invalid username or password"));

        // no TokenSet was stored, and the next call still says so
        assert!(manager.current().await.is_none());
        let err = manager.ensure_valid().await.unwrap_err();
        assert!(err.to_string().contains("no credentials"));
        assert!(!dir.path().join("credentials.json").exists());
    }

    #[tokio::test]
    #[serial]
    async fn concurrent_ensure_valid_refreshes_exactly_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=ref-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "acc-refreshed",
                "refresh_token": "ref-2",
                "uid": 42,
                "expires_in": 7200,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(
            manager_with(&server.uri(), dir.path(), Some(token_valid_for(-10))).await,
        );

        let calls = (0..8).map(|_| {
            let manager = manager.clone();
            async move { manager.ensure_valid().await }
        });
        let results = futures::future::join_all(calls).await;

        for result in results {
            assert_eq!(result.unwrap().access_token, "acc-refreshed");
        }
        // the mock's expect(1) verifies on drop: one refresh, not eight
    }

    #[tokio::test]
    async fn rejected_refresh_drops_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errcode": 10004,
                "errmsg": "refresh token revoked",
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let manager =
            manager_with(&server.uri(), dir.path(), Some(token_valid_for(-10))).await;

        let err = manager.ensure_valid().await.unwrap_err();
        assert!(matches!(err, Error::Auth { .. }), "got: {err:?}");

        // manager is now unauthenticated: re-login required, file gone
        let err = manager.ensure_valid().await.unwrap_err();
        assert!(err.to_string().contains("no credentials"));
        assert!(!dir.path().join("credentials.json").exists());
    }

    #[tokio::test]
    async fn transport_failure_during_refresh_keeps_token() {
        // Nothing listening: connection refused is a transport error.
        let dir = tempfile::tempdir().unwrap();
        let manager =
            manager_with("http://127.0.0.1:1", dir.path(), Some(token_valid_for(-10))).await;

        let err = manager.ensure_valid().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "got: {err:?}");

        // the expired-but-refreshable token survives for the next attempt
        let current = manager.current().await.unwrap();
        assert_eq!(current.refresh_token, "ref-1");
        assert!(dir.path().join("credentials.json").exists());
    }
}
