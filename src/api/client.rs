//! HTTP client for the Lanyard presence API
//!
//! Wraps reqwest::Client and normalizes every fetch outcome (HTTP status,
//! rate limiting, payload-level failure) into a typed FetchError.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::models::{LanyardResponse, PresenceSnapshot};

const LANYARD_BASE: &str = "https://api.lanyard.rest/v1";

/// Abort a request that has not produced a response within this window.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Backoff applied when a 429 carries no Retry-After header.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Everything that can go wrong fetching one presence document.
///
/// All variants are surfaced to the user as a message in the poller state;
/// `RateLimited` is the only one the poller treats differently (it carries
/// the server-specified backoff instead of the fixed retry delay).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error: {}", .0.as_u16())]
    Http(StatusCode),

    #[error("rate limit exceeded, retry in {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("{0}")]
    Api(String),
}

/// Source of presence documents.
///
/// The poller is written against this seam so tests can drive the state
/// machine with scripted responses instead of a live endpoint.
#[async_trait]
pub trait PresenceSource: Send + Sync {
    async fn fetch(&self) -> Result<PresenceSnapshot, FetchError>;
}

/// Client for the public Lanyard REST API. No auth required.
pub struct LanyardClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
}

impl LanyardClient {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::with_base_url(LANYARD_BASE, user_id)
    }

    /// Client against a non-default base URL (used by tests).
    pub fn with_base_url(base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            user_id: user_id.into(),
        }
    }

    /// GET the presence document once and normalize the outcome.
    pub async fn fetch_presence(&self) -> Result<PresenceSnapshot, FetchError> {
        let url = format!("{}/users/{}", self.base_url, self.user_id);
        tracing::debug!("GET {}", url);

        let resp = self.http.get(&url).send().await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(FetchError::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(FetchError::Http(status));
        }

        let body: LanyardResponse = resp.json().await?;
        if !body.success {
            let message = body
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "Invalid API response".to_string());
            return Err(FetchError::Api(message));
        }

        body.data
            .ok_or_else(|| FetchError::Api("Response missing presence data".to_string()))
    }
}

#[async_trait]
impl PresenceSource for LanyardClient {
    async fn fetch(&self) -> Result<PresenceSnapshot, FetchError> {
        self.fetch_presence().await
    }
}

/// Run one fetch with the standard request timeout applied.
///
/// Dropping the inner future on expiry aborts the underlying request; the
/// expiry is reported as the transient `Timeout` error.
pub async fn fetch_with_timeout<S: PresenceSource + ?Sized>(
    source: &S,
) -> Result<PresenceSnapshot, FetchError> {
    match tokio::time::timeout(REQUEST_TIMEOUT, source.fetch()).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use mockito::Server;

    fn success_body() -> &'static str {
        r#"{
            "success": true,
            "data": {
                "discord_user": {
                    "id": "728076716219695148",
                    "username": "tester",
                    "avatar": "a1b2c3",
                    "discriminator": "0",
                    "public_flags": 0,
                    "global_name": "Tester"
                },
                "discord_status": "idle",
                "activities": [],
                "listening_to_spotify": false,
                "spotify": null,
                "active_on_discord_desktop": false,
                "active_on_discord_mobile": true,
                "active_on_discord_web": false
            }
        }"#
    }

    #[tokio::test]
    async fn test_fetch_success_parses_snapshot() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/users/728076716219695148")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(success_body())
            .create_async()
            .await;

        let client = LanyardClient::with_base_url(server.url(), "728076716219695148");
        let snapshot = client.fetch_presence().await.unwrap();

        mock.assert_async().await;
        assert_eq!(snapshot.discord_status, Status::Idle);
        assert!(snapshot.active_on_discord_mobile);
    }

    #[tokio::test]
    async fn test_429_reads_retry_after_header() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/42")
            .with_status(429)
            .with_header("Retry-After", "45")
            .create_async()
            .await;

        let client = LanyardClient::with_base_url(server.url(), "42");
        let err = client.fetch_presence().await.unwrap_err();
        match err {
            FetchError::RateLimited { retry_after } => assert_eq!(retry_after, 45),
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_429_without_header_defaults_to_60() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/42")
            .with_status(429)
            .create_async()
            .await;

        let client = LanyardClient::with_base_url(server.url(), "42");
        let err = client.fetch_presence().await.unwrap_err();
        match err {
            FetchError::RateLimited { retry_after } => {
                assert_eq!(retry_after, DEFAULT_RETRY_AFTER_SECS)
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_maps_to_http() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/42")
            .with_status(500)
            .create_async()
            .await;

        let client = LanyardClient::with_base_url(server.url(), "42");
        let err = client.fetch_presence().await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Http(StatusCode::INTERNAL_SERVER_ERROR)
        ));
        assert_eq!(err.to_string(), "HTTP error: 500");
    }

    #[tokio::test]
    async fn test_payload_failure_maps_to_api_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/42")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": false, "error": {"message": "User is not being monitored"}}"#)
            .create_async()
            .await;

        let client = LanyardClient::with_base_url(server.url(), "42");
        let err = client.fetch_presence().await.unwrap_err();
        match err {
            FetchError::Api(msg) => assert_eq!(msg, "User is not being monitored"),
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_payload_failure_without_message_uses_default() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/42")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": false}"#)
            .create_async()
            .await;

        let client = LanyardClient::with_base_url(server.url(), "42");
        let err = client.fetch_presence().await.unwrap_err();
        match err {
            FetchError::Api(msg) => assert_eq!(msg, "Invalid API response"),
            other => panic!("expected Api, got {:?}", other),
        }
    }
}
