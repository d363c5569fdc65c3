//! Delivery of built payloads to the Google Chat webhook.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::payload::GoogleChatPayload;

/// Seconds to report when a 429 response carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Submits a payload; any `Err` means the message was not delivered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post a payload as JSON.
    async fn post(&self, payload: &GoogleChatPayload) -> Result<(), ChannelError>;
}

/// Incoming-webhook client.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    webhook_url: String,
    client: reqwest::Client,
}

impl WebhookClient {
    /// Create a client for `webhook_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns [`ChannelError::NotConfigured`] for an empty URL and
    /// [`ChannelError::Http`] if the HTTP client cannot be built.
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, ChannelError> {
        let webhook_url = webhook_url.into();
        if webhook_url.trim().is_empty() {
            return Err(ChannelError::NotConfigured(
                crate::config::ENV_WEBHOOK_URL.to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("alert-notify/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl Transport for WebhookClient {
    async fn post(&self, payload: &GoogleChatPayload) -> Result<(), ChannelError> {
        debug!(channel = "googlechat", "Sending notification");

        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await?;

        if response.status().is_success() {
            debug!(channel = "googlechat", "Notification sent successfully");
            Ok(())
        } else if response.status() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

            warn!(
                channel = "googlechat",
                retry_after_secs = retry_after,
                "Rate limited by Google Chat"
            );

            Err(ChannelError::RateLimited {
                retry_after_secs: retry_after,
            })
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(
                channel = "googlechat",
                status = %status,
                body = %body,
                "Google Chat webhook request failed"
            );

            Err(ChannelError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> GoogleChatPayload {
        GoogleChatPayload {
            text: "ALERT r1".to_string(),
            cards: vec![],
        }
    }

    fn client_for(server: &MockServer) -> WebhookClient {
        WebhookClient::new(format!("{}/v1/spaces/AAA/messages", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_url() {
        assert!(matches!(
            WebhookClient::new("  ", Duration::from_secs(1)),
            Err(ChannelError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_post_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/spaces/AAA/messages"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"text": "ALERT r1"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).post(&payload()).await.unwrap();
    }

    #[tokio::test]
    async fn test_post_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).post(&payload()).await.unwrap_err();
        match err {
            ChannelError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "backend unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_post_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).post(&payload()).await.unwrap_err();
        assert!(matches!(
            err,
            ChannelError::RateLimited {
                retry_after_secs: 30
            }
        ));
    }

    #[tokio::test]
    async fn test_post_connection_refused() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = WebhookClient::new(format!("http://{addr}/hook"), Duration::from_secs(5)).unwrap();

        let err = client.post(&payload()).await.unwrap_err();
        assert!(matches!(err, ChannelError::Http(_)));
    }
}
