//! Slack incoming-webhook client for moderator notifications and job
//! failure alerts.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SlackConfig;

#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Slack webhook not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack webhook returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

#[derive(Clone)]
pub struct SlackClient {
    client: Client,
    webhook_url: Option<String>,
    channel: String,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self, SlackError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let webhook_url = (config.enabled && !config.webhook_url.is_empty())
            .then(|| config.webhook_url.clone());

        Ok(Self {
            client,
            webhook_url,
            channel: config.channel.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Prefixes the channel label, if any.
    pub fn format(&self, text: &str) -> String {
        if self.channel.is_empty() {
            text.to_string()
        } else {
            format!("[{}] {}", self.channel, text)
        }
    }

    /// Posts a message. A disabled client drops the message.
    pub async fn post(&self, text: &str) -> Result<(), SlackError> {
        let Some(url) = self.webhook_url.as_deref() else {
            debug!("Slack disabled, dropping message");
            return Ok(());
        };

        let text = self.format(text);
        let response = self
            .client
            .post(url)
            .json(&WebhookMessage { text: &text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Slack notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn config(url: String) -> SlackConfig {
        SlackConfig {
            enabled: true,
            webhook_url: url,
            channel: "ceres-alertas".to_string(),
            timeout_ms: 2_000,
        }
    }

    #[tokio::test]
    async fn test_post_sends_prefixed_text() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/hook")
                    .json_body(serde_json::json!({ "text": "[ceres-alertas] Nuevo profesional" }));
                then.status(200).body("ok");
            })
            .await;

        let client = SlackClient::new(&config(server.url("/hook"))).unwrap();
        client.post("Nuevo profesional").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_surfaces_rejection() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/hook");
                then.status(404).body("no_service");
            })
            .await;

        let client = SlackClient::new(&config(server.url("/hook"))).unwrap();
        let err = client.post("hola").await.unwrap_err();
        match err {
            SlackError::Rejected { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "no_service");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disabled_client_is_noop() {
        let mut cfg = config(String::new());
        cfg.enabled = false;
        let client = SlackClient::new(&cfg).unwrap();
        assert!(!client.is_enabled());
        client.post("hola").await.unwrap();
    }

    #[test]
    fn test_format_without_channel() {
        let mut cfg = config("http://localhost/hook".into());
        cfg.channel.clear();
        let client = SlackClient::new(&cfg).unwrap();
        assert_eq!(client.format("hola"), "hola");
    }
}
