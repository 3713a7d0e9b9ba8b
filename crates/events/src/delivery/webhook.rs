//! Chat webhook delivery.
//!
//! [`WebhookNotifier`] POSTs `{"text": "<summary>"}` to the configured URL,
//! which is the payload shape Slack-style incoming webhooks accept. A single
//! attempt is made; wrap it in [`RetryNotifier`](super::retry::RetryNotifier)
//! for more.

use std::time::Duration;

use async_trait::async_trait;
use greendelivery_core::sink::{Notifier, NotifyError};

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers alert summaries to an external webhook endpoint.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Build a notifier for `url`.
    ///
    /// Returns `Ok(None)` unless the URL starts with `http`, so an empty or
    /// placeholder `WEBHOOK_URL` simply disables webhook delivery.
    pub fn from_url(url: &str) -> Result<Option<Self>, reqwest::Error> {
        let url = url.trim();
        if !url.starts_with("http") {
            return Ok(None);
        }
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Some(Self {
            client,
            url: url.to_string(),
        }))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// JSON body sent to the webhook.
fn payload(summary: &str) -> serde_json::Value {
    serde_json::json!({ "text": summary })
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, summary: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&payload(summary))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout(REQUEST_TIMEOUT)
                } else {
                    NotifyError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status().as_u16()));
        }
        tracing::debug!(url = %self.url, "Webhook notification delivered");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
