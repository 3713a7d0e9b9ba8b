//! Queue publisher for the forwarding ingest mode.
//!
//! Publishes readings to a Pub/Sub topic through the REST `:publish` call:
//!
//! ```text
//! POST {endpoint}/v1/projects/{project}/topics/{topic}:publish
//! {"messages": [{"data": "<base64 JSON reading>", "attributes": {"shipment_id": "..."}}]}
//! ```
//!
//! The local emulator needs no credentials; against the hosted service a
//! bearer token must be supplied.

use std::time::Duration;

use async_trait::async_trait;
use greendelivery_core::envelope::encode_data;
use greendelivery_core::reading::Reading;
use greendelivery_core::sink::{ReadingPublisher, StoreError};
use serde::Deserialize;

/// HTTP request timeout for a single publish call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_ENDPOINT: &str = "http://localhost:8085";
const DEFAULT_PROJECT_ID: &str = "green-delivery-local";
const DEFAULT_TOPIC: &str = "greendelivery-telemetry-events";

// ---------------------------------------------------------------------------
// PubSubConfig
// ---------------------------------------------------------------------------

/// Topic coordinates and credentials for publishing.
#[derive(Debug, Clone)]
pub struct PubSubConfig {
    /// Base URL of the Pub/Sub REST API (or emulator).
    pub endpoint: String,
    pub project_id: String,
    pub topic: String,
    /// OAuth bearer token; not needed for the emulator.
    pub access_token: Option<String>,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            access_token: None,
        }
    }
}

impl PubSubConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable              | Default                            |
    /// |-----------------------|------------------------------------|
    /// | `PUBSUB_ENDPOINT`     | `http://localhost:8085`            |
    /// | `PUBSUB_PROJECT_ID`   | `green-delivery-local`             |
    /// | `PUBSUB_TOPIC`        | `greendelivery-telemetry-events`   |
    /// | `PUBSUB_ACCESS_TOKEN` | --                                 |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            endpoint: lookup("PUBSUB_ENDPOINT").unwrap_or(defaults.endpoint),
            project_id: lookup("PUBSUB_PROJECT_ID").unwrap_or(defaults.project_id),
            topic: lookup("PUBSUB_TOPIC").unwrap_or(defaults.topic),
            access_token: lookup("PUBSUB_ACCESS_TOKEN").filter(|t| !t.is_empty()),
        }
    }

    /// Fully qualified topic path, `projects/{project}/topics/{topic}`.
    pub fn topic_path(&self) -> String {
        format!("projects/{}/topics/{}", self.project_id, self.topic)
    }

    fn publish_url(&self) -> String {
        format!(
            "{}/v1/{}:publish",
            self.endpoint.trim_end_matches('/'),
            self.topic_path()
        )
    }
}

// ---------------------------------------------------------------------------
// PubSubPublisher
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(default, rename = "messageIds")]
    message_ids: Vec<String>,
}

/// Publishes validated readings to the configured topic.
pub struct PubSubPublisher {
    client: reqwest::Client,
    config: PubSubConfig,
    publish_url: String,
}

impl PubSubPublisher {
    pub fn new(config: PubSubConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let publish_url = config.publish_url();
        Ok(Self {
            client,
            config,
            publish_url,
        })
    }

    pub fn topic_path(&self) -> String {
        self.config.topic_path()
    }
}

/// Request body for one reading.
fn publish_body(reading: &Reading) -> Result<serde_json::Value, serde_json::Error> {
    Ok(serde_json::json!({
        "messages": [{
            "data": encode_data(reading)?,
            "attributes": { "shipment_id": reading.shipment_id() },
        }]
    }))
}

#[async_trait]
impl ReadingPublisher for PubSubPublisher {
    async fn publish(&self, reading: &Reading) -> Result<String, StoreError> {
        let body = publish_body(reading).map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut request = self.client.post(&self.publish_url).json(&body);
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(StoreError::Unavailable(format!("queue returned HTTP {status}")));
        }
        if !status.is_success() {
            return Err(StoreError::Backend(format!("queue returned HTTP {status}")));
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        parsed
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("queue returned no message id".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use greendelivery_core::envelope::decode_push;
    use greendelivery_core::reading::{validate, RawReading};

    use super::*;

    fn config(endpoint: &str) -> PubSubConfig {
        PubSubConfig {
            endpoint: endpoint.to_string(),
            project_id: "green-delivery-27c13".to_string(),
            topic: "greendelivery-telemetry-events".to_string(),
            access_token: None,
        }
    }

    #[test]
    fn empty_access_token_is_ignored() {
        let config = PubSubConfig::from_lookup(|key| match key {
            "PUBSUB_TOPIC" => Some("readings".to_string()),
            "PUBSUB_ACCESS_TOKEN" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.topic_path(), "projects/green-delivery-local/topics/readings");
        assert_eq!(config.access_token, None);
    }

    #[test]
    fn publish_url_targets_topic() {
        assert_eq!(
            config("http://localhost:8085/").publish_url(),
            "http://localhost:8085/v1/projects/green-delivery-27c13/topics/greendelivery-telemetry-events:publish"
        );
    }

    #[test]
    fn published_data_is_what_the_push_endpoint_decodes() {
        let reading = validate(&RawReading::new("GD-1").temperature(9.5)).unwrap();
        let body = publish_body(&reading).unwrap();
        let message = &body["messages"][0];
        assert_eq!(message["attributes"]["shipment_id"], "GD-1");

        // Wrap the published message the way a push subscription delivers it.
        let push = serde_json::json!({ "message": { "data": message["data"] } });
        let decoded = decode_push(&serde_json::to_vec(&push).unwrap()).unwrap();
        assert_eq!(decoded.reading.temperature_c, Some(9.5));
    }

    #[tokio::test]
    async fn unreachable_queue_is_unavailable() {
        let publisher = PubSubPublisher::new(config("http://127.0.0.1:1")).unwrap();
        let reading = validate(&RawReading::new("GD-1")).unwrap();
        assert_matches!(
            publisher.publish(&reading).await,
            Err(StoreError::Unavailable(_))
        );
    }
}
