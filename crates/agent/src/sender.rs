//! HTTP push loop.
//!
//! Posts one simulated reading per tick to the ingest endpoint and logs what
//! the server made of it. Failed sends are logged and the loop carries on;
//! the next tick produces a fresh reading rather than resending the old one.

use std::time::Duration;

use chrono::Utc;
use greendelivery_core::reading::RawReading;
use rand::Rng;
use serde::Deserialize;

use crate::simulator::SensorSimulator;

/// HTTP request timeout for a single send.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// 4xx: the server refused this reading; resending will not help.
    #[error("reading rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// 5xx: the server could not store the reading right now.
    #[error("ingest endpoint unavailable (HTTP {0})")]
    Unavailable(u16),
}

/// Body of a successful ingest response.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestAck {
    pub ok: bool,
    #[serde(default)]
    pub alert_reasons: Vec<String>,
}

/// Running totals for one agent session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SendStats {
    pub sent: u64,
    pub accepted: u64,
    /// Readings the server answered with at least one alert reason.
    pub alerted: u64,
    pub failed: u64,
}

impl SendStats {
    pub fn record(&mut self, result: &Result<IngestAck, SendError>) {
        self.sent += 1;
        match result {
            Ok(ack) => {
                self.accepted += 1;
                if !ack.alert_reasons.is_empty() {
                    self.alerted += 1;
                }
            }
            Err(_) => self.failed += 1,
        }
    }
}

pub fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()
}

/// Map a non-success status to its error.
fn status_error(status: u16, body: String) -> SendError {
    if status >= 500 {
        SendError::Unavailable(status)
    } else {
        SendError::Rejected { status, body }
    }
}

/// POST one reading to `url`.
pub async fn send_reading(
    client: &reqwest::Client,
    url: &str,
    reading: &RawReading,
) -> Result<IngestAck, SendError> {
    let response = client.post(url).json(reading).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status.as_u16(), body));
    }

    Ok(response.json().await?)
}

/// Send a reading every `interval` until `max_readings` have been sent
/// (forever when `None`).
pub async fn run<R: Rng>(
    client: &reqwest::Client,
    url: &str,
    interval: Duration,
    simulator: &mut SensorSimulator<R>,
    max_readings: Option<u64>,
) -> SendStats {
    let mut stats = SendStats::default();
    let mut ticker = tokio::time::interval(interval);

    loop {
        if max_readings.is_some_and(|max| stats.sent >= max) {
            break;
        }
        ticker.tick().await;

        let reading = simulator.next_reading(Utc::now());
        let result = send_reading(client, url, &reading).await;

        match &result {
            Ok(ack) if ack.alert_reasons.is_empty() => {
                tracing::debug!(shipment_id = simulator.shipment_id(), "Reading accepted");
            }
            Ok(ack) => {
                tracing::warn!(
                    shipment_id = simulator.shipment_id(),
                    reasons = ?ack.alert_reasons,
                    "Reading accepted with alerts"
                );
            }
            Err(e) => {
                tracing::error!(
                    shipment_id = simulator.shipment_id(),
                    error = %e,
                    "Send failed"
                );
            }
        }
        stats.record(&result);

        if stats.sent % 10 == 0 {
            tracing::info!(
                sent = stats.sent,
                accepted = stats.accepted,
                alerted = stats.alerted,
                failed = stats.failed,
                "Agent progress"
            );
        }
    }

    stats
}
