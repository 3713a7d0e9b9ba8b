//! `greendelivery-agent` -- simulated cold-chain tracker.
//!
//! Generates synthetic readings for one shipment and pushes them to the
//! ingest endpoint, injecting refrigeration failures and impacts at
//! configurable rates. Useful for demos and for load-testing a deployment.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default                                  |
//! |-----------------------|----------|------------------------------------------|
//! | `INGEST_URL`          | no       | `http://localhost:3000/api/v1/ingest`    |
//! | `SHIPMENT_ID`         | no       | random `GD-nnnn`                         |
//! | `SEND_INTERVAL_SECS`  | no       | `5`                                      |
//! | `BREACH_PROBABILITY`  | no       | `0.03`                                   |
//! | `IMPACT_PROBABILITY`  | no       | `0.05`                                   |
//! | `MAX_READINGS`        | no       | unlimited                                |

use std::str::FromStr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greendelivery_agent::sender;
use greendelivery_agent::simulator::{
    random_shipment_id, FaultRates, SensorSimulator, DEFAULT_BREACH_PROBABILITY,
    DEFAULT_IMPACT_PROBABILITY,
};

const DEFAULT_INGEST_URL: &str = "http://localhost:3000/api/v1/ingest";
const DEFAULT_INTERVAL_SECS: u64 = 5;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "greendelivery_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let url = std::env::var("INGEST_URL").unwrap_or_else(|_| DEFAULT_INGEST_URL.to_string());
    let interval_secs: u64 = env_or_exit("SEND_INTERVAL_SECS", DEFAULT_INTERVAL_SECS);
    let interval = Duration::from_secs(interval_secs.max(1));
    let max_readings: Option<u64> = std::env::var("MAX_READINGS")
        .ok()
        .map(|_| env_or_exit("MAX_READINGS", 0));

    let faults = FaultRates::new(
        env_or_exit("BREACH_PROBABILITY", DEFAULT_BREACH_PROBABILITY),
        env_or_exit("IMPACT_PROBABILITY", DEFAULT_IMPACT_PROBABILITY),
    )
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid fault rates");
        std::process::exit(1);
    });

    let mut rng = StdRng::from_os_rng();
    let shipment_id = std::env::var("SHIPMENT_ID")
        .ok()
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| random_shipment_id(&mut rng));

    tracing::info!(
        shipment_id = %shipment_id,
        url = %url,
        interval_secs = interval.as_secs(),
        breach = faults.breach,
        impact = faults.impact,
        "Starting greendelivery-agent",
    );

    let client = sender::build_client().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    let mut simulator = SensorSimulator::new(shipment_id, faults, rng);
    let stats = sender::run(&client, &url, interval, &mut simulator, max_readings).await;

    tracing::info!(
        sent = stats.sent,
        accepted = stats.accepted,
        alerted = stats.alerted,
        failed = stats.failed,
        "Agent finished"
    );
}

/// Parse `key` if set, otherwise `default`. Exits on an unparsable value.
fn env_or_exit<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::error!(key, value = %raw, "Invalid environment variable");
            std::process::exit(1);
        }),
        Err(_) => default,
    }
}
