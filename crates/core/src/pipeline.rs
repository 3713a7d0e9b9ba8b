//! Per-reading ingest orchestration.
//!
//! One ingestion attempt runs:
//!
//! ```text
//! validate -> evaluate -> store_reading -> [store_alert -> notify]
//! ```
//!
//! - A validation failure rejects the reading with no side effects.
//! - A `store_reading` failure (or timeout) fails the attempt; the alert
//!   steps never run so the transport can redeliver cleanly.
//! - `store_alert` and `notify` are best-effort: failures are logged and
//!   recorded in the [`IngestOutcome`] but never fail the attempt. `notify`
//!   runs whatever happened to `store_alert`.
//!
//! Nothing here retries. Redelivery is the upstream transport's job.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::alert::{AlertReason, AlertRecord};
use crate::reading::{validate_at, RawReading, Reading, ValidationError};
use crate::rules::RulePolicy;
use crate::sink::{Notifier, NotifyError, PersistenceSink, ReadingPublisher, StoreError};

/// Default bound on a single sink or notifier call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of readings processed concurrently by a batch.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 16;

// ---------------------------------------------------------------------------
// Outcome / error types
// ---------------------------------------------------------------------------

/// Why an ingestion attempt did not complete.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IngestError {
    /// The reading failed validation. Never worth retrying.
    #[error("reading rejected: {0}")]
    Rejected(#[from] ValidationError),

    /// The reading could not be durably recorded. Safe to redeliver.
    #[error("failed to store reading: {0}")]
    Store(#[source] StoreError),
}

/// Result of one best-effort step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    /// The step did not apply (no alerts were raised).
    Skipped,
    Succeeded,
    Failed(String),
}

impl StepStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// What happened during a successful ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub reading: Reading,
    pub reasons: Vec<AlertReason>,
    pub alert_store: StepStatus,
    pub notification: StepStatus,
}

impl IngestOutcome {
    /// The alert reasons as display strings, for API responses.
    pub fn reason_messages(&self) -> Vec<String> {
        self.reasons.iter().map(|r| r.message.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// IngestPipeline
// ---------------------------------------------------------------------------

/// Validates, evaluates and persists readings through injected collaborators.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and there is
/// no interior mutable state, so any number of tasks may ingest at once.
pub struct IngestPipeline {
    policy: RulePolicy,
    sink: Arc<dyn PersistenceSink>,
    notifier: Arc<dyn Notifier>,
    call_timeout: Duration,
}

impl IngestPipeline {
    pub fn new(
        policy: RulePolicy,
        sink: Arc<dyn PersistenceSink>,
        notifier: Arc<dyn Notifier>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            policy,
            sink,
            notifier,
            call_timeout,
        }
    }

    pub fn policy(&self) -> &RulePolicy {
        &self.policy
    }

    /// Run one full ingestion attempt for a raw reading.
    pub async fn ingest(&self, raw: &RawReading) -> Result<IngestOutcome, IngestError> {
        let reading = validate_at(raw, Utc::now()).map_err(|e| {
            tracing::debug!(
                shipment_id = raw.shipment_id.as_deref().unwrap_or(""),
                field = e.field(),
                error = %e,
                "Reading rejected"
            );
            IngestError::Rejected(e)
        })?;
        self.process(reading).await
    }

    /// Run the post-validation steps for an already validated reading.
    pub async fn process(&self, reading: Reading) -> Result<IngestOutcome, IngestError> {
        let reasons = self.policy.evaluate(&reading);

        if let Err(e) = store_within(self.call_timeout, self.sink.store_reading(&reading)).await {
            tracing::error!(
                shipment_id = reading.shipment_id(),
                error = %e,
                "Failed to store reading"
            );
            return Err(IngestError::Store(e));
        }

        let Some(record) =
            AlertRecord::new(reading.shipment_id(), reading.timestamp(), reasons.clone())
        else {
            tracing::debug!(shipment_id = reading.shipment_id(), "Reading stored, no alerts");
            return Ok(IngestOutcome {
                reading,
                reasons,
                alert_store: StepStatus::Skipped,
                notification: StepStatus::Skipped,
            });
        };

        tracing::info!(
            shipment_id = reading.shipment_id(),
            severity = %record.max_severity(),
            reasons = reasons.len(),
            "Alert raised"
        );

        let alert_store =
            match store_within(self.call_timeout, self.sink.store_alert(&record)).await {
                Ok(()) => StepStatus::Succeeded,
                Err(e) => {
                    tracing::warn!(
                        shipment_id = reading.shipment_id(),
                        error = %e,
                        "Failed to store alert, continuing"
                    );
                    StepStatus::Failed(e.to_string())
                }
            };

        let summary = record.summary();
        let notification =
            match notify_within(self.call_timeout, self.notifier.notify(&summary)).await {
                Ok(()) => StepStatus::Succeeded,
                Err(e) => {
                    tracing::warn!(
                        shipment_id = reading.shipment_id(),
                        error = %e,
                        "Failed to send alert notification"
                    );
                    StepStatus::Failed(e.to_string())
                }
            };

        Ok(IngestOutcome {
            reading,
            reasons,
            alert_store,
            notification,
        })
    }

    /// Ingest many readings with at most `concurrency` in flight.
    ///
    /// Results are returned in input order; one reading's failure does not
    /// affect the others.
    pub async fn ingest_batch(
        &self,
        raws: &[RawReading],
        concurrency: usize,
    ) -> Vec<Result<IngestOutcome, IngestError>> {
        stream::iter(raws)
            .map(|raw| self.ingest(raw))
            .buffered(concurrency.max(1))
            .boxed()
            .collect()
            .await
    }
}

// ---------------------------------------------------------------------------
// Forwarder
// ---------------------------------------------------------------------------

/// Result of forwarding a reading to the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOutcome {
    pub reading: Reading,
    /// Reasons the processor will raise once it consumes the message.
    pub reasons: Vec<AlertReason>,
    pub message_id: String,
}

/// Queue-mode front end: validates and publishes instead of storing.
///
/// Alerts are not persisted or notified here; the processor consuming the
/// queue runs the full [`IngestPipeline`]. The reasons are still evaluated
/// so the caller gets the same response shape as in direct mode.
pub struct Forwarder {
    policy: RulePolicy,
    publisher: Arc<dyn ReadingPublisher>,
    call_timeout: Duration,
}

impl Forwarder {
    pub fn new(
        policy: RulePolicy,
        publisher: Arc<dyn ReadingPublisher>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            policy,
            publisher,
            call_timeout,
        }
    }

    pub async fn forward(&self, raw: &RawReading) -> Result<ForwardOutcome, IngestError> {
        let reading = validate_at(raw, Utc::now())?;
        let reasons = self.policy.evaluate(&reading);

        let message_id = store_within(self.call_timeout, self.publisher.publish(&reading))
            .await
            .map_err(|e| {
                tracing::error!(
                    shipment_id = reading.shipment_id(),
                    error = %e,
                    "Failed to publish reading"
                );
                IngestError::Store(e)
            })?;

        tracing::debug!(
            shipment_id = reading.shipment_id(),
            message_id = %message_id,
            "Reading forwarded to queue"
        );

        Ok(ForwardOutcome {
            reading,
            reasons,
            message_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

async fn store_within<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(StoreError::Timeout(limit)))
}

async fn notify_within(
    limit: Duration,
    call: impl Future<Output = Result<(), NotifyError>>,
) -> Result<(), NotifyError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(NotifyError::Timeout(limit)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
