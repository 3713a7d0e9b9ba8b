//! Seams to the outside world: where readings and alerts are stored, where
//! alert summaries are sent, and where readings are forwarded in queue mode.
//!
//! Implementations live in other crates (`greendelivery-db`,
//! `greendelivery-events`) or in [`crate::memory`]; the pipeline only sees
//! these traits.

use std::time::Duration;

use async_trait::async_trait;

use crate::alert::AlertRecord;
use crate::reading::Reading;

/// Failure of a storage (or queue hand-off) call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend was reached but refused or failed the write.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The call did not finish within the per-call timeout.
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of a notification call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("notification endpoint returned HTTP {0}")]
    HttpStatus(u16),

    #[error("notification timed out after {0:?}")]
    Timeout(Duration),
}

/// Durable storage for readings and alerts.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Store a validated reading. Failure fails the whole ingestion.
    async fn store_reading(&self, reading: &Reading) -> Result<(), StoreError>;

    /// Store an alert record. Best-effort from the pipeline's point of view.
    async fn store_alert(&self, alert: &AlertRecord) -> Result<(), StoreError>;
}

/// Delivery of alert summaries to humans (chat webhook, pager, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &str) -> Result<(), NotifyError>;
}

/// Hand-off of validated readings to a message queue.
///
/// In forwarding mode the queue is the durable record, so a publish failure
/// carries the same weight as a failed `store_reading`.
#[async_trait]
pub trait ReadingPublisher: Send + Sync {
    /// Publish `reading`, returning the queue's message id.
    async fn publish(&self, reading: &Reading) -> Result<String, StoreError>;
}
