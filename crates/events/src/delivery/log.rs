//! Notifier used when no external channel is configured.

use async_trait::async_trait;
use greendelivery_core::sink::{Notifier, NotifyError};

/// Writes alert summaries to the log and nowhere else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, summary: &str) -> Result<(), NotifyError> {
        tracing::info!(summary, "Alert notification (no webhook configured)");
        Ok(())
    }
}
