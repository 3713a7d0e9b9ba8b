//! Database-backed [`PersistenceSink`].

use async_trait::async_trait;
use greendelivery_core::alert::AlertRecord;
use greendelivery_core::reading::Reading;
use greendelivery_core::sink::{PersistenceSink, StoreError};

use crate::repositories::{AlertRepo, TelemetryRepo};
use crate::DbPool;

/// Stores readings in `telemetry` and alerts in `alerts`.
#[derive(Clone)]
pub struct PgSink {
    pool: DbPool,
}

impl PgSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersistenceSink for PgSink {
    async fn store_reading(&self, reading: &Reading) -> Result<(), StoreError> {
        let id = TelemetryRepo::insert(&self.pool, reading)
            .await
            .map_err(classify_sqlx_error)?;
        tracing::debug!(id, shipment_id = reading.shipment_id(), "Reading stored");
        Ok(())
    }

    async fn store_alert(&self, alert: &AlertRecord) -> Result<(), StoreError> {
        let id = AlertRepo::insert(&self.pool, alert)
            .await
            .map_err(classify_sqlx_error)?;
        tracing::debug!(id, shipment_id = alert.shipment_id(), "Alert stored");
        Ok(())
    }
}

/// Map a sqlx error onto the sink error taxonomy.
///
/// Connection-level problems become [`StoreError::Unavailable`]; anything
/// the server itself rejected becomes [`StoreError::Backend`].
fn classify_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_unavailable() {
        assert!(matches!(
            classify_sqlx_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn missing_row_is_backend_error() {
        assert!(matches!(
            classify_sqlx_error(sqlx::Error::RowNotFound),
            StoreError::Backend(_)
        ));
    }

    #[test]
    fn io_error_is_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            classify_sqlx_error(sqlx::Error::Io(io)),
            StoreError::Unavailable(_)
        ));
    }
}
