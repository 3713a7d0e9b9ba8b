//! Repository for the `alerts` table.

use greendelivery_core::alert::AlertRecord;
use greendelivery_core::types::DbId;
use sqlx::PgPool;

use crate::models::alert::AlertRow;

/// Column list for `alerts` SELECT queries.
const COLUMNS: &str = "\
    id, shipment_id, recorded_at, severity, kinds, reasons, resolved, created_at";

/// Provides query operations for alert records.
pub struct AlertRepo;

impl AlertRepo {
    /// Insert an alert record, returning the generated ID.
    pub async fn insert(pool: &PgPool, alert: &AlertRecord) -> Result<DbId, sqlx::Error> {
        let kinds: Vec<&str> = alert.reasons().iter().map(|r| r.kind.as_str()).collect();
        let reasons = serde_json::to_value(alert.reasons())
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        sqlx::query_scalar(
            "INSERT INTO alerts \
                (shipment_id, recorded_at, severity, kinds, reasons, resolved) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(alert.shipment_id())
        .bind(alert.timestamp())
        .bind(alert.max_severity().as_str())
        .bind(&kinds)
        .bind(&reasons)
        .bind(alert.resolved())
        .fetch_one(pool)
        .await
    }

    /// Most recent alerts for a shipment, newest first.
    pub async fn list_for_shipment(
        pool: &PgPool,
        shipment_id: &str,
        limit: i64,
    ) -> Result<Vec<AlertRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alerts \
             WHERE shipment_id = $1 \
             ORDER BY recorded_at DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, AlertRow>(&query)
            .bind(shipment_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
