//! Repository for the `telemetry` table (append-only time-series).

use greendelivery_core::reading::Reading;
use greendelivery_core::types::DbId;
use sqlx::PgPool;

use crate::models::telemetry::TelemetryRow;

/// Column list for `telemetry` SELECT queries.
const COLUMNS: &str = "\
    id, shipment_id, recorded_at, \
    temperature_c, humidity_pct, g_force, lat, lon, \
    created_at";

/// Provides query operations for telemetry readings.
pub struct TelemetryRepo;

impl TelemetryRepo {
    /// Insert a validated reading, returning the generated ID.
    pub async fn insert(pool: &PgPool, reading: &Reading) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO telemetry \
                (shipment_id, recorded_at, temperature_c, humidity_pct, g_force, lat, lon) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(reading.shipment_id())
        .bind(reading.timestamp())
        .bind(reading.temperature_c())
        .bind(reading.humidity_pct())
        .bind(reading.g_force())
        .bind(reading.lat())
        .bind(reading.lon())
        .fetch_one(pool)
        .await
    }

    /// Most recent readings for a shipment, newest first.
    pub async fn list_for_shipment(
        pool: &PgPool,
        shipment_id: &str,
        limit: i64,
    ) -> Result<Vec<TelemetryRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM telemetry \
             WHERE shipment_id = $1 \
             ORDER BY recorded_at DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, TelemetryRow>(&query)
            .bind(shipment_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
