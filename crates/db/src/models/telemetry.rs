//! Telemetry reading rows.

use greendelivery_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A stored reading from the `telemetry` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TelemetryRow {
    pub id: DbId,
    pub shipment_id: String,
    pub recorded_at: Timestamp,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub g_force: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub created_at: Timestamp,
}
