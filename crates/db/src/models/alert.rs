//! Alert rows.

use greendelivery_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A stored alert from the `alerts` table.
///
/// `reasons` holds the serialized
/// [`AlertReason`](greendelivery_core::alert::AlertReason) list in
/// evaluation order.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlertRow {
    pub id: DbId,
    pub shipment_id: String,
    pub recorded_at: Timestamp,
    pub severity: String,
    pub kinds: Vec<String>,
    pub reasons: serde_json::Value,
    pub resolved: bool,
    pub created_at: Timestamp,
}
