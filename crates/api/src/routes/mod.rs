pub mod health;
pub mod ingest;
pub mod queue;
pub mod shipments;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ingest                              POST single reading
/// /ingest/batch                        POST array of readings
///
/// /queue/push                          POST queue push subscription
///
/// /shipments/{shipment_id}/readings    GET recent readings
/// /shipments/{shipment_id}/alerts      GET recent alerts
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/ingest", ingest::router())
        .nest("/queue", queue::router())
        .nest("/shipments", shipments::router())
}
