use axum::routing::get;
use axum::Router;

use crate::handlers::shipments;
use crate::state::AppState;

/// Routes mounted at `/shipments`.
///
/// ```text
/// GET /{shipment_id}/readings  -> list_readings
/// GET /{shipment_id}/alerts    -> list_alerts
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{shipment_id}/readings", get(shipments::list_readings))
        .route("/{shipment_id}/alerts", get(shipments::list_alerts))
}
