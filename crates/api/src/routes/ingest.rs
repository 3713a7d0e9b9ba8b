use axum::routing::post;
use axum::Router;

use crate::handlers::ingest;
use crate::state::AppState;

/// Routes mounted at `/ingest`.
///
/// ```text
/// POST /       -> ingest_reading
/// POST /batch  -> ingest_batch
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(ingest::ingest_reading))
        .route("/batch", post(ingest::ingest_batch))
}
