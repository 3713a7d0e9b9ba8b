use axum::routing::post;
use axum::Router;

use crate::handlers::queue;
use crate::state::AppState;

/// Routes mounted at `/queue`.
///
/// ```text
/// POST /push  -> receive_push
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/push", post(queue::receive_push))
}
