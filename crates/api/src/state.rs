use std::sync::Arc;

use greendelivery_core::pipeline::{Forwarder, IngestPipeline};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything heavy sits behind `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database pool; `None` when running with the in-memory store.
    pub pool: Option<greendelivery_db::DbPool>,
    pub config: Arc<ServerConfig>,
    /// Store-evaluate-notify pipeline used by direct ingest and queue push.
    pub pipeline: Arc<IngestPipeline>,
    /// Present in queue mode: the ingest endpoints publish instead of storing.
    pub forwarder: Option<Arc<Forwarder>>,
}
