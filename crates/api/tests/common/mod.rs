#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use greendelivery_api::config::{IngestMode, ServerConfig, StorageBackend};
use greendelivery_api::router::build_app_router;
use greendelivery_api::state::AppState;
use greendelivery_core::alert::AlertRecord;
use greendelivery_core::memory::MemorySink;
use greendelivery_core::pipeline::{Forwarder, IngestPipeline};
use greendelivery_core::reading::Reading;
use greendelivery_core::sink::{
    Notifier, NotifyError, PersistenceSink, ReadingPublisher, StoreError,
};

/// Build a test `ServerConfig` with safe defaults and the in-memory store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        sink_timeout_secs: 1,
        storage: StorageBackend::Memory,
        ..ServerConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// In-memory sink whose two writes can be made to fail independently.
#[derive(Default)]
pub struct ScriptedSink {
    pub inner: MemorySink,
    pub fail_readings: bool,
    pub fail_alerts: bool,
}

#[async_trait]
impl PersistenceSink for ScriptedSink {
    async fn store_reading(&self, reading: &Reading) -> Result<(), StoreError> {
        if self.fail_readings {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        self.inner.store_reading(reading).await
    }

    async fn store_alert(&self, alert: &AlertRecord) -> Result<(), StoreError> {
        if self.fail_alerts {
            return Err(StoreError::Backend("alerts table locked".into()));
        }
        self.inner.store_alert(alert).await
    }
}

/// Records every summary it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, summary: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(summary.to_string());
        if self.fail {
            return Err(NotifyError::HttpStatus(500));
        }
        Ok(())
    }
}

/// Publisher that hands out sequential message ids, or always fails.
#[derive(Default)]
pub struct StubPublisher {
    pub published: Mutex<Vec<Reading>>,
    pub fail: bool,
}

#[async_trait]
impl ReadingPublisher for StubPublisher {
    async fn publish(&self, reading: &Reading) -> Result<String, StoreError> {
        if self.fail {
            return Err(StoreError::Unavailable("queue unreachable".into()));
        }
        let mut published = self.published.lock().unwrap();
        published.push(reading.clone());
        Ok(format!("msg-{}", published.len()))
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// A router plus handles on its test doubles.
pub struct TestApp {
    pub router: Router,
    pub sink: Arc<ScriptedSink>,
    pub notifier: Arc<RecordingNotifier>,
    pub publisher: Option<Arc<StubPublisher>>,
}

/// Build the full application router in direct mode around the given doubles.
///
/// Uses the same [`build_app_router`] as `main.rs` so the middleware stack
/// (CORS, request ID, timeout, tracing, panic recovery) is exercised.
pub fn build_test_app(sink: ScriptedSink, notifier: RecordingNotifier) -> TestApp {
    build_app(test_config(), sink, notifier, None)
}

/// Direct mode with a healthy sink and notifier.
pub fn default_app() -> TestApp {
    build_test_app(ScriptedSink::default(), RecordingNotifier::default())
}

/// Queue mode: the ingest endpoints publish through `publisher`.
pub fn build_forwarding_app(publisher: StubPublisher) -> TestApp {
    let config = ServerConfig {
        ingest_mode: IngestMode::Queue,
        ..test_config()
    };
    build_app(
        config,
        ScriptedSink::default(),
        RecordingNotifier::default(),
        Some(publisher),
    )
}

/// Direct mode backed by Postgres, as deployed.
pub fn build_pg_app(pool: sqlx::PgPool) -> Router {
    let config = ServerConfig {
        storage: StorageBackend::Postgres,
        ..test_config()
    };
    let pipeline = Arc::new(IngestPipeline::new(
        config.rules.clone(),
        Arc::new(greendelivery_db::PgSink::new(pool.clone())),
        Arc::new(RecordingNotifier::default()),
        Duration::from_secs(config.sink_timeout_secs),
    ));
    let state = AppState {
        pool: Some(pool),
        config: Arc::new(config.clone()),
        pipeline,
        forwarder: None,
    };
    build_app_router(state, &config).unwrap()
}

fn build_app(
    config: ServerConfig,
    sink: ScriptedSink,
    notifier: RecordingNotifier,
    publisher: Option<StubPublisher>,
) -> TestApp {
    let sink = Arc::new(sink);
    let notifier = Arc::new(notifier);
    let publisher = publisher.map(Arc::new);
    let timeout = Duration::from_secs(config.sink_timeout_secs);

    let pipeline = Arc::new(IngestPipeline::new(
        config.rules.clone(),
        sink.clone(),
        notifier.clone(),
        timeout,
    ));
    let forwarder = publisher.clone().map(|p| {
        Arc::new(Forwarder::new(
            config.rules.clone(),
            p as Arc<dyn ReadingPublisher>,
            timeout,
        ))
    });

    let state = AppState {
        pool: None,
        config: Arc::new(config.clone()),
        pipeline,
        forwarder,
    };

    TestApp {
        router: build_app_router(state, &config).unwrap(),
        sink,
        notifier,
        publisher,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_bytes(app, uri, serde_json::to_vec(&body).unwrap()).await
}

pub async fn post_bytes(app: Router, uri: &str, body: impl Into<Body>) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
