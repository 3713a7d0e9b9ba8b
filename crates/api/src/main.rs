use std::net::SocketAddr;
use std::sync::Arc;

use greendelivery_core::memory::MemorySink;
use greendelivery_core::pipeline::{Forwarder, IngestPipeline};
use greendelivery_core::sink::{Notifier, PersistenceSink};
use greendelivery_events::delivery::retry::DEFAULT_BASE_DELAY;
use greendelivery_events::{LogNotifier, PubSubPublisher, RetryNotifier, WebhookNotifier};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greendelivery_api::config::{IngestMode, ServerConfig, StorageBackend};
use greendelivery_api::router::build_app_router;
use greendelivery_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "greendelivery_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        ingest_mode = config.ingest_mode.as_str(),
        storage = config.storage.as_str(),
        "Loaded server configuration"
    );

    // --- Storage ---
    let pool = match config.storage {
        StorageBackend::Postgres => {
            let pool = greendelivery_db::create_pool(&config.database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            greendelivery_db::health_check(&pool)
                .await
                .expect("Database health check failed");

            greendelivery_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");
            Some(pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; readings are lost on restart");
            None
        }
    };

    let sink: Arc<dyn PersistenceSink> = match &pool {
        Some(pool) => Arc::new(greendelivery_db::PgSink::new(pool.clone())),
        None => Arc::new(MemorySink::new()),
    };

    // --- Notifications ---
    let notifier: Arc<dyn Notifier> = match WebhookNotifier::from_url(&config.webhook_url)
        .expect("Failed to build webhook client")
    {
        Some(webhook) => {
            tracing::info!(
                attempts = config.notify_attempts,
                "Webhook notifications enabled"
            );
            Arc::new(RetryNotifier::new(
                webhook,
                config.notify_attempts,
                DEFAULT_BASE_DELAY,
            ))
        }
        None => {
            tracing::info!("WEBHOOK_URL not set; alert notifications go to the log only");
            Arc::new(LogNotifier)
        }
    };

    let pipeline = Arc::new(IngestPipeline::new(
        config.rules.clone(),
        sink,
        notifier,
        config.sink_timeout(),
    ));

    // --- Queue forwarding ---
    let forwarder = match config.ingest_mode {
        IngestMode::Direct => None,
        IngestMode::Queue => {
            let publisher = PubSubPublisher::new(config.pubsub.clone())
                .expect("Failed to build queue publisher client");
            tracing::info!(topic = %publisher.topic_path(), "Forwarding readings to queue");
            Some(Arc::new(Forwarder::new(
                config.rules.clone(),
                Arc::new(publisher),
                config.sink_timeout(),
            )))
        }
    };

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        pipeline,
        forwarder,
    };

    let app = build_app_router(state, &config).expect("Invalid CORS configuration");

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
