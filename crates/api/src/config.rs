use std::str::FromStr;
use std::time::Duration;

use greendelivery_core::error::CoreError;
use greendelivery_core::pipeline::{DEFAULT_BATCH_CONCURRENCY, DEFAULT_CALL_TIMEOUT};
use greendelivery_core::rules::RulePolicy;
use greendelivery_events::PubSubConfig;

/// What the ingest endpoint does with a valid reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestMode {
    /// Store, evaluate, and notify in-process.
    #[default]
    Direct,
    /// Publish to the queue; a processor instance consumes the push endpoint.
    Queue,
}

impl IngestMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Queue => "queue",
        }
    }
}

impl FromStr for IngestMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "queue" => Ok(Self::Queue),
            other => Err(CoreError::Configuration(format!(
                "INGEST_MODE must be 'direct' or 'queue', got '{other}'"
            ))),
        }
    }
}

/// Where readings and alerts are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// In-process only; history endpoints are unavailable.
    Memory,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(CoreError::Configuration(format!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"
            ))),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Bound on every sink, notifier, and publisher call (default: `10`).
    pub sink_timeout_secs: u64,
    /// Readings processed concurrently by the batch endpoint (default: `16`).
    pub batch_concurrency: usize,
    pub ingest_mode: IngestMode,
    pub storage: StorageBackend,
    pub database_url: String,
    /// Alert webhook; delivery is disabled unless it starts with `http`.
    pub webhook_url: String,
    /// Delivery attempts per notification (default: `1`, no retry).
    pub notify_attempts: u32,
    pub rules: RulePolicy,
    pub pubsub: PubSubConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            request_timeout_secs: 30,
            sink_timeout_secs: DEFAULT_CALL_TIMEOUT.as_secs(),
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            ingest_mode: IngestMode::Direct,
            storage: StorageBackend::Postgres,
            database_url: database_url_from_parts(
                "localhost",
                "5432",
                "greendelivery",
                "gd_user",
                "gd_pass",
            ),
            webhook_url: String::new(),
            notify_attempts: 1,
            rules: RulePolicy::default(),
            pubsub: PubSubConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SINK_TIMEOUT_SECS`     | `10`                       |
    /// | `BATCH_CONCURRENCY`     | `16`                       |
    /// | `INGEST_MODE`           | `direct`                   |
    /// | `STORAGE_BACKEND`       | `postgres`                 |
    /// | `DATABASE_URL`          | built from `DB_*` vars     |
    /// | `WEBHOOK_URL`           | (empty, disabled)          |
    /// | `NOTIFY_ATTEMPTS`       | `1`                        |
    /// | `RULE_TEMP_MAX_C`       | `8.0`                      |
    /// | `RULE_TEMP_MIN_C`       | `2.0`                      |
    /// | `RULE_G_FORCE_MAX`      | `3.0`                      |
    /// | `RULE_HUMIDITY_MIN_PCT` | `50`                       |
    /// | `RULE_HUMIDITY_MAX_PCT` | `90`                       |
    ///
    /// Pub/Sub settings are read by [`PubSubConfig::from_env`].
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();
        let env = Env(&lookup);

        let host = env.string("HOST", &defaults.host);

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(raw) => parse_origins(&raw),
            None => defaults.cors_origins,
        };

        let database_url = match lookup("DATABASE_URL") {
            Some(url) if !url.trim().is_empty() => url,
            _ => database_url_from_parts(
                &env.string("DB_HOST", "localhost"),
                &env.string("DB_PORT", "5432"),
                &env.string("POSTGRES_DB", "greendelivery"),
                &env.string("POSTGRES_USER", "gd_user"),
                &env.string("POSTGRES_PASSWORD", "gd_pass"),
            ),
        };

        let mut rules = defaults.rules;
        for (key, slot) in [
            ("RULE_TEMP_MAX_C", &mut rules.temperature_max.threshold),
            ("RULE_TEMP_MIN_C", &mut rules.temperature_min.threshold),
            ("RULE_G_FORCE_MAX", &mut rules.g_force_max.threshold),
            ("RULE_HUMIDITY_MIN_PCT", &mut rules.humidity_min.threshold),
            ("RULE_HUMIDITY_MAX_PCT", &mut rules.humidity_max.threshold),
        ] {
            *slot = env.parse(key, *slot)?;
        }
        rules.validate()?;

        let config = Self {
            host,
            port: env.parse("PORT", defaults.port)?,
            cors_origins,
            request_timeout_secs: env.parse(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            sink_timeout_secs: env.parse("SINK_TIMEOUT_SECS", defaults.sink_timeout_secs)?,
            batch_concurrency: env.parse("BATCH_CONCURRENCY", defaults.batch_concurrency)?,
            ingest_mode: env.parse("INGEST_MODE", defaults.ingest_mode)?,
            storage: env.parse("STORAGE_BACKEND", defaults.storage)?,
            database_url,
            webhook_url: env.string("WEBHOOK_URL", ""),
            notify_attempts: env.parse("NOTIFY_ATTEMPTS", defaults.notify_attempts)?,
            rules,
            pubsub: PubSubConfig::from_lookup(&lookup),
        };

        if config.sink_timeout_secs == 0 {
            return Err(CoreError::Configuration(
                "SINK_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if config.batch_concurrency == 0 {
            return Err(CoreError::Configuration(
                "BATCH_CONCURRENCY must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_secs(self.sink_timeout_secs)
    }
}

/// Typed access to configuration variables.
struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn string(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse `key` if set, otherwise return `default`.
    fn parse<T>(&self, key: &str, default: T) -> Result<T, CoreError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match (self.0)(key) {
            Some(raw) => parse_value(key, &raw),
            None => Ok(default),
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| CoreError::Configuration(format!("{key}='{raw}' is invalid: {e}")))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn database_url_from_parts(
    host: &str,
    port: &str,
    db: &str,
    user: &str,
    password: &str,
) -> String {
    format!("postgres://{user}:{password}@{host}:{port}/{db}")
}
