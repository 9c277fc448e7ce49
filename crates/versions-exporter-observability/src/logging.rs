//! Tracing initialization

use tracing_subscriber::{
    fmt::{self, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Timestamp layout for console output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Level used when none is configured
pub const DEFAULT_LOG_LEVEL: &str = "error";

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name, attached to the startup event
    pub service_name: String,

    /// Log level filter (`panic|fatal|error|warn|info|debug|trace`)
    pub log_level: String,

    /// Enable JSON format for console
    pub json_format: bool,

    /// Include source file and line on every event
    pub with_source_location: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "versions-exporter".to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            with_source_location: true,
        }
    }
}

impl TracingConfig {
    /// Create config for a specific service
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Enable JSON format
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

/// Map a configured level onto a `tracing` level directive.
///
/// `panic` and `fatal` have no `tracing` counterpart and collapse to `error`.
/// Returns `None` for unknown values.
pub fn normalize_level(level: &str) -> Option<&'static str> {
    match level.trim().to_lowercase().as_str() {
        "panic" | "fatal" | "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &TracingConfig) -> crate::error::Result<()> {
    let level = normalize_level(&config.log_level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_LOG_LEVEL)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let installed = if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location);
        subscriber.with(fmt_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
            .with_target(false)
            .with_file(config.with_source_location)
            .with_line_number(config.with_source_location);
        subscriber.with(fmt_layer).try_init()
    };
    installed.map_err(|e| crate::error::ObservabilityError::Tracing(e.to_string()))?;

    if level.is_none() {
        report_unknown_level(&config.log_level);
    }
    tracing::info!(service = %config.service_name, "Tracing initialized");

    Ok(())
}

/// Emitted at `error` so it passes the fallback filter
fn report_unknown_level(level: &str) {
    tracing::error!(
        level = %level,
        "Unknown log level, falling back to {}",
        DEFAULT_LOG_LEVEL
    );
}
