//! Tracing setup for structured logging.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str =
    "info,enrichment_engine=debug,worker=info,lookup_client=info,sqlx=warn";

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Plain,
    /// One JSON object per event, with file and line.
    Json,
}

impl LogFormat {
    /// `json`, `1` and `true` select JSON; anything else is plain.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "1" | "true" => Self::Json,
            _ => Self::Plain,
        }
    }
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// `EnvFilter` directives (e.g. "info,worker=debug")
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Plain,
        }
    }
}

impl TracingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Reads `RUST_LOG` and `LOG_FORMAT` (`LOG_JSON` is accepted as well).
    pub fn from_env() -> Self {
        let format = std::env::var("LOG_FORMAT")
            .or_else(|_| std::env::var("LOG_JSON"))
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        let config = Self::default().with_format(format);
        match std::env::var("RUST_LOG") {
            Ok(filter) if !filter.trim().is_empty() => config.with_filter(filter),
            _ => config,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Installs the global subscriber. Call once, before any worker starts.
pub fn init_tracing(config: TracingConfig) {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(false)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Plain => registry.with(fmt::layer().with_target(true)).init(),
    }

    tracing::info!(filter = %config.filter, format = ?config.format, "Tracing initialized");
}

/// Initialize tracing from environment variables.
pub fn init_tracing_from_env() {
    init_tracing(TracingConfig::from_env());
}
