//! Structured logging setup.
//!
//! `RUST_LOG` wins over the configured level when it is set, so a single
//! run can be made more verbose without touching the config file.

use gateway_config::{LogFormat, LoggingSettings};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is absent
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Colorize pretty output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// Create a configuration with the given level
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable ANSI colors
    #[must_use]
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Raise the level to `debug` or `trace` for `-v` flags
    #[must_use]
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        match verbose {
            0 => {}
            1 => self.level = "debug".to_string(),
            _ => self.level = "trace".to_string(),
        }
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

impl From<&LoggingSettings> for LoggingConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self::new(settings.level.clone()).with_format(settings.format)
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr so command output on stdout stays machine readable.
///
/// # Errors
/// Returns an error if a global subscriber is already installed
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let fmt_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_ansi(config.ansi)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(config.filter()))
        .try_init()
        .map_err(|e| TelemetryError::Init(e.to_string()))?;

    debug!(level = %config.level, format = %config.format, "Logging initialized");
    Ok(())
}

/// Telemetry setup error
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to install the subscriber
    #[error("Failed to initialize logging: {0}")]
    Init(String),
    /// Metric registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl From<prometheus::Error> for TelemetryError {
    fn from(err: prometheus::Error) -> Self {
        Self::Metrics(err.to_string())
    }
}

/// Create a span for one provider attempt
#[macro_export]
macro_rules! provider_span {
    ($provider_id:expr, $task:expr, $attempt:expr) => {
        tracing::info_span!(
            "provider_call",
            provider_id = %$provider_id,
            task = %$task,
            attempt = $attempt,
        )
    };
}
