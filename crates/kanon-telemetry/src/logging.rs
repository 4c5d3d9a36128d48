//! Subscriber setup for the events kanon crates emit.
//!
//! The validators log construction details at `debug`, load progress and
//! rejected requests at `info`, and invalid responses at `warn`. Event
//! fields use dotted names (`http.method`, `http.path`) next to
//! `operation_id` and `violations`.
//!
//! ```rust,ignore
//! use kanon_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig {
//!     level: "kanon_sentinel=debug,info".to_string(),
//!     ..LogConfig::default()
//! })?;
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Indented text for terminals.
    Pretty,
}

/// Settings for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Install nothing when false.
    pub enabled: bool,

    /// `EnvFilter` directive, e.g. `kanon_sentinel=debug,warn`.
    pub level: String,

    /// Rendering.
    pub format: LogFormat,

    /// Colour codes in [`LogFormat::Pretty`] output.
    pub ansi: bool,

    /// Emit span open/close events.
    pub span_events: bool,

    /// Source file and line of each event.
    pub file_line_info: bool,

    /// Module path of each event.
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            ansi: false,
            span_events: false,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Verbose pretty output with source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            ansi: true,
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// [`TelemetryError::InvalidFilter`] for a bad `level`, and
/// [`TelemetryError::LoggingInit`] when a global subscriber already exists.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let spans = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_span_events(spans)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);

    let layer = match config.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Pretty => base.pretty().with_ansi(config.ansi).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses an `EnvFilter` directive.
///
/// # Errors
///
/// [`TelemetryError::InvalidFilter`] when the directive does not parse.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        filter: filter.to_string(),
        reason: e.to_string(),
    })
}
