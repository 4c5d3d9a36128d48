//! Observability for Kanon.
//!
//! - **Logging**: `tracing-subscriber` initialisation with JSON or pretty
//!   output and `EnvFilter` directives
//! - **Metrics**: validation counters via the `metrics` facade
//!
//! Library crates only emit events and counters. Binaries (or the host
//! server) call [`init_logging`] once and install a metrics exporter of
//! their choice.
//!
//! # Example
//!
//! ```rust,ignore
//! use kanon_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! kanon_telemetry::metrics::describe_metrics();
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};
pub use metrics::{describe_metrics, record_validation, record_violation, Outcome, Side};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
