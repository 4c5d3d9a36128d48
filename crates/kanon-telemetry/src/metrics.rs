//! Validation metrics for Kanon.
//!
//! Counters are emitted through the `metrics` facade; installing an exporter
//! (Prometheus, StatsD, ...) is left to the host application. Without a
//! recorder every call is a no-op.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `kanon_validations_total` | Counter | `side`, `outcome` | Validation calls by result |
//! | `kanon_violations_total` | Counter | `side`, `kind` | Reported violations by kind |
//!
//! # Example
//!
//! ```rust
//! use kanon_telemetry::metrics::{describe_metrics, record_validation, Outcome, Side};
//!
//! describe_metrics();
//! record_validation(Side::Request, Outcome::Valid);
//! ```

use metrics::{counter, describe_counter};

/// Counter of validation calls.
pub const VALIDATIONS_TOTAL: &str = "kanon_validations_total";

/// Counter of reported violations.
pub const VIOLATIONS_TOTAL: &str = "kanon_violations_total";

/// Which half of the exchange was validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// An incoming request.
    Request,
    /// A handler's response.
    Response,
}

impl Side {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
        }
    }
}

/// Result of one validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// No violations.
    Valid,
    /// One or more violations.
    Invalid,
    /// The route could not be resolved.
    Unroutable,
    /// Validation is disabled for this side.
    Skipped,
}

impl Outcome {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Unroutable => "unroutable",
            Self::Skipped => "skipped",
        }
    }
}

/// Registers descriptions for all Kanon metrics.
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(
        VALIDATIONS_TOTAL,
        "Total number of request and response validations by outcome"
    );
    describe_counter!(
        VIOLATIONS_TOTAL,
        "Total number of reported contract violations by kind"
    );
}

/// Records one validation call.
pub fn record_validation(side: Side, outcome: Outcome) {
    counter!(
        VALIDATIONS_TOTAL,
        "side" => side.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Records one reported violation.
///
/// # Arguments
///
/// * `side` - Request or response
/// * `kind` - Violation kind label (e.g. "missing_required_parameter")
pub fn record_violation(side: Side, kind: &'static str) {
    counter!(
        VIOLATIONS_TOTAL,
        "side" => side.as_str(),
        "kind" => kind
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Side::Request.as_str(), "request");
        assert_eq!(Side::Response.as_str(), "response");
        assert_eq!(Outcome::Unroutable.as_str(), "unroutable");
        assert_eq!(Outcome::Skipped.as_str(), "skipped");
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder installed: the metrics facade drops everything.
        describe_metrics();
        record_validation(Side::Request, Outcome::Valid);
        record_validation(Side::Response, Outcome::Invalid);
        record_violation(Side::Response, "invalid_type");
    }
}
