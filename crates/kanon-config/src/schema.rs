//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use std::fmt;

use kanon_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// Which dialect a contract document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Version 2 (`swagger: "2.0"`), converted on load.
    Legacy,
    /// Version 3 (`openapi: 3.x`).
    Canonical,
    /// Decided by the root key of the document.
    #[default]
    Detect,
}

impl Dialect {
    /// Parses a dialect name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "legacy" | "swagger" | "v2" => Some(Self::Legacy),
            "canonical" | "openapi" | "v3" => Some(Self::Canonical),
            "detect" | "auto" => Some(Self::Detect),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Legacy => "legacy",
            Self::Canonical => "canonical",
            Self::Detect => "detect",
        })
    }
}

/// Contract document section.
///
/// # Example
///
/// ```
/// use kanon_config::{ContractSection, Dialect};
///
/// let section = ContractSection {
///     location: Some("contracts/pets.yaml".to_string()),
///     dialect: Dialect::Canonical,
/// };
/// assert_eq!(section.dialect.to_string(), "canonical");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContractSection {
    /// File path or http(s) URL of the contract document.
    #[serde(default)]
    pub location: Option<String>,

    /// Dialect of the document.
    #[serde(default)]
    pub dialect: Dialect,
}

/// Validation behaviour section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidationSection {
    /// Validate incoming requests.
    #[serde(default = "default_true")]
    pub validate_requests: bool,

    /// Validate outgoing responses.
    #[serde(default = "default_true")]
    pub validate_responses: bool,

    /// Report every violation instead of the first one.
    #[serde(default)]
    pub multi_error: bool,

    /// Reject objects that forbid additional properties yet require
    /// undeclared ones.
    #[serde(default)]
    pub strict_mode: bool,

    /// Accept undeclared properties when a schema does not say otherwise.
    #[serde(default = "default_true")]
    pub allow_additional_properties: bool,
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            validate_requests: true,
            validate_responses: true,
            multi_error: false,
            strict_mode: false,
            allow_additional_properties: true,
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Colour pretty output.
    #[serde(default)]
    pub ansi: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi: false,
        }
    }
}

impl From<&LoggingSection> for LogConfig {
    fn from(section: &LoggingSection) -> Self {
        Self {
            enabled: section.enabled,
            level: section.level.clone(),
            format: section.format,
            ansi: section.ansi,
            ..Self::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_defaults() {
        let section = ValidationSection::default();
        assert!(section.validate_requests);
        assert!(section.validate_responses);
        assert!(!section.multi_error);
        assert!(!section.strict_mode);
        assert!(section.allow_additional_properties);
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let section: ValidationSection = toml::from_str("multi_error = true").unwrap();
        assert!(section.multi_error);
        assert!(section.validate_requests);
        assert!(section.allow_additional_properties);
    }

    #[test]
    fn test_dialect_parse() {
        assert_eq!(Dialect::parse("Legacy"), Some(Dialect::Legacy));
        assert_eq!(Dialect::parse("openapi"), Some(Dialect::Canonical));
        assert_eq!(Dialect::parse("auto"), Some(Dialect::Detect));
        assert_eq!(Dialect::parse("raml"), None);
    }

    #[test]
    fn test_dialect_serde() {
        let section: ContractSection = serde_json::from_str(r#"{"dialect":"legacy"}"#).unwrap();
        assert_eq!(section.dialect, Dialect::Legacy);
        assert!(section.location.is_none());
        assert!(serde_json::from_str::<ContractSection>(r#"{"dialect":"raml"}"#).is_err());
    }

    #[test]
    fn test_logging_section_into_log_config() {
        let section = LoggingSection {
            level: "kanon_sentinel=debug".to_string(),
            format: LogFormat::Pretty,
            ansi: true,
            ..LoggingSection::default()
        };
        let config = LogConfig::from(&section);
        assert_eq!(config.level, "kanon_sentinel=debug");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.ansi);
        assert!(config.include_target);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<LoggingSection>("colour = true").is_err());
    }
}
