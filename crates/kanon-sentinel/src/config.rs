//! Configuration for the Sentinel.

use kanon_config::ValidationSection;
use serde::{Deserialize, Serialize};

use crate::validation::Mode;

/// Configuration for validation behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Whether to validate incoming requests.
    pub validate_requests: bool,
    /// Whether to validate outgoing responses.
    pub validate_responses: bool,
    /// Report every violation instead of stopping at the first.
    pub multi_error: bool,
    /// Reject documents whose closed objects require undeclared properties.
    pub strict_mode: bool,
    /// Accept undeclared properties on objects that do not say otherwise.
    pub allow_additional_properties: bool,
}

impl Default for ValidationConfig {
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

impl ValidationConfig {
    /// Validate everything, report everything, close every object.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            validate_requests: true,
            validate_responses: true,
            multi_error: true,
            strict_mode: true,
            allow_additional_properties: false,
        }
    }

    /// Validate nothing.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            validate_requests: false,
            validate_responses: false,
            ..Self::default()
        }
    }

    /// Validate requests only.
    #[must_use]
    pub fn request_only() -> Self {
        Self {
            validate_responses: false,
            ..Self::default()
        }
    }

    /// Sets multi-error reporting.
    #[must_use]
    pub fn with_multi_error(mut self, enabled: bool) -> Self {
        self.multi_error = enabled;
        self
    }

    /// The reporting mode these settings select.
    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.multi_error {
            Mode::MultiError
        } else {
            Mode::FailFast
        }
    }
}

impl From<&ValidationSection> for ValidationConfig {
    fn from(section: &ValidationSection) -> Self {
        Self {
            validate_requests: section.validate_requests,
            validate_responses: section.validate_responses,
            multi_error: section.multi_error,
            strict_mode: section.strict_mode,
            allow_additional_properties: section.allow_additional_properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validation_config() {
        let config = ValidationConfig::default();
        assert!(config.validate_requests);
        assert!(config.validate_responses);
        assert!(!config.strict_mode);
        assert!(config.allow_additional_properties);
        assert_eq!(config.mode(), Mode::FailFast);
    }

    #[test]
    fn test_strict_validation_config() {
        let config = ValidationConfig::strict();
        assert!(config.strict_mode);
        assert!(!config.allow_additional_properties);
        assert_eq!(config.mode(), Mode::MultiError);
    }

    #[test]
    fn test_permissive_and_request_only() {
        let config = ValidationConfig::permissive();
        assert!(!config.validate_requests);
        assert!(!config.validate_responses);

        let config = ValidationConfig::request_only();
        assert!(config.validate_requests);
        assert!(!config.validate_responses);
    }

    #[test]
    fn test_from_config_section() {
        let section = ValidationSection {
            multi_error: true,
            validate_responses: false,
            ..ValidationSection::default()
        };
        let config = ValidationConfig::from(&section);
        assert_eq!(config.mode(), Mode::MultiError);
        assert!(!config.validate_responses);
        assert!(config.validate_requests);
    }
}
