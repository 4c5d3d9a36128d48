//! The top-level [`KanonConfig`].

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ContractSection, LogFormat, LoggingSection, ValidationSection};

/// Everything a host needs to stand up contract validation.
///
/// Every section is optional in a file; missing ones take their defaults.
///
/// ```
/// use kanon_config::{Dialect, KanonConfig};
///
/// let config = KanonConfig::default();
/// assert_eq!(config.contract.dialect, Dialect::Detect);
/// assert!(config.validation.validate_requests);
/// assert!(!config.validation.multi_error);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct KanonConfig {
    /// Contract document source.
    #[serde(default)]
    pub contract: ContractSection,

    /// Validation switches.
    #[serde(default)]
    pub validation: ValidationSection,

    /// Subscriber setup.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl KanonConfig {
    /// Checks values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for a blank `contract.location`, or a
    /// blank `logging.level` while logging is enabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(location) = &self.contract.location {
            if location.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    "contract.location",
                    "must not be empty",
                ));
            }
        }

        if self.logging.enabled && self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "logging.level",
                "must not be empty when logging is enabled",
            ));
        }

        Ok(())
    }

    /// Pretty debug logs and every violation reported.
    #[must_use]
    pub fn development() -> Self {
        Self {
            validation: ValidationSection {
                multi_error: true,
                ..ValidationSection::default()
            },
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ansi: true,
                ..LoggingSection::default()
            },
            ..Self::default()
        }
    }

    /// JSON logs, and contracts checked in strict mode.
    #[must_use]
    pub fn production() -> Self {
        Self {
            validation: ValidationSection {
                strict_mode: true,
                ..ValidationSection::default()
            },
            logging: LoggingSection {
                format: LogFormat::Json,
                ..LoggingSection::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dialect;

    #[test]
    fn test_default_config() {
        let config = KanonConfig::default();
        assert!(config.contract.location.is_none());
        assert_eq!(config.contract.dialect, Dialect::Detect);
        assert!(config.validation.validate_responses);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_blank_values() {
        let mut config = KanonConfig::default();
        config.logging.level = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("logging.level"));

        config.logging.enabled = false;
        assert!(config.validate().is_ok());

        config.contract.location = Some(String::new());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("contract.location"));
    }

    #[test]
    fn test_presets() {
        let dev = KanonConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert_eq!(dev.logging.level, "debug");
        assert!(dev.validation.multi_error);
        assert!(!dev.validation.strict_mode);

        let prod = KanonConfig::production();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(!prod.logging.ansi);
        assert!(prod.validation.strict_mode);
        assert!(!prod.validation.multi_error);
    }

    #[test]
    fn test_serialized_sections() {
        let toml_str = toml::to_string_pretty(&KanonConfig::default()).unwrap();
        assert!(toml_str.contains("[contract]"));
        assert!(toml_str.contains("[validation]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            [contract]
            location = "https://contracts.example.com/pets.json"
            dialect = "legacy"

            [validation]
            multi_error = true
        "#;

        let config: KanonConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.contract.dialect, Dialect::Legacy);
        assert!(config.validation.multi_error);
        assert!(config.validation.validate_requests);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml_str = r#"
            [validation]
            multi_error = true
            fail_fast = false
        "#;

        assert!(toml::from_str::<KanonConfig>(toml_str).is_err());
        assert!(toml::from_str::<KanonConfig>("[server]\nport = 1").is_err());
    }
}
