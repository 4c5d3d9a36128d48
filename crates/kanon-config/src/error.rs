//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// A configuration source could not be turned into a [`KanonConfig`](crate::KanonConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The named file does not exist.
    #[error("config file {} does not exist", path.display())]
    FileNotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The file exists but reading it failed.
    #[error("cannot read config file {}", path.display())]
    ReadError {
        /// Requested path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// TOML source is malformed or names an unknown field.
    #[error("invalid TOML config: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON source is malformed or names an unknown field.
    #[error("invalid JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Neither `toml` nor `json`.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// A field holds a value the validators cannot work with.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted field name, e.g. `contract.location`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `PREFIX__SECTION__KEY` override could not be applied.
    #[error("override {var}: {reason}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `.env` file is present but unusable.
    #[error(".env: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Builds an [`InvalidValue`](Self::InvalidValue).
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_source() {
        let missing = ConfigError::file_not_found("/etc/kanon/kanon.toml");
        assert_eq!(
            missing.to_string(),
            "config file /etc/kanon/kanon.toml does not exist"
        );

        let invalid = ConfigError::invalid_value("contract.location", "must not be empty");
        assert_eq!(invalid.to_string(), "contract.location: must not be empty");

        let var = ConfigError::env_parse_error("KANON__VALIDATION__MULTI_ERROR", "expected boolean");
        assert_eq!(
            var.to_string(),
            "override KANON__VALIDATION__MULTI_ERROR: expected boolean"
        );
    }

    #[test]
    fn test_read_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::read_error("kanon.toml", io);
        assert!(err.source().is_some());
    }
}
