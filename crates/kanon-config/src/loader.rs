//! Layered loading of [`KanonConfig`].
//!
//! Sources are applied in call order, each replacing what came before:
//! a preset or the defaults, then a TOML or JSON file, then `.env`, then
//! `PREFIX__SECTION__KEY` variables at [`ConfigLoader::load`].

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, Dialect, KanonConfig, LogFormat};

/// Serialization of a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_name(extension)
    }

    /// Parses `toml` or `json`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other name.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    fn parse(self, content: &str) -> Result<KanonConfig, ConfigError> {
        Ok(match self {
            Self::Toml => toml::from_str(content)?,
            Self::Json => serde_json::from_str(content)?,
        })
    }
}

/// Builds a [`KanonConfig`] from layered sources.
///
/// ```no_run
/// use kanon_config::ConfigLoader;
///
/// # fn main() -> Result<(), kanon_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_file("kanon.toml")?
///     .with_dotenv()?
///     .with_env_prefix("KANON")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: KanonConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Starts from [`KanonConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything loaded so far with [`KanonConfig::development`].
    ///
    /// ```
    /// use kanon_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert!(config.validation.multi_error);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = KanonConfig::development();
        self
    }

    /// Replaces everything loaded so far with [`KanonConfig::production`].
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = KanonConfig::production();
        self
    }

    /// Reads a `.toml` or `.json` file. Sections it omits take their defaults.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, unreadable, has another extension,
    /// is malformed, or names a field kanon does not know.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        tracing::debug!(path = %path.display(), ?format, "loading configuration file");
        self.with_string(&content, format)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Fails when the file exists and cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Parses configuration held in memory.
    ///
    /// ```
    /// use kanon_config::{ConfigFormat, ConfigLoader, Dialect};
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[contract]\ndialect = \"legacy\"", ConfigFormat::Toml)
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.contract.dialect, Dialect::Legacy);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on malformed content or unknown fields.
    pub fn with_string(mut self, content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        self.config = format.parse(content)?;
        Ok(self)
    }

    /// Reads `PREFIX__SECTION__KEY` variables at [`load`](Self::load), e.g.
    /// `KANON__CONTRACT__LOCATION` or `KANON__VALIDATION__STRICT_MODE`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Exports `./.env` into the process environment when present.
    /// Variables that are already set are kept.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Err(e) if !e.not_found() => Err(e.into()),
            _ => Ok(self),
        }
    }

    /// Exports the given `.env` file into the process environment.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing or malformed.
    pub fn with_dotenv_path<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Ok(self)
    }

    /// Applies environment overrides, then checks the result with
    /// [`KanonConfig::validate`].
    ///
    /// # Errors
    ///
    /// Fails on an unparsable override or an invalid final value.
    pub fn load(mut self) -> Result<KanonConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_vars(env::vars(), &prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// The configuration as loaded so far, without overrides or checks.
    #[must_use]
    pub fn load_unvalidated(self) -> KanonConfig {
        self.config
    }

    fn apply_vars<I>(&mut self, vars: I, prefix: &str) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (var, value) in vars {
            let Some(path) = var
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix("__"))
            else {
                continue;
            };
            let Some((section, key)) = path.split_once("__") else {
                return Err(ConfigError::env_parse_error(&var, "expected SECTION__KEY"));
            };
            let known = apply_override(&mut self.config, section, key, &value)
                .map_err(|reason| ConfigError::env_parse_error(&var, reason))?;
            if !known {
                tracing::warn!(var = %var, "ignoring unknown configuration override");
            }
        }
        Ok(())
    }
}

/// Sets one field. Returns `Ok(false)` when `section`/`key` names nothing.
fn apply_override(
    config: &mut KanonConfig,
    section: &str,
    key: &str,
    value: &str,
) -> Result<bool, &'static str> {
    let flag = || parse_bool(value).ok_or("expected boolean");

    match (section, key) {
        ("CONTRACT", "LOCATION") => {
            config.contract.location = Some(value.to_string()).filter(|v| !v.is_empty());
        }
        ("CONTRACT", "DIALECT") => {
            config.contract.dialect =
                Dialect::parse(value).ok_or("expected 'legacy', 'canonical' or 'detect'")?;
        }
        ("VALIDATION", "VALIDATE_REQUESTS") => config.validation.validate_requests = flag()?,
        ("VALIDATION", "VALIDATE_RESPONSES") => config.validation.validate_responses = flag()?,
        ("VALIDATION", "MULTI_ERROR") => config.validation.multi_error = flag()?,
        ("VALIDATION", "STRICT_MODE") => config.validation.strict_mode = flag()?,
        ("VALIDATION", "ALLOW_ADDITIONAL_PROPERTIES") => {
            config.validation.allow_additional_properties = flag()?;
        }
        ("LOGGING", "ENABLED") => config.logging.enabled = flag()?,
        ("LOGGING", "LEVEL") => config.logging.level = value.to_string(),
        ("LOGGING", "FORMAT") => {
            config.logging.format = match value.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => return Err("expected 'json' or 'pretty'"),
            };
        }
        ("LOGGING", "ANSI") => config.logging.ansi = flag()?,
        _ => return Ok(false),
    }
    Ok(true)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
