//! Contract document loading.
//!
//! Documents are read from files or fetched over HTTP, parsed as JSON or
//! YAML, and brought into canonical form: legacy (`swagger: "2.0"`)
//! documents go through the converter, canonical (`openapi: 3.x`) ones
//! through the version 3 reader.

use std::path::Path;

use kanon_core::legacy::{convert, LegacyDocument};
use kanon_core::openapi3::OpenApi3;
use kanon_core::Document;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info};

pub use kanon_config::Dialect;

use crate::error::LoadError;

/// Serialization of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON.
    Json,
    /// YAML (a superset of JSON).
    Yaml,
}

impl Format {
    /// Guesses the format from a file name or URL path.
    #[must_use]
    pub fn from_extension(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

// Only the version markers are read to pick a dialect.
#[derive(Deserialize)]
struct VersionMarkers {
    swagger: Option<IgnoredAny>,
    openapi: Option<IgnoredAny>,
}

/// Loads documents from various sources.
pub struct DocumentLoader;

impl DocumentLoader {
    /// Parses a document held in memory.
    pub fn from_str(content: &str, format: Format, dialect: Dialect) -> Result<Document, LoadError> {
        Self::parse_document(content, format, dialect, "<memory>")
    }

    // `location` only labels errors.
    fn parse_document(
        content: &str,
        format: Format,
        dialect: Dialect,
        location: &str,
    ) -> Result<Document, LoadError> {
        let dialect = match dialect {
            Dialect::Detect => {
                let markers: VersionMarkers = parse(content, format, location)?;
                match (markers.swagger, markers.openapi) {
                    (Some(_), _) => Dialect::Legacy,
                    (None, Some(_)) => Dialect::Canonical,
                    (None, None) => {
                        return Err(LoadError::UnknownDialect {
                            location: location.to_string(),
                        })
                    }
                }
            }
            explicit => explicit,
        };

        let document = if dialect == Dialect::Legacy {
            let legacy: LegacyDocument = parse(content, format, location)?;
            convert(&legacy).map_err(|source| LoadError::Conversion {
                location: location.to_string(),
                source,
            })?
        } else {
            let canonical: OpenApi3 = parse(content, format, location)?;
            canonical.to_document().map_err(|source| LoadError::Build {
                location: location.to_string(),
                source,
            })?
        };

        debug!(
            location,
            %dialect,
            title = document.title(),
            version = document.version(),
            operations = document.operations().count(),
            schemas = document.schemas().len(),
            "document loaded"
        );

        Ok(document)
    }

    /// Loads a document from a file. The extension selects the format.
    pub async fn from_file(path: impl AsRef<Path>, dialect: Dialect) -> Result<Document, LoadError> {
        let path = path.as_ref();
        let location = path.display().to_string();
        info!(path = %location, "loading document from file");

        let format = Format::from_extension(&location).ok_or_else(|| LoadError::UnknownFormat {
            location: location.clone(),
        })?;

        let content = fs::read_to_string(path)
            .await
            .map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Self::parse_document(&content, format, dialect, &location)
    }

    /// Fetches a document over HTTP.
    ///
    /// The format comes from the URL's extension, else from the
    /// `Content-Type` of the response, defaulting to YAML.
    pub async fn from_url(url: &str, dialect: Dialect) -> Result<Document, LoadError> {
        info!(url, "loading document from url");

        let http_error = |source| LoadError::Http {
            url: url.to_string(),
            source,
        };

        let response = reqwest::get(url).await.map_err(http_error)?;
        if !response.status().is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let by_header = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));
        let path = url::Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default();
        let format = Format::from_extension(&path).unwrap_or(if by_header {
            Format::Json
        } else {
            Format::Yaml
        });

        let content = response.text().await.map_err(http_error)?;
        Self::parse_document(&content, format, dialect, url)
    }

    /// Loads from an `http(s)` URL or else a file path.
    pub async fn from_location(location: &str, dialect: Dialect) -> Result<Document, LoadError> {
        match url::Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                Self::from_url(location, dialect).await
            }
            _ => Self::from_file(location, dialect).await,
        }
    }
}

fn parse<T: DeserializeOwned>(content: &str, format: Format, location: &str) -> Result<T, LoadError> {
    match format {
        Format::Json => serde_json::from_str(content).map_err(|source| LoadError::Json {
            location: location.to_string(),
            source,
        }),
        Format::Yaml => serde_yaml::from_str(content).map_err(|source| LoadError::Yaml {
            location: location.to_string(),
            source,
        }),
    }
}
