//! Typed configuration for Kanon.
//!
//! This crate provides a strongly-typed configuration system with support for:
//! - TOML and JSON configuration files
//! - `.env` files
//! - Environment variable overrides
//! - Strict parsing (fails on unknown fields)
//!
//! # Overview
//!
//! [`KanonConfig`] holds three sections:
//!
//! - [`ContractSection`] - where the contract document lives and its [`Dialect`]
//! - [`ValidationSection`] - which sides are validated and how violations are reported
//! - [`LoggingSection`] - filter directive and output format
//!
//! # Example
//!
//! ```no_run
//! use kanon_config::ConfigLoader;
//!
//! # fn main() -> Result<(), kanon_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("kanon.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("KANON")
//!     .load()?;
//!
//! println!("contract: {:?}", config.contract.location);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [contract]
//! location = "contracts/pets.yaml"
//! dialect = "detect"
//!
//! [validation]
//! validate_requests = true
//! validate_responses = true
//! multi_error = false
//! strict_mode = false
//! allow_additional_properties = true
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ansi = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY` variables:
//!
//! - `KANON__CONTRACT__LOCATION=https://contracts.example.com/pets.json`
//! - `KANON__VALIDATION__MULTI_ERROR=true`
//! - `KANON__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use kanon_telemetry::LogFormat;
pub use loader::{ConfigFormat, ConfigLoader};
pub use schema::*;
