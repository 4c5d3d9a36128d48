//! # Kanon Core
//!
//! The canonical OpenAPI document model shared by every Kanon crate.
//!
//! This crate provides:
//!
//! - [`Document`]: paths, operations, parameters, bodies and responses
//! - [`Schema`]: the recursive schema grammar, typed
//! - [`openapi3`]: the version 3 reader
//! - [`legacy`]: the version 2 model and its converter
//! - [`BuildError`] and [`ConversionError`]: start-up failures
//!
//! Documents are immutable once built and are shared between threads
//! behind an `Arc` by the validation layer.
//!
//! # Example
//!
//! ```
//! use kanon_core::legacy::{convert, LegacyDocument};
//! use kanon_core::fixtures::FOO_SWAGGER_YAML;
//! use http::Method;
//!
//! let legacy: LegacyDocument = serde_yaml::from_str(FOO_SWAGGER_YAML).unwrap();
//! let document = convert(&legacy).unwrap();
//!
//! let op = document.operation(&Method::POST, "/foo/{bar}").unwrap();
//! assert_eq!(op.parameters.len(), 2);
//! assert!(op.request_body.as_ref().unwrap().required);
//! ```

#![doc(html_root_url = "https://docs.rs/kanon-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod document;
pub mod error;
pub mod fixtures;
pub mod legacy;
pub mod openapi3;
pub mod schema;

pub use document::{
    Document, Header, MediaType, Operation, Parameter, ParameterLocation, ParameterStyle,
    PathItem, RequestBody, Response, StatusKey,
};
pub use error::{BuildError, BuildResult, ConversionError};
pub use schema::{AdditionalProperties, Format, Schema, SchemaError, SchemaKind, Untyped};
