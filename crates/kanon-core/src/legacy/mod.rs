//! The legacy (version 2) dialect.
//!
//! [`LegacyDocument`] is the serde model of a `swagger: "2.0"` document;
//! [`convert`] maps it into the canonical [`Document`](crate::Document).
//!
//! # Example
//!
//! ```
//! use kanon_core::legacy::{convert, LegacyDocument};
//! use http::Method;
//!
//! let legacy: LegacyDocument = serde_json::from_str(r##"{
//!     "swagger": "2.0",
//!     "info": {"title": "pets", "version": "1.0.0"},
//!     "basePath": "/v1",
//!     "paths": {
//!         "/pets/{id}": {
//!             "get": {
//!                 "operationId": "getPet",
//!                 "parameters": [{"name": "id", "in": "path", "required": true, "type": "integer"}],
//!                 "responses": {"200": {"description": "ok", "schema": {"$ref": "#/definitions/Pet"}}}
//!             }
//!         }
//!     },
//!     "definitions": {"Pet": {"type": "object"}}
//! }"##).unwrap();
//!
//! let document = convert(&legacy).unwrap();
//! assert_eq!(document.base_path(), Some("/v1"));
//! assert!(document.operation(&Method::GET, "/pets/{id}").is_some());
//! assert!(document.schema("Pet").is_some());
//! ```

mod convert;
mod model;

pub use convert::convert;
pub use model::{
    LegacyDocument, LegacyHeader, LegacyOperation, LegacyParameter, LegacyPathItem,
    LegacyResponse, ParameterOrRef, ResponseOrRef,
};
