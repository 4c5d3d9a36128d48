//! Serde model of the legacy dialect.

use http::Method;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::openapi3::{Info, RawStatusKey};
use crate::schema::RawSchema;

/// Root of a `swagger: "2.0"` document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDocument {
    /// Must be `2.0`.
    pub swagger: String,
    /// `info` block.
    #[serde(default)]
    pub info: Info,
    /// `host`.
    pub host: Option<String>,
    /// `basePath`.
    pub base_path: Option<String>,
    /// `schemes`.
    #[serde(default)]
    pub schemes: Vec<String>,
    /// Document-level `consumes`.
    #[serde(default)]
    pub consumes: Vec<String>,
    /// Document-level `produces`.
    #[serde(default)]
    pub produces: Vec<String>,
    /// `paths`.
    #[serde(default)]
    pub paths: IndexMap<String, LegacyPathItem>,
    /// `definitions`.
    #[serde(default)]
    pub definitions: IndexMap<String, RawSchema>,
    /// Shared `parameters`.
    #[serde(default)]
    pub parameters: IndexMap<String, LegacyParameter>,
    /// Shared `responses`.
    #[serde(default)]
    pub responses: IndexMap<String, LegacyResponse>,
}

/// A path item.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyPathItem {
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
    pub get: Option<LegacyOperation>,
    pub put: Option<LegacyOperation>,
    pub post: Option<LegacyOperation>,
    pub delete: Option<LegacyOperation>,
    pub options: Option<LegacyOperation>,
    pub head: Option<LegacyOperation>,
    pub patch: Option<LegacyOperation>,
}

impl LegacyPathItem {
    /// Declared operations in document method order.
    pub fn operations(&self) -> impl Iterator<Item = (Method, &LegacyOperation)> {
        [
            (Method::GET, &self.get),
            (Method::PUT, &self.put),
            (Method::POST, &self.post),
            (Method::DELETE, &self.delete),
            (Method::OPTIONS, &self.options),
            (Method::HEAD, &self.head),
            (Method::PATCH, &self.patch),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

/// An operation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOperation {
    /// `operationId`.
    pub operation_id: Option<String>,
    /// `summary`.
    pub summary: Option<String>,
    /// `deprecated`.
    #[serde(default)]
    pub deprecated: bool,
    /// Overrides the document-level `consumes` when present.
    pub consumes: Option<Vec<String>>,
    /// Overrides the document-level `produces` when present.
    pub produces: Option<Vec<String>>,
    /// `parameters`.
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
    /// `responses`.
    #[serde(default)]
    pub responses: IndexMap<RawStatusKey, ResponseOrRef>,
}

/// A parameter or a `#/parameters/...` reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    /// A reference.
    Ref {
        /// The pointer.
        #[serde(rename = "$ref")]
        reference: String,
    },
    /// An inline parameter.
    Parameter(LegacyParameter),
}

/// A parameter.
///
/// Non-body parameters carry their type keywords inline; they are gathered
/// into `inline`, a schema node of its own.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyParameter {
    /// `name`.
    pub name: String,
    /// `in`.
    #[serde(rename = "in")]
    pub location: String,
    /// `required`.
    #[serde(default)]
    pub required: bool,
    /// `description`.
    pub description: Option<String>,
    /// Body schema (`in: body` only).
    pub schema: Option<RawSchema>,
    /// `collectionFormat`.
    pub collection_format: Option<String>,
    /// Inline `type`, `format`, `items`, `enum` and constraints.
    #[serde(flatten)]
    pub inline: RawSchema,
}

/// A response or a `#/responses/...` reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResponseOrRef {
    /// A reference.
    Ref {
        /// The pointer.
        #[serde(rename = "$ref")]
        reference: String,
    },
    /// An inline response.
    Response(LegacyResponse),
}

/// A response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyResponse {
    /// `description`.
    #[serde(default)]
    pub description: String,
    /// Body schema.
    pub schema: Option<RawSchema>,
    /// Declared headers.
    #[serde(default)]
    pub headers: IndexMap<String, LegacyHeader>,
}

/// A response header: type keywords inline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyHeader {
    /// Inline `type`, `format`, `items` and constraints.
    #[serde(flatten)]
    pub schema: RawSchema,
}
