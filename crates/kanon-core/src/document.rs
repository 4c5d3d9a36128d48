//! The canonical document model.
//!
//! A [`Document`] is the read-only description every other component works
//! from: an ordered map of path templates to [`PathItem`]s, each holding its
//! [`Operation`]s keyed by method, plus a registry of named schemas.
//!
//! Both dialects end up here. Version 3 documents are read by
//! [`crate::openapi3`]; version 2 documents go through
//! [`crate::legacy::convert`]. Tests and embedders can also assemble one
//! directly with the builders.
//!
//! # Example
//!
//! ```
//! use kanon_core::document::{Document, Operation, Parameter, RequestBody, Response, StatusKey};
//! use kanon_core::schema::Schema;
//! use http::Method;
//!
//! let document = Document::builder("pets")
//!     .version("1.0.0")
//!     .operation(
//!         Operation::builder(Method::POST, "/pets/{petId}")
//!             .operation_id("updatePet")
//!             .parameter(Parameter::path("petId", Schema::integer()))
//!             .request_body(RequestBody::json(Schema::object()).required())
//!             .response(StatusKey::Code(200), Response::new("updated"))
//!             .build(),
//!     )
//!     .build();
//!
//! let op = document.operation(&Method::POST, "/pets/{petId}").unwrap();
//! assert_eq!(op.key(), "updatePet");
//! ```

use std::fmt;

use http::{Method, StatusCode};
use indexmap::IndexMap;

use crate::schema::Schema;

/// Media type assumed when a document names none.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// A canonical OpenAPI document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    title: String,
    version: String,
    servers: Vec<String>,
    paths: IndexMap<String, PathItem>,
    schemas: IndexMap<String, Schema>,
}

impl Document {
    /// Creates a builder for a document.
    #[must_use]
    pub fn builder(title: impl Into<String>) -> DocumentBuilder {
        DocumentBuilder::new(title)
    }

    /// Document title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Document version (`info.version`).
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Declared server URLs, in order.
    #[must_use]
    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    /// Path items keyed by template, in declaration order.
    #[must_use]
    pub fn paths(&self) -> &IndexMap<String, PathItem> {
        &self.paths
    }

    /// The component schema registry.
    #[must_use]
    pub fn schemas(&self) -> &IndexMap<String, Schema> {
        &self.schemas
    }

    /// Looks up a named schema.
    #[must_use]
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Looks up the operation declared for `method` on `template`.
    #[must_use]
    pub fn operation(&self, method: &Method, template: &str) -> Option<&Operation> {
        self.paths.get(template)?.operations.get(method)
    }

    /// Every operation in declaration order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.paths.values().flat_map(|item| item.operations.values())
    }

    /// Path prefix requests carry in front of every template.
    ///
    /// Taken from the first server URL. Root prefixes and templated server
    /// URLs (containing `{`) yield `None`.
    #[must_use]
    pub fn base_path(&self) -> Option<&str> {
        let server = self.servers.first()?;
        if server.contains('{') {
            return None;
        }
        let path = match server.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
            None => server.as_str(),
        };
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        (path.starts_with('/') && !path.is_empty()).then_some(path)
    }
}

/// Builder for [`Document`].
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Creates a builder with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            document: Document {
                title: title.into(),
                version: "0.0.0".to_string(),
                ..Document::default()
            },
        }
    }

    /// Sets the document version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.document.version = version.into();
        self
    }

    /// Adds a server URL.
    #[must_use]
    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.document.servers.push(url.into());
        self
    }

    /// Declares a path item with no operations yet.
    ///
    /// Useful to fix declaration order before operations are added.
    #[must_use]
    pub fn path(mut self, template: impl Into<String>) -> Self {
        let template = template.into();
        self.document
            .paths
            .entry(template.clone())
            .or_insert_with(|| PathItem::new(template));
        self
    }

    /// Adds an operation under its own template and method.
    ///
    /// A second operation for the same template and method replaces the first.
    #[must_use]
    pub fn operation(mut self, operation: Operation) -> Self {
        self.document
            .paths
            .entry(operation.path.clone())
            .or_insert_with(|| PathItem::new(operation.path.clone()))
            .operations
            .insert(operation.method.clone(), operation);
        self
    }

    /// Registers a named schema.
    #[must_use]
    pub fn schema(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.document.schemas.insert(name.into(), schema);
        self
    }

    /// Builds the document.
    #[must_use]
    pub fn build(self) -> Document {
        self.document
    }
}

/// A path template and its operations.
#[derive(Debug, Clone)]
pub struct PathItem {
    /// The template, e.g. `/pets/{petId}`.
    pub template: String,
    /// Operations keyed by method, in declaration order.
    pub operations: IndexMap<Method, Operation>,
}

impl PathItem {
    /// Creates an empty path item.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            operations: IndexMap::new(),
        }
    }
}

/// One method on one template.
#[derive(Debug, Clone)]
pub struct Operation {
    /// HTTP method.
    pub method: Method,
    /// Owning template.
    pub path: String,
    /// Declared `operationId`.
    pub operation_id: Option<String>,
    /// Short summary.
    pub summary: Option<String>,
    /// Marked deprecated.
    pub deprecated: bool,
    /// Effective parameters, path-level ones merged in.
    pub parameters: Vec<Parameter>,
    /// Declared request body.
    pub request_body: Option<RequestBody>,
    /// Responses by status key, in declaration order.
    pub responses: IndexMap<StatusKey, Response>,
}

impl Operation {
    /// Creates a builder for an operation.
    #[must_use]
    pub fn builder(method: Method, path: impl Into<String>) -> OperationBuilder {
        OperationBuilder::new(method, path)
    }

    /// Stable key: the `operationId` when declared, else `METHOD /template`.
    #[must_use]
    pub fn key(&self) -> String {
        self.operation_id
            .clone()
            .unwrap_or_else(|| format!("{} {}", self.method, self.path))
    }

    /// Finds the parameter declared for `name` in `location`.
    #[must_use]
    pub fn parameter(&self, name: &str, location: ParameterLocation) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.location == location && p.name == name)
    }

    /// Selects the response for a status: exact code, then range, then `default`.
    #[must_use]
    pub fn response_for(&self, status: StatusCode) -> Option<&Response> {
        let code = status.as_u16();
        self.responses
            .get(&StatusKey::Code(code))
            .or_else(|| self.responses.get(&StatusKey::range_of(code)))
            .or_else(|| self.responses.get(&StatusKey::Default))
    }
}

/// Builder for [`Operation`].
#[derive(Debug)]
pub struct OperationBuilder {
    operation: Operation,
}

impl OperationBuilder {
    /// Creates a builder for `method` on `path`.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            operation: Operation {
                method,
                path: path.into(),
                operation_id: None,
                summary: None,
                deprecated: false,
                parameters: Vec::new(),
                request_body: None,
                responses: IndexMap::new(),
            },
        }
    }

    /// Sets the `operationId`.
    #[must_use]
    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation.operation_id = Some(id.into());
        self
    }

    /// Sets the summary.
    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.operation.summary = Some(summary.into());
        self
    }

    /// Marks the operation deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.operation.deprecated = true;
        self
    }

    /// Adds a parameter, replacing one with the same name and location.
    #[must_use]
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.operation.parameters = merge_parameters(&self.operation.parameters, vec![parameter]);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn request_body(mut self, body: RequestBody) -> Self {
        self.operation.request_body = Some(body);
        self
    }

    /// Adds a response.
    #[must_use]
    pub fn response(mut self, key: StatusKey, response: Response) -> Self {
        self.operation.responses.insert(key, response);
        self
    }

    /// Builds the operation.
    #[must_use]
    pub fn build(self) -> Operation {
        self.operation
    }
}

/// Merges operation-level parameters over shared path-level ones.
///
/// An operation parameter replaces the shared one with the same name and
/// location in place; new parameters are appended in order.
#[must_use]
pub fn merge_parameters(shared: &[Parameter], own: Vec<Parameter>) -> Vec<Parameter> {
    let mut merged = shared.to_vec();
    for parameter in own {
        match merged
            .iter_mut()
            .find(|p| p.name == parameter.name && p.location == parameter.location)
        {
            Some(existing) => *existing = parameter,
            None => merged.push(parameter),
        }
    }
    merged
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    /// A template placeholder.
    Path,
    /// The query string.
    Query,
    /// A request header.
    Header,
    /// A cookie in the `Cookie` header.
    Cookie,
}

impl ParameterLocation {
    /// Parses an `in` value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }

    /// The `in` value as written in documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }

    /// Style used when a parameter declares none.
    #[must_use]
    pub const fn default_style(self) -> ParameterStyle {
        match self {
            Self::Path | Self::Header => ParameterStyle::Simple,
            Self::Query | Self::Cookie => ParameterStyle::Form,
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialisation style of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterStyle {
    /// `a,b,c`
    Simple,
    /// `x=a,b,c` or `x=a&x=b` when exploded.
    Form,
    /// `.a.b.c` (path only)
    Label,
    /// `;x=a,b,c` (path only)
    Matrix,
    /// `a b c`
    SpaceDelimited,
    /// `a|b|c`
    PipeDelimited,
    /// `x[k]=v` (query objects)
    DeepObject,
}

impl ParameterStyle {
    /// Parses a `style` value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "simple" => Some(Self::Simple),
            "form" => Some(Self::Form),
            "label" => Some(Self::Label),
            "matrix" => Some(Self::Matrix),
            "spaceDelimited" => Some(Self::SpaceDelimited),
            "pipeDelimited" => Some(Self::PipeDelimited),
            "deepObject" => Some(Self::DeepObject),
            _ => None,
        }
    }
}

/// A declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Name (header names compare case-insensitively).
    pub name: String,
    /// Where it is carried.
    pub location: ParameterLocation,
    /// Whether it must be present. Always true for path parameters.
    pub required: bool,
    /// Value schema.
    pub schema: Schema,
    /// Serialisation style.
    pub style: ParameterStyle,
    /// Whether arrays and objects are exploded.
    pub explode: bool,
    /// Free-form description.
    pub description: Option<String>,
}

impl Parameter {
    /// Creates a parameter with the location's default style.
    ///
    /// Path parameters are marked required.
    #[must_use]
    pub fn new(name: impl Into<String>, location: ParameterLocation, schema: Schema) -> Self {
        let style = location.default_style();
        Self {
            name: name.into(),
            location,
            required: location == ParameterLocation::Path,
            schema,
            style,
            explode: style == ParameterStyle::Form,
            description: None,
        }
    }

    /// A path parameter.
    #[must_use]
    pub fn path(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, ParameterLocation::Path, schema)
    }

    /// An optional query parameter.
    #[must_use]
    pub fn query(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, ParameterLocation::Query, schema)
    }

    /// An optional header parameter.
    #[must_use]
    pub fn header(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, ParameterLocation::Header, schema)
    }

    /// An optional cookie parameter.
    #[must_use]
    pub fn cookie(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, ParameterLocation::Cookie, schema)
    }

    /// Marks the parameter required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets style and explode.
    #[must_use]
    pub fn style(mut self, style: ParameterStyle, explode: bool) -> Self {
        self.style = style;
        self.explode = explode;
        self
    }
}

/// A declared request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestBody {
    /// Whether an empty body is a violation.
    pub required: bool,
    /// Accepted media types, in declaration order.
    pub content: IndexMap<String, MediaType>,
}

impl RequestBody {
    /// An optional body accepting `application/json` with `schema`.
    #[must_use]
    pub fn json(schema: Schema) -> Self {
        Self::default().media_type(DEFAULT_MEDIA_TYPE, MediaType::new(schema))
    }

    /// Adds a media type.
    #[must_use]
    pub fn media_type(mut self, name: impl Into<String>, media: MediaType) -> Self {
        self.content.insert(name.into(), media);
        self
    }

    /// Marks the body required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Schema attached to one media type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaType {
    /// `None` accepts any payload.
    pub schema: Option<Schema>,
}

impl MediaType {
    /// A media type constrained by `schema`.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
        }
    }
}

/// A declared response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Response {
    /// Free-form description.
    pub description: String,
    /// Body media types, in declaration order.
    pub content: IndexMap<String, MediaType>,
    /// Declared headers by name.
    pub headers: IndexMap<String, Header>,
}

impl Response {
    /// A response with no content or headers.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Adds `application/json` content.
    #[must_use]
    pub fn json(self, schema: Schema) -> Self {
        self.media_type(DEFAULT_MEDIA_TYPE, MediaType::new(schema))
    }

    /// Adds a media type.
    #[must_use]
    pub fn media_type(mut self, name: impl Into<String>, media: MediaType) -> Self {
        self.content.insert(name.into(), media);
        self
    }

    /// Declares a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, header: Header) -> Self {
        self.headers.insert(name.into(), header);
        self
    }
}

/// A declared response header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Whether the header must be present.
    pub required: bool,
    /// Value schema.
    pub schema: Schema,
}

impl Header {
    /// An optional header.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            required: false,
            schema,
        }
    }

    /// Marks the header required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A key of the `responses` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKey {
    /// An exact code such as `200`.
    Code(u16),
    /// A class such as `2XX` (stores the leading digit).
    Range(u8),
    /// The `default` catch-all.
    Default,
}

impl StatusKey {
    /// Parses `200`, `2XX`/`2xx` or `default`.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        if key == "default" {
            return Some(Self::Default);
        }
        let bytes = key.as_bytes();
        if bytes.len() != 3 {
            return None;
        }
        if bytes[1..].eq_ignore_ascii_case(b"XX") {
            return match bytes[0] {
                d @ b'1'..=b'5' => Some(Self::Range(d - b'0')),
                _ => None,
            };
        }
        key.parse::<u16>()
            .ok()
            .filter(|code| (100..=599).contains(code))
            .map(Self::Code)
    }

    /// The range key covering `code`.
    #[must_use]
    pub fn range_of(code: u16) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self::Range((code / 100) as u8)
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Range(class) => write!(f, "{class}XX"),
            Self::Default => f.write_str("default"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_status_key_parse() {
        assert_eq!(StatusKey::parse("200"), Some(StatusKey::Code(200)));
        assert_eq!(StatusKey::parse("2XX"), Some(StatusKey::Range(2)));
        assert_eq!(StatusKey::parse("4xx"), Some(StatusKey::Range(4)));
        assert_eq!(StatusKey::parse("default"), Some(StatusKey::Default));
        assert_eq!(StatusKey::parse("6XX"), None);
        assert_eq!(StatusKey::parse("2000"), None);
        assert_eq!(StatusKey::parse("099"), None);
        assert_eq!(StatusKey::parse("ok"), None);
        assert_eq!(StatusKey::Range(2).to_string(), "2XX");
    }

    #[test]
    fn test_response_lookup_order() {
        let op = Operation::builder(Method::GET, "/pets")
            .response(StatusKey::Default, Response::new("fallback"))
            .response(StatusKey::Range(2), Response::new("success"))
            .response(StatusKey::Code(200), Response::new("ok"))
            .build();

        assert_eq!(op.response_for(StatusCode::OK).unwrap().description, "ok");
        assert_eq!(op.response_for(StatusCode::CREATED).unwrap().description, "success");
        assert_eq!(
            op.response_for(StatusCode::NOT_FOUND).unwrap().description,
            "fallback"
        );
    }

    #[test]
    fn test_response_lookup_without_default() {
        let op = Operation::builder(Method::GET, "/pets")
            .response(StatusKey::Code(200), Response::new("ok"))
            .build();
        assert!(op.response_for(StatusCode::INTERNAL_SERVER_ERROR).is_none());
    }

    #[test]
    fn test_operation_key() {
        let op = Operation::builder(Method::DELETE, "/pets/{id}").build();
        assert_eq!(op.key(), "DELETE /pets/{id}");

        let op = Operation::builder(Method::DELETE, "/pets/{id}")
            .operation_id("deletePet")
            .build();
        assert_eq!(op.key(), "deletePet");
    }

    #[test]
    fn test_parameter_defaults() {
        let p = Parameter::path("id", Schema::integer());
        assert!(p.required);
        assert_eq!(p.style, ParameterStyle::Simple);
        assert!(!p.explode);

        let q = Parameter::query("tags", Schema::array(Schema::string()));
        assert!(!q.required);
        assert_eq!(q.style, ParameterStyle::Form);
        assert!(q.explode);
    }

    #[test]
    fn test_merge_parameters_overrides_by_name_and_location() {
        let shared = vec![
            Parameter::query("limit", Schema::integer()),
            Parameter::header("limit", Schema::string()),
        ];
        let merged = merge_parameters(
            &shared,
            vec![
                Parameter::query("limit", Schema::integer()).required(),
                Parameter::query("offset", Schema::integer()),
            ],
        );

        assert_eq!(merged.len(), 3);
        assert!(merged[0].required);
        assert_eq!(merged[1].location, ParameterLocation::Header);
        assert_eq!(merged[2].name, "offset");
    }

    #[test]
    fn test_builder_groups_operations_by_template() {
        let document = Document::builder("pets")
            .operation(Operation::builder(Method::GET, "/pets").build())
            .operation(Operation::builder(Method::POST, "/pets").build())
            .operation(Operation::builder(Method::GET, "/pets/{id}").build())
            .build();

        assert_eq!(document.paths().len(), 2);
        assert_eq!(document.operations().count(), 3);
        let methods: Vec<_> = document.paths()["/pets"].operations.keys().cloned().collect();
        assert_eq!(methods, vec![Method::GET, Method::POST]);
    }

    #[test]
    fn test_base_path() {
        let base = |url: &str| {
            Document::builder("t")
                .server(url)
                .build()
                .base_path()
                .map(str::to_string)
        };
        assert_eq!(base("https://api.example.com/v1"), Some("/v1".to_string()));
        assert_eq!(base("https://api.example.com/v1/"), Some("/v1".to_string()));
        assert_eq!(base("/api"), Some("/api".to_string()));
        assert_eq!(base("https://api.example.com"), None);
        assert_eq!(base("https://api.example.com/"), None);
        assert_eq!(base("https://{region}.example.com/v1"), None);
        assert_eq!(Document::builder("t").build().base_path(), None);
    }

    proptest! {
        /// With a range and a default declared, every status finds a response,
        /// and a declared exact code always wins.
        #[test]
        fn response_lookup_prefers_exact(code in 100u16..600, exact in 100u16..600) {
            let op = Operation::builder(Method::GET, "/x")
                .response(StatusKey::Default, Response::new("default"))
                .response(StatusKey::range_of(exact), Response::new("range"))
                .response(StatusKey::Code(exact), Response::new("exact"))
                .build();
            let status = StatusCode::from_u16(code).unwrap();
            let found = op.response_for(status).unwrap();
            if code == exact {
                prop_assert_eq!(found.description.as_str(), "exact");
            } else if code / 100 == exact / 100 {
                prop_assert_eq!(found.description.as_str(), "range");
            } else {
                prop_assert_eq!(found.description.as_str(), "default");
            }
        }
    }
}
