//! Reader for version 3 documents.
//!
//! [`OpenApi3`] is the serde model of a version 3 document as written (JSON
//! or YAML). [`OpenApi3::to_document`] maps it into the canonical
//! [`Document`], resolving component references for parameters, request
//! bodies, responses and headers. Schema references stay symbolic and are
//! resolved lazily by the validator.

use std::fmt;

use http::Method;
use indexmap::IndexMap;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::document::{
    merge_parameters, Document, Header, MediaType, Operation, Parameter, ParameterLocation,
    ParameterStyle, RequestBody, Response, StatusKey,
};
use crate::error::{BuildError, BuildResult};
use crate::schema::{RawSchema, Schema, COMPONENTS_PREFIX};

/// A `responses` key as written.
///
/// YAML documents commonly write status codes as bare integers, so both
/// strings and numbers are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawStatusKey(pub String);

impl<'de> Deserialize<'de> for RawStatusKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl Visitor<'_> for KeyVisitor {
            type Value = RawStatusKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a status code, range or 'default'")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(RawStatusKey(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(RawStatusKey(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(RawStatusKey(v.to_string()))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

impl RawStatusKey {
    pub(crate) fn parse(&self, location: &str) -> BuildResult<StatusKey> {
        StatusKey::parse(&self.0).ok_or_else(|| BuildError::InvalidStatusKey {
            location: location.to_string(),
            key: self.0.clone(),
        })
    }
}

/// Either a `$ref` or an inline item.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    /// A reference such as `#/components/parameters/limit`.
    Ref {
        /// The pointer.
        #[serde(rename = "$ref")]
        reference: String,
    },
    /// The item itself.
    Item(T),
}

/// Root of a version 3 document.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenApi3 {
    /// `openapi` version string.
    pub openapi: String,
    /// `info` block.
    #[serde(default)]
    pub info: Info,
    /// `servers`.
    #[serde(default)]
    pub servers: Vec<Server>,
    /// `paths`.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem3>,
    /// `components`.
    #[serde(default)]
    pub components: Components3,
}

/// `info` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    /// `title`.
    #[serde(default)]
    pub title: String,
    /// `version`.
    #[serde(default)]
    pub version: String,
}

/// A `servers` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    /// `url`.
    pub url: String,
}

/// A path item with one field per method.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem3 {
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter3>>,
    pub get: Option<Operation3>,
    pub put: Option<Operation3>,
    pub post: Option<Operation3>,
    pub delete: Option<Operation3>,
    pub options: Option<Operation3>,
    pub head: Option<Operation3>,
    pub patch: Option<Operation3>,
    pub trace: Option<Operation3>,
}

impl PathItem3 {
    /// Declared operations in document method order.
    pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation3)> {
        [
            (Method::GET, &self.get),
            (Method::PUT, &self.put),
            (Method::POST, &self.post),
            (Method::DELETE, &self.delete),
            (Method::OPTIONS, &self.options),
            (Method::HEAD, &self.head),
            (Method::PATCH, &self.patch),
            (Method::TRACE, &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }
}

/// An operation object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation3 {
    /// `operationId`.
    pub operation_id: Option<String>,
    /// `summary`.
    pub summary: Option<String>,
    /// `deprecated`.
    #[serde(default)]
    pub deprecated: bool,
    /// `parameters`.
    #[serde(default)]
    pub parameters: Vec<RefOr<Parameter3>>,
    /// `requestBody`.
    pub request_body: Option<RefOr<RequestBody3>>,
    /// `responses`.
    #[serde(default)]
    pub responses: IndexMap<RawStatusKey, RefOr<Response3>>,
}

/// A parameter object.
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter3 {
    /// `name`.
    pub name: String,
    /// `in`.
    #[serde(rename = "in")]
    pub location: String,
    /// `required`.
    #[serde(default)]
    pub required: bool,
    /// `schema`.
    pub schema: Option<RawSchema>,
    /// `style`.
    pub style: Option<String>,
    /// `explode`.
    pub explode: Option<bool>,
    /// `description`.
    pub description: Option<String>,
}

/// A request body object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody3 {
    /// `required`.
    #[serde(default)]
    pub required: bool,
    /// `content`.
    #[serde(default)]
    pub content: IndexMap<String, MediaType3>,
}

/// A media type object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType3 {
    /// `schema`.
    pub schema: Option<RawSchema>,
}

/// A response object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Response3 {
    /// `description`.
    #[serde(default)]
    pub description: String,
    /// `content`.
    #[serde(default)]
    pub content: IndexMap<String, MediaType3>,
    /// `headers`.
    #[serde(default)]
    pub headers: IndexMap<String, RefOr<Header3>>,
}

/// A header object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Header3 {
    /// `required`.
    #[serde(default)]
    pub required: bool,
    /// `schema`.
    pub schema: Option<RawSchema>,
}

/// `components` block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components3 {
    /// `schemas`.
    #[serde(default)]
    pub schemas: IndexMap<String, RawSchema>,
    /// `parameters`.
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter3>,
    /// `requestBodies`.
    #[serde(default)]
    pub request_bodies: IndexMap<String, RequestBody3>,
    /// `responses`.
    #[serde(default)]
    pub responses: IndexMap<String, Response3>,
    /// `headers`.
    #[serde(default)]
    pub headers: IndexMap<String, Header3>,
}

fn resolve<'a, T>(
    item: &'a RefOr<T>,
    prefix: &str,
    registry: &'a IndexMap<String, T>,
    location: &str,
) -> BuildResult<&'a T> {
    match item {
        RefOr::Item(item) => Ok(item),
        RefOr::Ref { reference } => reference
            .strip_prefix(prefix)
            .and_then(|name| registry.get(name))
            .ok_or_else(|| BuildError::unresolved(location, reference.clone())),
    }
}

fn schema_or_any(raw: Option<&RawSchema>, location: &str) -> BuildResult<Schema> {
    raw.map_or_else(
        || Ok(Schema::any()),
        |raw| Schema::from_raw(raw, COMPONENTS_PREFIX).map_err(|e| BuildError::schema(location, e)),
    )
}

fn content(raw: &IndexMap<String, MediaType3>, location: &str) -> BuildResult<IndexMap<String, MediaType>> {
    raw.iter()
        .map(|(name, media)| {
            let schema = media
                .schema
                .as_ref()
                .map(|raw| schema_or_any(Some(raw), &format!("{location}/{name}")))
                .transpose()?;
            Ok((name.clone(), MediaType { schema }))
        })
        .collect()
}

impl OpenApi3 {
    /// Maps this document into the canonical model.
    pub fn to_document(&self) -> BuildResult<Document> {
        if !self.openapi.starts_with("3.") {
            return Err(BuildError::UnsupportedVersion(self.openapi.clone()));
        }

        let mut builder = Document::builder(self.info.title.clone()).version(self.info.version.clone());
        for server in &self.servers {
            builder = builder.server(server.url.clone());
        }

        for (name, raw) in &self.components.schemas {
            let location = format!("{COMPONENTS_PREFIX}{name}");
            let schema = Schema::from_raw(raw, COMPONENTS_PREFIX)
                .map_err(|e| BuildError::schema(location, e))?;
            builder = builder.schema(name.clone(), schema);
        }

        for (template, item) in &self.paths {
            builder = builder.path(template.clone());
            let shared = self.parameters(&item.parameters, template)?;
            for (method, op) in item.operations() {
                let operation = self.operation(template, method, op, &shared)?;
                debug!(
                    operation_id = %operation.key(),
                    http.method = %operation.method,
                    http.path = %template,
                    "read operation"
                );
                builder = builder.operation(operation);
            }
        }

        Ok(builder.build())
    }

    fn operation(
        &self,
        template: &str,
        method: Method,
        op: &Operation3,
        shared: &[Parameter],
    ) -> BuildResult<Operation> {
        let location = format!("{method} {template}");
        let own = self.parameters(&op.parameters, &location)?;

        let request_body = op
            .request_body
            .as_ref()
            .map(|body| {
                let body = resolve(
                    body,
                    "#/components/requestBodies/",
                    &self.components.request_bodies,
                    &location,
                )?;
                Ok::<_, BuildError>(RequestBody {
                    required: body.required,
                    content: content(&body.content, &format!("{location} requestBody"))?,
                })
            })
            .transpose()?;

        let mut responses = IndexMap::new();
        for (key, response) in &op.responses {
            let status = key.parse(&location)?;
            let response = resolve(
                response,
                "#/components/responses/",
                &self.components.responses,
                &location,
            )?;
            responses.insert(status, self.response(response, &format!("{location} {status}"))?);
        }

        Ok(Operation {
            method,
            path: template.to_string(),
            operation_id: op.operation_id.clone(),
            summary: op.summary.clone(),
            deprecated: op.deprecated,
            parameters: merge_parameters(shared, own),
            request_body,
            responses,
        })
    }

    fn response(&self, response: &Response3, location: &str) -> BuildResult<Response> {
        let mut headers = IndexMap::new();
        for (name, header) in &response.headers {
            let header = resolve(header, "#/components/headers/", &self.components.headers, location)?;
            headers.insert(
                name.clone(),
                Header {
                    required: header.required,
                    schema: schema_or_any(header.schema.as_ref(), &format!("{location} header {name}"))?,
                },
            );
        }

        Ok(Response {
            description: response.description.clone(),
            content: content(&response.content, location)?,
            headers,
        })
    }

    fn parameters(&self, raw: &[RefOr<Parameter3>], location: &str) -> BuildResult<Vec<Parameter>> {
        raw.iter()
            .map(|p| {
                let p = resolve(p, "#/components/parameters/", &self.components.parameters, location)?;
                parameter(p, location)
            })
            .collect()
    }
}

fn parameter(raw: &Parameter3, location: &str) -> BuildResult<Parameter> {
    let place = format!("{location} parameter {}", raw.name);
    let param_location =
        ParameterLocation::parse(&raw.location).ok_or_else(|| BuildError::UnknownParameterLocation {
            location: place.clone(),
            found: raw.location.clone(),
        })?;

    let mut parameter = Parameter::new(
        raw.name.clone(),
        param_location,
        schema_or_any(raw.schema.as_ref(), &place)?,
    );
    parameter.required = raw.required || param_location == ParameterLocation::Path;
    parameter.description.clone_from(&raw.description);

    if let Some(style) = &raw.style {
        match ParameterStyle::parse(style) {
            Some(style) => {
                parameter.style = style;
                parameter.explode = style == ParameterStyle::Form;
            }
            None => warn!(parameter = %raw.name, style = %style, "unknown parameter style, using default"),
        }
    }
    if let Some(explode) = raw.explode {
        parameter.explode = explode;
    }

    Ok(parameter)
}
