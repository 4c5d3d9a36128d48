//! Legacy to canonical conversion.

use http::Method;
use indexmap::IndexMap;
use tracing::{debug, info};

use super::model::{
    LegacyDocument, LegacyOperation, LegacyParameter, LegacyResponse, ParameterOrRef,
    ResponseOrRef,
};
use crate::document::{
    Document, Header, MediaType, Operation, Parameter, ParameterLocation, ParameterStyle,
    RequestBody, Response, StatusKey, DEFAULT_MEDIA_TYPE,
};
use crate::error::ConversionError;
use crate::schema::{Format, RawSchema, Schema, DEFINITIONS_PREFIX};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

type Result<T> = std::result::Result<T, ConversionError>;

/// Converts a legacy document into the canonical model.
///
/// The input is only borrowed. Path templates are kept verbatim; `basePath`
/// (with `host` and the first scheme when present) becomes the first server
/// URL.
///
/// # Errors
///
/// Returns a [`ConversionError`] naming the affected path and method when an
/// operation cannot be expressed canonically.
pub fn convert(legacy: &LegacyDocument) -> Result<Document> {
    if legacy.swagger != "2.0" {
        return Err(ConversionError::UnsupportedVersion(legacy.swagger.clone()));
    }

    let mut builder =
        Document::builder(legacy.info.title.clone()).version(legacy.info.version.clone());
    if let Some(url) = server_url(legacy) {
        builder = builder.server(url);
    }

    for (name, raw) in &legacy.definitions {
        let schema = Schema::from_raw(raw, DEFINITIONS_PREFIX)
            .map_err(|e| ConversionError::schema(format!("{DEFINITIONS_PREFIX}{name}"), e))?;
        builder = builder.schema(name.clone(), schema);
    }

    let mut operations = 0usize;
    for (template, item) in &legacy.paths {
        builder = builder.path(template.clone());
        for (method, op) in item.operations() {
            let scope = Scope {
                legacy,
                path: template,
                method,
            };
            builder = builder.operation(scope.operation(&item.parameters, op)?);
            operations += 1;
        }
    }

    info!(
        title = %legacy.info.title,
        operations,
        definitions = legacy.definitions.len(),
        "converted legacy document"
    );
    Ok(builder.build())
}

fn server_url(legacy: &LegacyDocument) -> Option<String> {
    let base = legacy.base_path.as_deref().unwrap_or_default();
    match &legacy.host {
        Some(host) => {
            let scheme = legacy.schemes.first().map_or("http", String::as_str);
            Some(format!("{scheme}://{host}{base}"))
        }
        None if !base.is_empty() => Some(base.to_string()),
        None => None,
    }
}

fn media_types<'a>(own: Option<&'a [String]>, shared: &'a [String]) -> Vec<&'a str> {
    let list = own.unwrap_or(shared);
    if list.is_empty() {
        vec![DEFAULT_MEDIA_TYPE]
    } else {
        list.iter().map(String::as_str).collect()
    }
}

/// One operation being converted.
struct Scope<'a> {
    legacy: &'a LegacyDocument,
    path: &'a str,
    method: Method,
}

impl<'a> Scope<'a> {
    fn malformed(&self, name: &str, reason: impl Into<String>) -> ConversionError {
        ConversionError::malformed(self.path, self.method.as_str(), name, reason)
    }

    fn dangling(&self, reference: &str) -> ConversionError {
        ConversionError::dangling(self.path, self.method.as_str(), reference)
    }

    fn schema(&self, raw: &RawSchema, what: &str) -> Result<Schema> {
        Schema::from_raw(raw, DEFINITIONS_PREFIX).map_err(|e| {
            ConversionError::schema(format!("{} {} {what}", self.method, self.path), e)
        })
    }

    fn resolve_parameter(&self, p: &'a ParameterOrRef) -> Result<&'a LegacyParameter> {
        match p {
            ParameterOrRef::Parameter(p) => Ok(p),
            ParameterOrRef::Ref { reference } => reference
                .strip_prefix("#/parameters/")
                .and_then(|name| self.legacy.parameters.get(name))
                .ok_or_else(|| self.dangling(reference)),
        }
    }

    fn resolve_response(&self, r: &'a ResponseOrRef) -> Result<&'a LegacyResponse> {
        match r {
            ResponseOrRef::Response(r) => Ok(r),
            ResponseOrRef::Ref { reference } => reference
                .strip_prefix("#/responses/")
                .and_then(|name| self.legacy.responses.get(name))
                .ok_or_else(|| self.dangling(reference)),
        }
    }

    fn operation(&self, shared: &'a [ParameterOrRef], op: &'a LegacyOperation) -> Result<Operation> {
        let mut effective: Vec<&LegacyParameter> = Vec::new();
        for p in shared.iter().chain(&op.parameters) {
            let p = self.resolve_parameter(p)?;
            match effective
                .iter_mut()
                .find(|q| q.name == p.name && q.location == p.location)
            {
                Some(slot) => *slot = p,
                None => effective.push(p),
            }
        }

        let mut parameters = Vec::new();
        let mut body = None;
        let mut form = Vec::new();
        for p in effective {
            match p.location.as_str() {
                "body" if body.is_some() => {
                    return Err(ConversionError::MultipleBodies {
                        path: self.path.to_string(),
                        method: self.method.to_string(),
                    });
                }
                "body" => body = Some(p),
                "formData" => form.push(p),
                "path" | "query" | "header" => parameters.push(self.parameter(p)?),
                other => {
                    return Err(ConversionError::UnsupportedLocation {
                        path: self.path.to_string(),
                        method: self.method.to_string(),
                        name: p.name.clone(),
                        location: other.to_string(),
                    });
                }
            }
        }

        let consumes = media_types(op.consumes.as_deref(), &self.legacy.consumes);
        let request_body = match (body, form.is_empty()) {
            (Some(_), false) => {
                return Err(ConversionError::BodyAndFormData {
                    path: self.path.to_string(),
                    method: self.method.to_string(),
                });
            }
            (Some(body), true) => Some(self.body(body, &consumes)?),
            (None, false) => Some(self.form(&form, &consumes)?),
            (None, true) => None,
        };

        let produces = media_types(op.produces.as_deref(), &self.legacy.produces);
        let mut responses = IndexMap::new();
        for (key, response) in &op.responses {
            let status = StatusKey::parse(&key.0).ok_or_else(|| ConversionError::InvalidStatusKey {
                path: self.path.to_string(),
                method: self.method.to_string(),
                key: key.0.clone(),
            })?;
            let response = self.resolve_response(response)?;
            responses.insert(status, self.response(response, &produces)?);
        }

        debug!(
            operation_id = ?op.operation_id,
            http.method = %self.method,
            http.path = %self.path,
            parameters = parameters.len(),
            "converted legacy operation"
        );

        Ok(Operation {
            method: self.method.clone(),
            path: self.path.to_string(),
            operation_id: op.operation_id.clone(),
            summary: op.summary.clone(),
            deprecated: op.deprecated,
            parameters,
            request_body,
            responses,
        })
    }

    fn parameter(&self, p: &LegacyParameter) -> Result<Parameter> {
        let location = match p.location.as_str() {
            "path" => ParameterLocation::Path,
            "header" => ParameterLocation::Header,
            _ => ParameterLocation::Query,
        };
        let schema = self.inline_schema(p)?;
        let is_array = schema.kind.type_name() == Some("array");

        let mut parameter = Parameter::new(p.name.clone(), location, schema);
        parameter.required = p.required || location == ParameterLocation::Path;
        parameter.description.clone_from(&p.description);
        if is_array {
            let (style, explode) = self.collection_style(p, location)?;
            parameter.style = style;
            parameter.explode = explode;
        }
        Ok(parameter)
    }

    fn collection_style(
        &self,
        p: &LegacyParameter,
        location: ParameterLocation,
    ) -> Result<(ParameterStyle, bool)> {
        let format = p.collection_format.as_deref().unwrap_or("csv");
        match (format, location) {
            ("csv", ParameterLocation::Query) => Ok((ParameterStyle::Form, false)),
            ("csv", _) => Ok((ParameterStyle::Simple, false)),
            ("multi", ParameterLocation::Query) => Ok((ParameterStyle::Form, true)),
            ("ssv", ParameterLocation::Query) => Ok((ParameterStyle::SpaceDelimited, false)),
            ("pipes", ParameterLocation::Query) => Ok((ParameterStyle::PipeDelimited, false)),
            (other, location) => Err(self.malformed(
                &p.name,
                format!("collectionFormat '{other}' is not supported in {location}"),
            )),
        }
    }

    fn inline_schema(&self, p: &LegacyParameter) -> Result<Schema> {
        let raw = &p.inline;
        match raw.schema_type.as_deref() {
            None => return Err(self.malformed(&p.name, "missing type")),
            Some("file") => {
                return Err(self.malformed(&p.name, "type 'file' is only allowed in formData"));
            }
            Some("array") if raw.items.is_none() => {
                return Err(self.malformed(&p.name, "array without items"));
            }
            Some(_) => {}
        }
        self.check_format(&p.name, raw)?;
        self.schema(raw, &format!("parameter {}", p.name))
    }

    fn check_format(&self, name: &str, raw: &RawSchema) -> Result<()> {
        if let (Some(ty), Some(format)) = (raw.schema_type.as_deref(), raw.format.as_deref()) {
            let format = Format::from_name(format);
            if format.is_integer_format() && ty != "integer" {
                return Err(self.malformed(name, format!("format '{format}' requires type integer, found '{ty}'")));
            }
            if format.is_float_format() && ty != "number" {
                return Err(self.malformed(name, format!("format '{format}' requires type number, found '{ty}'")));
            }
        }
        match &raw.items {
            Some(items) => self.check_format(name, items),
            None => Ok(()),
        }
    }

    fn body(&self, p: &LegacyParameter, consumes: &[&str]) -> Result<RequestBody> {
        let schema = match &p.schema {
            Some(raw) => self.schema(raw, "body")?,
            None => Schema::any(),
        };
        let mut body = RequestBody {
            required: p.required,
            content: IndexMap::new(),
        };
        for media in consumes {
            body = body.media_type(*media, MediaType::new(schema.clone()));
        }
        Ok(body)
    }

    fn form(&self, form: &[&LegacyParameter], consumes: &[&str]) -> Result<RequestBody> {
        let mut multipart = consumes.contains(&MULTIPART);
        let mut object = Schema::object();
        let mut required = false;

        for p in form {
            let schema = if p.inline.schema_type.as_deref() == Some("file") {
                multipart = true;
                Schema::string().format(Format::Binary)
            } else {
                self.inline_schema(p)?
            };
            object = object.property(p.name.clone(), schema);
            if p.required {
                object = object.require(p.name.clone());
                required = true;
            }
        }

        let media = if multipart { MULTIPART } else { FORM_URLENCODED };
        let body = RequestBody {
            required,
            content: IndexMap::new(),
        };
        Ok(body.media_type(media, MediaType::new(object)))
    }

    fn response(&self, r: &LegacyResponse, produces: &[&str]) -> Result<Response> {
        let mut response = Response::new(r.description.clone());

        if let Some(raw) = &r.schema {
            let media = if raw.schema_type.as_deref() == Some("file") {
                MediaType::default()
            } else {
                MediaType::new(self.schema(raw, "response")?)
            };
            for name in produces {
                response = response.media_type(*name, media.clone());
            }
        }

        for (name, header) in &r.headers {
            let schema = self.schema(&header.schema, &format!("header {name}"))?;
            response = response.header(name.clone(), Header::new(schema));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AdditionalProperties, SchemaKind};
    use http::StatusCode;
    use serde_json::json;

    fn legacy(value: serde_json::Value) -> LegacyDocument {
        serde_json::from_value(value).unwrap()
    }

    fn one_operation(op: serde_json::Value) -> LegacyDocument {
        legacy(json!({
            "swagger": "2.0",
            "info": {"title": "t", "version": "1"},
            "paths": {"/items/{id}": {"post": op}}
        }))
    }

    fn convert_op(op: serde_json::Value) -> Result<Operation> {
        let document = convert(&one_operation(op))?;
        Ok(document.operation(&Method::POST, "/items/{id}").unwrap().clone())
    }

    #[test]
    fn test_convert_foo_example() {
        let legacy: LegacyDocument = serde_yaml::from_str(crate::fixtures::FOO_SWAGGER_YAML).unwrap();
        let document = convert(&legacy).unwrap();
        let op = document.operation(&Method::POST, "/foo/{bar}").unwrap();

        assert_eq!(op.summary.as_deref(), Some("Example"));
        assert_eq!(op.parameters.len(), 2);
        let bar = op.parameter("bar", ParameterLocation::Path).unwrap();
        assert_eq!(bar.schema.kind, SchemaKind::Number);
        let baz = op.parameter("baz", ParameterLocation::Query).unwrap();
        assert!(baz.required);
        assert_eq!(baz.schema.format, Some(Format::Email));

        let body = op.request_body.as_ref().unwrap();
        assert!(body.required);
        let schema = body.content[DEFAULT_MEDIA_TYPE].schema.as_ref().unwrap();
        assert_eq!(schema.required(), &["john".to_string()]);

        let ok = op.response_for(StatusCode::OK).unwrap();
        let SchemaKind::Object(object) = &ok.content[DEFAULT_MEDIA_TYPE].schema.as_ref().unwrap().kind
        else {
            panic!("expected an object response schema");
        };
        assert_eq!(object.additional, AdditionalProperties::Forbidden);

        let bad = op.response_for(StatusCode::BAD_REQUEST).unwrap();
        assert!(bad.content.is_empty());
    }

    #[test]
    fn test_base_path_becomes_server() {
        let mut doc = one_operation(json!({}));
        doc.base_path = Some("/api".to_string());
        assert_eq!(convert(&doc).unwrap().servers(), &["/api".to_string()]);

        doc.host = Some("example.com".to_string());
        doc.schemes = vec!["https".to_string()];
        let converted = convert(&doc).unwrap();
        assert_eq!(converted.servers(), &["https://example.com/api".to_string()]);
        assert_eq!(converted.base_path(), Some("/api"));
    }

    #[test]
    fn test_collection_formats() {
        let op = convert_op(json!({
            "parameters": [
                {"name": "csv", "in": "query", "type": "array", "items": {"type": "string"}},
                {"name": "multi", "in": "query", "type": "array", "collectionFormat": "multi", "items": {"type": "string"}},
                {"name": "ssv", "in": "query", "type": "array", "collectionFormat": "ssv", "items": {"type": "string"}},
                {"name": "pipes", "in": "query", "type": "array", "collectionFormat": "pipes", "items": {"type": "integer"}},
                {"name": "X-Ids", "in": "header", "type": "array", "items": {"type": "integer"}}
            ]
        }))
        .unwrap();

        let style = |name: &str| {
            let p = op.parameters.iter().find(|p| p.name == name).unwrap();
            (p.style, p.explode)
        };
        assert_eq!(style("csv"), (ParameterStyle::Form, false));
        assert_eq!(style("multi"), (ParameterStyle::Form, true));
        assert_eq!(style("ssv"), (ParameterStyle::SpaceDelimited, false));
        assert_eq!(style("pipes"), (ParameterStyle::PipeDelimited, false));
        assert_eq!(style("X-Ids"), (ParameterStyle::Simple, false));
    }

    #[test]
    fn test_unsupported_collection_format() {
        let err = convert_op(json!({
            "parameters": [{"name": "t", "in": "query", "type": "array", "collectionFormat": "tsv", "items": {"type": "string"}}]
        }))
        .unwrap_err();
        assert!(matches!(err, ConversionError::MalformedParameter { .. }));
    }

    #[test]
    fn test_consumes_override_produces_one_media_type_each() {
        let mut doc = one_operation(json!({
            "consumes": ["application/json", "application/vnd.item+json"],
            "parameters": [{"name": "body", "in": "body", "schema": {"$ref": "#/definitions/Item"}}]
        }));
        doc.consumes = vec!["text/plain".to_string()];
        doc.definitions.insert("Item".to_string(), RawSchema::default());

        let converted = convert(&doc).unwrap();
        let op = converted.operation(&Method::POST, "/items/{id}").unwrap();
        let body = op.request_body.as_ref().unwrap();
        assert!(!body.required);
        assert_eq!(
            body.content.keys().collect::<Vec<_>>(),
            vec!["application/json", "application/vnd.item+json"]
        );
        assert_eq!(
            body.content["application/json"].schema.as_ref().unwrap().kind,
            SchemaKind::Ref("Item".to_string())
        );
    }

    #[test]
    fn test_form_data_is_urlencoded() {
        let op = convert_op(json!({
            "parameters": [
                {"name": "name", "in": "formData", "type": "string", "required": true},
                {"name": "age", "in": "formData", "type": "integer"}
            ]
        }))
        .unwrap();

        let body = op.request_body.unwrap();
        assert!(body.required);
        let schema = body.content[FORM_URLENCODED].schema.as_ref().unwrap();
        assert_eq!(schema.required(), &["name".to_string()]);
    }

    #[test]
    fn test_file_form_data_is_multipart() {
        let op = convert_op(json!({
            "parameters": [
                {"name": "upload", "in": "formData", "type": "file"},
                {"name": "note", "in": "formData", "type": "string"}
            ]
        }))
        .unwrap();
        let body = op.request_body.unwrap();
        assert!(body.content.contains_key(MULTIPART));
        assert!(!body.required);
    }

    #[test]
    fn test_path_level_parameters_are_merged() {
        let doc = legacy(json!({
            "swagger": "2.0",
            "parameters": {"limit": {"name": "limit", "in": "query", "type": "integer"}},
            "paths": {"/items": {
                "parameters": [
                    {"$ref": "#/parameters/limit"},
                    {"name": "trace", "in": "header", "type": "string"}
                ],
                "get": {"parameters": [{"name": "limit", "in": "query", "type": "integer", "required": true}]}
            }}
        }));
        let converted = convert(&doc).unwrap();
        let op = converted.operation(&Method::GET, "/items").unwrap();
        assert_eq!(op.parameters.len(), 2);
        assert!(op.parameter("limit", ParameterLocation::Query).unwrap().required);
        assert!(op.parameter("trace", ParameterLocation::Header).is_some());
    }

    #[test]
    fn test_response_refs_headers_and_default() {
        let doc = legacy(json!({
            "swagger": "2.0",
            "produces": ["application/json", "application/xml"],
            "responses": {"NotFound": {"description": "missing"}},
            "paths": {"/items": {"get": {"responses": {
                "200": {
                    "description": "ok",
                    "schema": {"type": "array", "items": {"type": "string", "x-nullable": true}},
                    "headers": {"X-Total": {"type": "integer", "format": "int32"}}
                },
                "404": {"$ref": "#/responses/NotFound"},
                "default": {"description": "error"}
            }}}}
        }));
        let converted = convert(&doc).unwrap();
        let op = converted.operation(&Method::GET, "/items").unwrap();

        let ok = op.response_for(StatusCode::OK).unwrap();
        assert_eq!(ok.content.len(), 2);
        let SchemaKind::Array(array) = &ok.content["application/xml"].schema.as_ref().unwrap().kind else {
            panic!("expected array");
        };
        assert!(array.items.as_ref().unwrap().nullable);
        assert_eq!(ok.headers["X-Total"].schema.format, Some(Format::Int32));

        assert_eq!(op.response_for(StatusCode::NOT_FOUND).unwrap().description, "missing");
        assert_eq!(op.response_for(StatusCode::CONFLICT).unwrap().description, "error");
    }

    #[test]
    fn test_conversion_failures() {
        let cases = [
            (json!({"parameters": [{"name": "s", "in": "cookie", "type": "string"}]}), "unsupported location"),
            (json!({"parameters": [{"name": "q", "in": "query"}]}), "missing type"),
            (json!({"parameters": [{"name": "f", "in": "query", "type": "file"}]}), "only allowed in formData"),
            (json!({"parameters": [{"name": "a", "in": "query", "type": "array"}]}), "array without items"),
            (json!({"parameters": [{"name": "n", "in": "query", "type": "string", "format": "int64"}]}), "requires type integer"),
            (json!({"parameters": [{"name": "n", "in": "query", "type": "integer", "format": "double"}]}), "requires type number"),
            (json!({"parameters": [
                {"name": "a", "in": "body", "schema": {}},
                {"name": "b", "in": "body", "schema": {}}
            ]}), "more than one body"),
            (json!({"parameters": [
                {"name": "a", "in": "body", "schema": {}},
                {"name": "b", "in": "formData", "type": "string"}
            ]}), "cannot be combined"),
            (json!({"parameters": [{"$ref": "#/parameters/missing"}]}), "dangling reference"),
            (json!({"responses": {"200": {"$ref": "#/responses/missing"}}}), "dangling reference"),
            (json!({"responses": {"2X0": {"description": "?"}}}), "invalid status key"),
        ];

        for (op, expected) in cases {
            let err = convert_op(op.clone()).unwrap_err();
            let message = err.to_string();
            assert!(message.contains(expected), "{op}: {message}");
            assert!(message.contains("POST /items/{id}"), "{message}");
        }
    }

    #[test]
    fn test_unsupported_swagger_version() {
        let doc = legacy(json!({"swagger": "1.2"}));
        assert_eq!(
            convert(&doc).unwrap_err(),
            ConversionError::UnsupportedVersion("1.2".to_string())
        );
    }
}
