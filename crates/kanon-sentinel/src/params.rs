//! Parameter extraction and coercion.
//!
//! Parameters arrive as text. Each declared parameter is read from its
//! location according to its style, coerced into the JSON kind its schema
//! names and then validated like a body value. Violations are located at
//! `/<location>/<name>`, e.g. `/query/limit`.

use std::ops::ControlFlow;

use http::HeaderMap;
use indexmap::IndexMap;
use kanon_core::{Header, Parameter, ParameterLocation, ParameterStyle, Schema, SchemaKind};
use kanon_router::Params;
use serde_json::{Map, Number, Value};

use crate::error::{ErrorKind, ValidationError};
use crate::validation::{child_pointer, push_token, Collector, SchemaValidator};

/// A parameter as read from the request, before coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawValue {
    Scalar(String),
    List(Vec<String>),
    Pairs(Vec<(String, String)>),
}

/// A piece of a parameter that does not read as its declared kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rejected {
    /// Item index or object key below the parameter; `None` for scalars.
    pub(crate) token: Option<String>,
    pub(crate) reason: String,
}

impl Rejected {
    fn whole(reason: String) -> Self {
        Self {
            token: None,
            reason,
        }
    }

    fn at(token: impl Into<String>, reason: String) -> Self {
        Self {
            token: Some(token.into()),
            reason,
        }
    }
}

fn report_rejected(
    out: &mut Collector,
    kind: ErrorKind,
    pointer: &str,
    rejected: Vec<Rejected>,
) -> ControlFlow<()> {
    for Rejected { token, reason } in rejected {
        let location = match token {
            Some(token) => child_pointer(pointer, &token),
            None => pointer.to_string(),
        };
        out.report(ValidationError::new(kind, location, reason))?;
    }
    ControlFlow::Continue(())
}

/// The parts of a request parameters are read from.
#[derive(Debug)]
pub(crate) struct RequestParts<'r> {
    path: &'r Params,
    query: Vec<(String, String)>,
    headers: &'r HeaderMap,
    cookies: Vec<(String, String)>,
}

impl<'r> RequestParts<'r> {
    pub(crate) fn new(path: &'r Params, query: Option<&str>, headers: &'r HeaderMap) -> Self {
        let query = query
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self {
            path,
            query,
            headers,
            cookies: parse_cookies(headers),
        }
    }

    fn query_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.query
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// Joined value of every occurrence of header `name`.
pub(crate) fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let values: Vec<String> = headers
        .get_all(name)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect();
    (!values.is_empty()).then(|| values.join(","))
}

/// Validates every parameter of an operation, in declaration order.
pub(crate) fn check(
    validator: &SchemaValidator,
    parameters: &[Parameter],
    parts: &RequestParts<'_>,
    out: &mut Collector,
) -> ControlFlow<()> {
    for param in parameters {
        let mut pointer = format!("/{}", param.location);
        push_token(&mut pointer, &param.name);

        let schema = validator.resolve(&param.schema);
        let Some(raw) = extract(param, schema, parts) else {
            if param.required {
                out.report(ValidationError::new(
                    ErrorKind::MissingRequiredParameter,
                    &pointer,
                    format!("missing required {} parameter '{}'", param.location, param.name),
                ))?;
            }
            continue;
        };

        match coerce(validator, schema, raw) {
            Ok(value) => validator.check(&param.schema, &value, &mut pointer, out)?,
            Err(rejected) => {
                report_rejected(out, ErrorKind::InvalidParameterValue, &pointer, rejected)?;
            }
        }
    }
    ControlFlow::Continue(())
}

/// Validates the declared headers of a response.
///
/// Values use the `simple` style. Violations are located at `/header/<name>`.
pub(crate) fn check_headers(
    validator: &SchemaValidator,
    declared: &IndexMap<String, Header>,
    headers: &HeaderMap,
    out: &mut Collector,
) -> ControlFlow<()> {
    for (name, header) in declared {
        let mut pointer = "/header".to_string();
        push_token(&mut pointer, name);

        let Some(value) = header_value(headers, name) else {
            if header.required {
                out.report(ValidationError::new(
                    ErrorKind::MissingRequiredHeader,
                    &pointer,
                    format!("missing required header '{name}'"),
                ))?;
            }
            continue;
        };

        let schema = validator.resolve(&header.schema);
        let raw = shape_styled(&value, ParameterStyle::Simple, false, schema);
        match coerce(validator, schema, raw) {
            Ok(value) => validator.check(&header.schema, &value, &mut pointer, out)?,
            Err(rejected) => report_rejected(out, ErrorKind::InvalidType, &pointer, rejected)?,
        }
    }
    ControlFlow::Continue(())
}

/// Reads one parameter, shaped by the kind of its resolved schema.
pub(crate) fn extract(
    param: &Parameter,
    schema: &Schema,
    parts: &RequestParts<'_>,
) -> Option<RawValue> {
    let name = param.name.as_str();
    match param.location {
        ParameterLocation::Path => {
            let value = parts.path.get(name)?;
            Some(shape(strip_path_prefix(param, value), param, schema))
        }
        ParameterLocation::Query => extract_query(param, schema, parts),
        ParameterLocation::Header => {
            let value = header_value(parts.headers, name)?;
            Some(shape(&value, param, schema))
        }
        ParameterLocation::Cookie => Some(shape(parts.cookie(name)?, param, schema)),
    }
}

fn extract_query(param: &Parameter, schema: &Schema, parts: &RequestParts<'_>) -> Option<RawValue> {
    let name = param.name.as_str();
    match &schema.kind {
        SchemaKind::Array(_) if param.style == ParameterStyle::Form && param.explode => {
            let values: Vec<String> = parts.query_values(name).map(str::to_string).collect();
            (!values.is_empty()).then_some(RawValue::List(values))
        }
        SchemaKind::Object(_) if param.style == ParameterStyle::DeepObject => {
            let pairs: Vec<(String, String)> = parts
                .query
                .iter()
                .filter_map(|(k, v)| {
                    let inner = k.strip_prefix(name)?.strip_prefix('[')?.strip_suffix(']')?;
                    Some((inner.to_string(), v.clone()))
                })
                .collect();
            (!pairs.is_empty()).then_some(RawValue::Pairs(pairs))
        }
        SchemaKind::Object(object) if param.style == ParameterStyle::Form && param.explode => {
            let pairs: Vec<(String, String)> = parts
                .query
                .iter()
                .filter(|(k, _)| object.properties.contains_key(k))
                .cloned()
                .collect();
            (!pairs.is_empty()).then_some(RawValue::Pairs(pairs))
        }
        _ => {
            let value = parts.query_values(name).next()?;
            Some(shape(value, param, schema))
        }
    }
}

// Removes the `.` or `;name=` lead of label and matrix path values.
fn strip_path_prefix<'v>(param: &Parameter, value: &'v str) -> &'v str {
    match param.style {
        ParameterStyle::Label => value.strip_prefix('.').unwrap_or(value),
        ParameterStyle::Matrix => value
            .strip_prefix(';')
            .and_then(|v| v.strip_prefix(param.name.as_str()))
            .and_then(|v| v.strip_prefix('='))
            .unwrap_or(value),
        _ => value,
    }
}

fn separator(style: ParameterStyle, explode: bool) -> char {
    match style {
        ParameterStyle::SpaceDelimited => ' ',
        ParameterStyle::PipeDelimited => '|',
        ParameterStyle::Label if explode => '.',
        _ => ',',
    }
}

fn shape(value: &str, param: &Parameter, schema: &Schema) -> RawValue {
    if param.style == ParameterStyle::Matrix && param.explode {
        if let SchemaKind::Array(_) = schema.kind {
            let marker = format!(";{}=", param.name);
            return RawValue::List(value.split(marker.as_str()).map(str::to_string).collect());
        }
    }
    shape_styled(value, param.style, param.explode, schema)
}

fn shape_styled(value: &str, style: ParameterStyle, explode: bool, schema: &Schema) -> RawValue {
    let sep = separator(style, explode);
    match &schema.kind {
        SchemaKind::Array(_) => {
            let items = if value.is_empty() {
                Vec::new()
            } else {
                value.split(sep).map(|s| s.trim().to_string()).collect()
            };
            RawValue::List(items)
        }
        SchemaKind::Object(_) => {
            let pairs = if explode {
                value
                    .split(sep)
                    .filter_map(|pair| pair.split_once('='))
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            } else {
                let tokens: Vec<&str> = value.split(',').collect();
                tokens
                    .chunks(2)
                    .map(|pair| (pair[0].to_string(), pair.get(1).copied().unwrap_or("").to_string()))
                    .collect()
            };
            RawValue::Pairs(pairs)
        }
        _ => RawValue::Scalar(value.to_string()),
    }
}

/// Converts a raw parameter into the JSON kind of `schema`.
///
/// `schema` must already be resolved. Every item or value that cannot be
/// read as its declared scalar kind is rejected, each under its own token.
pub(crate) fn coerce(
    validator: &SchemaValidator,
    schema: &Schema,
    raw: RawValue,
) -> Result<Value, Vec<Rejected>> {
    match raw {
        RawValue::Scalar(s) => scalar(&s, schema).map_err(|reason| vec![Rejected::whole(reason)]),
        RawValue::List(items) => {
            let item_schema = schema
                .array_keywords()
                .and_then(|array| array.items.as_deref())
                .map(|s| validator.resolve(s));
            let mut values = Vec::with_capacity(items.len());
            let mut rejected = Vec::new();
            for (i, item) in items.into_iter().enumerate() {
                match item_schema.map(|s| scalar(&item, s)) {
                    Some(Ok(value)) => values.push(value),
                    Some(Err(reason)) => rejected.push(Rejected::at(i.to_string(), reason)),
                    None => values.push(Value::String(item)),
                }
            }
            if rejected.is_empty() {
                Ok(Value::Array(values))
            } else {
                Err(rejected)
            }
        }
        RawValue::Pairs(pairs) => {
            let mut map = Map::new();
            let mut rejected = Vec::new();
            for (key, value) in pairs {
                let declared = schema
                    .object_keywords()
                    .and_then(|object| object.properties.get(&key));
                match declared.map(|s| scalar(&value, validator.resolve(s))) {
                    Some(Ok(value)) => {
                        map.insert(key, value);
                    }
                    Some(Err(reason)) => rejected.push(Rejected::at(key, reason)),
                    None => {
                        map.insert(key, Value::String(value));
                    }
                }
            }
            if rejected.is_empty() {
                Ok(Value::Object(map))
            } else {
                Err(rejected)
            }
        }
    }
}

/// Reads `s` as the scalar kind of `schema`.
pub(crate) fn scalar(s: &str, schema: &Schema) -> Result<Value, String> {
    match schema.kind {
        SchemaKind::Integer => s
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| s.parse::<u64>().map(Value::from))
            .map_err(|_| format!("'{s}' is not an integer")),
        SchemaKind::Number => {
            if let Ok(n) = s.parse::<i64>() {
                return Ok(Value::from(n));
            }
            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("'{s}' is not a number"))
        }
        SchemaKind::Boolean => match s {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!("'{s}' is not a boolean")),
        },
        _ => Ok(Value::String(s.to_string())),
    }
}
