//! Media type selection and body decoding.
//!
//! A body is checked against the schema of the media type its
//! `Content-Type` selects. Only JSON (`application/json`, `*+json`) and
//! `application/x-www-form-urlencoded` payloads are decoded; other declared
//! types are accepted without inspection.

use std::ops::ControlFlow;

use indexmap::IndexMap;
use kanon_core::{MediaType, Schema, SchemaKind};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, ValidationError};
use crate::params::scalar;
use crate::validation::{Collector, SchemaValidator};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// `type/subtype` of a `Content-Type` value, lowercased, parameters dropped.
#[must_use]
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Returns true for `application/json` and `+json` structured types.
#[must_use]
pub fn is_json(essence: &str) -> bool {
    essence == "application/json" || essence.ends_with("+json")
}

/// Picks the declared entry for a request's media type.
///
/// Exact matches win over `type/*`, which wins over `*/*`. Without a
/// `Content-Type` the first declared entry applies. `Err` carries the
/// undeclared essence.
pub(crate) fn select<'c>(
    content: &'c IndexMap<String, MediaType>,
    content_type: Option<&str>,
) -> Result<Option<(&'c str, &'c MediaType)>, String> {
    let Some(content_type) = content_type else {
        return Ok(content.first().map(|(k, v)| (k.as_str(), v)));
    };
    let wanted = essence(content_type);
    let major = wanted.split('/').next().unwrap_or_default();

    let exact = content.iter().find(|(k, _)| essence(k) == wanted);
    let family = || {
        content.iter().find(|(k, _)| {
            let declared = essence(k);
            declared
                .strip_suffix("/*")
                .is_some_and(|prefix| prefix == major && prefix != "*")
        })
    };
    let any = || content.iter().find(|(k, _)| essence(k) == "*/*");

    let found = exact.or_else(family).or_else(any);
    found.map(|(k, v)| Some((k.as_str(), v))).ok_or(wanted)
}

/// Validates a non-empty body against the declared `content`.
pub(crate) fn check(
    validator: &SchemaValidator,
    content: &IndexMap<String, MediaType>,
    content_type: Option<&str>,
    body: &[u8],
    out: &mut Collector,
) -> ControlFlow<()> {
    if content.is_empty() {
        return ControlFlow::Continue(());
    }

    let (declared, media) = match select(content, content_type) {
        Ok(Some(selected)) => selected,
        Ok(None) => return ControlFlow::Continue(()),
        Err(found) => {
            let expected: Vec<&str> = content.keys().map(String::as_str).collect();
            return out.report(ValidationError::new(
                ErrorKind::UnsupportedMediaType,
                "",
                format!("media type '{found}' is not declared (expected {})", expected.join(", ")),
            ));
        }
    };

    let Some(schema) = &media.schema else {
        return ControlFlow::Continue(());
    };

    let effective = essence(content_type.unwrap_or(declared));
    let value = if is_json(&effective) {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => value,
            Err(e) => return malformed(out, format!("body is not valid JSON: {e}")),
        }
    } else if effective == FORM_URLENCODED {
        decode_form(validator, schema, body)
    } else {
        return ControlFlow::Continue(());
    };

    validator.check(schema, &value, &mut String::new(), out)
}

pub(crate) fn malformed(out: &mut Collector, message: String) -> ControlFlow<()> {
    out.report(ValidationError::new(ErrorKind::MalformedBody, "", message))
}

// Repeated keys become arrays when the property is declared as one. Values
// that do not read as their declared scalar kind stay strings so the schema
// check reports them.
fn decode_form(validator: &SchemaValidator, schema: &Schema, body: &[u8]) -> Value {
    let object = validator.resolve(schema).object_keywords();

    let mut map = Map::new();
    for (key, raw) in url::form_urlencoded::parse(body) {
        let declared = object
            .and_then(|o| o.properties.get(&*key))
            .map(|s| validator.resolve(s));

        let value = match declared {
            Some(Schema {
                kind: SchemaKind::Array(array),
                ..
            }) => {
                let item = array
                    .items
                    .as_deref()
                    .map_or_else(|| Value::String(raw.to_string()), |s| {
                        best_effort(&raw, validator.resolve(s))
                    });
                if let Some(Value::Array(items)) = map.get_mut(&*key) {
                    items.push(item);
                    continue;
                }
                Value::Array(vec![item])
            }
            Some(declared) => best_effort(&raw, declared),
            None => Value::String(raw.into_owned()),
        };
        map.insert(key.into_owned(), value);
    }
    Value::Object(map)
}

fn best_effort(raw: &str, schema: &Schema) -> Value {
    scalar(raw, schema).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationConfig;
    use crate::validation::Mode;
    use serde_json::json;

    fn content(types: &[&str]) -> IndexMap<String, MediaType> {
        types
            .iter()
            .map(|t| ((*t).to_string(), MediaType::new(Schema::any())))
            .collect()
    }

    fn selected(content: &IndexMap<String, MediaType>, header: Option<&str>) -> Result<Option<String>, String> {
        select(content, header).map(|s| s.map(|(k, _)| k.to_string()))
    }

    fn run(schema: Schema, content_type: &str, body: &[u8]) -> Vec<(ErrorKind, String)> {
        let v = SchemaValidator::new(IndexMap::new(), &ValidationConfig::default()).unwrap();
        let content = IndexMap::from([(content_type.to_string(), MediaType::new(schema))]);
        let mut out = Collector::new(Mode::MultiError);
        let _ = check(&v, &content, Some(content_type), body, &mut out);
        out.finish()
            .map_or_else(|e| e.into_iter().map(|e| (e.kind, e.location)).collect(), |()| Vec::new())
    }

    #[test]
    fn test_essence() {
        assert_eq!(essence("Application/JSON; charset=utf-8"), "application/json");
        assert!(is_json("application/problem+json"));
        assert!(!is_json("text/plain"));
    }

    #[test]
    fn test_select_precedence() {
        let declared = content(&["text/*", "application/json", "*/*"]);
        assert_eq!(selected(&declared, Some("application/json; charset=utf-8")), Ok(Some("application/json".into())));
        assert_eq!(selected(&declared, Some("text/csv")), Ok(Some("text/*".into())));
        assert_eq!(selected(&declared, Some("image/png")), Ok(Some("*/*".into())));
        assert_eq!(selected(&declared, None), Ok(Some("text/*".into())));

        let json_only = content(&["application/json"]);
        assert_eq!(selected(&json_only, Some("text/plain")), Err("text/plain".into()));
    }

    #[test]
    fn test_unsupported_media_type() {
        let v = SchemaValidator::new(IndexMap::new(), &ValidationConfig::default()).unwrap();
        let mut out = Collector::new(Mode::FailFast);
        let flow = check(&v, &content(&["application/json"]), Some("text/xml"), b"<a/>", &mut out);
        assert!(flow.is_break());
        let errors = out.finish().unwrap_err();
        assert_eq!(errors.first().kind, ErrorKind::UnsupportedMediaType);
    }

    #[test]
    fn test_malformed_json() {
        assert_eq!(
            run(Schema::object(), "application/json", b"{not json"),
            vec![(ErrorKind::MalformedBody, String::new())]
        );
    }

    #[test]
    fn test_json_body_is_validated() {
        let schema = Schema::object().property("john", Schema::boolean()).require("john");
        assert!(run(schema.clone(), "application/json", br#"{"john": true}"#).is_empty());
        assert_eq!(
            run(schema, "application/vnd.api+json", br#"{"john": "yes"}"#),
            vec![(ErrorKind::InvalidType, "/john".to_string())]
        );
    }

    #[test]
    fn test_form_body() {
        let schema = Schema::object()
            .property("age", Schema::integer())
            .property("tags", Schema::array(Schema::string()))
            .require("name");
        let found = run(schema, FORM_URLENCODED, b"age=abc&tags=a&tags=b&x=1");
        assert_eq!(
            found,
            vec![
                (ErrorKind::MissingRequiredProperty, "/name".to_string()),
                (ErrorKind::InvalidType, "/age".to_string()),
            ]
        );
    }

    #[test]
    fn test_form_body_coerces_values() {
        let v = SchemaValidator::new(IndexMap::new(), &ValidationConfig::default()).unwrap();
        let schema = Schema::object()
            .property("age", Schema::integer())
            .property("tags", Schema::array(Schema::string()));
        assert_eq!(
            decode_form(&v, &schema, b"age=3&tags=a&tags=b"),
            json!({"age": 3, "tags": ["a", "b"]})
        );
    }

    #[test]
    fn test_other_media_types_are_not_inspected() {
        assert!(run(Schema::integer(), "text/plain", b"anything").is_empty());
    }
}
