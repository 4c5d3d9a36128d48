//! Recursive schema validation.
//!
//! One depth-first routine walks a value alongside its [`Schema`]. Reporting
//! is delegated to a [`Collector`]: in [`Mode::FailFast`] the first report
//! breaks the walk, in [`Mode::MultiError`] the walk continues and every
//! violation is kept in traversal order. The first multi-error violation is
//! therefore always the fail-fast one.
//!
//! Traversal order within an object: missing `required` names, then
//! declared properties in declaration order, then undeclared keys in value
//! order.

use std::collections::HashMap;
use std::ops::ControlFlow;

use indexmap::IndexMap;
use kanon_core::schema::{ObjectSchema, COMPONENTS_PREFIX};
use kanon_core::{AdditionalProperties, BuildError, Schema, SchemaKind};
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::config::ValidationConfig;
use crate::error::{ErrorKind, ValidationError, Violations};
use crate::format;

// Longest chain of references followed without consuming any of the value.
const MAX_REF_DEPTH: usize = 32;

/// How many violations a validation reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Stop at the first violation.
    #[default]
    FailFast,
    /// Collect every violation.
    MultiError,
}

/// Accumulates violations and decides whether traversal continues.
#[derive(Debug)]
pub struct Collector {
    mode: Mode,
    errors: Vec<ValidationError>,
}

impl Collector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    /// Records a violation.
    ///
    /// Returns `Break` when traversal must stop.
    pub fn report(&mut self, error: ValidationError) -> ControlFlow<()> {
        self.errors.push(error);
        match self.mode {
            Mode::FailFast => ControlFlow::Break(()),
            Mode::MultiError => ControlFlow::Continue(()),
        }
    }

    /// Returns true once anything was reported.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `Ok` if nothing was reported.
    pub fn finish(self) -> Result<(), Violations> {
        match Violations::from_vec(self.errors) {
            None => Ok(()),
            Some(violations) => Err(violations),
        }
    }
}

/// Appends an RFC 6901 reference token to `pointer`.
pub fn push_token(pointer: &mut String, token: &str) {
    pointer.push('/');
    for c in token.chars() {
        match c {
            '~' => pointer.push_str("~0"),
            '/' => pointer.push_str("~1"),
            c => pointer.push(c),
        }
    }
}

/// Pointer to `token` below `base`.
#[must_use]
pub fn child_pointer(base: &str, token: &str) -> String {
    let mut pointer = base.to_string();
    push_token(&mut pointer, token);
    pointer
}

fn descend(
    pointer: &mut String,
    token: &str,
    visit: impl FnOnce(&mut String) -> ControlFlow<()>,
) -> ControlFlow<()> {
    let len = pointer.len();
    push_token(pointer, token);
    let flow = visit(pointer);
    pointer.truncate(len);
    flow
}

/// Validates JSON values against schemas of one document.
///
/// Owns the component registry references resolve against and the
/// compiled `pattern` regexes.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schemas: IndexMap<String, Schema>,
    patterns: HashMap<String, Regex>,
    allow_additional_properties: bool,
    strict_mode: bool,
}

impl SchemaValidator {
    /// Creates a validator over a component registry.
    ///
    /// Every registry entry is prepared (see [`prepare`](Self::prepare)).
    pub fn new(
        schemas: IndexMap<String, Schema>,
        config: &ValidationConfig,
    ) -> Result<Self, BuildError> {
        let mut validator = Self {
            schemas,
            patterns: HashMap::new(),
            allow_additional_properties: config.allow_additional_properties,
            strict_mode: config.strict_mode,
        };

        let mut pending = Vec::with_capacity(validator.schemas.len());
        for (name, schema) in &validator.schemas {
            let location = format!("{COMPONENTS_PREFIX}{name}");
            let patterns = validator.scan(schema, &location)?;
            pending.push((location, patterns));
        }
        for (location, patterns) in pending {
            validator.compile(patterns, &location)?;
        }

        Ok(validator)
    }

    /// Checks a schema that will be validated against later.
    ///
    /// Fails on references missing from the registry, invalid patterns and,
    /// in strict mode, closed objects requiring undeclared properties.
    pub fn prepare(&mut self, schema: &Schema, location: &str) -> Result<(), BuildError> {
        let patterns = self.scan(schema, location)?;
        self.compile(patterns, location)
    }

    fn scan(&self, schema: &Schema, location: &str) -> Result<Vec<String>, BuildError> {
        let mut patterns = Vec::new();
        let mut failure = None;

        schema.walk(&mut |node| {
            if failure.is_some() {
                return;
            }
            if let Some(pattern) = &node.constraints.pattern {
                patterns.push(pattern.clone());
            }
            if let SchemaKind::Ref(name) = &node.kind {
                if !self.schemas.contains_key(name) {
                    failure = Some(BuildError::unresolved(location, name));
                }
                return;
            }
            let Some(object) = node.object_keywords() else {
                return;
            };
            if self.strict_mode && self.is_closed(object) {
                if let Some(name) = object
                    .required
                    .iter()
                    .find(|name| !object.properties.contains_key(*name))
                {
                    failure = Some(BuildError::StrictRequired {
                        location: location.to_string(),
                        name: name.clone(),
                    });
                }
            }
        });

        match failure {
            Some(error) => Err(error),
            None => Ok(patterns),
        }
    }

    fn compile(&mut self, patterns: Vec<String>, location: &str) -> Result<(), BuildError> {
        for pattern in patterns {
            if self.patterns.contains_key(&pattern) {
                continue;
            }
            let regex = Regex::new(&pattern)
                .map_err(|e| BuildError::invalid_pattern(location, &pattern, e))?;
            self.patterns.insert(pattern, regex);
        }
        Ok(())
    }

    fn is_closed(&self, object: &ObjectSchema) -> bool {
        match object.additional {
            AdditionalProperties::Forbidden => true,
            AdditionalProperties::Unspecified => !self.allow_additional_properties,
            _ => false,
        }
    }

    /// The component registry.
    #[must_use]
    pub fn schemas(&self) -> &IndexMap<String, Schema> {
        &self.schemas
    }

    /// Follows references until a non-reference node.
    ///
    /// A dangling reference resolves to itself.
    #[must_use]
    pub fn resolve<'s>(&'s self, schema: &'s Schema) -> &'s Schema {
        let mut current = schema;
        for _ in 0..MAX_REF_DEPTH {
            let SchemaKind::Ref(name) = &current.kind else {
                break;
            };
            match self.schemas.get(name) {
                Some(target) => current = target,
                None => break,
            }
        }
        current
    }

    /// Validates a whole value.
    pub fn validate(&self, schema: &Schema, value: &Value, mode: Mode) -> Result<(), Violations> {
        let mut collector = Collector::new(mode);
        let mut pointer = String::new();
        let _ = self.check(schema, value, &mut pointer, &mut collector);
        collector.finish()
    }

    /// Validates `value` located at `pointer`, reporting into `out`.
    ///
    /// `pointer` is restored before returning.
    pub fn check(
        &self,
        schema: &Schema,
        value: &Value,
        pointer: &mut String,
        out: &mut Collector,
    ) -> ControlFlow<()> {
        self.check_node(schema, value, pointer, out, 0)
    }

    fn check_node(
        &self,
        schema: &Schema,
        value: &Value,
        pointer: &mut String,
        out: &mut Collector,
        depth: usize,
    ) -> ControlFlow<()> {
        if value.is_null() && schema.nullable {
            return ControlFlow::Continue(());
        }

        if let SchemaKind::Ref(name) = &schema.kind {
            return match self.schemas.get(name) {
                Some(target) if depth < MAX_REF_DEPTH => {
                    self.check_node(target, value, pointer, out, depth + 1)
                }
                _ => {
                    warn!(reference = %name, "unresolvable schema reference, value accepted");
                    ControlFlow::Continue(())
                }
            };
        }

        if !type_matches(&schema.kind, value) {
            let expected = schema.kind.type_name().unwrap_or("any");
            return out.report(violation(
                ErrorKind::InvalidType,
                pointer,
                format!("expected {expected}, got {}", kind_of(value)),
                schema,
            ));
        }

        if let Some(allowed) = &schema.enumeration {
            if !allowed.iter().any(|literal| literal_eq(literal, value)) {
                out.report(violation(
                    ErrorKind::NotInEnum,
                    pointer,
                    format!("{value} is not one of the allowed values"),
                    schema,
                ))?;
            }
        }

        if let Some(format) = &schema.format {
            if let Err(message) = format::check(format, value) {
                out.report(violation(ErrorKind::InvalidFormat, pointer, message, schema))?;
            }
        }

        self.check_constraints(schema, value, pointer, out)?;

        // Untyped nodes carry these too; each applies only to its own kind of value.
        if let Some(object) = schema.object_keywords() {
            self.check_object(schema, object, value, pointer, out)?;
        }
        if let (Some(items), Some(elements)) = (
            schema.array_keywords().and_then(|array| array.items.as_deref()),
            value.as_array(),
        ) {
            for (i, element) in elements.iter().enumerate() {
                descend(pointer, &i.to_string(), |pointer| {
                    self.check_node(items, element, pointer, out, 0)
                })?;
            }
        }
        ControlFlow::Continue(())
    }

    fn check_constraints(
        &self,
        schema: &Schema,
        value: &Value,
        pointer: &str,
        out: &mut Collector,
    ) -> ControlFlow<()> {
        let c = &schema.constraints;
        if c.is_empty() {
            return ControlFlow::Continue(());
        }
        let mut fail = |message: String| {
            out.report(violation(ErrorKind::ConstraintViolation, pointer, message, schema))
        };

        match value {
            Value::Number(n) => {
                let Some(n) = n.as_f64() else {
                    return ControlFlow::Continue(());
                };
                if let Some(min) = c.minimum {
                    if c.exclusive_minimum && n <= min {
                        fail(format!("{n} must be greater than {min}"))?;
                    } else if n < min {
                        fail(format!("{n} must be at least {min}"))?;
                    }
                }
                if let Some(max) = c.maximum {
                    if c.exclusive_maximum && n >= max {
                        fail(format!("{n} must be less than {max}"))?;
                    } else if n > max {
                        fail(format!("{n} must be at most {max}"))?;
                    }
                }
            }
            Value::String(s) => {
                let len = s.chars().count();
                if let Some(min) = c.min_length {
                    if len < min {
                        fail(format!("length {len} is shorter than {min}"))?;
                    }
                }
                if let Some(max) = c.max_length {
                    if len > max {
                        fail(format!("length {len} is longer than {max}"))?;
                    }
                }
                if let Some(pattern) = &c.pattern {
                    if !self.pattern_matches(pattern, s) {
                        fail(format!("'{s}' does not match pattern '{pattern}'"))?;
                    }
                }
            }
            Value::Array(items) => {
                let len = items.len();
                if let Some(min) = c.min_items {
                    if len < min {
                        fail(format!("{len} items, at least {min} required"))?;
                    }
                }
                if let Some(max) = c.max_items {
                    if len > max {
                        fail(format!("{len} items, at most {max} allowed"))?;
                    }
                }
            }
            _ => {}
        }

        ControlFlow::Continue(())
    }

    fn pattern_matches(&self, pattern: &str, s: &str) -> bool {
        match self.patterns.get(pattern) {
            Some(regex) => regex.is_match(s),
            None => match Regex::new(pattern) {
                Ok(regex) => regex.is_match(s),
                Err(e) => {
                    warn!(pattern, error = %e, "skipping invalid pattern");
                    true
                }
            },
        }
    }

    fn check_object(
        &self,
        schema: &Schema,
        object: &ObjectSchema,
        value: &Value,
        pointer: &mut String,
        out: &mut Collector,
    ) -> ControlFlow<()> {
        let Some(map) = value.as_object() else {
            return ControlFlow::Continue(());
        };

        for name in &object.required {
            if !map.contains_key(name) {
                out.report(violation(
                    ErrorKind::MissingRequiredProperty,
                    &child_pointer(pointer, name),
                    format!("missing required property '{name}'"),
                    schema,
                ))?;
            }
        }

        for (name, child) in &object.properties {
            if let Some(v) = map.get(name) {
                descend(pointer, name, |pointer| {
                    self.check_node(child, v, pointer, out, 0)
                })?;
            }
        }

        let forbid = self.is_closed(object);
        for (name, v) in map {
            if object.properties.contains_key(name) {
                continue;
            }
            if let AdditionalProperties::Schema(child) = &object.additional {
                descend(pointer, name, |pointer| {
                    self.check_node(child, v, pointer, out, 0)
                })?;
            } else if forbid {
                out.report(violation(
                    ErrorKind::UnexpectedProperty,
                    &child_pointer(pointer, name),
                    format!("unexpected property '{name}'"),
                    schema,
                ))?;
            }
        }

        ControlFlow::Continue(())
    }
}

fn violation(kind: ErrorKind, pointer: &str, message: String, schema: &Schema) -> ValidationError {
    ValidationError::new(kind, pointer, message).with_schema(schema.to_json())
}

fn type_matches(kind: &SchemaKind, value: &Value) -> bool {
    match kind {
        SchemaKind::Any(_) | SchemaKind::Ref(_) => true,
        SchemaKind::Boolean => value.is_boolean(),
        SchemaKind::Integer => is_whole(value),
        SchemaKind::Number => value.is_number(),
        SchemaKind::String => value.is_string(),
        SchemaKind::Object(_) => value.is_object(),
        SchemaKind::Array(_) => value.is_array(),
    }
}

fn is_whole(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => false,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) if is_whole(value) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[allow(clippy::float_cmp)]
fn literal_eq(literal: &Value, value: &Value) -> bool {
    match (literal, value) {
        (Value::Number(a), Value::Number(b)) => a == b || a.as_f64() == b.as_f64(),
        _ => literal == value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanon_core::fixtures;
    use kanon_core::Format;
    use proptest::prelude::*;
    use serde_json::json;

    fn validator() -> SchemaValidator {
        validator_with(&ValidationConfig::default())
    }

    fn validator_with(config: &ValidationConfig) -> SchemaValidator {
        let registry = fixtures::pet_store_document().schemas().clone();
        SchemaValidator::new(registry, config).unwrap()
    }

    fn errors(schema: &Schema, value: Value) -> Vec<ValidationError> {
        validator()
            .validate(schema, &value, Mode::MultiError)
            .map_or_else(Violations::into_vec, |()| Vec::new())
    }

    fn kinds(schema: &Schema, value: Value) -> Vec<(ErrorKind, String)> {
        errors(schema, value)
            .into_iter()
            .map(|e| (e.kind, e.location))
            .collect()
    }

    #[test]
    fn test_status_response_scenario() {
        let schema = fixtures::foo_status_schema();
        assert!(errors(&schema, json!({"status": 200, "weight": 1.5})).is_empty());

        let found = kinds(&schema, json!({"status": "string"}));
        assert_eq!(found, vec![(ErrorKind::InvalidType, "/status".to_string())]);
    }

    #[test]
    fn test_no_coercion() {
        assert_eq!(
            kinds(&Schema::number(), json!("100")),
            vec![(ErrorKind::InvalidType, String::new())]
        );
        assert!(errors(&Schema::integer(), json!(3.0)).is_empty());
        assert_eq!(kinds(&Schema::integer(), json!(3.5)).len(), 1);
        assert_eq!(kinds(&Schema::boolean(), json!("true")).len(), 1);
    }

    #[test]
    fn test_nullable() {
        assert_eq!(kinds(&Schema::string(), Value::Null).len(), 1);
        assert!(errors(&Schema::string().nullable(), Value::Null).is_empty());
        assert!(errors(&Schema::any(), Value::Null).is_empty());
    }

    #[test]
    fn test_any_still_checks_enum() {
        let schema = Schema::any().enumeration([json!(1), json!("one")]);
        assert!(errors(&schema, json!(1.0)).is_empty());
        assert!(errors(&schema, json!("one")).is_empty());
        assert_eq!(kinds(&schema, json!(2)), vec![(ErrorKind::NotInEnum, String::new())]);
    }

    fn untyped(raw: Value) -> Schema {
        let raw: kanon_core::schema::RawSchema = serde_json::from_value(raw).unwrap();
        Schema::from_raw(&raw, COMPONENTS_PREFIX).unwrap()
    }

    #[test]
    fn test_untyped_object_keywords_accept_any_kind() {
        let schema = untyped(json!({"properties": {"a": {"type": "string"}}}));
        for value in [json!("hello"), json!(7), json!([1, 2]), json!(true), Value::Null] {
            assert!(errors(&schema, value.clone()).is_empty(), "{value}");
        }

        assert!(errors(&schema, json!({"a": "x"})).is_empty());
        let found = errors(&schema, json!({"a": 1}));
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].kind, found[0].location.as_str()), (ErrorKind::InvalidType, "/a"));
    }

    #[test]
    fn test_untyped_required_is_enforced_on_objects() {
        let schema = untyped(json!({"required": ["a"]}));
        assert_eq!(
            kinds(&schema, json!({})),
            vec![(ErrorKind::MissingRequiredProperty, "/a".to_string())]
        );
        assert!(errors(&schema, json!({"a": null})).is_empty());
        assert!(errors(&schema, json!("not an object")).is_empty());

        let found = errors(&schema, json!({}));
        assert_eq!(found[0].schema, Some(json!({"required": ["a"]})));
    }

    #[test]
    fn test_untyped_items_are_checked_on_arrays() {
        let schema = untyped(json!({"items": {"type": "integer"}}));
        assert_eq!(
            kinds(&schema, json!([1, "two", 3])),
            vec![(ErrorKind::InvalidType, "/1".to_string())]
        );
        assert!(errors(&schema, json!({"0": "two"})).is_empty());
        assert!(errors(&schema, json!("two")).is_empty());
    }

    #[test]
    fn test_untyped_closed_object_in_strict_mode() {
        let config = ValidationConfig {
            strict_mode: true,
            ..ValidationConfig::default()
        };
        let mut validator = validator_with(&config);
        let schema = untyped(json!({"additionalProperties": false, "required": ["ghost"]}));
        assert!(matches!(
            validator.prepare(&schema, "body"),
            Err(BuildError::StrictRequired { .. })
        ));
    }

    #[test]
    fn test_reference_resolution() {
        let schema = Schema::array(Schema::reference("Pet"));
        let found = kinds(&schema, json!([{"id": 1, "name": "rex"}, {"id": "x"}]));
        assert_eq!(
            found,
            vec![
                (ErrorKind::MissingRequiredProperty, "/1/name".to_string()),
                (ErrorKind::InvalidType, "/1/id".to_string()),
            ]
        );
    }

    #[test]
    fn test_object_traversal_order() {
        let schema = Schema::object()
            .property("b", Schema::integer())
            .property("a", Schema::integer())
            .require("z")
            .forbid_additional();
        let found = kinds(&schema, json!({"x": 1, "a": "1", "b": "2"}));
        assert_eq!(
            found,
            vec![
                (ErrorKind::MissingRequiredProperty, "/z".to_string()),
                (ErrorKind::InvalidType, "/b".to_string()),
                (ErrorKind::InvalidType, "/a".to_string()),
                (ErrorKind::UnexpectedProperty, "/x".to_string()),
            ]
        );
    }

    #[test]
    fn test_additional_properties_policies() {
        let open = Schema::object().property("a", Schema::integer());
        assert!(errors(&open, json!({"a": 1, "b": 2})).is_empty());

        let typed = Schema::object()
            .additional_properties(AdditionalProperties::Schema(Box::new(Schema::string())));
        assert_eq!(
            kinds(&typed, json!({"k": 1})),
            vec![(ErrorKind::InvalidType, "/k".to_string())]
        );

        let closed_by_config = validator_with(&ValidationConfig {
            allow_additional_properties: false,
            ..ValidationConfig::default()
        });
        let result = closed_by_config.validate(&open, &json!({"a": 1, "b": 2}), Mode::FailFast);
        assert_eq!(result.unwrap_err().first().kind, ErrorKind::UnexpectedProperty);

        let allowed = Schema::object().additional_properties(AdditionalProperties::Allowed);
        assert!(closed_by_config
            .validate(&allowed, &json!({"b": 2}), Mode::FailFast)
            .is_ok());
    }

    #[test]
    fn test_constraints() {
        let bounded = Schema::integer().minimum(1.0).maximum(100.0);
        assert!(errors(&bounded, json!(1)).is_empty());
        assert_eq!(
            kinds(&bounded, json!(101)),
            vec![(ErrorKind::ConstraintViolation, String::new())]
        );

        let mut exclusive = Schema::number().minimum(0.0);
        exclusive.constraints.exclusive_minimum = true;
        assert_eq!(kinds(&exclusive, json!(0)).len(), 1);
        assert!(errors(&exclusive, json!(0.1)).is_empty());

        let text = Schema::string().min_length(2).max_length(3);
        assert!(errors(&text, json!("éé")).is_empty());
        assert_eq!(kinds(&text, json!("a")).len(), 1);
        assert_eq!(kinds(&text, json!("abcd")).len(), 1);

        let list = Schema::array(Schema::any()).min_items(1).max_items(2);
        assert_eq!(kinds(&list, json!([])).len(), 1);
        assert_eq!(kinds(&list, json!([1, 2, 3])).len(), 1);
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let mut v = validator();
        let schema = Schema::string().pattern("[0-9]{3}");
        v.prepare(&schema, "test").unwrap();
        assert!(v.validate(&schema, &json!("ab123cd"), Mode::FailFast).is_ok());
        assert!(v.validate(&schema, &json!("ab12"), Mode::FailFast).is_err());
    }

    #[test]
    fn test_format_violation() {
        let schema = Schema::string().format(Format::Email);
        assert_eq!(
            kinds(&schema, json!("nope")),
            vec![(ErrorKind::InvalidFormat, String::new())]
        );
        assert!(errors(&Schema::string().format(Format::Other("x".into())), json!("y")).is_empty());
    }

    #[test]
    fn test_pointer_escaping() {
        let schema = Schema::object().property("a/b~c", Schema::integer());
        assert_eq!(
            kinds(&schema, json!({"a/b~c": "x"})),
            vec![(ErrorKind::InvalidType, "/a~1b~0c".to_string())]
        );
    }

    #[test]
    fn test_violation_carries_schema_fragment() {
        let found = errors(&fixtures::foo_status_schema(), json!({"status": "s"}));
        assert_eq!(found[0].schema, Some(json!({"type": "integer"})));
    }

    #[test]
    fn test_prepare_rejects_bad_documents() {
        let mut v = validator();
        assert!(matches!(
            v.prepare(&Schema::reference("Missing"), "here"),
            Err(BuildError::UnresolvedReference { .. })
        ));
        assert!(matches!(
            v.prepare(&Schema::string().pattern("(unclosed"), "here"),
            Err(BuildError::InvalidPattern { .. })
        ));

        let closed = Schema::object()
            .property("a", Schema::any())
            .require("b")
            .forbid_additional();
        assert!(v.prepare(&closed, "lenient").is_ok());

        let mut strict = validator_with(&ValidationConfig {
            strict_mode: true,
            ..ValidationConfig::default()
        });
        assert!(matches!(
            strict.prepare(&closed, "strict"),
            Err(BuildError::StrictRequired { name, .. }) if name == "b"
        ));
    }

    #[test]
    fn test_self_referencing_schema_is_bounded_by_value() {
        let mut registry = IndexMap::new();
        registry.insert(
            "Node".to_string(),
            Schema::object()
                .property("next", Schema::reference("Node").nullable())
                .property("value", Schema::integer()),
        );
        registry.insert("Loop".to_string(), Schema::reference("Loop"));
        let v = SchemaValidator::new(registry, &ValidationConfig::default()).unwrap();

        let value = json!({"value": 1, "next": {"value": 2, "next": {"value": "x", "next": null}}});
        let err = v.validate(&Schema::reference("Node"), &value, Mode::FailFast).unwrap_err();
        assert_eq!(err.first().location, "/next/next/value");

        assert!(v.validate(&Schema::reference("Loop"), &json!(1), Mode::FailFast).is_ok());
    }

    #[test]
    fn test_collector_modes() {
        let mut fail_fast = Collector::new(Mode::FailFast);
        let error = ValidationError::new(ErrorKind::InvalidType, "", "x");
        assert!(fail_fast.report(error.clone()).is_break());
        assert!(fail_fast.has_errors());

        let mut multi = Collector::new(Mode::MultiError);
        assert!(multi.report(error).is_continue());
        assert!(Collector::new(Mode::MultiError).finish().is_ok());
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i32>().prop_map(Value::from),
            (-1000.0f64..1000.0).prop_map(Value::from),
            "[a-z@.]{0,8}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
                prop::collection::btree_map("[a-z]{1,3}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn fail_fast_is_prefix_of_multi_error(value in arb_value()) {
            let v = validator();
            let schema = Schema::object()
                .property("id", Schema::integer().format(Format::Int32))
                .property("name", Schema::string().min_length(2))
                .property("tags", Schema::array(Schema::string()))
                .require("id")
                .forbid_additional();

            let fast = v.validate(&schema, &value, Mode::FailFast);
            let multi = v.validate(&schema, &value, Mode::MultiError);
            match (fast, multi) {
                (Ok(()), Ok(())) => {}
                (Err(fast), Err(multi)) => {
                    prop_assert_eq!(fast.len(), 1);
                    prop_assert_eq!(fast.first(), multi.first());
                }
                (fast, multi) => prop_assert!(false, "modes disagree: {:?} vs {:?}", fast, multi),
            }
        }

        #[test]
        fn validation_is_idempotent(value in arb_value()) {
            let v = validator();
            let schema = Schema::reference("Pet");
            let first = v.validate(&schema, &value, Mode::MultiError);
            let second = v.validate(&schema, &value, Mode::MultiError);
            prop_assert_eq!(first, second);
        }
    }
}
