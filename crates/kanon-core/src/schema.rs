//! The schema grammar.
//!
//! Documents describe values with a recursive JSON-Schema subset. Two
//! representations live here:
//!
//! - [`RawSchema`], the serde form exactly as written in a document (both
//!   dialects share it, legacy-only keys such as `x-nullable` included), and
//! - [`Schema`], the typed form the validator works on: a [`SchemaKind`]
//!   tagged variant plus the keywords that apply to every kind.
//!
//! `Schema::from_raw` maps one to the other, rewriting `$ref`s into names in
//! the document's component registry.
//!
//! # Example
//!
//! ```
//! use kanon_core::schema::{Format, Schema};
//!
//! let schema = Schema::object()
//!     .property("john", Schema::boolean())
//!     .property("email", Schema::string().format(Format::Email))
//!     .require("john")
//!     .forbid_additional();
//!
//! assert!(schema.is_object());
//! assert_eq!(schema.required(), &["john".to_string()]);
//! ```

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Prefix of canonical component references.
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

/// Prefix of legacy definition references.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Errors mapping a [`RawSchema`] to a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// `type` names something outside the grammar.
    #[error("unknown schema type '{0}'")]
    UnknownType(String),

    /// `$ref` points outside the schema registry.
    #[error("unsupported schema reference '{0}'")]
    UnsupportedReference(String),
}

/// A schema node as written in a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchema {
    /// `$ref`.
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// `type`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// `format`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// `enum`.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<Value>>,
    /// `nullable` (canonical dialect).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    /// `x-nullable` (legacy dialect extension).
    #[serde(rename = "x-nullable", default, skip_serializing_if = "Option::is_none")]
    pub x_nullable: Option<bool>,
    /// `properties`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, RawSchema>>,
    /// `required` (object schemas).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// `additionalProperties`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<RawAdditionalProperties>,
    /// `items`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<RawSchema>>,
    /// `minimum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// `maximum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// `exclusiveMinimum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    /// `exclusiveMaximum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,
    /// `minLength`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// `maxLength`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// `pattern`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// `minItems`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    /// `maxItems`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// `description`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `additionalProperties` as written: a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAdditionalProperties {
    /// `true` / `false`.
    Bool(bool),
    /// A schema constraining undeclared properties.
    Schema(Box<RawSchema>),
}

/// Well-known `format` values.
///
/// Anything else is kept verbatim in [`Format::Other`] and never fails
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Format {
    /// `email`
    Email,
    /// `uuid`
    Uuid,
    /// `date` (RFC 3339 full-date)
    Date,
    /// `date-time` (RFC 3339)
    DateTime,
    /// `ipv4`
    Ipv4,
    /// `ipv6`
    Ipv6,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `byte` (base64)
    Byte,
    /// `binary`
    Binary,
    /// `password`
    Password,
    /// Unrecognised, passed through.
    Other(String),
}

impl Format {
    /// The format name as written in documents.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Email => "email",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Byte => "byte",
            Self::Binary => "binary",
            Self::Password => "password",
            Self::Other(name) => name,
        }
    }

    /// Returns true for formats that only make sense on integers.
    #[must_use]
    pub fn is_integer_format(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    /// Returns true for formats that only make sense on numbers.
    #[must_use]
    pub fn is_float_format(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Maps a `format` value; unknown names become [`Format::Other`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "email" => Self::Email,
            "uuid" => Self::Uuid,
            "date" => Self::Date,
            "date-time" => Self::DateTime,
            "ipv4" => Self::Ipv4,
            "ipv6" => Self::Ipv6,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "float" => Self::Float,
            "double" => Self::Double,
            "byte" => Self::Byte,
            "binary" => Self::Binary,
            "password" => Self::Password,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for Format {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy for properties an object schema does not declare.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    /// Not declared in the document; the validator's configuration decides.
    #[default]
    Unspecified,
    /// Any undeclared property is accepted.
    Allowed,
    /// Any undeclared property is a violation.
    Forbidden,
    /// Undeclared properties must match this schema.
    Schema(Box<Schema>),
}

/// Keywords for an `object` schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    /// Declared properties in declaration order.
    pub properties: IndexMap<String, Schema>,
    /// Names that must be present. May name undeclared properties.
    pub required: Vec<String>,
    /// Policy for undeclared properties.
    pub additional: AdditionalProperties,
}

/// Keywords for an `array` schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArraySchema {
    /// Schema every element must satisfy. `None` accepts any element.
    pub items: Option<Box<Schema>>,
}

/// Keywords declared on a schema with no `type`.
///
/// They never reject a value by kind: object keywords apply only to
/// objects, `items` only to arrays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Untyped {
    /// `properties`, `required` and `additionalProperties`, when any is set.
    pub object: Option<ObjectSchema>,
    /// `items`, when set.
    pub array: Option<ArraySchema>,
}

/// The kind of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// No `type`: any JSON value.
    Any(Untyped),
    /// `boolean`
    Boolean,
    /// `integer`: whole numbers only.
    Integer,
    /// `number`
    Number,
    /// `string`
    String,
    /// `object`
    Object(ObjectSchema),
    /// `array`
    Array(ArraySchema),
    /// Reference to a named schema in the component registry.
    Ref(String),
}

impl SchemaKind {
    /// The `type` keyword for this kind, if any.
    #[must_use]
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            Self::Any(_) | Self::Ref(_) => None,
            Self::Boolean => Some("boolean"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::String => Some("string"),
            Self::Object(_) => Some("object"),
            Self::Array(_) => Some("array"),
        }
    }
}

/// Numeric, length and pattern keywords. All optional.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constraints {
    /// Lower numeric bound.
    pub minimum: Option<f64>,
    /// Upper numeric bound.
    pub maximum: Option<f64>,
    /// `minimum` excludes its value.
    pub exclusive_minimum: bool,
    /// `maximum` excludes its value.
    pub exclusive_maximum: bool,
    /// Minimum string length in characters.
    pub min_length: Option<usize>,
    /// Maximum string length in characters.
    pub max_length: Option<usize>,
    /// Regular expression strings must match (unanchored).
    pub pattern: Option<String>,
    /// Minimum array length.
    pub min_items: Option<usize>,
    /// Maximum array length.
    pub max_items: Option<usize>,
}

impl Constraints {
    /// Returns true if no keyword is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A typed schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// What kind of value this node describes.
    pub kind: SchemaKind,
    /// Declared `format`.
    pub format: Option<Format>,
    /// Literal values the instance must equal one of.
    pub enumeration: Option<Vec<Value>>,
    /// Whether `null` is accepted in addition to the kind.
    pub nullable: bool,
    /// Numeric, length and pattern keywords.
    pub constraints: Constraints,
    /// Human-readable description.
    pub description: Option<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::of(SchemaKind::Any(Untyped::default()))
    }
}

impl Schema {
    /// Creates a node of the given kind with no other keywords.
    #[must_use]
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            format: None,
            enumeration: None,
            nullable: false,
            constraints: Constraints::default(),
            description: None,
        }
    }

    /// An untyped schema accepting any value.
    #[must_use]
    pub fn any() -> Self {
        Self::of(SchemaKind::Any(Untyped::default()))
    }

    /// A `boolean` schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    /// An `integer` schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer)
    }

    /// A `number` schema.
    #[must_use]
    pub fn number() -> Self {
        Self::of(SchemaKind::Number)
    }

    /// A `string` schema.
    #[must_use]
    pub fn string() -> Self {
        Self::of(SchemaKind::String)
    }

    /// An `object` schema with no properties yet.
    #[must_use]
    pub fn object() -> Self {
        Self::of(SchemaKind::Object(ObjectSchema::default()))
    }

    /// An `array` schema whose elements must match `items`.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::of(SchemaKind::Array(ArraySchema {
            items: Some(Box::new(items)),
        }))
    }

    /// A reference to the registry entry `name`.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::of(SchemaKind::Ref(name.into()))
    }

    /// Declares a property. No effect on non-object schemas.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        if let SchemaKind::Object(object) = &mut self.kind {
            object.properties.insert(name.into(), schema);
        }
        self
    }

    /// Adds a required property name. No effect on non-object schemas.
    #[must_use]
    pub fn require(mut self, name: impl Into<String>) -> Self {
        if let SchemaKind::Object(object) = &mut self.kind {
            object.required.push(name.into());
        }
        self
    }

    /// Sets the additional-properties policy. No effect on non-object schemas.
    #[must_use]
    pub fn additional_properties(mut self, policy: AdditionalProperties) -> Self {
        if let SchemaKind::Object(object) = &mut self.kind {
            object.additional = policy;
        }
        self
    }

    /// Shorthand for `additional_properties(AdditionalProperties::Forbidden)`.
    #[must_use]
    pub fn forbid_additional(self) -> Self {
        self.additional_properties(AdditionalProperties::Forbidden)
    }

    /// Sets `format`.
    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets `enum`.
    #[must_use]
    pub fn enumeration(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enumeration = Some(values.into_iter().collect());
        self
    }

    /// Accepts `null` as well.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets an inclusive lower bound.
    #[must_use]
    pub fn minimum(mut self, minimum: f64) -> Self {
        self.constraints.minimum = Some(minimum);
        self
    }

    /// Sets an inclusive upper bound.
    #[must_use]
    pub fn maximum(mut self, maximum: f64) -> Self {
        self.constraints.maximum = Some(maximum);
        self
    }

    /// Sets `minLength`.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.min_length = Some(len);
        self
    }

    /// Sets `maxLength`.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    /// Sets `pattern`.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    /// Sets `minItems`.
    #[must_use]
    pub fn min_items(mut self, len: usize) -> Self {
        self.constraints.min_items = Some(len);
        self
    }

    /// Sets `maxItems`.
    #[must_use]
    pub fn max_items(mut self, len: usize) -> Self {
        self.constraints.max_items = Some(len);
        self
    }

    /// Returns true for `object` schemas.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self.kind, SchemaKind::Object(_))
    }

    /// Required property names (empty when no object keywords are set).
    #[must_use]
    pub fn required(&self) -> &[String] {
        self.object_keywords()
            .map(|object| object.required.as_slice())
            .unwrap_or_default()
    }

    /// Object keywords of an `object` node or an untyped one.
    #[must_use]
    pub fn object_keywords(&self) -> Option<&ObjectSchema> {
        match &self.kind {
            SchemaKind::Object(object) => Some(object),
            SchemaKind::Any(untyped) => untyped.object.as_ref(),
            _ => None,
        }
    }

    /// Array keywords of an `array` node or an untyped one.
    #[must_use]
    pub fn array_keywords(&self) -> Option<&ArraySchema> {
        match &self.kind {
            SchemaKind::Array(array) => Some(array),
            SchemaKind::Any(untyped) => untyped.array.as_ref(),
            _ => None,
        }
    }

    /// Visits this node and every nested node, depth first.
    ///
    /// References are not followed.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Schema)) {
        visit(self);
        if let Some(object) = self.object_keywords() {
            for child in object.properties.values() {
                child.walk(visit);
            }
            if let AdditionalProperties::Schema(child) = &object.additional {
                child.walk(visit);
            }
        }
        if let Some(items) = self.array_keywords().and_then(|array| array.items.as_deref()) {
            items.walk(visit);
        }
    }

    /// Maps a document schema to its typed form.
    ///
    /// `ref_prefix` is the registry prefix used by the document's dialect
    /// ([`COMPONENTS_PREFIX`] or [`DEFINITIONS_PREFIX`]).
    pub fn from_raw(raw: &RawSchema, ref_prefix: &str) -> Result<Self, SchemaError> {
        if let Some(reference) = &raw.reference {
            let name = reference
                .strip_prefix(ref_prefix)
                .filter(|name| !name.is_empty() && !name.contains('/'))
                .ok_or_else(|| SchemaError::UnsupportedReference(reference.clone()))?;
            return Ok(Self::reference(name));
        }

        let kind = match raw.schema_type.as_deref() {
            None => {
                let has_object_keywords = raw.properties.is_some()
                    || raw.required.is_some()
                    || raw.additional_properties.is_some();
                SchemaKind::Any(Untyped {
                    object: has_object_keywords
                        .then(|| Self::object_from_raw(raw, ref_prefix))
                        .transpose()?,
                    array: raw
                        .items
                        .is_some()
                        .then(|| Self::array_from_raw(raw, ref_prefix))
                        .transpose()?,
                })
            }
            Some("boolean") => SchemaKind::Boolean,
            Some("integer") => SchemaKind::Integer,
            Some("number") => SchemaKind::Number,
            Some("string") => SchemaKind::String,
            Some("object") => SchemaKind::Object(Self::object_from_raw(raw, ref_prefix)?),
            Some("array") => SchemaKind::Array(Self::array_from_raw(raw, ref_prefix)?),
            Some(other) => return Err(SchemaError::UnknownType(other.to_string())),
        };

        Ok(Self {
            kind,
            format: raw.format.as_deref().map(Format::from_name),
            enumeration: raw.enumeration.clone(),
            nullable: raw.nullable.or(raw.x_nullable).unwrap_or(false),
            constraints: Constraints {
                minimum: raw.minimum,
                maximum: raw.maximum,
                exclusive_minimum: raw.exclusive_minimum.unwrap_or(false),
                exclusive_maximum: raw.exclusive_maximum.unwrap_or(false),
                min_length: raw.min_length,
                max_length: raw.max_length,
                pattern: raw.pattern.clone(),
                min_items: raw.min_items,
                max_items: raw.max_items,
            },
            description: raw.description.clone(),
        })
    }

    fn array_from_raw(raw: &RawSchema, ref_prefix: &str) -> Result<ArraySchema, SchemaError> {
        Ok(ArraySchema {
            items: raw
                .items
                .as_deref()
                .map(|items| Self::from_raw(items, ref_prefix).map(Box::new))
                .transpose()?,
        })
    }

    fn object_from_raw(raw: &RawSchema, ref_prefix: &str) -> Result<ObjectSchema, SchemaError> {
        let mut properties = IndexMap::new();
        for (name, child) in raw.properties.iter().flatten() {
            properties.insert(name.clone(), Self::from_raw(child, ref_prefix)?);
        }

        let additional = match &raw.additional_properties {
            None => AdditionalProperties::Unspecified,
            Some(RawAdditionalProperties::Bool(true)) => AdditionalProperties::Allowed,
            Some(RawAdditionalProperties::Bool(false)) => AdditionalProperties::Forbidden,
            Some(RawAdditionalProperties::Schema(child)) => {
                AdditionalProperties::Schema(Box::new(Self::from_raw(child, ref_prefix)?))
            }
        };

        Ok(ObjectSchema {
            properties,
            required: raw.required.clone().unwrap_or_default(),
            additional,
        })
    }

    /// Renders this node in canonical document form.
    #[must_use]
    pub fn to_raw(&self) -> RawSchema {
        let mut raw = RawSchema {
            schema_type: self.kind.type_name().map(str::to_string),
            format: self.format.as_ref().map(|f| f.as_str().to_string()),
            enumeration: self.enumeration.clone(),
            nullable: self.nullable.then_some(true),
            minimum: self.constraints.minimum,
            maximum: self.constraints.maximum,
            exclusive_minimum: self.constraints.exclusive_minimum.then_some(true),
            exclusive_maximum: self.constraints.exclusive_maximum.then_some(true),
            min_length: self.constraints.min_length,
            max_length: self.constraints.max_length,
            pattern: self.constraints.pattern.clone(),
            min_items: self.constraints.min_items,
            max_items: self.constraints.max_items,
            description: self.description.clone(),
            ..RawSchema::default()
        };

        if let SchemaKind::Ref(name) = &self.kind {
            raw.reference = Some(format!("{COMPONENTS_PREFIX}{name}"));
        }
        if let Some(object) = self.object_keywords() {
            if !object.properties.is_empty() {
                raw.properties = Some(
                    object
                        .properties
                        .iter()
                        .map(|(name, child)| (name.clone(), child.to_raw()))
                        .collect(),
                );
            }
            if !object.required.is_empty() {
                raw.required = Some(object.required.clone());
            }
            raw.additional_properties = match &object.additional {
                AdditionalProperties::Unspecified => None,
                AdditionalProperties::Allowed => Some(RawAdditionalProperties::Bool(true)),
                AdditionalProperties::Forbidden => Some(RawAdditionalProperties::Bool(false)),
                AdditionalProperties::Schema(child) => {
                    Some(RawAdditionalProperties::Schema(Box::new(child.to_raw())))
                }
            };
        }
        if let Some(array) = self.array_keywords() {
            raw.items = array.items.as_ref().map(|items| Box::new(items.to_raw()));
        }

        raw
    }

    /// Renders this node as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.to_raw()).unwrap_or(Value::Null)
    }
}
