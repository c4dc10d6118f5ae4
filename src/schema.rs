//! Schema node model
//!
//! A closed set of schema shapes covering the composition subset of
//! Swagger/OpenAPI: primitives, arrays, objects, named structures, `allOf`,
//! `oneOf` and unresolved references. Consumers match every variant; nothing
//! here coerces one shape into another. A `Structure` wrapping an `Object` is
//! not an `Object` until the caller calls [`Schema::unwrap_structure`].

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Primitive Kinds
// =============================================================================

/// Leaf scalar type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Integer,
    Boolean,
}

impl PrimitiveKind {
    pub fn from_json_type(type_str: &str) -> Option<Self> {
        match type_str {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

// =============================================================================
// Combinators
// =============================================================================

/// Composition keyword grouping several subschemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Combinator {
    #[serde(rename = "allOf")]
    AllOf,
    #[serde(rename = "oneOf")]
    OneOf,
}

impl Combinator {
    /// The document keyword for this combinator
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::AllOf => "allOf",
            Self::OneOf => "oneOf",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

// =============================================================================
// Object Schema
// =============================================================================

/// Descriptive data attached to an object schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Property whose value selects the concrete child variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
}

/// An object with named properties
///
/// `required` is not checked against `properties` on construction; the
/// discriminator validator reports inconsistencies as `DanglingRequired`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(default)]
    pub properties: IndexMap<String, Schema>,
    #[serde(default)]
    pub required: IndexSet<String>,
    #[serde(default)]
    pub metadata: ObjectMetadata,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property; `required` also records it in the required set
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        schema: Schema,
        required: bool,
    ) -> Self {
        let name = name.into();
        if required {
            self.required.insert(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    /// Mark a name as required without declaring it
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.insert(name.into());
        self
    }

    pub fn with_discriminator(mut self, name: impl Into<String>) -> Self {
        self.metadata.discriminator = Some(name.into());
        self
    }

    pub fn discriminator(&self) -> Option<&str> {
        self.metadata.discriminator.as_deref()
    }

    pub fn declares(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    pub fn requires(&self, property: &str) -> bool {
        self.required.contains(property)
    }

    /// Required names in declaration order
    pub fn required_names(&self) -> Vec<&str> {
        self.required.iter().map(String::as_str).collect()
    }

    /// Property names in declaration order
    pub fn property_names(&self) -> Vec<&str> {
        self.properties.keys().map(String::as_str).collect()
    }
}

// =============================================================================
// Structure
// =============================================================================

/// A definition name bound to its resolved schema
///
/// The body is shared: every place a definition is reached from within one
/// resolution points at the same materialized node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub name: String,
    pub wrapped: Arc<Schema>,
}

impl Structure {
    pub fn new(name: impl Into<String>, wrapped: Schema) -> Self {
        Self {
            name: name.into(),
            wrapped: Arc::new(wrapped),
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// A schema node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "schema", rename_all = "snake_case")]
pub enum Schema {
    Primitive(PrimitiveKind),
    Array(Box<Schema>),
    Object(ObjectSchema),
    Structure(Structure),
    AllOf(Vec<Schema>),
    OneOf(Vec<Schema>),
    /// Unresolved pointer to a definition name
    Reference(String),
}

/// Field-less discriminant of [`Schema`], used in error payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    Primitive(PrimitiveKind),
    Array,
    Object,
    /// A structure and the kind it wraps (one level)
    Structure { wraps_object: bool },
    AllOf,
    OneOf,
    Reference,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "a primitive ({})", p.as_str()),
            Self::Array => write!(f, "an array"),
            Self::Object => write!(f, "an object"),
            Self::Structure { wraps_object: true } => write!(f, "a named object"),
            Self::Structure { wraps_object: false } => write!(f, "a named non-object"),
            Self::AllOf => write!(f, "an allOf"),
            Self::OneOf => write!(f, "a oneOf"),
            Self::Reference => write!(f, "an unresolved reference"),
        }
    }
}

impl Schema {
    pub fn object(object: ObjectSchema) -> Self {
        Schema::Object(object)
    }

    pub fn structure(name: impl Into<String>, wrapped: Schema) -> Self {
        Schema::Structure(Structure::new(name, wrapped))
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array(Box::new(items))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Schema::Reference(name.into())
    }

    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Primitive(p) => SchemaKind::Primitive(*p),
            Schema::Array(_) => SchemaKind::Array,
            Schema::Object(_) => SchemaKind::Object,
            Schema::Structure(s) => SchemaKind::Structure {
                wraps_object: matches!(*s.wrapped, Schema::Object(_)),
            },
            Schema::AllOf(_) => SchemaKind::AllOf,
            Schema::OneOf(_) => SchemaKind::OneOf,
            Schema::Reference(_) => SchemaKind::Reference,
        }
    }

    /// The combinator and its subschemas, if this node is one
    pub fn composition(&self) -> Option<(Combinator, &[Schema])> {
        match self {
            Schema::AllOf(subs) => Some((Combinator::AllOf, subs)),
            Schema::OneOf(subs) => Some((Combinator::OneOf, subs)),
            Schema::Primitive(_)
            | Schema::Array(_)
            | Schema::Object(_)
            | Schema::Structure(_)
            | Schema::Reference(_) => None,
        }
    }

    /// See through exactly one `Structure` layer
    pub fn unwrap_structure(&self) -> &Schema {
        match self {
            Schema::Structure(s) => &s.wrapped,
            Schema::Primitive(_)
            | Schema::Array(_)
            | Schema::Object(_)
            | Schema::AllOf(_)
            | Schema::OneOf(_)
            | Schema::Reference(_) => self,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Schema::Object(o) => Some(o),
            Schema::Primitive(_)
            | Schema::Array(_)
            | Schema::Structure(_)
            | Schema::AllOf(_)
            | Schema::OneOf(_)
            | Schema::Reference(_) => None,
        }
    }

    /// Definition names this node points at, in document order
    ///
    /// Walks into properties, items and combinators, but not into a
    /// `Structure` (its name is the reference).
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Schema::Primitive(_) => {}
            Schema::Array(items) => items.collect_references(out),
            Schema::Object(o) => {
                for prop in o.properties.values() {
                    prop.collect_references(out);
                }
            }
            Schema::Structure(s) => out.push(&s.name),
            Schema::AllOf(subs) | Schema::OneOf(subs) => {
                for sub in subs {
                    sub.collect_references(out);
                }
            }
            Schema::Reference(name) => out.push(name),
        }
    }
}
