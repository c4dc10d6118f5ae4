//! Document Loading
//!
//! Reads a Swagger 2 (`definitions`) or OpenAPI 3 (`components.schemas`)
//! document from JSON or YAML and builds the `Definitions` mapping. Only the
//! composition subset is read: `$ref`, `allOf`, `oneOf`, `type`, `items`,
//! `properties`, `required`, `discriminator`, `title` and `description`.
//! Other keywords are ignored, and a schema with no `type` reads as an object.
//! A definition that cannot be read is recorded as invalid and the rest of
//! the document still loads.
//!
//! References are kept by name and resolved lazily, so forward references
//! need no second pass.

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::Definitions;
use crate::config::LoaderConfig;
use crate::error::{CompositionError, Result};
use crate::schema::{Combinator, ObjectMetadata, ObjectSchema, PrimitiveKind, Schema};

/// Serialization of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

// =============================================================================
// Reference Pointers
// =============================================================================

/// Maps `$ref` pointers such as `#/definitions/Pet` to definition names
struct PointerParser {
    pattern: Regex,
    prefixes: Vec<String>,
}

impl PointerParser {
    fn new(prefixes: &[String]) -> Result<Self> {
        let alternatives = prefixes
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!("^(?:{})(?P<name>[^/]+)$", alternatives))
            .map_err(|e| CompositionError::InvalidFormat(format!("bad reference prefix: {}", e)))?;

        Ok(Self {
            pattern,
            prefixes: prefixes.to_vec(),
        })
    }

    fn definition_name(&self, pointer: &str) -> Result<String> {
        let captures = self
            .pattern
            .captures(pointer)
            .ok_or_else(|| CompositionError::InvalidReference {
                pointer: pointer.to_string(),
                prefixes: self.prefixes.clone(),
            })?;

        // JSON Pointer escapes
        Ok(captures["name"].replace("~1", "/").replace("~0", "~"))
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Load definitions from document text
pub fn load_from_str(
    content: &str,
    format: DocumentFormat,
    config: &LoaderConfig,
) -> Result<Definitions> {
    let document: Value = match format {
        DocumentFormat::Json => serde_json::from_str(content)?,
        DocumentFormat::Yaml => serde_yaml::from_str(content)?,
    };

    let mut definitions = parse_document(&document, config)?;
    definitions.digest = format!("{:x}", Sha256::digest(content.as_bytes()));

    debug!(
        definitions = definitions.len(),
        invalid = definitions.invalid.len(),
        digest = %definitions.digest,
        "loaded document"
    );
    Ok(definitions)
}

/// Load definitions from a `.json`, `.yaml` or `.yml` file
pub fn load_from_path(path: &Path, config: &LoaderConfig) -> Result<Definitions> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        CompositionError::InvalidFormat(format!(
            "unrecognized document extension: {}",
            path.display()
        ))
    })?;
    let content = fs::read_to_string(path)?;
    load_from_str(&content, format, config)
}

/// Load every document under `dir`, sorted by path
///
/// A document that fails to load is returned as an error in its slot so one
/// bad file does not hide the others.
pub fn load_from_directory(
    dir: &Path,
    config: &LoaderConfig,
) -> Vec<(PathBuf, Result<Definitions>)> {
    let mut results = Vec::new();

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() || DocumentFormat::from_path(path).is_none() {
            continue;
        }

        let relative = path.strip_prefix(dir).unwrap_or(path);
        let relative_str = relative.to_string_lossy();
        if config.skip_prefixes.iter().any(|p| relative_str.starts_with(p.as_str())) {
            continue;
        }

        let loaded = load_from_path(path, config);
        if let Err(e) = &loaded {
            warn!(path = %path.display(), error = %e, "failed to load document");
        }
        results.push((path.to_path_buf(), loaded));
    }

    results
}

/// Build definitions from an already-decoded document tree
pub fn parse_document(document: &Value, config: &LoaderConfig) -> Result<Definitions> {
    let table = definitions_table(document)?;
    let pointers = PointerParser::new(&config.reference_prefixes)?;

    let mut schemas = IndexMap::with_capacity(table.len());
    let mut invalid = IndexMap::new();
    for (name, body) in table {
        match parse_schema(body, name, &pointers) {
            Ok(schema) => {
                schemas.insert(name.clone(), schema);
            }
            Err(e) => {
                warn!(definition = %name, error = %e, "skipping unreadable definition");
                invalid.insert(name.clone(), e.to_string());
            }
        }
    }

    Ok(Definitions {
        schemas,
        invalid,
        digest: String::new(),
    })
}

fn definitions_table(document: &Value) -> Result<&Map<String, Value>> {
    document
        .get("definitions")
        .or_else(|| document.pointer("/components/schemas"))
        .and_then(|v| v.as_object())
        .ok_or_else(|| {
            CompositionError::InvalidFormat(
                "document has no 'definitions' or 'components.schemas' mapping".to_string(),
            )
        })
}

// =============================================================================
// Schema Parsing
// =============================================================================

/// Parse one schema; `context` names its location for error messages
fn parse_schema(value: &Value, context: &str, pointers: &PointerParser) -> Result<Schema> {
    let Some(obj) = value.as_object() else {
        return Err(CompositionError::InvalidFormat(format!(
            "{}: schema must be a mapping",
            context
        )));
    };

    if let Some(pointer) = obj.get("$ref") {
        let pointer = pointer.as_str().ok_or_else(|| {
            CompositionError::InvalidFormat(format!("{}: $ref must be a string", context))
        })?;
        return Ok(Schema::Reference(pointers.definition_name(pointer)?));
    }

    if let Some(members) = obj.get("allOf") {
        return parse_composition(members, Combinator::AllOf, context, pointers).map(Schema::AllOf);
    }

    if let Some(members) = obj.get("oneOf") {
        return parse_composition(members, Combinator::OneOf, context, pointers).map(Schema::OneOf);
    }

    if obj.contains_key("anyOf") {
        return Err(CompositionError::InvalidFormat(format!(
            "{}: anyOf is not supported",
            context
        )));
    }

    match obj.get("type").map(|t| t.as_str()) {
        Some(Some("array")) => {
            let items = obj.get("items").ok_or_else(|| {
                CompositionError::InvalidFormat(format!("{}: array without items", context))
            })?;
            let items = parse_schema(items, &format!("{}[]", context), pointers)?;
            Ok(Schema::array(items))
        }
        Some(Some("object")) => parse_object(obj, context, pointers).map(Schema::Object),
        Some(Some(other)) => PrimitiveKind::from_json_type(other)
            .map(Schema::Primitive)
            .ok_or_else(|| {
                CompositionError::InvalidFormat(format!(
                    "{}: unsupported type '{}'",
                    context, other
                ))
            }),
        Some(None) => Err(CompositionError::InvalidFormat(format!(
            "{}: type must be a single string",
            context
        ))),
        // Untyped: `{}`, `required`-only children, `additionalProperties` maps
        None => parse_object(obj, context, pointers).map(Schema::Object),
    }
}

fn parse_composition(
    members: &Value,
    combinator: Combinator,
    context: &str,
    pointers: &PointerParser,
) -> Result<Vec<Schema>> {
    let members = members.as_array().ok_or_else(|| {
        CompositionError::InvalidFormat(format!("{}: {} must be a list", context, combinator))
    })?;

    if members.is_empty() {
        return Err(CompositionError::EmptyComposition {
            definition: context.to_string(),
            combinator,
        });
    }

    members
        .iter()
        .enumerate()
        .map(|(i, member)| {
            parse_schema(member, &format!("{}.{}[{}]", context, combinator, i), pointers)
        })
        .collect()
}

fn parse_object(
    obj: &Map<String, Value>,
    context: &str,
    pointers: &PointerParser,
) -> Result<ObjectSchema> {
    let mut properties = IndexMap::new();
    if let Some(props) = obj.get("properties") {
        let props = props.as_object().ok_or_else(|| {
            CompositionError::InvalidFormat(format!("{}: properties must be a mapping", context))
        })?;
        for (name, prop) in props {
            let schema = parse_schema(prop, &format!("{}.{}", context, name), pointers)?;
            properties.insert(name.clone(), schema);
        }
    }

    let mut required = IndexSet::new();
    if let Some(names) = obj.get("required") {
        let names = names.as_array().ok_or_else(|| {
            CompositionError::InvalidFormat(format!("{}: required must be a list", context))
        })?;
        for name in names {
            let name = name.as_str().ok_or_else(|| {
                CompositionError::InvalidFormat(format!(
                    "{}: required entries must be strings",
                    context
                ))
            })?;
            required.insert(name.to_string());
        }
    }

    let discriminator = match obj.get("discriminator") {
        None => None,
        // Swagger 2
        Some(Value::String(name)) => Some(name.clone()),
        // OpenAPI 3
        Some(Value::Object(d)) => Some(
            d.get("propertyName")
                .and_then(|v| v.as_str())
                .map(String::from)
                .ok_or_else(|| {
                    CompositionError::InvalidFormat(format!(
                        "{}: discriminator object needs a propertyName",
                        context
                    ))
                })?,
        ),
        Some(_) => {
            return Err(CompositionError::InvalidFormat(format!(
                "{}: discriminator must be a string or an object",
                context
            )))
        }
    };

    let text = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(String::from);

    Ok(ObjectSchema {
        properties,
        required,
        metadata: ObjectMetadata {
            title: text("title"),
            description: text("description"),
            discriminator,
        },
    })
}
