//! Error types for composition resolution

use thiserror::Error;

use crate::schema::{Combinator, SchemaKind};

/// Result type for composition operations
pub type Result<T> = std::result::Result<T, CompositionError>;

/// Composition, resolution and loading errors
#[derive(Error, Debug)]
pub enum CompositionError {
    // === Resolution ===
    #[error("Unknown reference: no definition named '{name}'")]
    UnknownReference { name: String },

    #[error("Cyclic reference: {}", .chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    // === Classification ===
    #[error("Expected {expected} composition, found {found}")]
    NotThisCombinator {
        expected: Combinator,
        found: SchemaKind,
    },

    #[error("{combinator} must have exactly 2 subschemas, found {count}")]
    WrongSubschemaCount { combinator: Combinator, count: usize },

    #[error("{combinator} subschema #{index} is {found}; expected an object or a named object")]
    UnsupportedSubschemaShape {
        combinator: Combinator,
        index: usize,
        found: SchemaKind,
    },

    #[error("{combinator} has no base schema (a named object)")]
    MissingBase { combinator: Combinator },

    #[error("{combinator} has no child schema (an inline object)")]
    MissingChild { combinator: Combinator },

    // === Polymorphism ===
    #[error("{}", missing_discriminator_message(.property))]
    MissingDiscriminator { property: Option<String> },

    #[error("Property '{property}' is required but not declared")]
    DanglingRequired { property: String },

    #[error("Discriminator '{property}' is not one of {candidates:?}")]
    UnexpectedDiscriminator {
        property: String,
        candidates: Vec<String>,
    },

    // === Loading ===
    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("Invalid reference '{pointer}': expected one of {prefixes:?}")]
    InvalidReference {
        pointer: String,
        prefixes: Vec<String>,
    },

    #[error("{combinator} with zero subschemas in '{definition}'")]
    EmptyComposition {
        definition: String,
        combinator: Combinator,
    },

    /// A definition the loader could not read; the rest of the document loaded
    #[error("Definition '{name}' could not be read: {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn missing_discriminator_message(property: &Option<String>) -> String {
    match property {
        Some(p) => format!("Discriminator '{}' is not a required property of the base", p),
        None => "Base schema declares no discriminator".to_string(),
    }
}

impl CompositionError {
    /// True for errors raised while reading a document rather than analysing it
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::InvalidReference { .. }
                | Self::EmptyComposition { .. }
                | Self::InvalidDefinition { .. }
                | Self::Io(_)
                | Self::Json(_)
                | Self::Yaml(_)
        )
    }
}
