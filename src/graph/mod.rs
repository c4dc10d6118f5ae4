//! Definitions Graph
//!
//! The immutable name -> schema mapping of one document, plus the passes that
//! run over it:
//! - resolve: cycle-guarded reference materialization
//! - classify: base/child recovery from `allOf`/`oneOf`
//! - discriminator: polymorphic well-formedness
//! - analysis: whole-document driver and reference cycle report
//!
//! Everything here borrows `Definitions` immutably, so independent analyses
//! can share one mapping across threads.

pub mod loader;
pub mod resolve;
pub mod classify;
pub mod discriminator;
pub mod analysis;
pub mod diagnostics;

pub use analysis::{analyze, reference_cycles, AnalysisReport, DefinitionOutcome};
pub use classify::{classify, classify_all_of, classify_one_of, InheritancePair};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use discriminator::{check_required_declared, validate_pair, validate_polymorphic_pair};
pub use loader::{load_from_directory, load_from_path, load_from_str, DocumentFormat};
pub use resolve::Resolver;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{CompositionError, Result};
use crate::schema::Schema;

/// Definition name (the addressing key of a reference)
pub type DefinitionName = String;

/// All named top-level schemas of one document, in document order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Definitions {
    pub(crate) schemas: IndexMap<DefinitionName, Schema>,

    /// Definitions the loader could not read, with the reason
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub(crate) invalid: IndexMap<DefinitionName, String>,

    /// SHA-256 of the source text (empty when built in memory)
    pub digest: String,
}

impl Definitions {
    /// Build a mapping from already-typed schemas
    pub fn new(schemas: impl IntoIterator<Item = (DefinitionName, Schema)>) -> Self {
        Self {
            schemas: schemas.into_iter().collect(),
            invalid: IndexMap::new(),
            digest: String::new(),
        }
    }

    /// Look up a definition without following references
    pub fn get(&self, name: &str) -> Result<&Schema> {
        if let Some(schema) = self.schemas.get(name) {
            return Ok(schema);
        }
        match self.invalid.get(name) {
            Some(reason) => Err(CompositionError::InvalidDefinition {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            None => Err(CompositionError::UnknownReference { name: name.to_string() }),
        }
    }

    /// Definitions present in the document but not loaded, in document order
    pub fn invalid(&self) -> impl Iterator<Item = (&DefinitionName, &str)> {
        self.invalid.iter().map(|(name, reason)| (name, reason.as_str()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Definition names in document order
    pub fn names(&self) -> impl Iterator<Item = &DefinitionName> {
        self.schemas.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DefinitionName, &Schema)> {
        self.schemas.iter()
    }

    /// Names of definitions whose body is an `allOf` or `oneOf`
    pub fn composed(&self) -> impl Iterator<Item = &DefinitionName> {
        self.schemas
            .iter()
            .filter(|(_, schema)| schema.composition().is_some())
            .map(|(name, _)| name)
    }

    /// A resolver borrowing this mapping
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self)
    }

    /// Resolve a definition by name
    pub fn resolve(&self, name: &str) -> Result<Schema> {
        self.resolver().resolve(name)
    }
}
