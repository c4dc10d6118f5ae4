//! Swagger/OpenAPI Composition Resolver
//!
//! Recovers inheritance from schema composition: given a definitions table
//! where a child is written as `allOf`/`oneOf` of a named base and an inline
//! object, it finds the base and the child and checks that the combination is
//! well formed.
//!
//! ## Pipeline
//!
//! ```text
//! document (JSON/YAML)
//!   └─ loader ──────────► Definitions   name -> Schema, refs kept by name
//!        └─ Resolver ────► Structure     structural refs materialized, cycles rejected
//!             └─ classify ► InheritancePair { base, child }
//!                  └─ discriminator ► discriminator required + declared
//! ```
//!
//! `graph::analyze` drives the whole pipeline over a document and collects
//! per-definition diagnostics.

pub mod config;
pub mod error;
pub mod graph;
pub mod schema;

pub use config::{AnalysisConfig, CompositionConfig, LoaderConfig, OutputFormat};
pub use error::{CompositionError, Result};
pub use graph::{
    analyze, classify_all_of, classify_one_of, validate_polymorphic_pair, AnalysisReport,
    Definitions, InheritancePair, Resolver,
};
pub use schema::{
    Combinator, ObjectMetadata, ObjectSchema, PrimitiveKind, Schema, SchemaKind, Structure,
};
