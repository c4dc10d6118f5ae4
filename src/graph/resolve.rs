//! Reference Resolution
//!
//! Turns a definition name into its schema with structural references
//! materialized as `Structure` nodes. A reference is structural when it is the
//! whole body of a definition (an alias) or a direct member of an
//! `allOf`/`oneOf`. References under properties and array items stay as lazy
//! `Reference` nodes: they may legitimately recurse (a tree node holding its
//! children) and are resolved on demand with another `resolve` call.
//!
//! Each call keeps its own in-progress stack and a table of names it has
//! already materialized, so a `Resolver` is a shared read-only view. A name
//! reached along several paths (a diamond) is materialized once and shared
//! through the `Arc` in its `Structure`, which bounds the work of one call by
//! the size of the document.

use std::collections::HashMap;
use tracing::trace;

use super::Definitions;
use crate::error::{CompositionError, Result};
use crate::schema::Schema;

/// Cycle-guarded resolver over one definitions mapping
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    definitions: &'a Definitions,
}

/// Per-call resolution state
#[derive(Default)]
struct Walk {
    in_progress: Vec<String>,
    done: HashMap<String, Schema>,
}

impl<'a> Resolver<'a> {
    pub fn new(definitions: &'a Definitions) -> Self {
        Self { definitions }
    }

    /// Resolve `name` to `Structure { name, wrapped }`
    pub fn resolve(&self, name: &str) -> Result<Schema> {
        self.resolve_named(name, &mut Walk::default())
    }

    fn resolve_named(&self, name: &str, walk: &mut Walk) -> Result<Schema> {
        if let Some(start) = walk.in_progress.iter().position(|n| n == name) {
            let mut chain = walk.in_progress[start..].to_vec();
            chain.push(name.to_string());
            return Err(CompositionError::CyclicReference { chain });
        }

        // Structure clones share the materialized body
        if let Some(done) = walk.done.get(name) {
            return Ok(done.clone());
        }

        let body = self.definitions.get(name)?;
        trace!(definition = name, depth = walk.in_progress.len(), "resolving");

        walk.in_progress.push(name.to_string());
        let wrapped = self.materialize(body, walk);
        walk.in_progress.pop();

        let structure = Schema::structure(name, wrapped?);
        walk.done.insert(name.to_string(), structure.clone());
        Ok(structure)
    }

    fn materialize(&self, schema: &Schema, walk: &mut Walk) -> Result<Schema> {
        match schema {
            Schema::Reference(target) => self.resolve_named(target, walk),
            Schema::AllOf(subs) => Ok(Schema::AllOf(self.materialize_members(subs, walk)?)),
            Schema::OneOf(subs) => Ok(Schema::OneOf(self.materialize_members(subs, walk)?)),
            // Property and item references stay lazy
            Schema::Primitive(_) | Schema::Array(_) | Schema::Object(_) | Schema::Structure(_) => {
                Ok(schema.clone())
            }
        }
    }

    fn materialize_members(&self, subs: &[Schema], walk: &mut Walk) -> Result<Vec<Schema>> {
        subs.iter().map(|sub| self.materialize(sub, walk)).collect()
    }
}
