//! Composition Classification
//!
//! Recovers the inheritance idiom from a resolved `allOf`/`oneOf`: exactly two
//! subschemas, one named object (the base) and one inline object (the child).
//! Roles come from shape, never from position. Multi-level or multi-parent
//! inheritance must be written as nested two-member compositions; anything
//! wider is rejected rather than guessed at.
//!
//! Classification does not resolve references. Callers resolve the
//! definition first (see `Resolver`) so that a base arrives as a `Structure`.

use serde::Serialize;

use crate::error::{CompositionError, Result};
use crate::schema::{Combinator, ObjectSchema, Schema};

/// Number of subschemas the inheritance idiom accepts
pub const INHERITANCE_ARITY: usize = 2;

// =============================================================================
// Inheritance Pair
// =============================================================================

/// A base/child pair borrowed from a resolved schema tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InheritancePair<'a> {
    pub combinator: Combinator,
    /// Definition name the base was reached through
    pub base_name: &'a str,
    pub base: &'a ObjectSchema,
    pub child: &'a ObjectSchema,
}

// =============================================================================
// Roles
// =============================================================================

enum Role<'a> {
    Base { name: &'a str, object: &'a ObjectSchema },
    Child(&'a ObjectSchema),
}

fn role_of(combinator: Combinator, index: usize, sub: &Schema) -> Result<Role<'_>> {
    let unsupported = || CompositionError::UnsupportedSubschemaShape {
        combinator,
        index,
        found: sub.kind(),
    };

    match sub {
        Schema::Object(object) => Ok(Role::Child(object)),
        Schema::Structure(structure) => match structure.wrapped.as_ref() {
            Schema::Object(object) => Ok(Role::Base {
                name: &structure.name,
                object,
            }),
            Schema::Primitive(_)
            | Schema::Array(_)
            | Schema::Structure(_)
            | Schema::AllOf(_)
            | Schema::OneOf(_)
            | Schema::Reference(_) => Err(unsupported()),
        },
        Schema::Primitive(_)
        | Schema::Array(_)
        | Schema::AllOf(_)
        | Schema::OneOf(_)
        | Schema::Reference(_) => Err(unsupported()),
    }
}

// =============================================================================
// Classification
// =============================================================================

/// Classify an `allOf` into its base and child
pub fn classify_all_of(schema: &Schema) -> Result<InheritancePair<'_>> {
    classify(schema, Combinator::AllOf)
}

/// Classify a `oneOf` into its base and child
pub fn classify_one_of(schema: &Schema) -> Result<InheritancePair<'_>> {
    classify(schema, Combinator::OneOf)
}

/// Classify `schema` as the given combinator
pub fn classify(schema: &Schema, combinator: Combinator) -> Result<InheritancePair<'_>> {
    let subschemas = match (combinator, schema) {
        (Combinator::AllOf, Schema::AllOf(subs)) | (Combinator::OneOf, Schema::OneOf(subs)) => subs,
        _ => {
            return Err(CompositionError::NotThisCombinator {
                expected: combinator,
                found: schema.kind(),
            })
        }
    };

    if subschemas.len() != INHERITANCE_ARITY {
        return Err(CompositionError::WrongSubschemaCount {
            combinator,
            count: subschemas.len(),
        });
    }

    let mut base: Option<(&str, &ObjectSchema)> = None;
    let mut child: Option<&ObjectSchema> = None;

    for (index, sub) in subschemas.iter().enumerate() {
        match role_of(combinator, index, sub)? {
            Role::Base { name, object } => base = Some((name, object)),
            Role::Child(object) => child = Some(object),
        }
    }

    let (base_name, base) = base.ok_or(CompositionError::MissingBase { combinator })?;
    let child = child.ok_or(CompositionError::MissingChild { combinator })?;

    Ok(InheritancePair {
        combinator,
        base_name,
        base,
        child,
    })
}
