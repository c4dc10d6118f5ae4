//! Discriminator Validation
//!
//! Confirms that a base schema used for polymorphism names a discriminator
//! that is both required and declared, and that a child's required set only
//! names properties the child or its base declares.

use crate::error::{CompositionError, Result};
use crate::schema::{Combinator, ObjectSchema};

use super::classify::InheritancePair;

/// First required name that `object` does not declare
pub fn check_required_declared(object: &ObjectSchema) -> Result<()> {
    match object.required.iter().find(|name| !object.declares(name)) {
        Some(name) => Err(CompositionError::DanglingRequired { property: name.clone() }),
        None => Ok(()),
    }
}

/// Validate the discriminator of a base schema
///
/// In a `oneOf` context the discriminator is mandatory; under `allOf` a base
/// without one is plain inheritance and passes with `Ok(None)`. A non-empty
/// `candidates` list restricts which property may serve as discriminator.
pub fn validate_polymorphic_pair<'a>(
    base: &'a ObjectSchema,
    combinator: Combinator,
    candidates: &[&str],
) -> Result<Option<&'a str>> {
    let Some(discriminator) = base.discriminator() else {
        return match combinator {
            Combinator::OneOf => Err(CompositionError::MissingDiscriminator { property: None }),
            Combinator::AllOf => Ok(None),
        };
    };

    if !base.requires(discriminator) {
        return Err(CompositionError::MissingDiscriminator {
            property: Some(discriminator.to_string()),
        });
    }

    if !base.declares(discriminator) {
        return Err(CompositionError::DanglingRequired {
            property: discriminator.to_string(),
        });
    }

    if !candidates.is_empty() && !candidates.contains(&discriminator) {
        return Err(CompositionError::UnexpectedDiscriminator {
            property: discriminator.to_string(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        });
    }

    Ok(Some(discriminator))
}

/// Validate a classified pair: the base discriminator, then the child's required set
pub fn validate_pair<'a>(
    pair: &InheritancePair<'a>,
    candidates: &[&str],
) -> Result<Option<&'a str>> {
    let discriminator = validate_polymorphic_pair(pair.base, pair.combinator, candidates)?;

    // Narrowing a base property is allowed, requiring an undeclared one is not
    if let Some(name) = pair
        .child
        .required
        .iter()
        .find(|name| !pair.child.declares(name) && !pair.base.declares(name))
    {
        return Err(CompositionError::DanglingRequired { property: name.clone() });
    }

    Ok(discriminator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PrimitiveKind, Schema};

    fn string() -> Schema {
        Schema::Primitive(PrimitiveKind::String)
    }

    fn base() -> ObjectSchema {
        ObjectSchema::new()
            .with_property("base", string(), true)
            .with_property("test_type", string(), true)
            .with_discriminator("test_type")
    }

    #[test]
    fn test_valid_discriminator() {
        let b = base();
        let found =
            validate_polymorphic_pair(&b, Combinator::OneOf, &["base", "test_type"]).unwrap();
        assert_eq!(found, Some("test_type"));
    }

    #[test]
    fn test_missing_discriminator_depends_on_context() {
        let plain = ObjectSchema::new().with_property("base", string(), true);
        assert!(matches!(
            validate_polymorphic_pair(&plain, Combinator::OneOf, &[]),
            Err(CompositionError::MissingDiscriminator { property: None })
        ));
        assert_eq!(validate_polymorphic_pair(&plain, Combinator::AllOf, &[]).unwrap(), None);
    }

    #[test]
    fn test_discriminator_not_required() {
        let b = ObjectSchema::new()
            .with_property("test_type", string(), false)
            .with_discriminator("test_type");
        match validate_polymorphic_pair(&b, Combinator::AllOf, &[]) {
            Err(CompositionError::MissingDiscriminator { property }) => {
                assert_eq!(property.as_deref(), Some("test_type"));
            }
            other => panic!("Expected MissingDiscriminator, got {:?}", other),
        }
    }

    #[test]
    fn test_discriminator_required_but_undeclared() {
        let b = ObjectSchema::new()
            .with_property("base", string(), true)
            .with_required("test_type")
            .with_discriminator("test_type");
        match validate_polymorphic_pair(&b, Combinator::OneOf, &[]) {
            Err(CompositionError::DanglingRequired { property }) => {
                assert_eq!(property, "test_type")
            }
            other => panic!("Expected DanglingRequired, got {:?}", other),
        }
        assert!(check_required_declared(&b).is_err());
        assert!(check_required_declared(&base()).is_ok());
    }

    #[test]
    fn test_unexpected_discriminator() {
        let b = base();
        assert!(matches!(
            validate_polymorphic_pair(&b, Combinator::AllOf, &["kind"]),
            Err(CompositionError::UnexpectedDiscriminator { .. })
        ));
    }

    #[test]
    fn test_child_may_require_base_properties() {
        let b = base();
        let child = ObjectSchema::new()
            .with_property("extra", string(), true)
            .with_required("base");
        let pair = InheritancePair {
            combinator: Combinator::AllOf,
            base_name: "Base",
            base: &b,
            child: &child,
        };
        assert_eq!(validate_pair(&pair, &[]).unwrap(), Some("test_type"));

        let dangling = child.clone().with_required("ghost");
        let pair = InheritancePair { child: &dangling, ..pair };
        assert!(matches!(
            validate_pair(&pair, &[]),
            Err(CompositionError::DanglingRequired { property }) if property == "ghost"
        ));
    }
}
