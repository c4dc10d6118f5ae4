//! Golden Tests for Composition Resolution
//!
//! Loads fixture documents and checks classification, validation and
//! resolution end to end.

use std::path::{Path, PathBuf};

use swagger_composition::graph::diagnostics::DiagnosticCode;
use swagger_composition::graph::{
    load_from_directory, load_from_path, load_from_str, reference_cycles, validate_pair,
    DocumentFormat,
};
use swagger_composition::{
    analyze, classify_all_of, classify_one_of, validate_polymorphic_pair, AnalysisConfig,
    Combinator, CompositionError, Definitions, LoaderConfig, ObjectSchema, PrimitiveKind, Schema,
};

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(name: &str) -> Definitions {
    load_from_path(&fixtures_path().join(name), &LoaderConfig::default()).unwrap()
}

fn string() -> Schema {
    Schema::Primitive(PrimitiveKind::String)
}

fn named_base() -> Schema {
    Schema::structure(
        "Base",
        Schema::Object(
            ObjectSchema::new()
                .with_property("base", string(), true)
                .with_property("test_type", string(), true)
                .with_discriminator("test_type"),
        ),
    )
}

fn inline_child() -> Schema {
    Schema::Object(ObjectSchema::new().with_property("extra", string(), false))
}

/// Checks the base required properties and their declaration
fn assert_base(base: &ObjectSchema, required: &[&str]) {
    assert_eq!(base.properties.len(), required.len());
    assert_eq!(base.required_names(), required);
    for name in required {
        assert!(base.declares(name), "{} is not declared", name);
    }
}

// =============================================================================
// Concrete Scenarios
// =============================================================================

#[test]
fn test_scenario_all_of_child() {
    let defs = load_fixture("swagger_inheritance.json");
    let resolved = defs.resolve("TestAllOfChild").unwrap();

    let pair = classify_all_of(resolved.unwrap_structure()).unwrap();
    assert_eq!(pair.base_name, "TestAllOfBase");
    assert_base(pair.base, &["base", "test_type"]);
    assert_eq!(pair.child.property_names(), vec!["extra"]);
    assert!(pair.child.required.is_empty());

    let discriminator =
        validate_polymorphic_pair(pair.base, Combinator::AllOf, &["base", "test_type"]).unwrap();
    assert_eq!(discriminator, Some("test_type"));
}

#[test]
fn test_scenario_one_of_child() {
    let defs = load_fixture("swagger_inheritance.json");
    let resolved = defs.resolve("TestOneOfChild").unwrap();

    let pair = classify_one_of(resolved.unwrap_structure()).unwrap();
    assert_eq!(pair.combinator, Combinator::OneOf);
    assert_eq!(pair.base_name, "TestOneOfBase");
    assert_base(pair.base, &["base", "test_type"]);
    assert_eq!(pair.child.required_names(), vec!["bar"]);
    assert_eq!(validate_pair(&pair, &[]).unwrap(), Some("test_type"));

    // Same shape, other entry point
    assert!(matches!(
        classify_all_of(resolved.unwrap_structure()),
        Err(CompositionError::NotThisCombinator { .. })
    ));
}

#[test]
fn test_scenario_three_subschemas() {
    let defs = load_fixture("swagger_inheritance.json");
    let resolved = defs.resolve("TestAllOfTriple").unwrap();
    assert!(matches!(
        classify_all_of(resolved.unwrap_structure()),
        Err(CompositionError::WrongSubschemaCount { combinator: Combinator::AllOf, count: 3 })
    ));
}

#[test]
fn test_base_listed_second() {
    let defs = load_fixture("swagger_inheritance.json");
    let resolved = defs.resolve("TestAllOfFoo").unwrap();
    let pair = classify_all_of(resolved.unwrap_structure()).unwrap();
    assert_eq!(pair.base_name, "TestAllOfBase");
    assert_eq!(pair.child.property_names(), vec!["foo", "tags"]);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_role_assignment_is_order_independent() {
    for combinator in [Combinator::AllOf, Combinator::OneOf] {
        let build = |subs: Vec<Schema>| match combinator {
            Combinator::AllOf => Schema::AllOf(subs),
            Combinator::OneOf => Schema::OneOf(subs),
        };
        let forward = build(vec![named_base(), inline_child()]);
        let reversed = build(vec![inline_child(), named_base()]);

        let a = swagger_composition::graph::classify(&forward, combinator).unwrap();
        let b = swagger_composition::graph::classify(&reversed, combinator).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.base_name, "Base");
        assert_eq!(a.child.property_names(), vec!["extra"]);
    }
}

#[test]
fn test_strict_arity() {
    for count in [0usize, 1, 3, 5, 8] {
        let subs: Vec<Schema> = (0..count)
            .map(|i| if i % 2 == 0 { named_base() } else { inline_child() })
            .collect();

        match classify_all_of(&Schema::AllOf(subs.clone())) {
            Err(CompositionError::WrongSubschemaCount { count: found, .. }) => {
                assert_eq!(found, count)
            }
            other => panic!("count {}: expected WrongSubschemaCount, got {:?}", count, other),
        }
        assert!(matches!(
            classify_one_of(&Schema::OneOf(subs)),
            Err(CompositionError::WrongSubschemaCount { .. })
        ));
    }
}

#[test]
fn test_role_exclusivity() {
    assert!(matches!(
        classify_all_of(&Schema::AllOf(vec![inline_child(), inline_child()])),
        Err(CompositionError::MissingBase { .. })
    ));
    assert!(matches!(
        classify_one_of(&Schema::OneOf(vec![named_base(), named_base()])),
        Err(CompositionError::MissingChild { .. })
    ));
}

#[test]
fn test_discriminator_consistency() {
    let not_required = ObjectSchema::new()
        .with_property("test_type", string(), false)
        .with_discriminator("test_type");
    assert!(matches!(
        validate_polymorphic_pair(&not_required, Combinator::OneOf, &[]),
        Err(CompositionError::MissingDiscriminator { property: Some(_) })
    ));

    let undeclared = ObjectSchema::new()
        .with_required("test_type")
        .with_discriminator("test_type");
    assert!(matches!(
        validate_polymorphic_pair(&undeclared, Combinator::OneOf, &[]),
        Err(CompositionError::DanglingRequired { property }) if property == "test_type"
    ));
}

#[test]
fn test_cycles_terminate() {
    let defs = load_fixture("reference_cycles.json");

    match defs.resolve("Self") {
        Err(CompositionError::CyclicReference { chain }) => {
            assert_eq!(chain, vec!["Self", "Self"])
        }
        other => panic!("Expected CyclicReference, got {:?}", other),
    }

    match defs.resolve("RingA") {
        Err(CompositionError::CyclicReference { chain }) => {
            assert_eq!(chain, vec!["RingA", "RingB", "RingC", "RingA"]);
        }
        other => panic!("Expected CyclicReference, got {:?}", other),
    }

    assert!(matches!(
        defs.resolve("Looped"),
        Err(CompositionError::CyclicReference { .. })
    ));

    let groups = reference_cycles(&defs);
    assert_eq!(groups.len(), 3);
}

// =============================================================================
// Documents
// =============================================================================

#[test]
fn test_openapi_document_analysis() {
    let defs = load_fixture("openapi_polymorphism.yaml");
    let report = analyze(&defs, &AnalysisConfig::default());

    assert_eq!(report.checked, 3);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].definition, "Dog");
    assert_eq!(report.outcomes[0].discriminator.as_deref(), Some("pet_type"));

    let codes: Vec<(&str, DiagnosticCode)> = report
        .diagnostics
        .all()
        .iter()
        .map(|d| (d.definition.as_str(), d.code))
        .collect();
    assert_eq!(
        codes,
        vec![
            ("Lizard", DiagnosticCode::MissingDiscriminator),
            ("Spectre", DiagnosticCode::DanglingRequired),
            ("Pet", DiagnosticCode::ReferenceCycleGroup),
        ]
    );
}

#[test]
fn test_untyped_definitions_load_and_bad_ones_are_isolated() {
    let defs = load_fixture("swagger_untyped.json");
    assert!(defs.contains("Labels"));
    assert!(defs.contains("Anything"));

    let report = analyze(&defs, &AnalysisConfig::default());
    assert_eq!(report.checked, 2);

    let accepted: Vec<&str> = report.outcomes.iter().map(|o| o.definition.as_str()).collect();
    assert_eq!(accepted, vec!["Dog"]);
    assert!(report.outcomes[0].child_properties.is_empty());

    let codes: Vec<(&str, DiagnosticCode)> = report
        .diagnostics
        .all()
        .iter()
        .map(|d| (d.definition.as_str(), d.code))
        .collect();
    assert_eq!(
        codes,
        vec![
            ("Nullable", DiagnosticCode::LoadFailure),
            ("Cat", DiagnosticCode::LoadFailure),
        ]
    );
}

#[test]
fn test_structural_cycles_fail_analysis() {
    let defs = load_fixture("reference_cycles.json");
    let report = analyze(&defs, &AnalysisConfig::default());

    let rejected: Vec<(&str, DiagnosticCode)> = report
        .diagnostics
        .all()
        .iter()
        .map(|d| (d.definition.as_str(), d.code))
        .collect();
    assert_eq!(
        rejected,
        vec![
            ("Self", DiagnosticCode::CyclicReference),
            ("RingA", DiagnosticCode::CyclicReference),
            ("RingB", DiagnosticCode::CyclicReference),
            ("RingC", DiagnosticCode::CyclicReference),
            ("Looped", DiagnosticCode::CyclicReference),
        ]
    );
    assert_eq!(report.diagnostics.warning_count(), 0);
    assert!(!report.passed(false));

    let only_self = load_from_str(
        r##"{ "definitions": { "Self": { "$ref": "#/definitions/Self" } } }"##,
        DocumentFormat::Json,
        &LoaderConfig::default(),
    )
    .unwrap();
    assert!(!analyze(&only_self, &AnalysisConfig::default()).passed(false));
}

#[test]
fn test_wide_diamond_analysis() {
    let mut entries = vec![(
        "L0".to_string(),
        Schema::Object(ObjectSchema::new().with_property("id", string(), true)),
    )];
    for i in 1..=48 {
        let below = format!("L{}", i - 1);
        entries.push((
            format!("L{}", i),
            Schema::OneOf(vec![Schema::reference(below.clone()), Schema::reference(below)]),
        ));
    }
    let defs = Definitions::new(entries);

    let report = analyze(&defs, &AnalysisConfig::default());
    assert_eq!(report.checked, 48);
    assert!(report.outcomes.is_empty());
    assert_eq!(report.diagnostics.all()[0].code, DiagnosticCode::MissingChild);
    assert!(report.diagnostics.all()[1..]
        .iter()
        .all(|d| d.code == DiagnosticCode::UnsupportedSubschemaShape));
}

#[test]
fn test_swagger_document_analysis() {
    let defs = load_fixture("swagger_inheritance.json");
    let report = analyze(&defs, &AnalysisConfig::default());

    let accepted: Vec<&str> = report.outcomes.iter().map(|o| o.definition.as_str()).collect();
    assert_eq!(accepted, vec!["TestAllOfChild", "TestAllOfFoo", "TestOneOfChild"]);
    assert_eq!(report.diagnostics.error_count(), 1);
    assert_eq!(report.diagnostics.all()[0].definition, "TestAllOfTriple");
    assert_eq!(report.digest.len(), 64);
}

#[test]
fn test_candidates_restrict_discriminator() {
    let defs = load_fixture("swagger_inheritance.json");
    let config = AnalysisConfig {
        discriminator_candidates: vec!["kind".to_string()],
        ..AnalysisConfig::default()
    };
    let report = analyze(&defs, &config);
    assert!(report.outcomes.is_empty());
    assert!(report
        .diagnostics
        .all()
        .iter()
        .any(|d| d.code == DiagnosticCode::UnexpectedDiscriminator));
}

#[test]
fn test_forward_references_load_lazily() {
    let json = r##"{ "definitions": {
        "Child": { "allOf": [ { "$ref": "#/definitions/Later" }, { "type": "object" } ] },
        "Later": { "type": "object", "properties": { "id": { "type": "integer" } } }
    } }"##;
    let defs = load_from_str(json, DocumentFormat::Json, &LoaderConfig::default()).unwrap();
    let resolved = defs.resolve("Child").unwrap();
    let pair = classify_all_of(resolved.unwrap_structure()).unwrap();
    assert_eq!(pair.base_name, "Later");
}

#[test]
fn test_directory_loading() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(
        fixtures_path().join("swagger_inheritance.json"),
        dir.path().join("a.json"),
    )
    .unwrap();
    std::fs::write(dir.path().join("b.yaml"), "definitions: [1, 2]\n").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    std::fs::create_dir(dir.path().join("node_modules")).unwrap();
    std::fs::write(dir.path().join("node_modules/c.json"), "{}").unwrap();

    let loaded = load_from_directory(dir.path(), &LoaderConfig::default());
    assert_eq!(loaded.len(), 2);
    assert!(loaded[0].0.ends_with("a.json"));
    assert!(loaded[0].1.is_ok());
    assert!(matches!(loaded[1].1, Err(CompositionError::InvalidFormat(_))));
}

#[test]
fn test_concurrent_classification() {
    let defs = load_fixture("swagger_inheritance.json");

    std::thread::scope(|scope| {
        let handles: Vec<_> = ["TestAllOfChild", "TestAllOfFoo", "TestOneOfChild"]
            .into_iter()
            .map(|name| {
                let defs = &defs;
                scope.spawn(move || {
                    let resolved = defs.resolve(name).unwrap();
                    let body = resolved.unwrap_structure();
                    let (combinator, _) = body.composition().unwrap();
                    let pair = swagger_composition::graph::classify(body, combinator).unwrap();
                    pair.base_name.to_string()
                })
            })
            .collect();

        let bases: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(bases, vec!["TestAllOfBase", "TestAllOfBase", "TestOneOfBase"]);
    });
}
