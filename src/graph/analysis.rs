//! Document Analysis
//!
//! Runs resolve -> classify -> validate over every composed definition of a
//! document, and resolves every alias so structural cycles are caught. A
//! failing definition is reported with its name and skipped; the remaining
//! definitions are still checked. Definitions the loader could not read are
//! reported the same way. Reference cycle groups (SCCs over all reference
//! edges) that resolution did not already reject, such as a tree node
//! holding its children, are reported as warnings.

use petgraph::algo::kosaraju_scc;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::classify::classify;
use super::diagnostics::{DiagnosticItem, Diagnostics};
use super::discriminator::validate_pair;
use super::resolve::Resolver;
use super::{DefinitionName, Definitions};
use crate::config::AnalysisConfig;
use crate::error::{CompositionError, Result};
use crate::schema::{Combinator, Schema};

// =============================================================================
// Outcomes
// =============================================================================

/// An accepted inheritance definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefinitionOutcome {
    pub definition: DefinitionName,
    pub combinator: Combinator,
    pub base: DefinitionName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    pub base_required: Vec<String>,
    pub child_properties: Vec<String>,
}

/// Result of analysing one document
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// Digest of the analysed document
    pub digest: String,
    /// Number of composed definitions examined
    pub checked: usize,
    pub outcomes: Vec<DefinitionOutcome>,
    pub diagnostics: Diagnostics,
}

impl AnalysisReport {
    /// Report for a document that could not be loaded
    pub fn load_failure(source: &str, error: &CompositionError) -> Self {
        let mut report = Self::default();
        report.diagnostics.push(DiagnosticItem::from_error(source, error));
        report
    }

    pub fn passed(&self, fail_on_warnings: bool) -> bool {
        !self.diagnostics.has_errors()
            && !(fail_on_warnings && self.diagnostics.warning_count() > 0)
    }
}

// =============================================================================
// Analysis
// =============================================================================

/// Check every `allOf`/`oneOf` definition of a document
pub fn analyze(definitions: &Definitions, config: &AnalysisConfig) -> AnalysisReport {
    let resolver = definitions.resolver();
    let candidates = config.candidates();
    let mut report = AnalysisReport {
        digest: definitions.digest.clone(),
        ..AnalysisReport::default()
    };

    for (name, reason) in definitions.invalid() {
        let error = CompositionError::InvalidDefinition {
            name: name.clone(),
            reason: reason.to_string(),
        };
        report.diagnostics.push(DiagnosticItem::from_error(name.as_str(), &error));
    }

    let mut cyclic: HashSet<String> = HashSet::new();
    for (name, schema) in definitions.iter() {
        let checked = match schema {
            Schema::AllOf(_) | Schema::OneOf(_) => {
                report.checked += 1;
                check_definition(&resolver, name, &candidates).map(Some)
            }
            // Aliases carry no inheritance but must resolve
            Schema::Reference(_) => resolver.resolve(name).map(|_| None),
            Schema::Primitive(_) | Schema::Array(_) | Schema::Object(_) | Schema::Structure(_) => {
                continue
            }
        };

        match checked {
            Ok(Some(outcome)) => {
                debug!(
                    definition = %name,
                    base = %outcome.base,
                    combinator = %outcome.combinator,
                    "inheritance accepted"
                );
                report.outcomes.push(outcome);
            }
            Ok(None) => debug!(definition = %name, "alias resolved"),
            Err(e) => {
                if let CompositionError::CyclicReference { chain } = &e {
                    cyclic.extend(chain.iter().cloned());
                }
                warn!(definition = %name, error = %e, "definition rejected");
                report.diagnostics.rejected(name, &e, definitions);
            }
        }
    }

    if config.report_cycles {
        for group in reference_cycles(definitions) {
            // Already rejected as a structural cycle
            if group.iter().any(|member| cyclic.contains(member)) {
                continue;
            }
            report.diagnostics.reference_cycle(&group);
        }
    }

    report
}

/// Resolve, classify and validate a single definition
pub fn check_definition(
    resolver: &Resolver<'_>,
    name: &str,
    candidates: &[&str],
) -> Result<DefinitionOutcome> {
    let resolved = resolver.resolve(name)?;
    let body = resolved.unwrap_structure();

    let Some((combinator, _)) = body.composition() else {
        // Only composed definitions carry inheritance
        return Err(CompositionError::NotThisCombinator {
            expected: Combinator::AllOf,
            found: body.kind(),
        });
    };

    let pair = classify(body, combinator)?;
    let discriminator = validate_pair(&pair, candidates)?;

    Ok(DefinitionOutcome {
        definition: name.to_string(),
        combinator,
        base: pair.base_name.to_string(),
        discriminator: discriminator.map(String::from),
        base_required: pair.base.required.iter().cloned().collect(),
        child_properties: pair.child.properties.keys().cloned().collect(),
    })
}

/// Groups of definitions that reference each other, in document order
///
/// Includes self references. References to unknown names are ignored here;
/// resolution reports them.
pub fn reference_cycles(definitions: &Definitions) -> Vec<Vec<DefinitionName>> {
    let order: HashMap<&str, usize> = definitions
        .names()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut graph = DiGraphMap::<&str, ()>::new();
    for (name, schema) in definitions.iter() {
        graph.add_node(name.as_str());
        for target in schema.references() {
            if order.contains_key(target) {
                graph.add_edge(name.as_str(), target, ());
            }
        }
    }

    let mut groups: Vec<Vec<DefinitionName>> = kosaraju_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|mut scc| {
            scc.sort_by_key(|name| order[name]);
            scc.into_iter().map(String::from).collect()
        })
        .collect();

    groups.sort_by_key(|group| order[group[0].as_str()]);
    groups
}
