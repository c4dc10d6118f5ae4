//! Diagnostics
//!
//! Turns typed composition errors into coded, per-definition report items.
//! The library never prints; the binary (or any other reporter) renders these.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{DefinitionName, Definitions};
use crate::error::CompositionError;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Stable code for each violated rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // === Resolution ===
    UnknownReference,
    CyclicReference,

    // === Classification ===
    NotThisCombinator,
    WrongSubschemaCount,
    UnsupportedSubschemaShape,
    MissingBase,
    MissingChild,

    // === Polymorphism ===
    MissingDiscriminator,
    DanglingRequired,
    UnexpectedDiscriminator,

    // === Document ===
    /// Reference cycle group found by whole-document analysis
    ReferenceCycleGroup,
    /// Document could not be read
    LoadFailure,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownReference => "C001",
            Self::CyclicReference => "C002",
            Self::NotThisCombinator => "C003",
            Self::WrongSubschemaCount => "C004",
            Self::UnsupportedSubschemaShape => "C005",
            Self::MissingBase => "C006",
            Self::MissingChild => "C007",
            Self::MissingDiscriminator => "C008",
            Self::DanglingRequired => "C009",
            Self::UnexpectedDiscriminator => "C010",
            Self::ReferenceCycleGroup => "W001",
            Self::LoadFailure => "E001",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::ReferenceCycleGroup => Severity::Warning,

            Self::UnknownReference
            | Self::CyclicReference
            | Self::NotThisCombinator
            | Self::WrongSubschemaCount
            | Self::UnsupportedSubschemaShape
            | Self::MissingBase
            | Self::MissingChild
            | Self::MissingDiscriminator
            | Self::DanglingRequired
            | Self::UnexpectedDiscriminator
            | Self::LoadFailure => Severity::Error,
        }
    }

    /// Code for a typed error
    pub fn for_error(error: &CompositionError) -> Self {
        match error {
            CompositionError::UnknownReference { .. } => Self::UnknownReference,
            CompositionError::CyclicReference { .. } => Self::CyclicReference,
            CompositionError::NotThisCombinator { .. } => Self::NotThisCombinator,
            CompositionError::WrongSubschemaCount { .. } => Self::WrongSubschemaCount,
            CompositionError::UnsupportedSubschemaShape { .. } => Self::UnsupportedSubschemaShape,
            CompositionError::MissingBase { .. } => Self::MissingBase,
            CompositionError::MissingChild { .. } => Self::MissingChild,
            CompositionError::MissingDiscriminator { .. } => Self::MissingDiscriminator,
            CompositionError::DanglingRequired { .. } => Self::DanglingRequired,
            CompositionError::UnexpectedDiscriminator { .. } => Self::UnexpectedDiscriminator,
            CompositionError::InvalidFormat(_)
            | CompositionError::InvalidReference { .. }
            | CompositionError::EmptyComposition { .. }
            | CompositionError::InvalidDefinition { .. }
            | CompositionError::Io(_)
            | CompositionError::Json(_)
            | CompositionError::Yaml(_) => Self::LoadFailure,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Definition the diagnostic is about
    pub definition: DefinitionName,
    pub code: DiagnosticCode,
    pub message: String,
    /// Additional context (hints, cycle members)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(
        definition: impl Into<DefinitionName>,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            definition: definition.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn from_error(definition: impl Into<DefinitionName>, error: &CompositionError) -> Self {
        Self::new(definition, DiagnosticCode::for_error(error), error.to_string())
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.definition
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

/// Collection of diagnostics from one analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: DiagnosticItem) {
        self.items.push(item);
    }

    /// Record a rejected definition, adding a hint for unknown references
    pub fn rejected(
        &mut self,
        definition: &str,
        error: &CompositionError,
        definitions: &Definitions,
    ) {
        let mut item = DiagnosticItem::from_error(definition, error);
        if let CompositionError::UnknownReference { name } = error {
            if let Some(hint) = closest_name(name, definitions) {
                item = item.with_context(format!("did you mean '{}'?", hint));
            }
        }
        self.push(item);
    }

    /// Record a group of definitions that reference each other in a ring
    pub fn reference_cycle(&mut self, members: &[DefinitionName]) {
        let Some(first) = members.first() else {
            return;
        };
        self.push(
            DiagnosticItem::new(
                first.clone(),
                DiagnosticCode::ReferenceCycleGroup,
                format!("{} definitions reference each other", members.len()),
            )
            .with_context(format!("Members: {}", members.join(", "))),
        );
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|i| i.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if self.has_errors() {
            output.push_str(&format!(
                "\n{} error(s), {} warning(s)\n",
                self.error_count(),
                self.warning_count()
            ));
        } else if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticItem;
    type IntoIter = std::vec::IntoIter<DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Best fuzzy match for `query` among the definition names
fn closest_name<'a>(query: &str, definitions: &'a Definitions) -> Option<&'a str> {
    let matcher = SkimMatcherV2::default();
    definitions
        .names()
        .filter_map(|name| {
            matcher
                .fuzzy_match(name, query)
                .or_else(|| matcher.fuzzy_match(query, name))
                .map(|score| (score, name))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, name)| name.as_str())
}
