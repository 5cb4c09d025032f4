//! Diagnostics for recoverable resolution failures
//!
//! Every reference the resolver fails to satisfy is recorded here rather
//! than raised as an error. A build therefore always produces a type
//! system; the diagnostics say which parts of it are degraded. The
//! collection is rebuilt from scratch on every compose, so a reference
//! that a later build repairs simply stops producing its record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How severe a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// The component degraded and the type system cannot be persisted
    Error,
    /// Suspicious but not degrading
    Warning,
    /// Informational note
    Info,
}

impl Severity {
    /// Whether this is an error-level record
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Machine-readable code describing which kind of reference failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Declared type of an element or attribute is not defined
    UnresolvedTypeRef,
    /// Base type of a derived type is not defined
    UnresolvedBaseType,
    /// Item or member type of a list/union simple type is not defined
    UnresolvedMemberType,
    /// Particle references a global element that is not defined
    UnresolvedElementRef,
    /// Attribute use references a global attribute that is not defined
    UnresolvedAttributeRef,
    /// Particle references a named model group that is not defined
    UnresolvedModelGroupRef,
    /// Type or attribute group references a named attribute group that is not defined
    UnresolvedAttributeGroupRef,
    /// Substitution group head element is not defined
    UnresolvedSubstitutionHead,
    /// Keyref refers to a key or unique constraint that is not defined
    UnresolvedKeyrefTarget,
    /// Two elements declare identity constraints with the same name
    DuplicateIdentityName,
}

impl DiagnosticCode {
    /// Whether this code reports an unresolved reference
    ///
    /// Only unresolved-family records gate persistence; a name collision
    /// does not.
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            DiagnosticCode::UnresolvedTypeRef
                | DiagnosticCode::UnresolvedBaseType
                | DiagnosticCode::UnresolvedMemberType
                | DiagnosticCode::UnresolvedElementRef
                | DiagnosticCode::UnresolvedAttributeRef
                | DiagnosticCode::UnresolvedModelGroupRef
                | DiagnosticCode::UnresolvedAttributeGroupRef
                | DiagnosticCode::UnresolvedSubstitutionHead
                | DiagnosticCode::UnresolvedKeyrefTarget
        )
    }

    /// Severity this code is reported at
    ///
    /// A missing substitution head only costs the element its group
    /// membership, so it is a note. A constraint name collision keeps
    /// both constraints attached to their elements, so it warns. The
    /// rest degrade the owning component.
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::UnresolvedSubstitutionHead => Severity::Info,
            DiagnosticCode::DuplicateIdentityName => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UnresolvedTypeRef => "unresolved-type-ref",
            DiagnosticCode::UnresolvedBaseType => "unresolved-base-type",
            DiagnosticCode::UnresolvedMemberType => "unresolved-member-type",
            DiagnosticCode::UnresolvedElementRef => "unresolved-element-ref",
            DiagnosticCode::UnresolvedAttributeRef => "unresolved-attribute-ref",
            DiagnosticCode::UnresolvedModelGroupRef => "unresolved-model-group-ref",
            DiagnosticCode::UnresolvedAttributeGroupRef => "unresolved-attribute-group-ref",
            DiagnosticCode::UnresolvedSubstitutionHead => "unresolved-substitution-head",
            DiagnosticCode::UnresolvedKeyrefTarget => "unresolved-keyref-target",
            DiagnosticCode::DuplicateIdentityName => "duplicate-identity-name",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a diagnostic originated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Logical name of the document that supplied the owning component
    pub source_name: String,
    /// Qualified name of the owning component, if it has one
    pub component: Option<String>,
}

impl SourceLocation {
    /// Create a location for a named component in a document
    pub fn new(source_name: impl Into<String>, component: Option<String>) -> Self {
        Self {
            source_name: source_name.into(),
            component,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.component {
            Some(c) => write!(f, "{} ({})", c, self.source_name),
            None => write!(f, "{}", self.source_name),
        }
    }
}

/// A single diagnostic record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the record
    pub severity: Severity,
    /// Machine-readable code
    pub code: DiagnosticCode,
    /// Origin of the failing reference
    pub location: SourceLocation,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic at the code's default severity
    pub fn new(code: DiagnosticCode, location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} at {}",
            self.severity, self.code, self.message, self.location
        )
    }
}

/// Ordered collection of diagnostics from one build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, preserving emission order
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.records.push(diagnostic);
    }

    /// Iterate over records in emission order
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any record reports an unresolved reference
    pub fn has_unresolved(&self) -> bool {
        self.records.iter().any(|d| d.code.is_unresolved())
    }

    /// Number of records reporting unresolved references
    pub fn unresolved_count(&self) -> usize {
        self.records.iter().filter(|d| d.code.is_unresolved()).count()
    }

    /// Records carrying the given code, in emission order
    pub fn by_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(move |d| d.code == code)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(code: DiagnosticCode) -> Diagnostic {
        Diagnostic::new(
            code,
            SourceLocation::new("test.xsd", Some("{http://example.com}t".to_string())),
            "reference could not be resolved",
        )
    }

    #[test]
    fn test_default_severities() {
        assert_eq!(
            DiagnosticCode::UnresolvedTypeRef.default_severity(),
            Severity::Error
        );
        assert_eq!(
            DiagnosticCode::UnresolvedKeyrefTarget.default_severity(),
            Severity::Error
        );
        assert_eq!(
            DiagnosticCode::UnresolvedSubstitutionHead.default_severity(),
            Severity::Info
        );
        assert_eq!(
            DiagnosticCode::DuplicateIdentityName.default_severity(),
            Severity::Warning
        );
    }

    #[test]
    fn test_emission_order_preserved() {
        let mut diags = Diagnostics::new();
        diags.push(sample(DiagnosticCode::UnresolvedAttributeRef));
        diags.push(sample(DiagnosticCode::UnresolvedBaseType));

        let codes: Vec<_> = diags.iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![
                DiagnosticCode::UnresolvedAttributeRef,
                DiagnosticCode::UnresolvedBaseType
            ]
        );
    }

    #[test]
    fn test_has_unresolved() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_unresolved());
        assert!(diags.is_empty());

        diags.push(sample(DiagnosticCode::UnresolvedSubstitutionHead));
        assert!(diags.has_unresolved());
        assert_eq!(diags.unresolved_count(), 1);

        // A collision warning never joins the unresolved family
        diags.push(sample(DiagnosticCode::DuplicateIdentityName));
        assert_eq!(diags.unresolved_count(), 1);
    }

    #[test]
    fn test_by_code_filter() {
        let mut diags = Diagnostics::new();
        diags.push(sample(DiagnosticCode::UnresolvedTypeRef));
        diags.push(sample(DiagnosticCode::UnresolvedAttributeRef));
        diags.push(sample(DiagnosticCode::UnresolvedTypeRef));

        assert_eq!(diags.by_code(DiagnosticCode::UnresolvedTypeRef).count(), 2);
        assert_eq!(diags.by_code(DiagnosticCode::UnresolvedKeyrefTarget).count(), 0);
    }

    #[test]
    fn test_display_format() {
        let d = sample(DiagnosticCode::UnresolvedBaseType);
        let msg = format!("{}", d);
        assert!(msg.contains("[error]"));
        assert!(msg.contains("unresolved-base-type"));
        assert!(msg.contains("test.xsd"));
    }

    #[test]
    fn test_serde_round_trip() {
        let d = sample(DiagnosticCode::UnresolvedElementRef);
        let json = serde_json::to_string(&d).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
