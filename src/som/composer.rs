//! Composition entry points
//!
//! [`compose`] runs one incremental build: it takes an optional base
//! type system and a batch of parsed documents, and produces a new
//! immutable [`SchemaTypeSystem`]. The base is never modified; builds
//! on top of it share component storage until a slot diverges.

use tracing::info;

use crate::documents::ParsedDocument;
use crate::error::Result;
use crate::limits::Limits;
use crate::som::graph::GraphBuilder;
use crate::som::system::SchemaTypeSystem;

/// Default name given to a type system composed without one
const DEFAULT_SYSTEM_NAME: &str = "schema-type-system";

/// Options controlling one composition
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    /// Name for the resulting type system; defaults to the base's name
    pub name: Option<String>,
    /// Limits in force for the build
    pub limits: Limits,
}

impl ComposeOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name of the resulting type system
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the limits for the build
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

/// Compose a type system from documents, on top of an optional base
///
/// Source errors (malformed names, contradictory declarations) and
/// cyclic base-type chains abort the build. References to components
/// no document defines do not: they degrade per the fallback policy
/// and are reported through the result's diagnostics.
pub fn compose(
    base: Option<&SchemaTypeSystem>,
    documents: &[ParsedDocument],
) -> Result<SchemaTypeSystem> {
    compose_with_options(base, documents, ComposeOptions::new())
}

/// Compose with explicit options
pub fn compose_with_options(
    base: Option<&SchemaTypeSystem>,
    documents: &[ParsedDocument],
    options: ComposeOptions,
) -> Result<SchemaTypeSystem> {
    let name = options.name.unwrap_or_else(|| match base {
        Some(base) => base.name().to_string(),
        None => DEFAULT_SYSTEM_NAME.to_string(),
    });
    info!(
        "Composing '{}' from {} documents{}",
        name,
        documents.len(),
        if base.is_some() {
            " (incremental)"
        } else {
            ""
        }
    );

    let mut builder = GraphBuilder::new(
        base.map(|base| (base.arena(), base.table())),
        options.limits.clone(),
    );
    builder.define_documents(documents)?;
    builder.resolve_all()?;
    let system = builder.finish(name);

    info!(
        components = system.component_count(),
        diagnostics = system.diagnostics().len(),
        fully_resolved = system.is_fully_resolved(),
        "composition finished"
    );
    Ok(system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{RawComplexType, RawElement};
    use crate::namespaces::QName;

    #[test]
    fn test_compose_empty_batch() {
        let sts = compose(None, &[]).unwrap();
        assert!(sts.is_fully_resolved());
        assert_eq!(sts.name(), DEFAULT_SYSTEM_NAME);
        assert_eq!(sts.type_count(), 0);
        assert_eq!(sts.element_count(), 0);
    }

    #[test]
    fn test_compose_inherits_base_name() {
        let base = compose_with_options(None, &[], ComposeOptions::new().with_name("orders"))
            .unwrap();
        assert_eq!(base.name(), "orders");

        let doc = ParsedDocument::named("a.xsd").with_component(RawComplexType::new("T"));
        let next = compose(Some(&base), &[doc]).unwrap();
        assert_eq!(next.name(), "orders");
        assert_eq!(next.type_count(), 1);
    }

    #[test]
    fn test_compose_carries_base_components_forward() {
        let doc_a = ParsedDocument::named("a.xsd").with_component(RawComplexType::new("T"));
        let base = compose(None, &[doc_a]).unwrap();

        let doc_b = ParsedDocument::named("b.xsd")
            .with_component(RawElement::new("root").with_type(QName::local("T")));
        let next = compose(Some(&base), &[doc_b]).unwrap();

        assert!(next.is_fully_resolved());
        assert_eq!(next.type_count(), 1);
        assert_eq!(next.element_count(), 1);
        // The base is untouched.
        assert_eq!(base.element_count(), 0);
    }

    #[test]
    fn test_strict_limits_reject_large_batches() {
        let limits = Limits::strict();
        let documents: Vec<ParsedDocument> = (0..200)
            .map(|i| ParsedDocument::named(format!("doc{}.xsd", i)))
            .collect();
        let result =
            compose_with_options(None, &documents, ComposeOptions::new().with_limits(limits));
        assert!(result.is_err());
    }
}
