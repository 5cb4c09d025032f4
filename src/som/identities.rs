//! Identity constraints (key, unique, keyref)

use std::fmt;

use super::base::{ComponentRef, RefKind};
use crate::namespaces::QName;

/// Kind of identity constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityKind {
    /// Values must be unique and present
    Key,
    /// Values must be unique when present
    Unique,
    /// Values must match a referenced key or unique constraint
    KeyRef,
}

impl IdentityKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::Key => "key",
            IdentityKind::Unique => "unique",
            IdentityKind::KeyRef => "keyref",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An identity constraint scoped to an element declaration
///
/// Selector and field XPath expressions are carried verbatim; this engine
/// records them but does not evaluate them.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityConstraintDef {
    /// Qualified name of the constraint
    pub name: QName,
    /// Logical name of the supplying document
    pub source_name: String,
    /// Kind of constraint
    pub kind: IdentityKind,
    /// Selector XPath expression
    pub selector: String,
    /// Field XPath expressions, in declaration order
    pub fields: Vec<String>,
    /// Referenced key or unique constraint; only present for keyrefs
    pub refer: Option<ComponentRef>,
}

impl IdentityConstraintDef {
    /// Create a key constraint
    pub fn key(
        name: QName,
        source_name: impl Into<String>,
        selector: impl Into<String>,
        fields: Vec<String>,
    ) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            kind: IdentityKind::Key,
            selector: selector.into(),
            fields,
            refer: None,
        }
    }

    /// Create a unique constraint
    pub fn unique(
        name: QName,
        source_name: impl Into<String>,
        selector: impl Into<String>,
        fields: Vec<String>,
    ) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            kind: IdentityKind::Unique,
            selector: selector.into(),
            fields,
            refer: None,
        }
    }

    /// Create a keyref constraint referring to a key or unique
    pub fn keyref(
        name: QName,
        source_name: impl Into<String>,
        selector: impl Into<String>,
        fields: Vec<String>,
        refer: ComponentRef,
    ) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            kind: IdentityKind::KeyRef,
            selector: selector.into(),
            fields,
            refer: Some(refer),
        }
    }

    /// Whether this constraint is a keyref
    pub fn is_keyref(&self) -> bool {
        matches!(self.kind, IdentityKind::KeyRef)
    }

    /// Whether a keyref lost its target and is dropped from query results
    ///
    /// Only an attempted and failed target drops the keyref; a pending
    /// one has simply not been resolved yet.
    pub fn is_dropped(&self) -> bool {
        match &self.refer {
            Some(refer) => self.is_keyref() && refer.target.is_failed(),
            None => false,
        }
    }

    /// Visit every reference this constraint directly holds
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        if let Some(refer) = &self.refer {
            f(RefKind::KeyrefTarget, refer);
        }
    }

    /// Mutable counterpart of [`IdentityConstraintDef::for_each_ref`]; same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        if let Some(refer) = &mut self.refer {
            f(RefKind::KeyrefTarget, refer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::som::base::{ComponentId, ResolvedTo};

    #[test]
    fn test_key_has_no_refs() {
        let key = IdentityConstraintDef::key(
            QName::local("pk"),
            "doc.xsd",
            ".//row",
            vec!["@id".to_string()],
        );
        assert_eq!(key.kind, IdentityKind::Key);
        assert!(!key.is_keyref());
        assert!(!key.is_dropped());

        let mut count = 0;
        key.for_each_ref(&mut |_, _| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_keyref_walks_target() {
        let keyref = IdentityConstraintDef::keyref(
            QName::local("fk"),
            "doc.xsd",
            ".//entry",
            vec!["@ref".to_string()],
            ComponentRef::named(QName::local("pk")),
        );

        let mut kinds = Vec::new();
        keyref.for_each_ref(&mut |k, _| kinds.push(k));
        assert_eq!(kinds, vec![RefKind::KeyrefTarget]);
    }

    #[test]
    fn test_keyref_dropped_when_target_missing() {
        let mut keyref = IdentityConstraintDef::keyref(
            QName::local("fk"),
            "doc.xsd",
            ".//entry",
            vec!["@ref".to_string()],
            ComponentRef::named(QName::local("pk")),
        );
        assert!(!keyref.is_dropped());

        if let Some(refer) = &mut keyref.refer {
            refer.target = ResolvedTo::Unresolved;
        }
        assert!(keyref.is_dropped());

        if let Some(refer) = &mut keyref.refer {
            refer.target = ResolvedTo::Component(ComponentId::new(4));
        }
        assert!(!keyref.is_dropped());
    }
}
