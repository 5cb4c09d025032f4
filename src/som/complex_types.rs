//! Complex type definitions

use super::attributes::AttributeUse;
use super::base::{ComponentRef, DerivationKind, RefKind};
use super::particles::ModelGroup;
use crate::namespaces::QName;

/// How a complex type relates to its base type
#[derive(Debug, Clone, PartialEq)]
pub enum ComplexDerivation {
    /// Not derived from a declared base (built-ins and plain types)
    None,
    /// Extension of a base type
    Extension {
        /// The extended base type
        base: ComponentRef,
    },
    /// Restriction of a base type
    Restriction {
        /// The restricted base type
        base: ComponentRef,
    },
}

/// A complex type definition
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexTypeDef {
    /// Qualified name; None for anonymous inline types
    pub name: Option<QName>,
    /// Logical name of the supplying document
    pub source_name: String,
    /// Derivation from a base type, if declared
    pub derivation: ComplexDerivation,
    /// Content model rooted at a compositor group
    pub content: ModelGroup,
    /// Whether character content may mix with child elements
    pub mixed: bool,
    /// Attribute uses declared directly on the type
    pub attribute_uses: Vec<AttributeUse>,
    /// Attribute group references declared on the type
    pub attribute_groups: Vec<ComponentRef>,
}

impl ComplexTypeDef {
    /// Create a complex type with empty content and no derivation
    pub fn new(name: Option<QName>, source_name: impl Into<String>) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            derivation: ComplexDerivation::None,
            content: ModelGroup::empty(),
            mixed: false,
            attribute_uses: Vec::new(),
            attribute_groups: Vec::new(),
        }
    }

    /// Create an extension of the given base type
    pub fn extension(
        name: Option<QName>,
        source_name: impl Into<String>,
        base: ComponentRef,
    ) -> Self {
        let mut def = Self::new(name, source_name);
        def.derivation = ComplexDerivation::Extension { base };
        def
    }

    /// Create a restriction of the given base type
    pub fn restriction(
        name: Option<QName>,
        source_name: impl Into<String>,
        base: ComponentRef,
    ) -> Self {
        let mut def = Self::new(name, source_name);
        def.derivation = ComplexDerivation::Restriction { base };
        def
    }

    /// Set the content model
    pub fn with_content(mut self, content: ModelGroup) -> Self {
        self.content = content;
        self
    }

    /// Set mixed content
    pub fn with_mixed(mut self, mixed: bool) -> Self {
        self.mixed = mixed;
        self
    }

    /// Add an attribute use
    pub fn with_use(mut self, attribute_use: AttributeUse) -> Self {
        self.attribute_uses.push(attribute_use);
        self
    }

    /// Add an attribute group reference
    pub fn with_group(mut self, reference: ComponentRef) -> Self {
        self.attribute_groups.push(reference);
        self
    }

    /// Whether the type declares a base type
    pub fn is_derived(&self) -> bool {
        !matches!(self.derivation, ComplexDerivation::None)
    }

    /// Derivation kind of this type
    pub fn derivation_kind(&self) -> DerivationKind {
        match self.derivation {
            ComplexDerivation::None => DerivationKind::None,
            ComplexDerivation::Extension { .. } => DerivationKind::Extension,
            ComplexDerivation::Restriction { .. } => DerivationKind::Restriction,
        }
    }

    /// Base type reference, if the type is derived
    pub fn base_ref(&self) -> Option<&ComponentRef> {
        match &self.derivation {
            ComplexDerivation::None => None,
            ComplexDerivation::Extension { base } | ComplexDerivation::Restriction { base } => {
                Some(base)
            }
        }
    }

    /// Whether the content model admits no children
    pub fn has_empty_content(&self) -> bool {
        self.content.is_empty()
    }

    /// Visit every reference this type directly holds: base first, then
    /// content model, then attribute uses, then attribute groups
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        match &self.derivation {
            ComplexDerivation::None => {}
            ComplexDerivation::Extension { base } | ComplexDerivation::Restriction { base } => {
                f(RefKind::BaseType, base)
            }
        }
        self.content.for_each_ref(f);
        for attribute_use in &self.attribute_uses {
            attribute_use.for_each_ref(f);
        }
        for group in &self.attribute_groups {
            f(RefKind::AttributeGroupRef, group);
        }
    }

    /// Mutable counterpart of [`ComplexTypeDef::for_each_ref`]; same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        match &mut self.derivation {
            ComplexDerivation::None => {}
            ComplexDerivation::Extension { base } | ComplexDerivation::Restriction { base } => {
                f(RefKind::BaseType, base)
            }
        }
        self.content.for_each_ref_mut(f);
        for attribute_use in &mut self.attribute_uses {
            attribute_use.for_each_ref_mut(f);
        }
        for group in &mut self.attribute_groups {
            f(RefKind::AttributeGroupRef, group);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::som::particles::{Compositor, ElementParticle, Particle};

    fn xs(name: &str) -> QName {
        QName::namespaced("http://www.w3.org/2001/XMLSchema", name)
    }

    #[test]
    fn test_plain_type_has_no_base() {
        let t = ComplexTypeDef::new(Some(QName::local("plain")), "doc.xsd");
        assert!(!t.is_derived());
        assert_eq!(t.derivation_kind(), DerivationKind::None);
        assert!(t.base_ref().is_none());
        assert!(t.has_empty_content());
    }

    #[test]
    fn test_walk_order_base_content_attrs_groups() {
        let t = ComplexTypeDef::extension(
            Some(QName::local("derived")),
            "doc.xsd",
            ComponentRef::named(QName::local("base")),
        )
        .with_content(ModelGroup::new(
            Compositor::Sequence,
            vec![Particle::Element(ElementParticle::new(
                QName::local("child"),
                ComponentRef::named(xs("string")),
            ))],
        ))
        .with_use(AttributeUse::reference(ComponentRef::named(QName::local(
            "attr",
        ))))
        .with_group(ComponentRef::named(QName::local("attrs")));

        let mut kinds = Vec::new();
        t.for_each_ref(&mut |k, _| kinds.push(k));
        assert_eq!(
            kinds,
            vec![
                RefKind::BaseType,
                RefKind::ElementType,
                RefKind::AttributeRef,
                RefKind::AttributeGroupRef
            ]
        );
    }

    #[test]
    fn test_derivation_kinds() {
        let base = || ComponentRef::named(QName::local("b"));
        let ext = ComplexTypeDef::extension(None, "doc.xsd", base());
        let res = ComplexTypeDef::restriction(None, "doc.xsd", base());
        assert_eq!(ext.derivation_kind(), DerivationKind::Extension);
        assert_eq!(res.derivation_kind(), DerivationKind::Restriction);
        assert!(ext.base_ref().is_some());
        assert!(res.is_derived());
    }
}
