//! Parsed document descriptors
//!
//! A source provider hands the composer [`ParsedDocument`] values: flat,
//! namespace-resolved descriptions of the global components one schema
//! document declares. Descriptors reference other components purely by
//! qualified name and say nothing about whether those names exist; the
//! resolution passes decide that later.
//!
//! All types here are plain builders. Nothing validates across
//! components at construction time, and a descriptor may reference a
//! component no document ever supplies.

use crate::namespaces::QName;
use crate::som::identities::IdentityKind;
use crate::som::particles::Occurs;

/// One schema document, reduced to its global component declarations
///
/// The `name` identifies the document across builds: re-supplying a
/// document with the same name replaces everything the earlier version
/// contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    /// Logical name of the document (stable across revisions)
    pub name: String,
    /// Target namespace of all components declared in the document
    pub target_namespace: Option<String>,
    /// Global component declarations in document order
    pub components: Vec<RawComponent>,
}

impl ParsedDocument {
    /// Create an empty document with the given logical name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_namespace: None,
            components: Vec::new(),
        }
    }

    /// Set the target namespace
    pub fn with_target_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.target_namespace = Some(namespace.into());
        self
    }

    /// Add a global component declaration
    pub fn with_component(mut self, component: impl Into<RawComponent>) -> Self {
        self.components.push(component.into());
        self
    }

    /// Number of global component declarations
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Qualified name a local name gets in this document
    pub fn qualify(&self, local_name: impl Into<String>) -> QName {
        QName::new(self.target_namespace.as_deref(), local_name)
    }
}

/// A global component declaration inside a document
#[derive(Debug, Clone, PartialEq)]
pub enum RawComponent {
    /// Global simple type definition
    SimpleType(RawSimpleType),
    /// Global complex type definition
    ComplexType(RawComplexType),
    /// Global element declaration
    Element(RawElement),
    /// Global attribute declaration
    Attribute(RawAttribute),
    /// Named model group definition
    ModelGroup(RawModelGroup),
    /// Named attribute group definition
    AttributeGroup(RawAttributeGroup),
    /// Notation declaration
    Notation(RawNotation),
}

impl From<RawSimpleType> for RawComponent {
    fn from(value: RawSimpleType) -> Self {
        RawComponent::SimpleType(value)
    }
}

impl From<RawComplexType> for RawComponent {
    fn from(value: RawComplexType) -> Self {
        RawComponent::ComplexType(value)
    }
}

impl From<RawElement> for RawComponent {
    fn from(value: RawElement) -> Self {
        RawComponent::Element(value)
    }
}

impl From<RawAttribute> for RawComponent {
    fn from(value: RawAttribute) -> Self {
        RawComponent::Attribute(value)
    }
}

impl From<RawModelGroup> for RawComponent {
    fn from(value: RawModelGroup) -> Self {
        RawComponent::ModelGroup(value)
    }
}

impl From<RawAttributeGroup> for RawComponent {
    fn from(value: RawAttributeGroup) -> Self {
        RawComponent::AttributeGroup(value)
    }
}

impl From<RawNotation> for RawComponent {
    fn from(value: RawNotation) -> Self {
        RawComponent::Notation(value)
    }
}

// ========== Types ==========

/// Declared type of an element: a name, or an anonymous inline type
#[derive(Debug, Clone, PartialEq)]
pub enum RawTypeRef {
    /// Reference to a named type
    Named(QName),
    /// Anonymous inline simple type
    InlineSimple(Box<RawSimpleType>),
    /// Anonymous inline complex type
    InlineComplex(Box<RawComplexType>),
}

impl From<QName> for RawTypeRef {
    fn from(value: QName) -> Self {
        RawTypeRef::Named(value)
    }
}

/// A simple type declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RawSimpleType {
    /// Local name; None when the type appears inline
    pub name: Option<String>,
    /// How the type is constructed
    pub derivation: RawSimpleDerivation,
}

/// Construction of a raw simple type
#[derive(Debug, Clone, PartialEq)]
pub enum RawSimpleDerivation {
    /// Restriction of a named base type
    Restriction {
        /// The base type name
        base: QName,
    },
    /// List over a named item type
    List {
        /// The item type name
        item: QName,
    },
    /// Union over named member types
    Union {
        /// The member type names, in declaration order
        members: Vec<QName>,
    },
}

impl RawSimpleType {
    /// Named restriction of a base type
    pub fn restriction(name: impl Into<String>, base: QName) -> Self {
        Self {
            name: Some(name.into()),
            derivation: RawSimpleDerivation::Restriction { base },
        }
    }

    /// Named list over an item type
    pub fn list(name: impl Into<String>, item: QName) -> Self {
        Self {
            name: Some(name.into()),
            derivation: RawSimpleDerivation::List { item },
        }
    }

    /// Named union over member types
    pub fn union(name: impl Into<String>, members: Vec<QName>) -> Self {
        Self {
            name: Some(name.into()),
            derivation: RawSimpleDerivation::Union { members },
        }
    }

    /// Anonymous restriction for inline use
    pub fn anonymous_restriction(base: QName) -> Self {
        Self {
            name: None,
            derivation: RawSimpleDerivation::Restriction { base },
        }
    }

    /// Anonymous list for inline use
    pub fn anonymous_list(item: QName) -> Self {
        Self {
            name: None,
            derivation: RawSimpleDerivation::List { item },
        }
    }
}

/// How a raw complex type derives from a base
#[derive(Debug, Clone, PartialEq)]
pub enum RawComplexDerivation {
    /// No declared base
    None,
    /// Extension of a named base type
    Extension {
        /// The base type name
        base: QName,
    },
    /// Restriction of a named base type
    Restriction {
        /// The base type name
        base: QName,
    },
}

/// A complex type declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RawComplexType {
    /// Local name; None when the type appears inline
    pub name: Option<String>,
    /// Derivation from a base type
    pub derivation: RawComplexDerivation,
    /// Content model; an empty sequence means empty content
    pub content: RawParticle,
    /// Whether character content may mix with child elements
    pub mixed: bool,
    /// Attribute uses declared on the type
    pub attributes: Vec<RawAttributeUse>,
    /// Attribute group references declared on the type
    pub attribute_groups: Vec<QName>,
}

impl RawComplexType {
    /// Named complex type with empty content
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            derivation: RawComplexDerivation::None,
            content: RawParticle::sequence(Vec::new()),
            mixed: false,
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
        }
    }

    /// Anonymous complex type for inline use
    pub fn anonymous() -> Self {
        Self {
            name: None,
            derivation: RawComplexDerivation::None,
            content: RawParticle::sequence(Vec::new()),
            mixed: false,
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
        }
    }

    /// Derive by extension from the named base
    pub fn extending(mut self, base: QName) -> Self {
        self.derivation = RawComplexDerivation::Extension { base };
        self
    }

    /// Derive by restriction from the named base
    pub fn restricting(mut self, base: QName) -> Self {
        self.derivation = RawComplexDerivation::Restriction { base };
        self
    }

    /// Set the content model
    pub fn with_content(mut self, content: RawParticle) -> Self {
        self.content = content;
        self
    }

    /// Set mixed content
    pub fn with_mixed(mut self, mixed: bool) -> Self {
        self.mixed = mixed;
        self
    }

    /// Add an attribute use
    pub fn with_attribute(mut self, attribute: RawAttributeUse) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add an attribute group reference
    pub fn with_attribute_group(mut self, group: QName) -> Self {
        self.attribute_groups.push(group);
        self
    }
}

// ========== Particles ==========

/// One node of a raw content model tree
#[derive(Debug, Clone, PartialEq)]
pub enum RawParticle {
    /// Ordered sequence of particles
    Sequence {
        /// Child particles
        particles: Vec<RawParticle>,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Exactly one of the particles
    Choice {
        /// Child particles
        particles: Vec<RawParticle>,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// All particles in any order
    All {
        /// Child particles
        particles: Vec<RawParticle>,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Local element declaration
    Element {
        /// Local name of the element
        name: String,
        /// Declared type; None defaults to the universal type
        type_ref: Option<RawTypeRef>,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Reference to a global element
    ElementRef {
        /// Name of the referenced element
        reference: QName,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Reference to a named model group
    GroupRef {
        /// Name of the referenced group
        reference: QName,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Wildcard accepting any element
    Wildcard {
        /// Occurrence bounds
        occurs: Occurs,
    },
}

impl RawParticle {
    /// Sequence of particles occurring once
    pub fn sequence(particles: Vec<RawParticle>) -> Self {
        RawParticle::Sequence {
            particles,
            occurs: Occurs::once(),
        }
    }

    /// Choice of particles occurring once
    pub fn choice(particles: Vec<RawParticle>) -> Self {
        RawParticle::Choice {
            particles,
            occurs: Occurs::once(),
        }
    }

    /// All-group of particles occurring once
    pub fn all(particles: Vec<RawParticle>) -> Self {
        RawParticle::All {
            particles,
            occurs: Occurs::once(),
        }
    }

    /// Local element with a named type
    pub fn element(name: impl Into<String>, type_name: QName) -> Self {
        RawParticle::Element {
            name: name.into(),
            type_ref: Some(RawTypeRef::Named(type_name)),
            occurs: Occurs::once(),
        }
    }

    /// Local element with an inline or defaulted type
    pub fn element_of(name: impl Into<String>, type_ref: Option<RawTypeRef>) -> Self {
        RawParticle::Element {
            name: name.into(),
            type_ref,
            occurs: Occurs::once(),
        }
    }

    /// Reference to a global element
    pub fn element_ref(reference: QName) -> Self {
        RawParticle::ElementRef {
            reference,
            occurs: Occurs::once(),
        }
    }

    /// Reference to a named model group
    pub fn group_ref(reference: QName) -> Self {
        RawParticle::GroupRef {
            reference,
            occurs: Occurs::once(),
        }
    }

    /// Wildcard occurring once
    pub fn wildcard() -> Self {
        RawParticle::Wildcard {
            occurs: Occurs::once(),
        }
    }

    /// Replace the occurrence bounds
    pub fn with_occurs(mut self, new_occurs: Occurs) -> Self {
        match &mut self {
            RawParticle::Sequence { occurs, .. }
            | RawParticle::Choice { occurs, .. }
            | RawParticle::All { occurs, .. }
            | RawParticle::Element { occurs, .. }
            | RawParticle::ElementRef { occurs, .. }
            | RawParticle::GroupRef { occurs, .. }
            | RawParticle::Wildcard { occurs } => *occurs = new_occurs,
        }
        self
    }

    /// Nesting depth of the particle tree
    pub fn depth(&self) -> usize {
        match self {
            RawParticle::Sequence { particles, .. }
            | RawParticle::Choice { particles, .. }
            | RawParticle::All { particles, .. } => {
                1 + particles.iter().map(RawParticle::depth).max().unwrap_or(0)
            }
            _ => 1,
        }
    }

    /// Whether this node is a compositor
    pub fn is_compositor(&self) -> bool {
        matches!(
            self,
            RawParticle::Sequence { .. } | RawParticle::Choice { .. } | RawParticle::All { .. }
        )
    }
}

// ========== Elements ==========

/// A global element declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    /// Local name of the element
    pub name: String,
    /// Declared type; None defaults to the universal type
    pub type_ref: Option<RawTypeRef>,
    /// Substitution group head, if membership is declared
    pub substitution_group: Option<QName>,
    /// Whether instances may carry xsi:nil
    pub nillable: bool,
    /// Whether the element is abstract
    pub abstract_element: bool,
    /// Identity constraints declared inside the element
    pub constraints: Vec<RawIdentityConstraint>,
}

impl RawElement {
    /// Element without a declared type (defaults to the universal type)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: None,
            substitution_group: None,
            nillable: false,
            abstract_element: false,
            constraints: Vec::new(),
        }
    }

    /// Set a named declared type
    pub fn with_type(mut self, type_name: QName) -> Self {
        self.type_ref = Some(RawTypeRef::Named(type_name));
        self
    }

    /// Set an anonymous inline simple type
    pub fn with_inline_simple_type(mut self, simple_type: RawSimpleType) -> Self {
        self.type_ref = Some(RawTypeRef::InlineSimple(Box::new(simple_type)));
        self
    }

    /// Set an anonymous inline complex type
    pub fn with_inline_complex_type(mut self, complex_type: RawComplexType) -> Self {
        self.type_ref = Some(RawTypeRef::InlineComplex(Box::new(complex_type)));
        self
    }

    /// Declare membership in a substitution group
    pub fn with_substitution_group(mut self, head: QName) -> Self {
        self.substitution_group = Some(head);
        self
    }

    /// Set nillable
    pub fn with_nillable(mut self, nillable: bool) -> Self {
        self.nillable = nillable;
        self
    }

    /// Set abstract
    pub fn with_abstract(mut self, abstract_element: bool) -> Self {
        self.abstract_element = abstract_element;
        self
    }

    /// Add an identity constraint
    pub fn with_constraint(mut self, constraint: RawIdentityConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

// ========== Attributes ==========

/// A global or local attribute declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RawAttribute {
    /// Local name of the attribute
    pub name: String,
    /// Named declared type, if any
    pub type_name: Option<QName>,
    /// Anonymous inline simple type, if any
    pub inline_type: Option<Box<RawSimpleType>>,
}

impl RawAttribute {
    /// Attribute without a declared type (defaults to the universal
    /// simple type)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            inline_type: None,
        }
    }

    /// Set a named declared type
    pub fn with_type(mut self, type_name: QName) -> Self {
        self.type_name = Some(type_name);
        self
    }

    /// Set an anonymous inline simple type
    pub fn with_inline_type(mut self, simple_type: RawSimpleType) -> Self {
        self.inline_type = Some(Box::new(simple_type));
        self
    }
}

/// What a raw attribute use points at
#[derive(Debug, Clone, PartialEq)]
pub enum RawAttributeTerm {
    /// Reference to a global attribute by name
    Ref(QName),
    /// Local attribute declaration
    Local(RawAttribute),
}

/// An attribute slot on a complex type or attribute group
#[derive(Debug, Clone, PartialEq)]
pub struct RawAttributeUse {
    /// The attribute this use admits
    pub term: RawAttributeTerm,
    /// Whether the attribute must appear
    pub required: bool,
    /// Default value, if declared
    pub default: Option<String>,
    /// Fixed value, if declared
    pub fixed: Option<String>,
}

impl RawAttributeUse {
    /// Use referencing a global attribute
    pub fn reference(name: QName) -> Self {
        Self {
            term: RawAttributeTerm::Ref(name),
            required: false,
            default: None,
            fixed: None,
        }
    }

    /// Use declaring a local attribute
    pub fn local(attribute: RawAttribute) -> Self {
        Self {
            term: RawAttributeTerm::Local(attribute),
            required: false,
            default: None,
            fixed: None,
        }
    }

    /// Mark the use as required
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the fixed value
    pub fn with_fixed(mut self, fixed: impl Into<String>) -> Self {
        self.fixed = Some(fixed.into());
        self
    }
}

// ========== Groups, notations, constraints ==========

/// A named model group definition
#[derive(Debug, Clone, PartialEq)]
pub struct RawModelGroup {
    /// Local name of the group
    pub name: String,
    /// The group's particle tree; the root must be a compositor
    pub particle: RawParticle,
}

impl RawModelGroup {
    /// Create a named model group
    pub fn new(name: impl Into<String>, particle: RawParticle) -> Self {
        Self {
            name: name.into(),
            particle,
        }
    }
}

/// A named attribute group definition
#[derive(Debug, Clone, PartialEq)]
pub struct RawAttributeGroup {
    /// Local name of the group
    pub name: String,
    /// Attribute uses declared in the group
    pub attributes: Vec<RawAttributeUse>,
    /// Nested attribute group references
    pub attribute_groups: Vec<QName>,
}

impl RawAttributeGroup {
    /// Create an empty attribute group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
        }
    }

    /// Add an attribute use
    pub fn with_attribute(mut self, attribute: RawAttributeUse) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a nested attribute group reference
    pub fn with_attribute_group(mut self, group: QName) -> Self {
        self.attribute_groups.push(group);
        self
    }
}

/// A notation declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RawNotation {
    /// Local name of the notation
    pub name: String,
    /// Public identifier
    pub public_id: Option<String>,
    /// System identifier
    pub system_id: Option<String>,
}

impl RawNotation {
    /// Create a notation declaration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_id: None,
            system_id: None,
        }
    }

    /// Set the public identifier
    pub fn with_public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }

    /// Set the system identifier
    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }
}

/// An identity constraint declared inside an element
#[derive(Debug, Clone, PartialEq)]
pub struct RawIdentityConstraint {
    /// Local name of the constraint
    pub name: String,
    /// Kind of constraint
    pub kind: IdentityKind,
    /// Selector XPath expression, carried verbatim
    pub selector: String,
    /// Field XPath expressions, carried verbatim
    pub fields: Vec<String>,
    /// Referenced key or unique constraint; keyrefs only
    pub refer: Option<QName>,
}

impl RawIdentityConstraint {
    /// Create a key constraint
    pub fn key(name: impl Into<String>, selector: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: IdentityKind::Key,
            selector: selector.into(),
            fields,
            refer: None,
        }
    }

    /// Create a unique constraint
    pub fn unique(
        name: impl Into<String>,
        selector: impl Into<String>,
        fields: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: IdentityKind::Unique,
            selector: selector.into(),
            fields,
            refer: None,
        }
    }

    /// Create a keyref constraint referring to a key or unique by name
    pub fn keyref(
        name: impl Into<String>,
        selector: impl Into<String>,
        fields: Vec<String>,
        refer: QName,
    ) -> Self {
        Self {
            name: name.into(),
            kind: IdentityKind::KeyRef,
            selector: selector.into(),
            fields,
            refer: Some(refer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = ParsedDocument::named("po.xsd")
            .with_target_namespace("http://example.com/po")
            .with_component(RawElement::new("purchaseOrder").with_type(QName::local("poType")))
            .with_component(RawComplexType::new("poType"));

        assert_eq!(doc.name, "po.xsd");
        assert_eq!(doc.component_count(), 2);
        assert_eq!(
            doc.qualify("poType"),
            QName::namespaced("http://example.com/po", "poType")
        );
    }

    #[test]
    fn test_qualify_without_namespace() {
        let doc = ParsedDocument::named("plain.xsd");
        assert_eq!(doc.qualify("item"), QName::local("item"));
    }

    #[test]
    fn test_particle_depth() {
        let flat = RawParticle::sequence(vec![RawParticle::element("a", QName::local("t"))]);
        assert_eq!(flat.depth(), 2);

        let nested = RawParticle::sequence(vec![RawParticle::choice(vec![
            RawParticle::element("a", QName::local("t")),
            RawParticle::wildcard(),
        ])]);
        assert_eq!(nested.depth(), 3);

        assert_eq!(RawParticle::wildcard().depth(), 1);
        assert_eq!(RawParticle::sequence(Vec::new()).depth(), 1);
    }

    #[test]
    fn test_with_occurs() {
        let p = RawParticle::element_ref(QName::local("e")).with_occurs(Occurs::zero_or_more());
        match p {
            RawParticle::ElementRef { occurs, .. } => assert_eq!(occurs, Occurs::zero_or_more()),
            _ => panic!("expected element ref"),
        }
    }

    #[test]
    fn test_compositor_predicate() {
        assert!(RawParticle::sequence(Vec::new()).is_compositor());
        assert!(RawParticle::all(Vec::new()).is_compositor());
        assert!(!RawParticle::wildcard().is_compositor());
        assert!(!RawParticle::element_ref(QName::local("e")).is_compositor());
    }

    #[test]
    fn test_component_conversions() {
        let doc = ParsedDocument::named("x.xsd")
            .with_component(RawSimpleType::restriction("code", QName::local("string")))
            .with_component(RawAttribute::new("version"))
            .with_component(RawNotation::new("gif"));

        assert!(matches!(doc.components[0], RawComponent::SimpleType(_)));
        assert!(matches!(doc.components[1], RawComponent::Attribute(_)));
        assert!(matches!(doc.components[2], RawComponent::Notation(_)));
    }
}
