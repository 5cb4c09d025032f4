//! Core component model types
//!
//! Every global schema construct is a [`Component`] stored in an arena and
//! addressed by a [`ComponentId`]. Components never point at each other
//! directly; they hold [`ComponentRef`] cells that record the referenced
//! qualified name together with the outcome of resolving it. Keeping the
//! name around even after resolution is what lets a later incremental
//! build re-attempt references that previously failed.

use crate::namespaces::QName;
use std::fmt;

use super::attributes::{AttributeDecl, AttributeGroupDef};
use super::complex_types::ComplexTypeDef;
use super::elements::ElementDecl;
use super::groups::ModelGroupDef;
use super::identities::IdentityConstraintDef;
use super::notations::NotationDecl;
use super::simple_types::SimpleTypeDef;

// ========== Identity ==========

/// Stable handle to a component slot in a type system arena
///
/// Handles stay valid across incremental builds: a build seeded from a
/// base type system keeps every base slot at its index, so ids obtained
/// from the base remain meaningful against the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    /// Create an id for the given slot index
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Slot index backing this id
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminates the concrete kind of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Simple type definition
    SimpleType,
    /// Complex type definition
    ComplexType,
    /// Global element declaration
    Element,
    /// Global attribute declaration
    Attribute,
    /// Named model group definition
    ModelGroup,
    /// Named attribute group definition
    AttributeGroup,
    /// Identity constraint (key, unique or keyref)
    IdentityConstraint,
    /// Notation declaration
    Notation,
}

impl ComponentKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::SimpleType => "simple-type",
            ComponentKind::ComplexType => "complex-type",
            ComponentKind::Element => "element",
            ComponentKind::Attribute => "attribute",
            ComponentKind::ModelGroup => "model-group",
            ComponentKind::AttributeGroup => "attribute-group",
            ComponentKind::IdentityConstraint => "identity-constraint",
            ComponentKind::Notation => "notation",
        }
    }

    /// Symbol space this kind is defined in
    ///
    /// Simple and complex types share one space; a qualified name can
    /// denote at most one type definition regardless of variety.
    pub fn symbol_space(&self) -> SymbolSpace {
        match self {
            ComponentKind::SimpleType | ComponentKind::ComplexType => SymbolSpace::Type,
            ComponentKind::Element => SymbolSpace::Element,
            ComponentKind::Attribute => SymbolSpace::Attribute,
            ComponentKind::ModelGroup => SymbolSpace::ModelGroup,
            ComponentKind::AttributeGroup => SymbolSpace::AttributeGroup,
            ComponentKind::IdentityConstraint => SymbolSpace::IdentityConstraint,
            ComponentKind::Notation => SymbolSpace::Notation,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Symbol space a qualified name is looked up in
///
/// XML Schema gives each component family its own namespace of names;
/// the component table keys on (name, space) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolSpace {
    /// Type definitions (simple and complex share this space)
    Type,
    /// Global element declarations
    Element,
    /// Global attribute declarations
    Attribute,
    /// Named model group definitions
    ModelGroup,
    /// Named attribute group definitions
    AttributeGroup,
    /// Identity constraints
    IdentityConstraint,
    /// Notation declarations
    Notation,
}

impl SymbolSpace {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolSpace::Type => "type",
            SymbolSpace::Element => "element",
            SymbolSpace::Attribute => "attribute",
            SymbolSpace::ModelGroup => "model-group",
            SymbolSpace::AttributeGroup => "attribute-group",
            SymbolSpace::IdentityConstraint => "identity-constraint",
            SymbolSpace::Notation => "notation",
        }
    }
}

impl fmt::Display for SymbolSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Resolution ==========

/// Per-component resolution state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Every reference the component directly holds resolved
    Resolved,
    /// At least one direct reference could not be resolved
    Unresolved,
    /// Resolution in progress; only ever observed mid-build while a
    /// base-type chain is being walked
    Resolving,
}

impl ResolutionState {
    /// Whether the component resolved completely
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionState::Resolved)
    }

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionState::Resolved => "resolved",
            ResolutionState::Unresolved => "unresolved",
            ResolutionState::Resolving => "resolving",
        }
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of resolving a single reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedTo {
    /// Reference resolved to a component slot
    Component(ComponentId),
    /// Target was missing; the reference degraded to the given built-in
    /// universal type per the fallback policy
    Fallback(ComponentId),
    /// Target was missing and the reference has no substitute value
    /// (substitution heads, group references, keyref targets)
    Unresolved,
    /// Not yet attempted; only ever observed mid-build
    Pending,
}

impl ResolvedTo {
    /// Slot the reference currently points at, if any
    pub fn target_id(&self) -> Option<ComponentId> {
        match self {
            ResolvedTo::Component(id) | ResolvedTo::Fallback(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether resolution has not been attempted yet
    pub fn is_pending(&self) -> bool {
        matches!(self, ResolvedTo::Pending)
    }

    /// Whether the reference failed to resolve (degraded or valueless)
    pub fn is_failed(&self) -> bool {
        matches!(self, ResolvedTo::Fallback(_) | ResolvedTo::Unresolved)
    }
}

/// A reference from one component to another
///
/// The referenced qualified name survives resolution so the reference can
/// be re-attempted by later builds. A cell without a name was bound at
/// definition time (anonymous inline types, defaulted types) and is never
/// re-attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    /// Qualified name the reference was written against, if any
    pub name: Option<QName>,
    /// Current resolution outcome
    pub target: ResolvedTo,
}

impl ComponentRef {
    /// Create an unattempted reference to a qualified name
    pub fn named(name: QName) -> Self {
        Self {
            name: Some(name),
            target: ResolvedTo::Pending,
        }
    }

    /// Create a reference bound directly to a slot at definition time
    pub fn fixed(id: ComponentId) -> Self {
        Self {
            name: None,
            target: ResolvedTo::Component(id),
        }
    }

    /// Whether the reference resolved to a real component
    pub fn is_resolved(&self) -> bool {
        matches!(self.target, ResolvedTo::Component(_))
    }

    /// Whether resolution has not been attempted yet
    pub fn is_pending(&self) -> bool {
        self.target.is_pending()
    }

    /// Slot the reference currently points at, if any
    pub fn resolved_id(&self) -> Option<ComponentId> {
        self.target.target_id()
    }

    /// Name for messages; anonymous references print as `<anonymous>`
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(q) => q.to_string(),
            None => "<anonymous>".to_string(),
        }
    }

    /// Forget a previous outcome so a new build can re-attempt the lookup.
    /// References without a name keep their definition-time binding.
    pub fn reset_for_reattempt(&mut self) {
        if self.name.is_some() {
            self.target = ResolvedTo::Pending;
        }
    }
}

/// Which role a reference plays in its owning component
///
/// The role decides the symbol space to look the name up in, whether the
/// reference participates in cycle detection, and which fallback applies
/// when the target is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// Base type of a restriction or extension derivation
    BaseType,
    /// Declared type of an element declaration
    ElementType,
    /// Declared type of an attribute declaration
    AttributeType,
    /// Item type of a list simple type
    ListItemType,
    /// Member type of a union simple type
    UnionMemberType,
    /// Particle reference to a global element
    ElementRef,
    /// Attribute use reference to a global attribute
    AttributeRef,
    /// Particle reference to a named model group
    ModelGroupRef,
    /// Reference to a named attribute group
    AttributeGroupRef,
    /// Substitution group head of an element
    SubstitutionHead,
    /// Keyref target (a key or unique constraint)
    KeyrefTarget,
}

impl RefKind {
    /// Symbol space the referenced name lives in
    pub fn symbol_space(&self) -> SymbolSpace {
        match self {
            RefKind::BaseType
            | RefKind::ElementType
            | RefKind::AttributeType
            | RefKind::ListItemType
            | RefKind::UnionMemberType => SymbolSpace::Type,
            RefKind::ElementRef | RefKind::SubstitutionHead => SymbolSpace::Element,
            RefKind::AttributeRef => SymbolSpace::Attribute,
            RefKind::ModelGroupRef => SymbolSpace::ModelGroup,
            RefKind::AttributeGroupRef => SymbolSpace::AttributeGroup,
            RefKind::KeyrefTarget => SymbolSpace::IdentityConstraint,
        }
    }

    /// Whether this reference forms a base-type derivation edge
    ///
    /// Only these edges are walked for cycle detection; a loop through
    /// any other reference kind is legal schema recursion.
    pub fn is_base_type(&self) -> bool {
        matches!(self, RefKind::BaseType)
    }

    /// Human-readable role name for messages
    pub fn describe(&self) -> &'static str {
        match self {
            RefKind::BaseType => "base type",
            RefKind::ElementType => "declared type",
            RefKind::AttributeType => "declared type",
            RefKind::ListItemType => "list item type",
            RefKind::UnionMemberType => "union member type",
            RefKind::ElementRef => "element reference",
            RefKind::AttributeRef => "attribute reference",
            RefKind::ModelGroupRef => "model group reference",
            RefKind::AttributeGroupRef => "attribute group reference",
            RefKind::SubstitutionHead => "substitution group head",
            RefKind::KeyrefTarget => "keyref target",
        }
    }
}

// ========== Derivation ==========

/// How a type definition was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationKind {
    /// Built-in type, not derived from anything user-visible
    None,
    /// Derived by restriction
    Restriction,
    /// Derived by extension
    Extension,
    /// List over an item type
    List,
    /// Union over member types
    Union,
}

impl DerivationKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DerivationKind::None => "none",
            DerivationKind::Restriction => "restriction",
            DerivationKind::Extension => "extension",
            DerivationKind::List => "list",
            DerivationKind::Union => "union",
        }
    }
}

impl fmt::Display for DerivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Component ==========

/// A global schema component
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// Simple type definition
    SimpleType(SimpleTypeDef),
    /// Complex type definition
    ComplexType(ComplexTypeDef),
    /// Global element declaration
    Element(ElementDecl),
    /// Global attribute declaration
    Attribute(AttributeDecl),
    /// Named model group definition
    ModelGroup(ModelGroupDef),
    /// Named attribute group definition
    AttributeGroup(AttributeGroupDef),
    /// Identity constraint
    IdentityConstraint(IdentityConstraintDef),
    /// Notation declaration
    Notation(NotationDecl),
}

impl Component {
    /// Concrete kind of this component
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::SimpleType(_) => ComponentKind::SimpleType,
            Component::ComplexType(_) => ComponentKind::ComplexType,
            Component::Element(_) => ComponentKind::Element,
            Component::Attribute(_) => ComponentKind::Attribute,
            Component::ModelGroup(_) => ComponentKind::ModelGroup,
            Component::AttributeGroup(_) => ComponentKind::AttributeGroup,
            Component::IdentityConstraint(_) => ComponentKind::IdentityConstraint,
            Component::Notation(_) => ComponentKind::Notation,
        }
    }

    /// Qualified name, if the component is named
    pub fn qualified_name(&self) -> Option<&QName> {
        match self {
            Component::SimpleType(t) => t.name.as_ref(),
            Component::ComplexType(t) => t.name.as_ref(),
            Component::Element(e) => Some(&e.name),
            Component::Attribute(a) => Some(&a.name),
            Component::ModelGroup(g) => Some(&g.name),
            Component::AttributeGroup(g) => Some(&g.name),
            Component::IdentityConstraint(c) => Some(&c.name),
            Component::Notation(n) => Some(&n.name),
        }
    }

    /// Logical name of the document that supplied this component
    pub fn source_name(&self) -> &str {
        match self {
            Component::SimpleType(t) => &t.source_name,
            Component::ComplexType(t) => &t.source_name,
            Component::Element(e) => &e.source_name,
            Component::Attribute(a) => &a.source_name,
            Component::ModelGroup(g) => &g.source_name,
            Component::AttributeGroup(g) => &g.source_name,
            Component::IdentityConstraint(c) => &c.source_name,
            Component::Notation(n) => &n.source_name,
        }
    }

    /// Name for messages; anonymous components print their kind
    pub fn display_name(&self) -> String {
        match self.qualified_name() {
            Some(q) => q.to_string(),
            None => format!("<anonymous {}>", self.kind()),
        }
    }

    /// Whether this component is a type definition
    pub fn is_type(&self) -> bool {
        matches!(self, Component::SimpleType(_) | Component::ComplexType(_))
    }

    /// As a simple type definition, if it is one
    pub fn as_simple_type(&self) -> Option<&SimpleTypeDef> {
        match self {
            Component::SimpleType(t) => Some(t),
            _ => None,
        }
    }

    /// As a complex type definition, if it is one
    pub fn as_complex_type(&self) -> Option<&ComplexTypeDef> {
        match self {
            Component::ComplexType(t) => Some(t),
            _ => None,
        }
    }

    /// As an element declaration, if it is one
    pub fn as_element(&self) -> Option<&ElementDecl> {
        match self {
            Component::Element(e) => Some(e),
            _ => None,
        }
    }

    /// As an attribute declaration, if it is one
    pub fn as_attribute(&self) -> Option<&AttributeDecl> {
        match self {
            Component::Attribute(a) => Some(a),
            _ => None,
        }
    }

    /// As a model group definition, if it is one
    pub fn as_model_group(&self) -> Option<&ModelGroupDef> {
        match self {
            Component::ModelGroup(g) => Some(g),
            _ => None,
        }
    }

    /// As an attribute group definition, if it is one
    pub fn as_attribute_group(&self) -> Option<&AttributeGroupDef> {
        match self {
            Component::AttributeGroup(g) => Some(g),
            _ => None,
        }
    }

    /// As an identity constraint, if it is one
    pub fn as_identity_constraint(&self) -> Option<&IdentityConstraintDef> {
        match self {
            Component::IdentityConstraint(c) => Some(c),
            _ => None,
        }
    }

    /// As a notation declaration, if it is one
    pub fn as_notation(&self) -> Option<&NotationDecl> {
        match self {
            Component::Notation(n) => Some(n),
            _ => None,
        }
    }

    /// Visit every reference this component directly holds, in a fixed
    /// definition order
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        match self {
            Component::SimpleType(t) => t.for_each_ref(f),
            Component::ComplexType(t) => t.for_each_ref(f),
            Component::Element(e) => e.for_each_ref(f),
            Component::Attribute(a) => a.for_each_ref(f),
            Component::ModelGroup(g) => g.for_each_ref(f),
            Component::AttributeGroup(g) => g.for_each_ref(f),
            Component::IdentityConstraint(c) => c.for_each_ref(f),
            Component::Notation(_) => {}
        }
    }

    /// Mutable counterpart of [`Component::for_each_ref`]; visits cells
    /// in the same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        match self {
            Component::SimpleType(t) => t.for_each_ref_mut(f),
            Component::ComplexType(t) => t.for_each_ref_mut(f),
            Component::Element(e) => e.for_each_ref_mut(f),
            Component::Attribute(a) => a.for_each_ref_mut(f),
            Component::ModelGroup(g) => g.for_each_ref_mut(f),
            Component::AttributeGroup(g) => g.for_each_ref_mut(f),
            Component::IdentityConstraint(c) => c.for_each_ref_mut(f),
            Component::Notation(_) => {}
        }
    }

    /// Whether any directly held reference is still pending
    pub fn has_pending_refs(&self) -> bool {
        let mut pending = false;
        self.for_each_ref(&mut |_, r| {
            if r.is_pending() {
                pending = true;
            }
        });
        pending
    }

    /// Whether any directly held reference failed to resolve
    pub fn has_failed_refs(&self) -> bool {
        let mut failed = false;
        self.for_each_ref(&mut |_, r| {
            if r.target.is_failed() {
                failed = true;
            }
        });
        failed
    }
}
