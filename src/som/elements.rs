//! Global element declarations

use super::base::{ComponentId, ComponentRef, RefKind};
use crate::namespaces::QName;

/// A global element declaration
///
/// Identity constraints declared inside the element are separate
/// components; the declaration holds their ids. They are not references
/// and are never re-resolved through the element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    /// Qualified name of the element
    pub name: QName,
    /// Logical name of the supplying document
    pub source_name: String,
    /// Declared type of the element
    pub declared_type: ComponentRef,
    /// Substitution group head, if the element declares membership
    pub substitution_group: Option<ComponentRef>,
    /// Whether instances may carry xsi:nil
    pub nillable: bool,
    /// Whether the element is abstract
    pub abstract_element: bool,
    /// Identity constraints scoped to this element, in declaration order
    pub identity_constraints: Vec<ComponentId>,
}

impl ElementDecl {
    /// Create a global element declaration
    pub fn new(name: QName, source_name: impl Into<String>, declared_type: ComponentRef) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            declared_type,
            substitution_group: None,
            nillable: false,
            abstract_element: false,
            identity_constraints: Vec::new(),
        }
    }

    /// Declare membership in a substitution group
    pub fn with_substitution_group(mut self, head: ComponentRef) -> Self {
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

    /// Attach identity constraint components
    pub fn with_identity_constraints(mut self, constraints: Vec<ComponentId>) -> Self {
        self.identity_constraints = constraints;
        self
    }

    /// Slot of the substitution group head, if membership resolved
    pub fn substitution_head_id(&self) -> Option<ComponentId> {
        self.substitution_group
            .as_ref()
            .and_then(|head| head.resolved_id())
    }

    /// Visit every reference this declaration directly holds
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        f(RefKind::ElementType, &self.declared_type);
        if let Some(head) = &self.substitution_group {
            f(RefKind::SubstitutionHead, head);
        }
    }

    /// Mutable counterpart of [`ElementDecl::for_each_ref`]; same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        f(RefKind::ElementType, &mut self.declared_type);
        if let Some(head) = &mut self.substitution_group {
            f(RefKind::SubstitutionHead, head);
        }
    }
}
