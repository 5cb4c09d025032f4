//! Attribute declarations, uses and groups

use super::base::{ComponentRef, RefKind};
use crate::namespaces::QName;

/// A global attribute declaration
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    /// Qualified name of the attribute
    pub name: QName,
    /// Logical name of the supplying document
    pub source_name: String,
    /// Declared simple type of the attribute
    pub declared_type: ComponentRef,
}

impl AttributeDecl {
    /// Create a global attribute declaration
    pub fn new(name: QName, source_name: impl Into<String>, declared_type: ComponentRef) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            declared_type,
        }
    }

    /// Visit every reference this declaration directly holds
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        f(RefKind::AttributeType, &self.declared_type);
    }

    /// Mutable counterpart of [`AttributeDecl::for_each_ref`]; same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        f(RefKind::AttributeType, &mut self.declared_type);
    }
}

/// What an attribute use points at
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeTerm {
    /// Reference to a global attribute declaration
    Ref(ComponentRef),
    /// Local attribute declaration owned by the use
    Local {
        /// Name the attribute appears under in instances
        name: QName,
        /// Declared simple type of the local attribute
        type_ref: ComponentRef,
    },
}

/// An attribute slot of a complex type or attribute group
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeUse {
    /// The attribute this use admits
    pub term: AttributeTerm,
    /// Whether the attribute must appear
    pub required: bool,
    /// Default value, if declared
    pub default: Option<String>,
    /// Fixed value, if declared
    pub fixed: Option<String>,
}

impl AttributeUse {
    /// Create a use referencing a global attribute
    pub fn reference(reference: ComponentRef) -> Self {
        Self {
            term: AttributeTerm::Ref(reference),
            required: false,
            default: None,
            fixed: None,
        }
    }

    /// Create a use declaring a local attribute
    pub fn local(name: QName, type_ref: ComponentRef) -> Self {
        Self {
            term: AttributeTerm::Local { name, type_ref },
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

    /// Visit every reference this use directly holds
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        match &self.term {
            AttributeTerm::Ref(reference) => f(RefKind::AttributeRef, reference),
            AttributeTerm::Local { type_ref, .. } => f(RefKind::AttributeType, type_ref),
        }
    }

    /// Mutable counterpart of [`AttributeUse::for_each_ref`]; same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        match &mut self.term {
            AttributeTerm::Ref(reference) => f(RefKind::AttributeRef, reference),
            AttributeTerm::Local { type_ref, .. } => f(RefKind::AttributeType, type_ref),
        }
    }
}

/// A named attribute group definition
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeGroupDef {
    /// Qualified name of the group
    pub name: QName,
    /// Logical name of the supplying document
    pub source_name: String,
    /// Attribute uses declared directly in the group
    pub attribute_uses: Vec<AttributeUse>,
    /// Nested attribute group references
    pub attribute_groups: Vec<ComponentRef>,
}

impl AttributeGroupDef {
    /// Create an attribute group definition
    pub fn new(name: QName, source_name: impl Into<String>) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            attribute_uses: Vec::new(),
            attribute_groups: Vec::new(),
        }
    }

    /// Add an attribute use
    pub fn with_use(mut self, attribute_use: AttributeUse) -> Self {
        self.attribute_uses.push(attribute_use);
        self
    }

    /// Add a nested attribute group reference
    pub fn with_group(mut self, reference: ComponentRef) -> Self {
        self.attribute_groups.push(reference);
        self
    }

    /// Visit every reference this group directly holds
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        for attribute_use in &self.attribute_uses {
            attribute_use.for_each_ref(f);
        }
        for group in &self.attribute_groups {
            f(RefKind::AttributeGroupRef, group);
        }
    }

    /// Mutable counterpart of [`AttributeGroupDef::for_each_ref`]; same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        for attribute_use in &mut self.attribute_uses {
            attribute_use.for_each_ref_mut(f);
        }
        for group in &mut self.attribute_groups {
            f(RefKind::AttributeGroupRef, group);
        }
    }
}
