//! Simple type definitions

use super::base::{ComponentRef, DerivationKind, RefKind};
use crate::namespaces::QName;

/// How a simple type is constructed
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleDerivation {
    /// Built-in simple type
    None,
    /// Restriction of a base simple type
    Restriction {
        /// The restricted base type
        base: ComponentRef,
    },
    /// List with the given item type
    List {
        /// The item type
        item: ComponentRef,
    },
    /// Union of the given member types
    Union {
        /// The member types, in declaration order
        members: Vec<ComponentRef>,
    },
}

/// A simple type definition
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleTypeDef {
    /// Qualified name; None for anonymous inline types
    pub name: Option<QName>,
    /// Logical name of the supplying document
    pub source_name: String,
    /// Construction of the type
    pub derivation: SimpleDerivation,
}

impl SimpleTypeDef {
    /// Create a built-in simple type
    pub fn builtin(name: QName, source_name: impl Into<String>) -> Self {
        Self {
            name: Some(name),
            source_name: source_name.into(),
            derivation: SimpleDerivation::None,
        }
    }

    /// Create a restriction of a base type
    pub fn restriction(
        name: Option<QName>,
        source_name: impl Into<String>,
        base: ComponentRef,
    ) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            derivation: SimpleDerivation::Restriction { base },
        }
    }

    /// Create a list over an item type
    pub fn list(name: Option<QName>, source_name: impl Into<String>, item: ComponentRef) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            derivation: SimpleDerivation::List { item },
        }
    }

    /// Create a union over member types
    pub fn union(
        name: Option<QName>,
        source_name: impl Into<String>,
        members: Vec<ComponentRef>,
    ) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            derivation: SimpleDerivation::Union { members },
        }
    }

    /// Whether this is a built-in type
    pub fn is_builtin(&self) -> bool {
        matches!(self.derivation, SimpleDerivation::None)
    }

    /// Derivation kind of this type
    pub fn derivation_kind(&self) -> DerivationKind {
        match &self.derivation {
            SimpleDerivation::None => DerivationKind::None,
            SimpleDerivation::Restriction { .. } => DerivationKind::Restriction,
            SimpleDerivation::List { .. } => DerivationKind::List,
            SimpleDerivation::Union { .. } => DerivationKind::Union,
        }
    }

    /// Base type reference for restriction types
    pub fn base_ref(&self) -> Option<&ComponentRef> {
        match &self.derivation {
            SimpleDerivation::Restriction { base } => Some(base),
            _ => None,
        }
    }

    /// Visit every reference this type directly holds
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        match &self.derivation {
            SimpleDerivation::None => {}
            SimpleDerivation::Restriction { base } => f(RefKind::BaseType, base),
            SimpleDerivation::List { item } => f(RefKind::ListItemType, item),
            SimpleDerivation::Union { members } => {
                for member in members {
                    f(RefKind::UnionMemberType, member);
                }
            }
        }
    }

    /// Mutable counterpart of [`SimpleTypeDef::for_each_ref`]; same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        match &mut self.derivation {
            SimpleDerivation::None => {}
            SimpleDerivation::Restriction { base } => f(RefKind::BaseType, base),
            SimpleDerivation::List { item } => f(RefKind::ListItemType, item),
            SimpleDerivation::Union { members } => {
                for member in members {
                    f(RefKind::UnionMemberType, member);
                }
            }
        }
    }
}
