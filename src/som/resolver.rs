//! Name resolution over the layered component tables
//!
//! Resolution looks a qualified name up in two layers: the table of
//! components defined by the current batch of documents, then the
//! table carried over from the base type system. Carried-over entries
//! whose slots were vacated by the current batch are invisible, so a
//! deleted definition cannot satisfy a reference.
//!
//! Resolution here is pure lookup. Recording outcomes on components
//! and substituting fallbacks happen in the resolution passes.

use std::collections::HashSet;

use crate::error::{CycleError, Error, Result};
use crate::namespaces::QName;
use crate::som::base::{ComponentId, RefKind, ResolutionState};
use crate::som::table::{ComponentArena, ComponentTable};

/// Outcome of a single name lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The name denotes a live component
    Resolved(ComponentId),
    /// The name denotes nothing in either layer
    Unresolved(UnresolvedReason),
}

/// Why a lookup failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No live component carries the name in the relevant symbol space
    NotFound,
}

/// Lookup context over the two table layers of one build
pub struct ResolveContext<'a> {
    /// Components defined by the current batch of documents
    pub new_layer: &'a ComponentTable,
    /// Components carried over from the base type system
    pub base_layer: Option<&'a ComponentTable>,
    /// Slots the current batch vacated; invisible through the base layer
    pub vacated: &'a HashSet<ComponentId>,
    /// Arena backing both layers
    pub arena: &'a ComponentArena,
}

impl<'a> ResolveContext<'a> {
    /// Find the component a name denotes, if any
    ///
    /// The new layer shadows the base layer. Base entries pointing at
    /// vacated or vacant slots are skipped rather than reported, since
    /// the definition they recorded no longer exists.
    pub fn lookup(&self, name: &QName, space: crate::som::base::SymbolSpace) -> Option<ComponentId> {
        if let Some(id) = self.new_layer.lookup(name, space) {
            return Some(id);
        }
        if let Some(base) = self.base_layer {
            if let Some(id) = base.lookup(name, space) {
                if !self.vacated.contains(&id) && !self.arena.is_vacant(id) {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Resolve a reference of the given kind
    ///
    /// A hit on a component currently being resolved is legal for most
    /// edges (content models may be recursive) but fatal for base type
    /// edges, where it means the derivation chain loops back on itself.
    pub fn resolve(&self, name: &QName, kind: RefKind) -> Result<Resolution> {
        match self.lookup(name, kind.symbol_space()) {
            Some(id) => {
                if kind.is_base_type() && self.arena.state(id) == Some(ResolutionState::Resolving) {
                    return Err(Error::Cycle(CycleError::new(name.to_string())));
                }
                Ok(Resolution::Resolved(id))
            }
            None => Ok(Resolution::Unresolved(UnresolvedReason::NotFound)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::som::base::{Component, SymbolSpace};
    use crate::som::simple_types::SimpleTypeDef;
    use std::sync::Arc;

    fn simple(name: &str, source: &str) -> Arc<Component> {
        Arc::new(Component::SimpleType(SimpleTypeDef::restriction(
            Some(QName::local(name)),
            source,
            crate::som::base::ComponentRef::named(QName::local("base")),
        )))
    }

    #[test]
    fn test_new_layer_shadows_base() {
        let mut arena = ComponentArena::new();
        let old = arena.alloc(simple("t", "old.xsd"), ResolutionState::Resolved);
        let new = arena.alloc(simple("t", "new.xsd"), ResolutionState::Unresolved);

        let mut base_table = ComponentTable::new();
        base_table.define(QName::local("t"), SymbolSpace::Type, old);
        let mut new_table = ComponentTable::new();
        new_table.define(QName::local("t"), SymbolSpace::Type, new);

        let vacated = HashSet::new();
        let ctx = ResolveContext {
            new_layer: &new_table,
            base_layer: Some(&base_table),
            vacated: &vacated,
            arena: &arena,
        };

        assert_eq!(ctx.lookup(&QName::local("t"), SymbolSpace::Type), Some(new));
    }

    #[test]
    fn test_vacated_base_entry_is_invisible() {
        let mut arena = ComponentArena::new();
        let old = arena.alloc(simple("t", "old.xsd"), ResolutionState::Resolved);

        let mut base_table = ComponentTable::new();
        base_table.define(QName::local("t"), SymbolSpace::Type, old);
        let new_table = ComponentTable::new();

        let mut vacated = HashSet::new();
        vacated.insert(old);
        let ctx = ResolveContext {
            new_layer: &new_table,
            base_layer: Some(&base_table),
            vacated: &vacated,
            arena: &arena,
        };

        assert_eq!(ctx.lookup(&QName::local("t"), SymbolSpace::Type), None);
        match ctx.resolve(&QName::local("t"), RefKind::BaseType) {
            Ok(Resolution::Unresolved(UnresolvedReason::NotFound)) => {}
            other => panic!("unexpected resolution: {:?}", other),
        }
    }

    #[test]
    fn test_base_type_hit_on_resolving_slot_is_a_cycle() {
        let mut arena = ComponentArena::new();
        let id = arena.alloc(simple("loop", "a.xsd"), ResolutionState::Resolving);

        let mut new_table = ComponentTable::new();
        new_table.define(QName::local("loop"), SymbolSpace::Type, id);

        let vacated = HashSet::new();
        let ctx = ResolveContext {
            new_layer: &new_table,
            base_layer: None,
            vacated: &vacated,
            arena: &arena,
        };

        assert!(matches!(
            ctx.resolve(&QName::local("loop"), RefKind::BaseType),
            Err(Error::Cycle(_))
        ));
        // The same hit through a non-base edge is fine.
        assert_eq!(
            ctx.resolve(&QName::local("loop"), RefKind::ElementType)
                .unwrap(),
            Resolution::Resolved(id)
        );
    }
}
