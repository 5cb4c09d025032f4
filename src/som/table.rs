//! Component storage and the symbol table
//!
//! A type system owns a [`ComponentArena`] of slots addressed by
//! [`ComponentId`] and a [`ComponentTable`] mapping (qualified name,
//! symbol space) pairs to slots. Incremental builds seed their arena from
//! the base system's arena, slot for slot, which is what keeps ids stable
//! across builds: redefinition replaces a slot's payload in place and
//! removal vacates the slot, but indices never shift.

use indexmap::IndexMap;
use std::sync::Arc;

use super::base::{Component, ComponentId, ResolutionState, SymbolSpace};
use crate::namespaces::QName;

// ========== Symbol table ==========

/// Maps (qualified name, symbol space) pairs to component slots
///
/// Within one build layer the table is last-write-wins: defining a name
/// again simply repoints it. Iteration order is definition order.
#[derive(Debug, Clone, Default)]
pub struct ComponentTable {
    entries: IndexMap<(QName, SymbolSpace), ComponentId>,
}

impl ComponentTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine a name; the last definition wins
    pub fn define(&mut self, name: QName, space: SymbolSpace, id: ComponentId) {
        self.entries.insert((name, space), id);
    }

    /// Look up a name in a symbol space
    pub fn lookup(&self, name: &QName, space: SymbolSpace) -> Option<ComponentId> {
        self.entries.get(&(name.clone(), space)).copied()
    }

    /// Whether the name is defined in the symbol space
    pub fn contains(&self, name: &QName, space: SymbolSpace) -> bool {
        self.lookup(name, space).is_some()
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no definitions
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate all definitions in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&QName, SymbolSpace, ComponentId)> {
        self.entries.iter().map(|((name, space), id)| (name, *space, *id))
    }

    /// Iterate the definitions of one symbol space, in definition order
    pub fn iter_space(&self, space: SymbolSpace) -> impl Iterator<Item = (&QName, ComponentId)> {
        self.entries
            .iter()
            .filter(move |((_, s), _)| *s == space)
            .map(|((name, _), id)| (name, *id))
    }

    /// Number of definitions in one symbol space
    pub fn count_space(&self, space: SymbolSpace) -> usize {
        self.iter_space(space).count()
    }
}

// ========== Arena ==========

#[derive(Debug, Clone)]
struct Slot {
    component: Option<Arc<Component>>,
    state: ResolutionState,
}

/// Slot storage for components
///
/// Slots are only ever appended or rewritten; a slot index handed out
/// once stays meaningful for the lifetime of every type system built on
/// top of this arena.
#[derive(Debug, Clone, Default)]
pub struct ComponentArena {
    slots: Vec<Slot>,
}

impl ComponentArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component, returning its slot id
    pub fn alloc(&mut self, component: Arc<Component>, state: ResolutionState) -> ComponentId {
        let id = ComponentId::new(self.slots.len());
        self.slots.push(Slot {
            component: Some(component),
            state,
        });
        id
    }

    /// Replace the payload of an existing slot, resetting its state
    pub(crate) fn replace(&mut self, id: ComponentId, component: Arc<Component>) {
        let slot = &mut self.slots[id.index()];
        slot.component = Some(component);
        slot.state = ResolutionState::Unresolved;
    }

    /// Empty a slot; the index stays allocated and is never reused
    pub(crate) fn vacate(&mut self, id: ComponentId) {
        let slot = &mut self.slots[id.index()];
        slot.component = None;
        slot.state = ResolutionState::Unresolved;
    }

    /// Component in a slot, if the slot is live
    pub fn get(&self, id: ComponentId) -> Option<&Arc<Component>> {
        self.slots.get(id.index()).and_then(|s| s.component.as_ref())
    }

    /// Mutable handle to a slot's payload for in-place resolution
    pub(crate) fn get_mut(&mut self, id: ComponentId) -> Option<&mut Arc<Component>> {
        self.slots
            .get_mut(id.index())
            .and_then(|s| s.component.as_mut())
    }

    /// Resolution state of a slot, if the slot is live
    pub fn state(&self, id: ComponentId) -> Option<ResolutionState> {
        let slot = self.slots.get(id.index())?;
        slot.component.as_ref()?;
        Some(slot.state)
    }

    /// Set the resolution state of a slot
    pub(crate) fn set_state(&mut self, id: ComponentId, state: ResolutionState) {
        self.slots[id.index()].state = state;
    }

    /// Whether the slot holds no component
    pub fn is_vacant(&self, id: ComponentId) -> bool {
        self.slots
            .get(id.index())
            .map(|s| s.component.is_none())
            .unwrap_or(true)
    }

    /// Number of slots, vacant ones included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the arena has no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterate live slots in index order
    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, &Arc<Component>, ResolutionState)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.component
                .as_ref()
                .map(|c| (ComponentId::new(index), c, slot.state))
        })
    }

    /// Number of live slots
    pub fn live_count(&self) -> usize {
        self.iter().count()
    }
}
