//! The immutable schema type system
//!
//! A [`SchemaTypeSystem`] is the output of one composition: an arena
//! of components, a name table over it, the diagnostics the build
//! emitted, and the substitution group closure. It is immutable and
//! shareable across threads; incremental builds take it as a base and
//! produce a new system without modifying it.

use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result, SaveError};
use crate::namespaces::QName;
use crate::snapshot::StsSnapshot;
use crate::som::attributes::{AttributeTerm, AttributeUse};
use crate::som::base::{Component, ComponentId, ComponentRef, ResolutionState, SymbolSpace};
use crate::som::builtins::BUILTIN_SOURCE;
use crate::som::table::{ComponentArena, ComponentTable};

/// An immutable, queryable collection of resolved schema components
#[derive(Debug, Clone)]
pub struct SchemaTypeSystem {
    name: String,
    arena: ComponentArena,
    table: ComponentTable,
    diagnostics: Diagnostics,
    substitution_groups: IndexMap<QName, Vec<ComponentId>>,
    fully_resolved: bool,
}

impl SchemaTypeSystem {
    /// Assemble a finished system from the parts of one build
    pub(crate) fn assemble(
        name: String,
        arena: ComponentArena,
        table: ComponentTable,
        diagnostics: Diagnostics,
        substitution_groups: IndexMap<QName, Vec<ComponentId>>,
    ) -> Self {
        let fully_resolved = arena.iter().all(|(_, _, state)| state.is_resolved())
            && !diagnostics.has_unresolved();
        Self {
            name,
            arena,
            table,
            diagnostics,
            substitution_groups,
            fully_resolved,
        }
    }

    pub(crate) fn arena(&self) -> &ComponentArena {
        &self.arena
    }

    pub(crate) fn table(&self) -> &ComponentTable {
        &self.table
    }

    /// Name of the type system
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========== Component access ==========

    /// Component stored in a slot, if the slot is live
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.arena.get(id).map(|arc| arc.as_ref())
    }

    /// Shared handle to a slot's component
    ///
    /// Handles stay valid after further builds; a build that does not
    /// disturb a component shares its storage with the base system.
    pub fn component_arc(&self, id: ComponentId) -> Option<Arc<Component>> {
        self.arena.get(id).cloned()
    }

    /// Resolution state of a slot, None if the slot is dead
    pub fn resolution_state(&self, id: ComponentId) -> Option<ResolutionState> {
        self.arena.state(id)
    }

    /// Follow a reference to the component it currently points at
    ///
    /// Fallback targets resolve like real ones, so a reference that
    /// degraded to a universal type yields that type here.
    pub fn resolve_ref(&self, reference: &ComponentRef) -> Option<&Component> {
        reference
            .target
            .target_id()
            .and_then(|id| self.component(id))
    }

    /// Iterate every live component, built-ins and anonymous included
    pub fn iter_components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.arena.iter().map(|(id, arc, _)| (id, arc.as_ref()))
    }

    /// Total number of live user components, anonymous types included
    pub fn component_count(&self) -> usize {
        self.iter_components()
            .filter(|(_, c)| c.source_name() != BUILTIN_SOURCE)
            .count()
    }

    // ========== Name lookup ==========

    /// Look up a type definition by qualified name
    pub fn lookup_type(&self, name: &QName) -> Option<ComponentId> {
        self.table.lookup(name, SymbolSpace::Type)
    }

    /// Look up a global element declaration by qualified name
    pub fn lookup_element(&self, name: &QName) -> Option<ComponentId> {
        self.table.lookup(name, SymbolSpace::Element)
    }

    /// Look up a global attribute declaration by qualified name
    pub fn lookup_attribute(&self, name: &QName) -> Option<ComponentId> {
        self.table.lookup(name, SymbolSpace::Attribute)
    }

    /// Look up a named model group definition by qualified name
    pub fn lookup_model_group(&self, name: &QName) -> Option<ComponentId> {
        self.table.lookup(name, SymbolSpace::ModelGroup)
    }

    /// Look up a named attribute group definition by qualified name
    pub fn lookup_attribute_group(&self, name: &QName) -> Option<ComponentId> {
        self.table.lookup(name, SymbolSpace::AttributeGroup)
    }

    /// Look up an identity constraint by qualified name
    pub fn lookup_identity(&self, name: &QName) -> Option<ComponentId> {
        self.table.lookup(name, SymbolSpace::IdentityConstraint)
    }

    /// Look up a notation declaration by qualified name
    pub fn lookup_notation(&self, name: &QName) -> Option<ComponentId> {
        self.table.lookup(name, SymbolSpace::Notation)
    }

    // ========== Enumeration ==========

    fn globals(&self, space: SymbolSpace) -> impl Iterator<Item = ComponentId> + '_ {
        self.table.iter_space(space).map(|(_, id)| id).filter(|id| {
            self.component(*id)
                .map(|c| c.source_name() != BUILTIN_SOURCE)
                .unwrap_or(false)
        })
    }

    /// Global type definitions in definition order, built-ins excluded
    pub fn global_types(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.globals(SymbolSpace::Type)
    }

    /// Global element declarations in definition order
    pub fn global_elements(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.globals(SymbolSpace::Element)
    }

    /// Global attribute declarations in definition order
    pub fn global_attributes(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.globals(SymbolSpace::Attribute)
    }

    /// Named model group definitions in definition order
    pub fn global_model_groups(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.globals(SymbolSpace::ModelGroup)
    }

    /// Named attribute group definitions in definition order
    pub fn global_attribute_groups(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.globals(SymbolSpace::AttributeGroup)
    }

    /// Identity constraints in registration order
    pub fn global_identity_constraints(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.globals(SymbolSpace::IdentityConstraint)
    }

    /// Notation declarations in definition order
    pub fn global_notations(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.globals(SymbolSpace::Notation)
    }

    /// Number of global type definitions, built-ins excluded
    pub fn type_count(&self) -> usize {
        self.global_types().count()
    }

    /// Number of global element declarations
    pub fn element_count(&self) -> usize {
        self.global_elements().count()
    }

    /// Number of global attribute declarations
    pub fn attribute_count(&self) -> usize {
        self.global_attributes().count()
    }

    /// Number of named model group definitions
    pub fn model_group_count(&self) -> usize {
        self.global_model_groups().count()
    }

    /// Number of named attribute group definitions
    pub fn attribute_group_count(&self) -> usize {
        self.global_attribute_groups().count()
    }

    /// Number of notation declarations
    pub fn notation_count(&self) -> usize {
        self.global_notations().count()
    }

    // ========== Diagnostics ==========

    /// Diagnostics emitted by the build that produced this system
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Whether every component resolved and no unresolved diagnostics
    /// remain
    pub fn is_fully_resolved(&self) -> bool {
        self.fully_resolved
    }

    // ========== Substitution groups ==========

    /// Elements substitutable for the given head, transitively
    ///
    /// The head itself is not listed. Elements whose head reference
    /// never resolved have no membership anywhere.
    pub fn substitution_members(&self, head: &QName) -> &[ComponentId] {
        self.substitution_groups
            .get(head)
            .map(|members| members.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `member` may substitute for `head`
    ///
    /// An element always substitutes for itself.
    pub fn is_substitutable(&self, member: &QName, head: &QName) -> bool {
        if member == head {
            return self.lookup_element(head).is_some();
        }
        match self.lookup_element(member) {
            Some(id) => self.substitution_members(head).contains(&id),
            None => false,
        }
    }

    // ========== Attribute expansion ==========

    /// All attribute uses a complex type or attribute group admits
    ///
    /// Nested attribute group references expand recursively; uses
    /// whose referenced attribute never resolved are dropped, and a
    /// group reference cycle expands each group once.
    pub fn expanded_attribute_uses(&self, id: ComponentId) -> Vec<&AttributeUse> {
        let mut uses = Vec::new();
        let mut seen = HashSet::new();
        self.collect_attribute_uses(id, &mut uses, &mut seen);
        uses
    }

    fn collect_attribute_uses<'s>(
        &'s self,
        id: ComponentId,
        uses: &mut Vec<&'s AttributeUse>,
        seen: &mut HashSet<ComponentId>,
    ) {
        if !seen.insert(id) {
            return;
        }
        let Some(component) = self.component(id) else {
            return;
        };
        let (own, groups) = match component {
            Component::ComplexType(def) => (&def.attribute_uses, &def.attribute_groups),
            Component::AttributeGroup(def) => (&def.attribute_uses, &def.attribute_groups),
            _ => return,
        };
        for attribute_use in own {
            if let AttributeTerm::Ref(reference) = &attribute_use.term {
                if !reference.is_resolved() {
                    continue;
                }
            }
            uses.push(attribute_use);
        }
        for group in groups {
            if let Some(group_id) = group.resolved_id() {
                self.collect_attribute_uses(group_id, uses, seen);
            }
        }
    }

    // ========== Identity constraints ==========

    /// Identity constraints of an element, dropped keyrefs excluded
    pub fn identity_constraints_of(&self, element: ComponentId) -> Vec<ComponentId> {
        let Some(decl) = self.component(element).and_then(Component::as_element) else {
            return Vec::new();
        };
        decl.identity_constraints
            .iter()
            .copied()
            .filter(|cid| {
                self.component(*cid)
                    .and_then(Component::as_identity_constraint)
                    .map(|constraint| !constraint.is_dropped())
                    .unwrap_or(false)
            })
            .collect()
    }

    // ========== Persistence ==========

    /// Capture a serializable snapshot of the user-visible components
    pub fn snapshot(&self) -> StsSnapshot {
        StsSnapshot::of(self)
    }

    /// Write the type system snapshot as JSON
    ///
    /// Saving is refused while anything is unresolved; nothing is
    /// written in that case. The gate keeps persisted systems loadable
    /// without re-running resolution.
    pub fn try_save<W: io::Write>(&self, writer: W) -> Result<()> {
        if !self.fully_resolved {
            let unresolved = self
                .arena
                .iter()
                .filter(|(_, _, state)| !state.is_resolved())
                .count();
            return Err(Error::Save(
                SaveError::new("type system is not fully resolved")
                    .with_unresolved_components(unresolved)
                    .with_outstanding_diagnostics(self.diagnostics.unresolved_count()),
            ));
        }
        let snapshot = self.snapshot();
        serde_json::to_writer_pretty(writer, &snapshot)
            .map_err(|e| Error::Save(SaveError::new(format!("failed to write snapshot: {}", e))))
    }
}
