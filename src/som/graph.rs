//! Incremental construction and resolution of the component graph
//!
//! A [`GraphBuilder`] runs one build: it clones the arena of the base
//! type system (or seeds a fresh one with the built-in types), lowers
//! the batch of parsed documents into components, resolves references,
//! substitutes fallbacks for whatever stays missing, and assembles the
//! result into a new [`SchemaTypeSystem`].
//!
//! Slot identity is the load-bearing invariant. A qualified name that
//! keeps its definition across builds keeps its [`ComponentId`], so
//! references recorded by earlier builds stay valid without rewriting.
//! Redefinition replaces the slot payload in place; deletion vacates
//! the slot and leaves it dead.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, SourceLocation};
use crate::documents::{
    ParsedDocument, RawAttribute, RawAttributeTerm, RawAttributeUse, RawComplexDerivation,
    RawComplexType, RawComponent, RawElement, RawIdentityConstraint, RawModelGroup, RawParticle,
    RawSimpleDerivation, RawSimpleType, RawTypeRef,
};
use crate::error::{Error, Result, SourceError};
use crate::limits::Limits;
use crate::names::is_valid_ncname;
use crate::namespaces::QName;
use crate::som::attributes::{AttributeDecl, AttributeGroupDef, AttributeUse};
use crate::som::base::{
    Component, ComponentId, ComponentRef, RefKind, ResolutionState, ResolvedTo, SymbolSpace,
};
use crate::som::builtins::{self, ANY_SIMPLE_TYPE_ID, ANY_TYPE_ID, BUILTIN_SOURCE, XSD_NAMESPACE};
use crate::som::complex_types::ComplexTypeDef;
use crate::som::elements::ElementDecl;
use crate::som::fallback;
use crate::som::groups::ModelGroupDef;
use crate::som::identities::{IdentityConstraintDef, IdentityKind};
use crate::som::notations::NotationDecl;
use crate::som::particles::{Compositor, ElementParticle, ModelGroup, Particle};
use crate::som::resolver::{Resolution, ResolveContext, UnresolvedReason};
use crate::som::simple_types::SimpleTypeDef;
use crate::som::system::SchemaTypeSystem;
use crate::som::table::{ComponentArena, ComponentTable};

/// State of one incremental build
pub(crate) struct GraphBuilder<'a> {
    /// Arena of slots, cloned from the base build or freshly seeded
    arena: ComponentArena,
    /// Names defined by the current batch of documents
    table: ComponentTable,
    /// Merged name table of the base type system, if any
    base_table: Option<&'a ComponentTable>,
    /// Slots vacated by this build
    vacated: HashSet<ComponentId>,
    /// Slots whose payload this build replaced or created
    touched: HashSet<ComponentId>,
    /// Slots to resolve, in definition order
    worklist: IndexSet<ComponentId>,
    /// Diagnostics of the current build
    diagnostics: Diagnostics,
    /// Display names of the base-type chain currently being descended
    chain: Vec<String>,
    /// Limits in force for this build
    limits: Limits,
}

impl<'a> GraphBuilder<'a> {
    /// Start a build on top of a base arena and table, or from scratch
    pub(crate) fn new(
        base: Option<(&ComponentArena, &'a ComponentTable)>,
        limits: Limits,
    ) -> Self {
        let (arena, table, base_table) = match base {
            Some((base_arena, base_table)) => {
                (base_arena.clone(), ComponentTable::new(), Some(base_table))
            }
            None => {
                let mut arena = ComponentArena::new();
                let mut table = ComponentTable::new();
                builtins::seed(&mut arena, &mut table);
                (arena, table, None)
            }
        };
        Self {
            arena,
            table,
            base_table,
            vacated: HashSet::new(),
            touched: HashSet::new(),
            worklist: IndexSet::new(),
            diagnostics: Diagnostics::new(),
            chain: Vec::new(),
            limits,
        }
    }

    // ========== Definition ==========

    /// Lower a batch of documents into components
    ///
    /// Every carried-over component originating from one of the batch
    /// document names is vacated first, so a document revision that
    /// drops a definition really deletes it. Definitions then claim
    /// slots: the slot already holding the same qualified name where
    /// one exists, a fresh slot otherwise.
    pub(crate) fn define_documents(&mut self, documents: &[ParsedDocument]) -> Result<()> {
        self.limits.check_documents(documents.len())?;
        for doc in documents {
            if doc.name.is_empty() {
                return Err(Error::Source(SourceError::new(
                    "document name must not be empty",
                )));
            }
        }
        for doc in documents {
            self.vacate_source(&doc.name);
        }
        for doc in documents {
            debug!(
                source = %doc.name,
                components = doc.component_count(),
                "defining document"
            );
            self.lower_document(doc)?;
        }
        self.limits.check_components(self.arena.live_count())?;
        Ok(())
    }

    /// Vacate every carried-over component a document contributed
    fn vacate_source(&mut self, source_name: &str) {
        let ids: Vec<ComponentId> = self
            .arena
            .iter()
            .filter(|(id, component, _)| {
                id.index() >= builtins::count() && component.source_name() == source_name
            })
            .map(|(id, _, _)| id)
            .collect();
        if !ids.is_empty() {
            debug!(
                source = source_name,
                count = ids.len(),
                "vacating carried-over components"
            );
        }
        for id in ids {
            self.arena.vacate(id);
            self.vacated.insert(id);
        }
    }

    /// Validate a declared name and qualify it against the document
    fn prepare_name(&self, doc: &ParsedDocument, name: &str) -> Result<QName> {
        if !is_valid_ncname(name) {
            return Err(Error::Source(
                SourceError::new(format!("'{}' is not a valid NCName", name))
                    .with_source_name(&doc.name),
            ));
        }
        let qname = doc.qualify(name);
        if qname.is_in_namespace(XSD_NAMESPACE) {
            return Err(Error::Source(
                SourceError::new("components cannot be defined in the XML Schema namespace")
                    .with_source_name(&doc.name)
                    .with_component(qname.to_string()),
            ));
        }
        Ok(qname)
    }

    fn source_error(doc: &ParsedDocument, message: impl Into<String>) -> Error {
        Error::Source(SourceError::new(message).with_source_name(&doc.name))
    }

    fn lower_document(&mut self, doc: &ParsedDocument) -> Result<()> {
        for raw in &doc.components {
            match raw {
                RawComponent::SimpleType(raw) => {
                    let name = raw.name.as_deref().ok_or_else(|| {
                        Self::source_error(doc, "global simple type is missing a name")
                    })?;
                    let qname = self.prepare_name(doc, name)?;
                    let def = self.lower_simple_type(doc, Some(qname.clone()), raw);
                    self.define_component(qname, Component::SimpleType(def));
                }
                RawComponent::ComplexType(raw) => {
                    let name = raw.name.as_deref().ok_or_else(|| {
                        Self::source_error(doc, "global complex type is missing a name")
                    })?;
                    let qname = self.prepare_name(doc, name)?;
                    let def = self.lower_complex_type(doc, Some(qname.clone()), raw)?;
                    self.define_component(qname, Component::ComplexType(def));
                }
                RawComponent::Element(raw) => {
                    let decl = self.lower_element(doc, raw)?;
                    self.define_component(decl.name.clone(), Component::Element(decl));
                }
                RawComponent::Attribute(raw) => {
                    let qname = self.prepare_name(doc, &raw.name)?;
                    let type_ref = self.lower_attribute_type(doc, raw)?;
                    let decl = AttributeDecl::new(qname.clone(), &doc.name, type_ref);
                    self.define_component(qname, Component::Attribute(decl));
                }
                RawComponent::ModelGroup(raw) => {
                    let def = self.lower_model_group(doc, raw)?;
                    self.define_component(def.name.clone(), Component::ModelGroup(def));
                }
                RawComponent::AttributeGroup(raw) => {
                    let qname = self.prepare_name(doc, &raw.name)?;
                    let mut def = AttributeGroupDef::new(qname.clone(), &doc.name);
                    for attribute in &raw.attributes {
                        def = def.with_use(self.lower_attribute_use(doc, attribute)?);
                    }
                    for group in &raw.attribute_groups {
                        def = def.with_group(ComponentRef::named(group.clone()));
                    }
                    self.define_component(qname, Component::AttributeGroup(def));
                }
                RawComponent::Notation(raw) => {
                    let qname = self.prepare_name(doc, &raw.name)?;
                    let mut decl = NotationDecl::new(qname.clone(), &doc.name);
                    if let Some(public_id) = &raw.public_id {
                        decl = decl.with_public_id(public_id);
                    }
                    if let Some(system_id) = &raw.system_id {
                        decl = decl.with_system_id(system_id);
                    }
                    self.define_component(qname, Component::Notation(decl));
                }
            }
        }
        Ok(())
    }

    /// Claim a slot for a named global component
    ///
    /// A name already defined by this batch, or carried over from the
    /// base build, keeps its slot; the payload is replaced in place.
    /// Anything the replaced payload owned privately (anonymous inline
    /// types, identity constraints) is vacated along with it unless the
    /// incoming definitions reclaimed it.
    fn define_component(&mut self, name: QName, payload: Component) -> ComponentId {
        let space = payload.kind().symbol_space();
        let payload = Arc::new(payload);
        if let Some(id) = self.table.lookup(&name, space) {
            self.replace_slot(id, payload);
            return id;
        }
        if let Some(id) = self
            .base_table
            .and_then(|base| base.lookup(&name, space))
        {
            self.replace_slot(id, payload);
            self.vacated.remove(&id);
            self.table.define(name, space, id);
            return id;
        }
        let id = self.arena.alloc(payload, ResolutionState::Unresolved);
        self.touched.insert(id);
        self.table.define(name, space, id);
        self.worklist.insert(id);
        id
    }

    fn replace_slot(&mut self, id: ComponentId, payload: Arc<Component>) {
        let old = self.arena.get(id).cloned();
        self.arena.replace(id, payload);
        self.touched.insert(id);
        self.worklist.insert(id);
        if let Some(old) = old {
            self.vacate_orphans(&old);
        }
    }

    /// Vacate slots only the replaced payload could reach
    ///
    /// References without a recorded name were bound at definition time
    /// and name nothing in any table; once their owner is gone the
    /// slots they point at are unreachable. The sweep runs after the
    /// replacement payload is installed, so a slot the batch reclaimed
    /// by name (a constraint of the redefined element, or of another
    /// element that took the name over) still has a live holder and
    /// stays. Defaulted types point at built-in slots, which stay.
    fn vacate_orphans(&mut self, old: &Arc<Component>) {
        let mut ids = Vec::new();
        old.for_each_ref(&mut |_, r| {
            if r.name.is_none() {
                if let Some(id) = r.resolved_id() {
                    ids.push(id);
                }
            }
        });
        if let Some(element) = old.as_element() {
            ids.extend(element.identity_constraints.iter().copied());
        }
        for id in ids {
            let Some(payload) = self.arena.get(id) else {
                continue;
            };
            if payload.source_name() == BUILTIN_SOURCE {
                continue;
            }
            if self.has_live_holder(id) {
                continue;
            }
            let payload = payload.clone();
            self.arena.vacate(id);
            self.vacated.insert(id);
            self.worklist.shift_remove(&id);
            self.vacate_orphans(&payload);
        }
    }

    /// Whether any live component holds a definition-time binding to the slot
    fn has_live_holder(&self, id: ComponentId) -> bool {
        self.arena.iter().any(|(_, component, _)| {
            let mut held = false;
            component.for_each_ref(&mut |_, r| {
                if r.name.is_none() && r.resolved_id() == Some(id) {
                    held = true;
                }
            });
            if !held {
                if let Some(element) = component.as_element() {
                    held = element.identity_constraints.contains(&id);
                }
            }
            held
        })
    }

    /// Allocate a slot for an anonymous inline type
    fn alloc_anonymous(&mut self, payload: Component) -> ComponentId {
        let id = self
            .arena
            .alloc(Arc::new(payload), ResolutionState::Unresolved);
        self.touched.insert(id);
        self.worklist.insert(id);
        id
    }

    /// Allocate a slot for an identity constraint
    ///
    /// Constraints are not entered into the name table here; their
    /// names register when the owning element's body is resolved. The
    /// slot itself is still reclaimed by name so constraint identity
    /// survives redefinition of the owning element. A base slot is
    /// reclaimed at most once per batch; a second constraint claiming
    /// the same name gets its own slot and the collision surfaces when
    /// the names register.
    fn alloc_identity(&mut self, name: &QName, payload: Component) -> ComponentId {
        if let Some(id) = self
            .base_table
            .and_then(|base| base.lookup(name, SymbolSpace::IdentityConstraint))
        {
            if !self.touched.contains(&id) {
                self.replace_slot(id, Arc::new(payload));
                self.vacated.remove(&id);
                return id;
            }
        }
        let id = self
            .arena
            .alloc(Arc::new(payload), ResolutionState::Unresolved);
        self.touched.insert(id);
        self.worklist.insert(id);
        id
    }

    // ========== Lowering ==========

    fn lower_simple_type(
        &self,
        doc: &ParsedDocument,
        name: Option<QName>,
        raw: &RawSimpleType,
    ) -> SimpleTypeDef {
        match &raw.derivation {
            RawSimpleDerivation::Restriction { base } => {
                SimpleTypeDef::restriction(name, &doc.name, ComponentRef::named(base.clone()))
            }
            RawSimpleDerivation::List { item } => {
                SimpleTypeDef::list(name, &doc.name, ComponentRef::named(item.clone()))
            }
            RawSimpleDerivation::Union { members } => SimpleTypeDef::union(
                name,
                &doc.name,
                members
                    .iter()
                    .map(|member| ComponentRef::named(member.clone()))
                    .collect(),
            ),
        }
    }

    fn lower_complex_type(
        &mut self,
        doc: &ParsedDocument,
        name: Option<QName>,
        raw: &RawComplexType,
    ) -> Result<ComplexTypeDef> {
        self.limits.check_particle_depth(raw.content.depth())?;
        let mut def = match &raw.derivation {
            RawComplexDerivation::None => ComplexTypeDef::new(name, &doc.name),
            RawComplexDerivation::Extension { base } => {
                ComplexTypeDef::extension(name, &doc.name, ComponentRef::named(base.clone()))
            }
            RawComplexDerivation::Restriction { base } => {
                ComplexTypeDef::restriction(name, &doc.name, ComponentRef::named(base.clone()))
            }
        };
        let content = match self.lower_particle(doc, &raw.content)? {
            Particle::Group(group) => group,
            particle => ModelGroup::new(Compositor::Sequence, vec![particle]),
        };
        def = def.with_content(content).with_mixed(raw.mixed);
        for attribute in &raw.attributes {
            def = def.with_use(self.lower_attribute_use(doc, attribute)?);
        }
        for group in &raw.attribute_groups {
            def = def.with_group(ComponentRef::named(group.clone()));
        }
        Ok(def)
    }

    fn lower_particle(&mut self, doc: &ParsedDocument, raw: &RawParticle) -> Result<Particle> {
        match raw {
            RawParticle::Sequence { particles, occurs } => {
                let children = self.lower_particles(doc, particles)?;
                Ok(Particle::Group(
                    ModelGroup::new(Compositor::Sequence, children).with_occurs(*occurs),
                ))
            }
            RawParticle::Choice { particles, occurs } => {
                let children = self.lower_particles(doc, particles)?;
                Ok(Particle::Group(
                    ModelGroup::new(Compositor::Choice, children).with_occurs(*occurs),
                ))
            }
            RawParticle::All { particles, occurs } => {
                let children = self.lower_particles(doc, particles)?;
                Ok(Particle::Group(
                    ModelGroup::new(Compositor::All, children).with_occurs(*occurs),
                ))
            }
            RawParticle::Element {
                name,
                type_ref,
                occurs,
            } => {
                let qname = self.prepare_name(doc, name)?;
                let type_ref = self.lower_type_ref(doc, type_ref.as_ref(), ANY_TYPE_ID)?;
                Ok(Particle::Element(
                    ElementParticle::new(qname, type_ref).with_occurs(*occurs),
                ))
            }
            RawParticle::ElementRef { reference, occurs } => Ok(Particle::ElementRef {
                reference: ComponentRef::named(reference.clone()),
                occurs: *occurs,
            }),
            RawParticle::GroupRef { reference, occurs } => Ok(Particle::GroupRef {
                reference: ComponentRef::named(reference.clone()),
                occurs: *occurs,
            }),
            RawParticle::Wildcard { occurs } => Ok(Particle::Wildcard { occurs: *occurs }),
        }
    }

    fn lower_particles(
        &mut self,
        doc: &ParsedDocument,
        raws: &[RawParticle],
    ) -> Result<Vec<Particle>> {
        raws.iter()
            .map(|raw| self.lower_particle(doc, raw))
            .collect()
    }

    /// Lower a declared type: named, inline anonymous, or defaulted
    fn lower_type_ref(
        &mut self,
        doc: &ParsedDocument,
        raw: Option<&RawTypeRef>,
        default_id: ComponentId,
    ) -> Result<ComponentRef> {
        match raw {
            None => Ok(ComponentRef::fixed(default_id)),
            Some(RawTypeRef::Named(qname)) => Ok(ComponentRef::named(qname.clone())),
            Some(RawTypeRef::InlineSimple(raw)) => {
                if raw.name.is_some() {
                    return Err(Self::source_error(doc, "inline type must not carry a name"));
                }
                let def = self.lower_simple_type(doc, None, raw);
                let id = self.alloc_anonymous(Component::SimpleType(def));
                Ok(ComponentRef::fixed(id))
            }
            Some(RawTypeRef::InlineComplex(raw)) => {
                if raw.name.is_some() {
                    return Err(Self::source_error(doc, "inline type must not carry a name"));
                }
                let def = self.lower_complex_type(doc, None, raw)?;
                let id = self.alloc_anonymous(Component::ComplexType(def));
                Ok(ComponentRef::fixed(id))
            }
        }
    }

    fn lower_attribute_type(
        &mut self,
        doc: &ParsedDocument,
        raw: &RawAttribute,
    ) -> Result<ComponentRef> {
        match (&raw.type_name, &raw.inline_type) {
            (Some(_), Some(_)) => Err(Self::source_error(
                doc,
                format!(
                    "attribute '{}' declares both a named and an inline type",
                    raw.name
                ),
            )),
            (Some(qname), None) => Ok(ComponentRef::named(qname.clone())),
            (None, Some(inline)) => {
                if inline.name.is_some() {
                    return Err(Self::source_error(doc, "inline type must not carry a name"));
                }
                let def = self.lower_simple_type(doc, None, inline);
                let id = self.alloc_anonymous(Component::SimpleType(def));
                Ok(ComponentRef::fixed(id))
            }
            (None, None) => Ok(ComponentRef::fixed(ANY_SIMPLE_TYPE_ID)),
        }
    }

    fn lower_attribute_use(
        &mut self,
        doc: &ParsedDocument,
        raw: &RawAttributeUse,
    ) -> Result<AttributeUse> {
        if raw.default.is_some() && raw.fixed.is_some() {
            return Err(Self::source_error(
                doc,
                "attribute use declares both a default and a fixed value",
            ));
        }
        let mut attribute_use = match &raw.term {
            RawAttributeTerm::Ref(qname) => AttributeUse::reference(ComponentRef::named(qname.clone())),
            RawAttributeTerm::Local(attribute) => {
                let qname = self.prepare_name(doc, &attribute.name)?;
                let type_ref = self.lower_attribute_type(doc, attribute)?;
                AttributeUse::local(qname, type_ref)
            }
        };
        attribute_use = attribute_use.with_required(raw.required);
        if let Some(default) = &raw.default {
            attribute_use = attribute_use.with_default(default);
        }
        if let Some(fixed) = &raw.fixed {
            attribute_use = attribute_use.with_fixed(fixed);
        }
        Ok(attribute_use)
    }

    fn lower_model_group(
        &mut self,
        doc: &ParsedDocument,
        raw: &RawModelGroup,
    ) -> Result<ModelGroupDef> {
        let qname = self.prepare_name(doc, &raw.name)?;
        if !raw.particle.is_compositor() {
            return Err(Error::Source(
                SourceError::new("model group content must be a compositor")
                    .with_source_name(&doc.name)
                    .with_component(qname.to_string()),
            ));
        }
        self.limits.check_particle_depth(raw.particle.depth())?;
        let group = match self.lower_particle(doc, &raw.particle)? {
            Particle::Group(group) => group,
            particle => ModelGroup::new(Compositor::Sequence, vec![particle]),
        };
        Ok(ModelGroupDef::new(qname, &doc.name, group))
    }

    fn lower_element(&mut self, doc: &ParsedDocument, raw: &RawElement) -> Result<ElementDecl> {
        let qname = self.prepare_name(doc, &raw.name)?;
        let type_ref = self.lower_type_ref(doc, raw.type_ref.as_ref(), ANY_TYPE_ID)?;
        let mut decl = ElementDecl::new(qname, &doc.name, type_ref)
            .with_nillable(raw.nillable)
            .with_abstract(raw.abstract_element);
        if let Some(head) = &raw.substitution_group {
            decl = decl.with_substitution_group(ComponentRef::named(head.clone()));
        }
        let mut constraint_ids = Vec::with_capacity(raw.constraints.len());
        let mut constraint_names = HashSet::new();
        for constraint in &raw.constraints {
            if !constraint_names.insert(constraint.name.as_str()) {
                return Err(Error::Source(
                    SourceError::new("duplicate identity constraint name on one element")
                        .with_source_name(&doc.name)
                        .with_component(&constraint.name),
                ));
            }
            constraint_ids.push(self.lower_identity_constraint(doc, constraint)?);
        }
        Ok(decl.with_identity_constraints(constraint_ids))
    }

    fn lower_identity_constraint(
        &mut self,
        doc: &ParsedDocument,
        raw: &RawIdentityConstraint,
    ) -> Result<ComponentId> {
        let qname = self.prepare_name(doc, &raw.name)?;
        let def = match raw.kind {
            IdentityKind::Key | IdentityKind::Unique => {
                if raw.refer.is_some() {
                    return Err(Error::Source(
                        SourceError::new("only a keyref may refer to another constraint")
                            .with_source_name(&doc.name)
                            .with_component(qname.to_string()),
                    ));
                }
                match raw.kind {
                    IdentityKind::Key => IdentityConstraintDef::key(
                        qname.clone(),
                        &doc.name,
                        &raw.selector,
                        raw.fields.clone(),
                    ),
                    _ => IdentityConstraintDef::unique(
                        qname.clone(),
                        &doc.name,
                        &raw.selector,
                        raw.fields.clone(),
                    ),
                }
            }
            IdentityKind::KeyRef => {
                let refer = raw.refer.as_ref().ok_or_else(|| {
                    Error::Source(
                        SourceError::new("keyref is missing a referenced constraint")
                            .with_source_name(&doc.name)
                            .with_component(qname.to_string()),
                    )
                })?;
                IdentityConstraintDef::keyref(
                    qname.clone(),
                    &doc.name,
                    &raw.selector,
                    raw.fields.clone(),
                    ComponentRef::named(refer.clone()),
                )
            }
        };
        Ok(self.alloc_identity(&qname, Component::IdentityConstraint(def)))
    }

    // ========== Resolution ==========

    /// Resolve every component this build defined or disturbed
    ///
    /// First pass walks the worklist in definition order, descending
    /// base-type edges depth-first so derivation chains resolve bottom
    /// up and loops surface as fatal cycles. A second flat pass
    /// re-attempts names that registered during the first (identity
    /// constraint names appear when their element resolves). Whatever
    /// is still pending afterwards is substituted with a fallback.
    pub(crate) fn resolve_all(&mut self) -> Result<()> {
        self.mark_carryover_reattempts();
        let worklist: Vec<ComponentId> = self.worklist.iter().copied().collect();
        debug!(components = worklist.len(), "resolving");
        for id in &worklist {
            self.visit(*id, 0)?;
        }
        for id in &worklist {
            self.resolve_flat(*id)?;
        }
        self.apply_fallbacks(&worklist);
        Ok(())
    }

    /// Pull carried-over components that need another attempt onto the
    /// worklist
    ///
    /// A carried component re-attempts when its previous build left it
    /// unresolved, or when any of its references points at a slot this
    /// build replaced or vacated. Its named references are reset so
    /// stale outcomes cannot survive a redefinition.
    fn mark_carryover_reattempts(&mut self) {
        let mut marked = Vec::new();
        for (id, component, state) in self.arena.iter() {
            if self.worklist.contains(&id) {
                continue;
            }
            if component.source_name() == BUILTIN_SOURCE {
                continue;
            }
            let mut needs = state != ResolutionState::Resolved;
            if !needs {
                component.for_each_ref(&mut |_, r| {
                    if needs {
                        return;
                    }
                    if let Some(target) = r.resolved_id() {
                        if self.touched.contains(&target) || self.vacated.contains(&target) {
                            needs = true;
                        }
                    }
                });
            }
            if needs {
                marked.push(id);
            }
        }
        if !marked.is_empty() {
            debug!(count = marked.len(), "re-attempting carried-over components");
        }
        for id in marked {
            let Some(arc) = self.arena.get(id) else {
                continue;
            };
            let mut payload = (**arc).clone();
            payload.for_each_ref_mut(&mut |_, r| r.reset_for_reattempt());
            self.arena.replace(id, Arc::new(payload));
            self.worklist.insert(id);
        }
    }

    /// Resolve one component, descending base-type edges
    fn visit(&mut self, id: ComponentId, depth: usize) -> Result<()> {
        self.limits.check_derivation_depth(depth)?;
        if self.arena.state(id) != Some(ResolutionState::Unresolved) {
            return Ok(());
        }
        self.register_identities(id);
        self.arena.set_state(id, ResolutionState::Resolving);
        let display = self
            .arena
            .get(id)
            .map(|c| c.display_name())
            .unwrap_or_default();
        self.chain.push(display);
        let result = self.resolve_body(id, depth);
        self.chain.pop();
        result?;
        let pending = self
            .arena
            .get(id)
            .map(|c| c.has_pending_refs())
            .unwrap_or(false);
        self.arena.set_state(
            id,
            if pending {
                ResolutionState::Unresolved
            } else {
                ResolutionState::Resolved
            },
        );
        Ok(())
    }

    /// Enter an element's identity constraint names into the table
    ///
    /// Constraint names share one symbol space. When a second element
    /// claims a name this batch already registered, the later writer
    /// holds the name for lookups and keyref targets; both constraints
    /// stay attached to their elements and a warning records the
    /// collision.
    fn register_identities(&mut self, id: ComponentId) {
        let entries: Vec<(QName, String, ComponentId)> = {
            let Some(component) = self.arena.get(id) else {
                return;
            };
            let Some(element) = component.as_element() else {
                return;
            };
            element
                .identity_constraints
                .iter()
                .filter_map(|cid| {
                    self.arena
                        .get(*cid)
                        .and_then(|c| c.as_identity_constraint())
                        .map(|ic| (ic.name.clone(), ic.source_name.clone(), *cid))
                })
                .collect()
        };
        for (qname, source_name, cid) in entries {
            if let Some(existing) = self.table.lookup(&qname, SymbolSpace::IdentityConstraint) {
                if existing != cid {
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticCode::DuplicateIdentityName,
                        SourceLocation::new(source_name, Some(qname.to_string())),
                        "identity constraint name is already declared by another element; \
                         the later declaration wins lookups",
                    ));
                }
            }
            self.table
                .define(qname, SymbolSpace::IdentityConstraint, cid);
        }
    }

    fn resolve_body(&mut self, id: ComponentId, depth: usize) -> Result<()> {
        let snapshot = self.pending_refs(id);
        if snapshot.is_empty() {
            return Ok(());
        }
        let source_name = self
            .arena
            .get(id)
            .map(|c| c.source_name().to_string())
            .unwrap_or_default();
        let mut outcomes = Vec::with_capacity(snapshot.len());
        for (kind, name) in &snapshot {
            let resolution = self.resolve_name(name, *kind, &source_name)?;
            if *kind == RefKind::BaseType {
                if let Resolution::Resolved(target) = resolution {
                    self.visit(target, depth + 1)?;
                }
            }
            outcomes.push(resolution);
        }
        self.apply_outcomes(id, &outcomes);
        Ok(())
    }

    /// One flat re-attempt at still-pending references
    fn resolve_flat(&mut self, id: ComponentId) -> Result<()> {
        if self.arena.state(id) != Some(ResolutionState::Unresolved) {
            return Ok(());
        }
        let snapshot = self.pending_refs(id);
        if snapshot.is_empty() {
            return Ok(());
        }
        let source_name = self
            .arena
            .get(id)
            .map(|c| c.source_name().to_string())
            .unwrap_or_default();
        let mut outcomes = Vec::with_capacity(snapshot.len());
        for (kind, name) in &snapshot {
            outcomes.push(self.resolve_name(name, *kind, &source_name)?);
        }
        self.apply_outcomes(id, &outcomes);
        let pending = self
            .arena
            .get(id)
            .map(|c| c.has_pending_refs())
            .unwrap_or(false);
        if !pending {
            self.arena.set_state(id, ResolutionState::Resolved);
        }
        Ok(())
    }

    /// Snapshot the still-pending named references of a component
    fn pending_refs(&self, id: ComponentId) -> Vec<(RefKind, QName)> {
        let mut refs = Vec::new();
        if let Some(component) = self.arena.get(id) {
            component.for_each_ref(&mut |kind, r| {
                if r.is_pending() {
                    if let Some(name) = &r.name {
                        refs.push((kind, name.clone()));
                    }
                }
            });
        }
        refs
    }

    fn resolve_name(&self, name: &QName, kind: RefKind, source_name: &str) -> Result<Resolution> {
        let context = ResolveContext {
            new_layer: &self.table,
            base_layer: self.base_table,
            vacated: &self.vacated,
            arena: &self.arena,
        };
        let resolution = match context.resolve(name, kind) {
            Ok(resolution) => resolution,
            Err(Error::Cycle(cycle)) => {
                return Err(Error::Cycle(
                    cycle
                        .with_chain(self.chain.clone())
                        .with_source_name(source_name),
                ));
            }
            Err(other) => return Err(other),
        };
        // A keyref may only target a key or unique constraint.
        if kind == RefKind::KeyrefTarget {
            if let Resolution::Resolved(target) = resolution {
                let is_key_or_unique = self
                    .arena
                    .get(target)
                    .and_then(|c| c.as_identity_constraint())
                    .map(|ic| !ic.is_keyref())
                    .unwrap_or(false);
                if !is_key_or_unique {
                    return Ok(Resolution::Unresolved(UnresolvedReason::NotFound));
                }
            }
        }
        Ok(resolution)
    }

    /// Record resolved targets back onto the pending references
    ///
    /// The outcome list is aligned with [`GraphBuilder::pending_refs`];
    /// both walks visit references in the same order. Misses stay
    /// pending so later passes can try again.
    fn apply_outcomes(&mut self, id: ComponentId, outcomes: &[Resolution]) {
        let Some(arc) = self.arena.get_mut(id) else {
            return;
        };
        let payload = Arc::make_mut(arc);
        let mut index = 0;
        payload.for_each_ref_mut(&mut |_, r| {
            if r.is_pending() && r.name.is_some() {
                if let Some(Resolution::Resolved(target)) = outcomes.get(index) {
                    r.target = ResolvedTo::Component(*target);
                }
                index += 1;
            }
        });
    }

    /// Substitute fallbacks for references that never resolved
    fn apply_fallbacks(&mut self, ids: &[ComponentId]) {
        for id in ids {
            let Some(arc) = self.arena.get(*id).cloned() else {
                continue;
            };
            if !arc.has_pending_refs() {
                continue;
            }
            let owner_kind = arc.kind();
            let owner_display = arc.display_name();
            let owner_source = arc.source_name().to_string();
            let mut substitutions = Vec::new();
            arc.for_each_ref(&mut |kind, r| {
                if r.is_pending() {
                    if let Some(name) = &r.name {
                        substitutions.push(fallback::substitute(
                            kind,
                            owner_kind,
                            &owner_display,
                            &owner_source,
                            name,
                        ));
                    }
                }
            });
            if let Some(arc) = self.arena.get_mut(*id) {
                let payload = Arc::make_mut(arc);
                let mut index = 0;
                payload.for_each_ref_mut(&mut |_, r| {
                    if r.is_pending() && r.name.is_some() {
                        if let Some((target, _)) = substitutions.get(index) {
                            r.target = *target;
                        }
                        index += 1;
                    }
                });
            }
            for (_, diagnostic) in substitutions {
                self.diagnostics.push(diagnostic);
            }
            let resolved = self
                .arena
                .get(*id)
                .map(|c| !c.has_failed_refs())
                .unwrap_or(false);
            self.arena.set_state(
                *id,
                if resolved {
                    ResolutionState::Resolved
                } else {
                    ResolutionState::Unresolved
                },
            );
        }
    }

    // ========== Assembly ==========

    /// Assemble the finished type system
    pub(crate) fn finish(self, name: impl Into<String>) -> SchemaTypeSystem {
        let substitution_groups = self.collect_substitution_groups();
        let table = self.merged_table();
        SchemaTypeSystem::assemble(
            name.into(),
            self.arena,
            table,
            self.diagnostics,
            substitution_groups,
        )
    }

    /// Map each substitution group head to its member elements
    ///
    /// Membership is transitive: a member of a member substitutes for
    /// the outer head too. Heads whose reference never resolved
    /// contribute nothing. Cyclic head chains stop where they close.
    fn collect_substitution_groups(&self) -> IndexMap<QName, Vec<ComponentId>> {
        let mut groups: IndexMap<QName, Vec<ComponentId>> = IndexMap::new();
        for (id, component, _) in self.arena.iter() {
            let Some(element) = component.as_element() else {
                continue;
            };
            let mut seen = HashSet::new();
            seen.insert(id);
            let mut head_id = element.substitution_head_id();
            while let Some(hid) = head_id {
                if !seen.insert(hid) {
                    break;
                }
                let Some(head) = self.arena.get(hid).and_then(|c| c.as_element()) else {
                    break;
                };
                groups.entry(head.name.clone()).or_default().push(id);
                head_id = head.substitution_head_id();
            }
        }
        groups
    }

    /// Merge the carried-over table with this build's definitions
    ///
    /// Base entries pointing at vacated or dead slots are dropped;
    /// entries this build defined shadow the rest. Iteration order is
    /// carried-over definitions first, new definitions after.
    fn merged_table(&self) -> ComponentTable {
        let mut merged = ComponentTable::new();
        if let Some(base) = self.base_table {
            for (qname, space, id) in base.iter() {
                if self.vacated.contains(&id) || self.arena.is_vacant(id) {
                    continue;
                }
                merged.define(qname.clone(), space, id);
            }
        }
        for (qname, space, id) in self.table.iter() {
            merged.define(qname.clone(), space, id);
        }
        merged
    }
}
