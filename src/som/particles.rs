//! Particles and content models
//!
//! A complex type's content is a tree of particles rooted at a model
//! group. Particles that reference other global components (element
//! references, named group references, local element types) carry
//! [`ComponentRef`] cells; the tree itself owns no components.

use std::fmt;

use super::base::{ComponentRef, RefKind};
use crate::namespaces::QName;

// ========== Occurs ==========

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Empty (0, 0)
    pub fn empty() -> Self {
        Self { min: 0, max: Some(0) }
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this particle is empty (maxOccurs == 0)
    pub fn is_empty(&self) -> bool {
        self.max == Some(0)
    }

    /// Check if particle has maxOccurs == 1
    pub fn is_single(&self) -> bool {
        self.max == Some(1)
    }

    /// Check if particle can have multiple occurrences
    pub fn is_multiple(&self) -> bool {
        !self.is_empty() && !self.is_single()
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

// ========== Compositor ==========

/// Model group compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compositor {
    /// Ordered sequence of particles
    Sequence,
    /// Exactly one of the particles
    Choice,
    /// All particles in any order
    All,
}

impl Compositor {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Compositor::Sequence => "sequence",
            Compositor::Choice => "choice",
            Compositor::All => "all",
        }
    }
}

impl fmt::Display for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Particles ==========

/// A compositor node holding child particles
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup {
    /// How the children combine
    pub compositor: Compositor,
    /// Child particles in document order
    pub particles: Vec<Particle>,
    /// Occurrence bounds of the group itself
    pub occurs: Occurs,
}

impl ModelGroup {
    /// Create a group with the given compositor and children
    pub fn new(compositor: Compositor, particles: Vec<Particle>) -> Self {
        Self {
            compositor,
            particles,
            occurs: Occurs::once(),
        }
    }

    /// Empty sequence; the content model of a type with no children
    pub fn empty() -> Self {
        Self::new(Compositor::Sequence, Vec::new())
    }

    /// Set the occurrence bounds
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }

    /// Whether the group has no child particles
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Check if this group can match empty content
    ///
    /// References are judged by their occurrence bounds only; what the
    /// referenced group expands to is not consulted here.
    pub fn is_emptiable(&self) -> bool {
        if self.occurs.is_emptiable() || self.is_empty() {
            return true;
        }
        match self.compositor {
            Compositor::Choice => self.particles.iter().any(Particle::is_emptiable),
            Compositor::Sequence | Compositor::All => {
                self.particles.iter().all(Particle::is_emptiable)
            }
        }
    }

    /// Visit every reference in the subtree, in document order
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        for particle in &self.particles {
            particle.for_each_ref(f);
        }
    }

    /// Mutable counterpart of [`ModelGroup::for_each_ref`]; same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        for particle in &mut self.particles {
            particle.for_each_ref_mut(f);
        }
    }
}

/// A local element declaration appearing directly in a content model
#[derive(Debug, Clone, PartialEq)]
pub struct ElementParticle {
    /// Name the element appears under in instances
    pub name: QName,
    /// Declared type of the local element
    pub type_ref: ComponentRef,
    /// Occurrence bounds
    pub occurs: Occurs,
}

impl ElementParticle {
    /// Create a local element particle
    pub fn new(name: QName, type_ref: ComponentRef) -> Self {
        Self {
            name,
            type_ref,
            occurs: Occurs::once(),
        }
    }

    /// Set the occurrence bounds
    pub fn with_occurs(mut self, occurs: Occurs) -> Self {
        self.occurs = occurs;
        self
    }
}

/// One node of a content model tree
#[derive(Debug, Clone, PartialEq)]
pub enum Particle {
    /// Local element declaration
    Element(ElementParticle),
    /// Reference to a global element declaration
    ElementRef {
        /// The referenced global element
        reference: ComponentRef,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Reference to a named model group
    GroupRef {
        /// The referenced group definition
        reference: ComponentRef,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Wildcard accepting any element
    Wildcard {
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Nested compositor
    Group(ModelGroup),
}

impl Particle {
    /// Occurrence bounds of this particle
    pub fn occurs(&self) -> Occurs {
        match self {
            Particle::Element(e) => e.occurs,
            Particle::ElementRef { occurs, .. }
            | Particle::GroupRef { occurs, .. }
            | Particle::Wildcard { occurs } => *occurs,
            Particle::Group(g) => g.occurs,
        }
    }

    /// Check if this particle can match empty content
    pub fn is_emptiable(&self) -> bool {
        match self {
            Particle::Group(g) => g.is_emptiable(),
            _ => self.occurs().is_emptiable(),
        }
    }

    /// Visit every reference in the subtree, in document order
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        match self {
            Particle::Element(e) => f(RefKind::ElementType, &e.type_ref),
            Particle::ElementRef { reference, .. } => f(RefKind::ElementRef, reference),
            Particle::GroupRef { reference, .. } => f(RefKind::ModelGroupRef, reference),
            Particle::Wildcard { .. } => {}
            Particle::Group(g) => g.for_each_ref(f),
        }
    }

    /// Mutable counterpart of [`Particle::for_each_ref`]; same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        match self {
            Particle::Element(e) => f(RefKind::ElementType, &mut e.type_ref),
            Particle::ElementRef { reference, .. } => f(RefKind::ElementRef, reference),
            Particle::GroupRef { reference, .. } => f(RefKind::ModelGroupRef, reference),
            Particle::Wildcard { .. } => {}
            Particle::Group(g) => g.for_each_ref_mut(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::som::base::ResolvedTo;

    #[test]
    fn test_occurs_presets() {
        assert_eq!(Occurs::once(), Occurs::new(1, Some(1)));
        assert_eq!(Occurs::optional(), Occurs::new(0, Some(1)));
        assert_eq!(Occurs::zero_or_more(), Occurs::new(0, None));
        assert_eq!(Occurs::one_or_more(), Occurs::new(1, None));
        assert_eq!(Occurs::empty(), Occurs::new(0, Some(0)));
    }

    #[test]
    fn test_occurs_predicates() {
        let optional = Occurs::optional();
        assert!(optional.is_emptiable());
        assert!(!optional.is_empty());
        assert!(optional.is_single());
        assert!(!optional.is_multiple());

        let unbounded = Occurs::zero_or_more();
        assert!(unbounded.is_emptiable());
        assert!(unbounded.is_multiple());

        let empty = Occurs::empty();
        assert!(empty.is_emptiable());
        assert!(empty.is_empty());
    }

    fn local_elem(name: &str) -> Particle {
        Particle::Element(ElementParticle::new(
            QName::local(name),
            ComponentRef::named(QName::local("t")),
        ))
    }

    #[test]
    fn test_group_emptiable() {
        let seq = ModelGroup::new(Compositor::Sequence, vec![local_elem("a"), local_elem("b")]);
        assert!(!seq.is_emptiable());

        let optional_seq = seq.clone().with_occurs(Occurs::optional());
        assert!(optional_seq.is_emptiable());

        let choice = ModelGroup::new(
            Compositor::Choice,
            vec![
                local_elem("a"),
                Particle::Wildcard {
                    occurs: Occurs::optional(),
                },
            ],
        );
        assert!(choice.is_emptiable());

        assert!(ModelGroup::empty().is_emptiable());
    }

    #[test]
    fn test_ref_walk_order() {
        let group = ModelGroup::new(
            Compositor::Sequence,
            vec![
                local_elem("first"),
                Particle::ElementRef {
                    reference: ComponentRef::named(QName::local("second")),
                    occurs: Occurs::once(),
                },
                Particle::Group(ModelGroup::new(
                    Compositor::Choice,
                    vec![Particle::GroupRef {
                        reference: ComponentRef::named(QName::local("third")),
                        occurs: Occurs::once(),
                    }],
                )),
            ],
        );

        let mut kinds = Vec::new();
        group.for_each_ref(&mut |kind, _| kinds.push(kind));
        assert_eq!(
            kinds,
            vec![RefKind::ElementType, RefKind::ElementRef, RefKind::ModelGroupRef]
        );
    }

    #[test]
    fn test_ref_walk_mut_matches_immutable_order() {
        let mut group = ModelGroup::new(
            Compositor::Sequence,
            vec![local_elem("a"), local_elem("b")],
        );

        let mut count = 0;
        group.for_each_ref_mut(&mut |_, r| {
            r.target = ResolvedTo::Unresolved;
            count += 1;
        });
        assert_eq!(count, 2);

        let mut seen = 0;
        group.for_each_ref(&mut |_, r| {
            assert_eq!(r.target, ResolvedTo::Unresolved);
            seen += 1;
        });
        assert_eq!(seen, count);
    }
}
