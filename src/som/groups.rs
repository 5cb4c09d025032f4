//! Named model group definitions

use super::base::{ComponentRef, RefKind};
use super::particles::ModelGroup;
use crate::namespaces::QName;

/// A named, reusable model group
///
/// Group references in content models expand to this definition at query
/// time; redefining the group in a later build therefore changes every
/// referencing content model without touching the referencing components.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroupDef {
    /// Qualified name of the group
    pub name: QName,
    /// Logical name of the supplying document
    pub source_name: String,
    /// The group's particle tree
    pub group: ModelGroup,
}

impl ModelGroupDef {
    /// Create a named model group definition
    pub fn new(name: QName, source_name: impl Into<String>, group: ModelGroup) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            group,
        }
    }

    /// Visit every reference this definition directly holds
    pub fn for_each_ref(&self, f: &mut dyn FnMut(RefKind, &ComponentRef)) {
        self.group.for_each_ref(f);
    }

    /// Mutable counterpart of [`ModelGroupDef::for_each_ref`]; same order
    pub fn for_each_ref_mut(&mut self, f: &mut dyn FnMut(RefKind, &mut ComponentRef)) {
        self.group.for_each_ref_mut(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::som::particles::{Compositor, ElementParticle, Particle};

    #[test]
    fn test_definition_walks_particles() {
        let def = ModelGroupDef::new(
            QName::local("nameGroup"),
            "doc.xsd",
            ModelGroup::new(
                Compositor::Sequence,
                vec![
                    Particle::Element(ElementParticle::new(
                        QName::local("first"),
                        ComponentRef::named(QName::local("t")),
                    )),
                    Particle::ElementRef {
                        reference: ComponentRef::named(QName::local("last")),
                        occurs: crate::som::particles::Occurs::once(),
                    },
                ],
            ),
        );

        let mut kinds = Vec::new();
        def.for_each_ref(&mut |k, _| kinds.push(k));
        assert_eq!(kinds, vec![RefKind::ElementType, RefKind::ElementRef]);
    }
}
