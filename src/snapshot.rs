//! Serializable snapshot of a schema type system
//!
//! A snapshot captures the user-visible components of a type system in
//! a path-independent form: entries are sorted by qualified name,
//! references are recorded by the name of their target, and references
//! that never resolved render the same way however the build arrived
//! at them. Two compositions that end up with the same components
//! produce equal snapshots, which is what the equivalence tests and
//! the save format rely on.
//!
//! Built-in types and the system's own name are not part of the
//! snapshot; neither are diagnostics, which describe a build rather
//! than its result.

use serde::{Deserialize, Serialize};

use crate::som::attributes::{AttributeTerm, AttributeUse};
use crate::som::base::{Component, ComponentRef, ResolutionState, ResolvedTo};
use crate::som::complex_types::{ComplexDerivation, ComplexTypeDef};
use crate::som::particles::{ModelGroup, Occurs, Particle};
use crate::som::simple_types::{SimpleDerivation, SimpleTypeDef};
use crate::som::system::SchemaTypeSystem;

/// Complete snapshot of the user-defined components of a type system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StsSnapshot {
    /// Named type definitions, sorted by qualified name
    pub types: Vec<TypeSnapshot>,

    /// Global element declarations, sorted by qualified name
    pub elements: Vec<ElementSnapshot>,

    /// Global attribute declarations, sorted by qualified name
    pub attributes: Vec<AttributeSnapshot>,

    /// Named model group definitions, sorted by qualified name
    pub model_groups: Vec<ModelGroupSnapshot>,

    /// Named attribute group definitions, sorted by qualified name
    pub attribute_groups: Vec<AttributeGroupSnapshot>,

    /// Notation declarations, sorted by qualified name
    pub notations: Vec<NotationSnapshot>,
}

/// One type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeSnapshot {
    /// Qualified name; None for anonymous inline types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// "simple" or "complex"
    pub variety: String,

    /// Derivation method
    pub derivation: String,

    /// Base type for restrictions and extensions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<TypeRefSnapshot>,

    /// Item type for lists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<TypeRefSnapshot>,

    /// Member types for unions
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub members: Vec<TypeRefSnapshot>,

    /// Whether character content may mix with child elements
    pub mixed: bool,

    /// Content model; None for simple types and empty content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ParticleSnapshot>,

    /// Attribute uses declared directly on the type
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attributes: Vec<AttributeUseSnapshot>,

    /// Names of attribute groups the type references
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attribute_groups: Vec<String>,
}

/// How a reference to a type renders
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeRefSnapshot {
    /// Qualified name of the target type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Inline definition for anonymous targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<Box<TypeSnapshot>>,

    /// Whether the reference resolved to a real definition
    ///
    /// False means the named type was missing and a universal type
    /// stands in; `name` then carries the stand-in's name.
    pub resolved: bool,
}

/// One global element declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementSnapshot {
    /// Qualified name ({namespace}localName format)
    pub name: String,

    /// Declared type of the element
    #[serde(rename = "type")]
    pub element_type: TypeRefSnapshot,

    /// Whether instances may carry xsi:nil
    pub nillable: bool,

    /// Whether the element is abstract
    #[serde(rename = "abstract")]
    pub abstract_element: bool,

    /// Resolved substitution group head, if membership took effect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution_group: Option<String>,

    /// Identity constraints, dropped keyrefs excluded
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub identity_constraints: Vec<IdentityConstraintSnapshot>,

    /// Whether every reference of the declaration resolved
    pub resolved: bool,
}

/// One global attribute declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeSnapshot {
    /// Qualified name ({namespace}localName format)
    pub name: String,

    /// Declared type of the attribute
    #[serde(rename = "type")]
    pub attribute_type: TypeRefSnapshot,
}

/// One attribute use on a complex type or attribute group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeUseSnapshot {
    /// Local attribute name, or name of the referenced global attribute
    pub name: String,

    /// "local" or "ref"
    pub kind: String,

    /// Declared type; local attributes only
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<TypeRefSnapshot>,

    /// Whether the attribute must appear
    pub required: bool,

    /// Default value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Fixed value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<String>,
}

/// One named model group definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelGroupSnapshot {
    /// Qualified name ({namespace}localName format)
    pub name: String,

    /// The group's particle tree
    pub group: ParticleSnapshot,
}

/// One named attribute group definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeGroupSnapshot {
    /// Qualified name ({namespace}localName format)
    pub name: String,

    /// Attribute uses declared in the group
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attributes: Vec<AttributeUseSnapshot>,

    /// Names of nested attribute groups
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attribute_groups: Vec<String>,
}

/// One notation declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotationSnapshot {
    /// Qualified name ({namespace}localName format)
    pub name: String,

    /// Public identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,

    /// System identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
}

/// One identity constraint on an element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityConstraintSnapshot {
    /// Qualified name ({namespace}localName format)
    pub name: String,

    /// "key", "unique" or "keyref"
    pub kind: String,

    /// Selector XPath expression
    pub selector: String,

    /// Field XPath expressions
    pub fields: Vec<String>,

    /// Name of the referenced constraint; keyrefs only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refer: Option<String>,
}

/// One node of a content model tree
///
/// References that never resolved expand to nothing and are omitted
/// from their parent's particle list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ParticleSnapshot {
    /// Compositor with child particles
    Group {
        /// "sequence", "choice" or "all"
        compositor: String,
        /// Child particles in document order
        particles: Vec<ParticleSnapshot>,
        /// Minimum occurrences
        min_occurs: u32,
        /// Maximum occurrences; None means unbounded
        max_occurs: Option<u32>,
    },
    /// Local element declaration
    Element {
        /// Qualified name ({namespace}localName format)
        name: String,
        /// Declared type of the element
        #[serde(rename = "type")]
        element_type: TypeRefSnapshot,
        /// Minimum occurrences
        min_occurs: u32,
        /// Maximum occurrences; None means unbounded
        max_occurs: Option<u32>,
    },
    /// Reference to a global element
    ElementRef {
        /// Name of the referenced element
        #[serde(rename = "ref")]
        reference: String,
        /// Minimum occurrences
        min_occurs: u32,
        /// Maximum occurrences; None means unbounded
        max_occurs: Option<u32>,
    },
    /// Reference to a named model group
    GroupRef {
        /// Name of the referenced group
        #[serde(rename = "ref")]
        reference: String,
        /// Minimum occurrences
        min_occurs: u32,
        /// Maximum occurrences; None means unbounded
        max_occurs: Option<u32>,
    },
    /// Wildcard accepting any element
    Wildcard {
        /// Minimum occurrences
        min_occurs: u32,
        /// Maximum occurrences; None means unbounded
        max_occurs: Option<u32>,
    },
}

/// Format a qualified name in the {namespace}localName format
pub fn format_qualified_name(namespace: Option<&str>, local_name: &str) -> String {
    match namespace {
        Some(ns) => format!("{{{}}}{}", ns, local_name),
        None => local_name.to_string(),
    }
}

impl StsSnapshot {
    /// Capture the user-visible components of a type system
    pub fn of(sts: &SchemaTypeSystem) -> Self {
        let mut types: Vec<TypeSnapshot> = sts
            .global_types()
            .filter_map(|id| sts.component(id))
            .map(|component| type_snapshot(sts, component))
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));

        let mut elements: Vec<ElementSnapshot> = sts
            .global_elements()
            .filter_map(|id| {
                sts.component(id)
                    .and_then(Component::as_element)
                    .map(|decl| element_snapshot(sts, id, decl))
            })
            .collect();
        elements.sort_by(|a, b| a.name.cmp(&b.name));

        let mut attributes: Vec<AttributeSnapshot> = sts
            .global_attributes()
            .filter_map(|id| sts.component(id).and_then(Component::as_attribute))
            .map(|decl| AttributeSnapshot {
                name: decl.name.to_string(),
                attribute_type: type_ref_snapshot(sts, &decl.declared_type),
            })
            .collect();
        attributes.sort_by(|a, b| a.name.cmp(&b.name));

        let mut model_groups: Vec<ModelGroupSnapshot> = sts
            .global_model_groups()
            .filter_map(|id| sts.component(id).and_then(Component::as_model_group))
            .map(|def| ModelGroupSnapshot {
                name: def.name.to_string(),
                group: group_snapshot(sts, &def.group),
            })
            .collect();
        model_groups.sort_by(|a, b| a.name.cmp(&b.name));

        let mut attribute_groups: Vec<AttributeGroupSnapshot> = sts
            .global_attribute_groups()
            .filter_map(|id| sts.component(id).and_then(Component::as_attribute_group))
            .map(|def| AttributeGroupSnapshot {
                name: def.name.to_string(),
                attributes: attribute_use_snapshots(sts, &def.attribute_uses),
                attribute_groups: group_names(sts, &def.attribute_groups),
            })
            .collect();
        attribute_groups.sort_by(|a, b| a.name.cmp(&b.name));

        let mut notations: Vec<NotationSnapshot> = sts
            .global_notations()
            .filter_map(|id| sts.component(id).and_then(Component::as_notation))
            .map(|decl| NotationSnapshot {
                name: decl.name.to_string(),
                public_id: decl.public_id.clone(),
                system_id: decl.system_id.clone(),
            })
            .collect();
        notations.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            types,
            elements,
            attributes,
            model_groups,
            attribute_groups,
            notations,
        }
    }
}

fn occur_bounds(occurs: Occurs) -> (u32, Option<u32>) {
    (occurs.min, occurs.max)
}

fn type_snapshot(sts: &SchemaTypeSystem, component: &Component) -> TypeSnapshot {
    match component {
        Component::SimpleType(def) => simple_type_snapshot(sts, def),
        Component::ComplexType(def) => complex_type_snapshot(sts, def),
        // Type symbol space holds nothing else.
        other => TypeSnapshot {
            name: Some(other.display_name()),
            variety: "unknown".to_string(),
            derivation: "none".to_string(),
            base: None,
            item: None,
            members: Vec::new(),
            mixed: false,
            content: None,
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
        },
    }
}

fn simple_type_snapshot(sts: &SchemaTypeSystem, def: &SimpleTypeDef) -> TypeSnapshot {
    let (base, item, members) = match &def.derivation {
        SimpleDerivation::None => (None, None, Vec::new()),
        SimpleDerivation::Restriction { base } => {
            (Some(type_ref_snapshot(sts, base)), None, Vec::new())
        }
        SimpleDerivation::List { item } => (None, Some(type_ref_snapshot(sts, item)), Vec::new()),
        SimpleDerivation::Union { members } => (
            None,
            None,
            members
                .iter()
                .map(|member| type_ref_snapshot(sts, member))
                .collect(),
        ),
    };
    TypeSnapshot {
        name: def.name.as_ref().map(|q| q.to_string()),
        variety: "simple".to_string(),
        derivation: def.derivation_kind().as_str().to_string(),
        base,
        item,
        members,
        mixed: false,
        content: None,
        attributes: Vec::new(),
        attribute_groups: Vec::new(),
    }
}

fn complex_type_snapshot(sts: &SchemaTypeSystem, def: &ComplexTypeDef) -> TypeSnapshot {
    let base = match &def.derivation {
        ComplexDerivation::None => None,
        ComplexDerivation::Extension { base } | ComplexDerivation::Restriction { base } => {
            Some(type_ref_snapshot(sts, base))
        }
    };
    TypeSnapshot {
        name: def.name.as_ref().map(|q| q.to_string()),
        variety: "complex".to_string(),
        derivation: def.derivation_kind().as_str().to_string(),
        base,
        item: None,
        members: Vec::new(),
        mixed: def.mixed,
        content: if def.has_empty_content() {
            None
        } else {
            Some(group_snapshot(sts, &def.content))
        },
        attributes: attribute_use_snapshots(sts, &def.attribute_uses),
        attribute_groups: group_names(sts, &def.attribute_groups),
    }
}

fn element_snapshot(
    sts: &SchemaTypeSystem,
    id: crate::som::base::ComponentId,
    decl: &crate::som::elements::ElementDecl,
) -> ElementSnapshot {
    let substitution_group = decl
        .substitution_head_id()
        .and_then(|hid| sts.component(hid))
        .and_then(Component::as_element)
        .map(|head| head.name.to_string());
    let identity_constraints = sts
        .identity_constraints_of(id)
        .into_iter()
        .filter_map(|cid| {
            sts.component(cid)
                .and_then(Component::as_identity_constraint)
        })
        .map(|constraint| IdentityConstraintSnapshot {
            name: constraint.name.to_string(),
            kind: constraint.kind.as_str().to_string(),
            selector: constraint.selector.clone(),
            fields: constraint.fields.clone(),
            refer: constraint.refer.as_ref().and_then(|refer| {
                sts.resolve_ref(refer)
                    .and_then(Component::as_identity_constraint)
                    .map(|target| target.name.to_string())
            }),
        })
        .collect();
    ElementSnapshot {
        name: decl.name.to_string(),
        element_type: type_ref_snapshot(sts, &decl.declared_type),
        nillable: decl.nillable,
        abstract_element: decl.abstract_element,
        substitution_group,
        identity_constraints,
        resolved: sts.resolution_state(id) == Some(ResolutionState::Resolved),
    }
}

fn type_ref_snapshot(sts: &SchemaTypeSystem, reference: &ComponentRef) -> TypeRefSnapshot {
    match reference.target {
        ResolvedTo::Component(id) | ResolvedTo::Fallback(id) => match sts.component(id) {
            Some(component) => match component.qualified_name() {
                Some(qname) => TypeRefSnapshot {
                    name: Some(qname.to_string()),
                    definition: None,
                    resolved: reference.is_resolved(),
                },
                None => TypeRefSnapshot {
                    name: None,
                    definition: Some(Box::new(type_snapshot(sts, component))),
                    resolved: reference.is_resolved(),
                },
            },
            None => TypeRefSnapshot {
                name: Some(reference.display_name()),
                definition: None,
                resolved: false,
            },
        },
        _ => TypeRefSnapshot {
            name: Some(reference.display_name()),
            definition: None,
            resolved: false,
        },
    }
}

fn attribute_use_snapshots(
    sts: &SchemaTypeSystem,
    uses: &[AttributeUse],
) -> Vec<AttributeUseSnapshot> {
    uses.iter()
        .filter_map(|attribute_use| match &attribute_use.term {
            AttributeTerm::Ref(reference) => {
                // A reference that never resolved is dropped.
                let target = sts
                    .resolve_ref(reference)
                    .and_then(Component::as_attribute)?;
                Some(AttributeUseSnapshot {
                    name: target.name.to_string(),
                    kind: "ref".to_string(),
                    attribute_type: None,
                    required: attribute_use.required,
                    default: attribute_use.default.clone(),
                    fixed: attribute_use.fixed.clone(),
                })
            }
            AttributeTerm::Local { name, type_ref } => Some(AttributeUseSnapshot {
                name: name.to_string(),
                kind: "local".to_string(),
                attribute_type: Some(type_ref_snapshot(sts, type_ref)),
                required: attribute_use.required,
                default: attribute_use.default.clone(),
                fixed: attribute_use.fixed.clone(),
            }),
        })
        .collect()
}

fn group_names(sts: &SchemaTypeSystem, groups: &[ComponentRef]) -> Vec<String> {
    groups
        .iter()
        .filter_map(|reference| {
            sts.resolve_ref(reference)
                .and_then(Component::as_attribute_group)
                .map(|group| group.name.to_string())
        })
        .collect()
}

fn group_snapshot(sts: &SchemaTypeSystem, group: &ModelGroup) -> ParticleSnapshot {
    let (min_occurs, max_occurs) = occur_bounds(group.occurs);
    ParticleSnapshot::Group {
        compositor: group.compositor.as_str().to_string(),
        particles: group
            .particles
            .iter()
            .filter_map(|particle| particle_snapshot(sts, particle))
            .collect(),
        min_occurs,
        max_occurs,
    }
}

fn particle_snapshot(sts: &SchemaTypeSystem, particle: &Particle) -> Option<ParticleSnapshot> {
    match particle {
        Particle::Element(element) => {
            let (min_occurs, max_occurs) = occur_bounds(element.occurs);
            Some(ParticleSnapshot::Element {
                name: element.name.to_string(),
                element_type: type_ref_snapshot(sts, &element.type_ref),
                min_occurs,
                max_occurs,
            })
        }
        Particle::ElementRef { reference, occurs } => {
            let target = sts.resolve_ref(reference).and_then(Component::as_element)?;
            let (min_occurs, max_occurs) = occur_bounds(*occurs);
            Some(ParticleSnapshot::ElementRef {
                reference: target.name.to_string(),
                min_occurs,
                max_occurs,
            })
        }
        Particle::GroupRef { reference, occurs } => {
            let target = sts
                .resolve_ref(reference)
                .and_then(Component::as_model_group)?;
            let (min_occurs, max_occurs) = occur_bounds(*occurs);
            Some(ParticleSnapshot::GroupRef {
                reference: target.name.to_string(),
                min_occurs,
                max_occurs,
            })
        }
        Particle::Wildcard { occurs } => {
            let (min_occurs, max_occurs) = occur_bounds(*occurs);
            Some(ParticleSnapshot::Wildcard {
                min_occurs,
                max_occurs,
            })
        }
        Particle::Group(group) => Some(group_snapshot(sts, group)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{
        ParsedDocument, RawAttributeUse, RawComplexType, RawElement, RawParticle,
    };
    use crate::namespaces::QName;
    use crate::som::composer::compose;

    #[test]
    fn test_format_qualified_name() {
        assert_eq!(
            format_qualified_name(Some("http://example.com"), "test"),
            "{http://example.com}test"
        );
        assert_eq!(format_qualified_name(None, "local"), "local");
    }

    #[test]
    fn test_snapshot_is_sorted_and_excludes_builtins() {
        let doc = ParsedDocument::named("a.xsd")
            .with_component(RawComplexType::new("Zebra"))
            .with_component(RawComplexType::new("Aardvark"));
        let sts = compose(None, &[doc]).unwrap();

        let snapshot = sts.snapshot();
        assert_eq!(snapshot.types.len(), 2);
        assert_eq!(snapshot.types[0].name.as_deref(), Some("Aardvark"));
        assert_eq!(snapshot.types[1].name.as_deref(), Some("Zebra"));
    }

    #[test]
    fn test_unresolved_attribute_ref_is_dropped() {
        let doc = ParsedDocument::named("a.xsd").with_component(
            RawComplexType::new("T")
                .with_attribute(RawAttributeUse::reference(QName::local("missing"))),
        );
        let sts = compose(None, &[doc]).unwrap();

        let snapshot = sts.snapshot();
        assert!(snapshot.types[0].attributes.is_empty());
    }

    #[test]
    fn test_fallback_type_renders_unresolved() {
        let doc = ParsedDocument::named("a.xsd")
            .with_component(RawElement::new("e").with_type(QName::local("Missing")));
        let sts = compose(None, &[doc]).unwrap();

        let snapshot = sts.snapshot();
        let element = &snapshot.elements[0];
        assert!(!element.element_type.resolved);
        assert!(element
            .element_type
            .name
            .as_deref()
            .unwrap()
            .contains("anyType"));
        assert!(!element.resolved);
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let doc = ParsedDocument::named("a.xsd")
            .with_component(RawComplexType::new("T").with_content(RawParticle::sequence(vec![
                RawParticle::element("child", QName::local("T")),
                RawParticle::wildcard(),
            ])))
            .with_component(RawElement::new("root").with_type(QName::local("T")));
        let sts = compose(None, &[doc]).unwrap();

        let snapshot = sts.snapshot();
        let json = serde_json::to_string_pretty(&snapshot).unwrap();
        let parsed: StsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snapshot, parsed);
    }

    #[test]
    fn test_batch_order_does_not_change_snapshot() {
        let doc_a = ParsedDocument::named("a.xsd").with_component(RawComplexType::new("A"));
        let doc_b = ParsedDocument::named("b.xsd")
            .with_component(RawElement::new("e").with_type(QName::local("A")));

        let forward = compose(None, &[doc_a.clone(), doc_b.clone()]).unwrap();
        let backward = compose(None, &[doc_b, doc_a]).unwrap();
        assert_eq!(forward.snapshot(), backward.snapshot());
    }
}
