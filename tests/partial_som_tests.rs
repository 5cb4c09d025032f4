//! Integration tests for partial type system composition
//!
//! These tests drive the composer through the scenarios the engine
//! exists for: a batch with missing definitions builds a degraded but
//! queryable type system, a later batch supplies what was missing, and
//! a revert returns the system to its earlier shape.

mod common;

use std::sync::Arc;
use std::thread;

use common::{elemattr_v1, elemattr_v2};
use psom::documents::{
    ParsedDocument, RawAttribute, RawAttributeGroup, RawAttributeUse, RawComplexType, RawElement,
    RawIdentityConstraint, RawParticle, RawSimpleType,
};
use psom::namespaces::QName;
use psom::som::builtins::{xsd_qname, ANY_SIMPLE_TYPE_ID, ANY_TYPE_ID};
use psom::som::{Component, ResolutionState, ResolvedTo};
use psom::{
    compose, compose_with_options, ComposeOptions, DiagnosticCode, Error, SchemaTypeSystem,
    Severity,
};

// ========== Incremental scenarios ==========

#[test]
fn test_first_revision_builds_partial_system() {
    let sts = compose_with_options(
        None,
        &[elemattr_v1()],
        ComposeOptions::new().with_name("BaseSchemaTS"),
    )
    .expect("compose should tolerate the missing attribute");

    assert_eq!(sts.element_count(), 1);
    assert_eq!(sts.attribute_count(), 1);
    assert_eq!(sts.type_count(), 1);
    assert_eq!(sts.attribute_group_count(), 0);

    assert!(!sts.is_fully_resolved());
    assert!(sts.diagnostics().has_unresolved());
    let unresolved: Vec<_> = sts
        .diagnostics()
        .by_code(DiagnosticCode::UnresolvedAttributeRef)
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert!(unresolved[0].message.contains("testAttributeComplex"));

    // The save gate refuses a partial system and writes nothing.
    let mut out = Vec::new();
    let err = sts.try_save(&mut out).unwrap_err();
    assert!(matches!(err, Error::Save(_)));
    assert!(out.is_empty());
}

#[test]
fn test_second_revision_completes_the_system() {
    let v1 = compose(None, &[elemattr_v1()]).unwrap();
    let v2 = compose(Some(&v1), &[elemattr_v2()]).expect("incremental compose");

    assert_eq!(v2.element_count(), 3);
    assert_eq!(v2.attribute_count(), 2);
    assert_eq!(v2.type_count(), 1);
    assert_eq!(v2.attribute_group_count(), 0);

    assert!(v2.lookup_element(&QName::local("ComplexTypeElem")).is_some());
    assert!(v2
        .lookup_attribute(&QName::local("testAttributeComplex"))
        .is_some());

    // The attribute use that degraded in the first build now resolves.
    let type_id = v2.lookup_type(&QName::local("testComplexType")).unwrap();
    let uses = v2.expanded_attribute_uses(type_id);
    assert_eq!(uses.len(), 1);

    assert!(v2.is_fully_resolved());
    assert!(!v2.diagnostics().has_unresolved());

    let mut out = Vec::new();
    v2.try_save(&mut out).expect("fully resolved system saves");
    assert!(!out.is_empty());

    // The base system the build started from is untouched.
    assert_eq!(v1.element_count(), 1);
    assert!(!v1.is_fully_resolved());
}

#[test]
fn test_reverting_the_document_restores_the_first_shape() {
    let v1 = compose_with_options(
        None,
        &[elemattr_v1()],
        ComposeOptions::new().with_name("BaseSchemaTS"),
    )
    .unwrap();
    let v2 = compose(Some(&v1), &[elemattr_v2()]).unwrap();
    let v3 = compose_with_options(
        Some(&v2),
        &[elemattr_v1()],
        ComposeOptions::new().with_name("FinalSchemaTS"),
    )
    .unwrap();

    assert_eq!(v3.element_count(), v1.element_count());
    assert_eq!(v3.attribute_count(), v1.attribute_count());
    assert_eq!(v3.type_count(), v1.type_count());
    assert_eq!(v3.attribute_group_count(), v1.attribute_group_count());

    assert!(!v3.is_fully_resolved());
    let mut out = Vec::new();
    assert!(v3.try_save(&mut out).is_err());

    // Different system names, structurally equal components.
    assert_ne!(v1.name(), v3.name());
    pretty_assertions::assert_eq!(v1.snapshot(), v3.snapshot());
}

// ========== Fallback policy ==========

#[test]
fn test_missing_element_type_falls_back_to_any_type() {
    let doc = ParsedDocument::named("a.xsd")
        .with_component(RawElement::new("e").with_type(QName::local("Missing")));
    let sts = compose(None, &[doc]).unwrap();

    let id = sts.lookup_element(&QName::local("e")).unwrap();
    let decl = sts.component(id).and_then(Component::as_element).unwrap();
    assert_eq!(decl.declared_type.target, ResolvedTo::Fallback(ANY_TYPE_ID));
    assert_eq!(sts.resolution_state(id), Some(ResolutionState::Unresolved));
    assert_eq!(
        sts.diagnostics()
            .by_code(DiagnosticCode::UnresolvedTypeRef)
            .count(),
        1
    );
}

#[test]
fn test_missing_attribute_type_falls_back_to_any_simple_type() {
    let doc = ParsedDocument::named("a.xsd")
        .with_component(RawAttribute::new("a").with_type(QName::local("Missing")));
    let sts = compose(None, &[doc]).unwrap();

    let id = sts.lookup_attribute(&QName::local("a")).unwrap();
    let decl = sts.component(id).and_then(Component::as_attribute).unwrap();
    assert_eq!(
        decl.declared_type.target,
        ResolvedTo::Fallback(ANY_SIMPLE_TYPE_ID)
    );
    assert_eq!(sts.resolution_state(id), Some(ResolutionState::Unresolved));
}

#[test]
fn test_missing_bases_fall_back_per_owner_variety() {
    let doc = ParsedDocument::named("a.xsd")
        .with_component(RawComplexType::new("C").extending(QName::local("MissingBase")))
        .with_component(RawSimpleType::restriction("S", QName::local("MissingBase")));
    let sts = compose(None, &[doc]).unwrap();

    let complex = sts
        .component(sts.lookup_type(&QName::local("C")).unwrap())
        .and_then(Component::as_complex_type)
        .unwrap();
    match &complex.derivation {
        psom::som::complex_types::ComplexDerivation::Extension { base } => {
            assert_eq!(base.target, ResolvedTo::Fallback(ANY_TYPE_ID));
        }
        other => panic!("unexpected derivation {:?}", other),
    }

    let simple = sts
        .component(sts.lookup_type(&QName::local("S")).unwrap())
        .and_then(Component::as_simple_type)
        .unwrap();
    match &simple.derivation {
        psom::som::simple_types::SimpleDerivation::Restriction { base } => {
            assert_eq!(base.target, ResolvedTo::Fallback(ANY_SIMPLE_TYPE_ID));
        }
        other => panic!("unexpected derivation {:?}", other),
    }

    assert_eq!(
        sts.diagnostics()
            .by_code(DiagnosticCode::UnresolvedBaseType)
            .count(),
        2
    );
}

#[test]
fn test_missing_list_and_union_constituents_fall_back() {
    let doc = ParsedDocument::named("a.xsd")
        .with_component(RawSimpleType::list("L", QName::local("MissingItem")))
        .with_component(RawSimpleType::union(
            "U",
            vec![xsd_qname("string"), QName::local("MissingMember")],
        ));
    let sts = compose(None, &[doc]).unwrap();

    let list = sts
        .component(sts.lookup_type(&QName::local("L")).unwrap())
        .and_then(Component::as_simple_type)
        .unwrap();
    match &list.derivation {
        psom::som::simple_types::SimpleDerivation::List { item } => {
            assert_eq!(item.target, ResolvedTo::Fallback(ANY_SIMPLE_TYPE_ID));
        }
        other => panic!("unexpected derivation {:?}", other),
    }

    let union = sts
        .component(sts.lookup_type(&QName::local("U")).unwrap())
        .and_then(Component::as_simple_type)
        .unwrap();
    match &union.derivation {
        psom::som::simple_types::SimpleDerivation::Union { members } => {
            assert!(members[0].is_resolved());
            assert_eq!(members[1].target, ResolvedTo::Fallback(ANY_SIMPLE_TYPE_ID));
        }
        other => panic!("unexpected derivation {:?}", other),
    }

    assert_eq!(
        sts.diagnostics()
            .by_code(DiagnosticCode::UnresolvedMemberType)
            .count(),
        2
    );
}

#[test]
fn test_missing_particle_references_expand_to_nothing() {
    let doc = ParsedDocument::named("a.xsd").with_component(
        RawComplexType::new("T")
            .with_content(RawParticle::sequence(vec![
                RawParticle::element_ref(QName::local("missingElem")),
                RawParticle::element("kept", xsd_qname("string")),
                RawParticle::group_ref(QName::local("missingGroup")),
            ]))
            .with_attribute_group(QName::local("missingAttrGroup")),
    );
    let sts = compose(None, &[doc]).unwrap();

    let snapshot = sts.snapshot();
    let t = &snapshot.types[0];
    match t.content.as_ref().unwrap() {
        psom::snapshot::ParticleSnapshot::Group { particles, .. } => {
            // Only the local element survives.
            assert_eq!(particles.len(), 1);
        }
        other => panic!("unexpected content {:?}", other),
    }
    assert!(t.attribute_groups.is_empty());

    assert_eq!(
        sts.diagnostics()
            .by_code(DiagnosticCode::UnresolvedElementRef)
            .count(),
        1
    );
    assert_eq!(
        sts.diagnostics()
            .by_code(DiagnosticCode::UnresolvedModelGroupRef)
            .count(),
        1
    );
    assert_eq!(
        sts.diagnostics()
            .by_code(DiagnosticCode::UnresolvedAttributeGroupRef)
            .count(),
        1
    );
}

#[test]
fn test_missing_substitution_head_is_a_note_but_blocks_saving() {
    let doc = ParsedDocument::named("a.xsd").with_component(
        RawElement::new("member")
            .with_type(xsd_qname("string"))
            .with_substitution_group(QName::local("missingHead")),
    );
    let sts = compose(None, &[doc]).unwrap();

    let notes: Vec<_> = sts
        .diagnostics()
        .by_code(DiagnosticCode::UnresolvedSubstitutionHead)
        .collect();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].severity, Severity::Info);

    assert!(sts
        .substitution_members(&QName::local("missingHead"))
        .is_empty());

    let id = sts.lookup_element(&QName::local("member")).unwrap();
    assert_eq!(sts.resolution_state(id), Some(ResolutionState::Unresolved));
    assert!(!sts.is_fully_resolved());
    assert!(sts.try_save(&mut Vec::new()).is_err());
}

#[test]
fn test_missing_keyref_target_drops_only_the_keyref() {
    let doc = ParsedDocument::named("a.xsd").with_component(
        RawElement::new("order")
            .with_type(xsd_qname("string"))
            .with_constraint(RawIdentityConstraint::key(
                "orderKey",
                "order",
                vec!["@id".to_string()],
            ))
            .with_constraint(RawIdentityConstraint::keyref(
                "orderRef",
                "line",
                vec!["@order".to_string()],
                QName::local("missingKey"),
            )),
    );
    let sts = compose(None, &[doc]).unwrap();

    let id = sts.lookup_element(&QName::local("order")).unwrap();
    let constraints = sts.identity_constraints_of(id);
    assert_eq!(constraints.len(), 1);
    let kept = sts
        .component(constraints[0])
        .and_then(Component::as_identity_constraint)
        .unwrap();
    assert_eq!(kept.name, QName::local("orderKey"));

    assert!(sts.lookup_identity(&QName::local("orderKey")).is_some());
    assert_eq!(
        sts.diagnostics()
            .by_code(DiagnosticCode::UnresolvedKeyrefTarget)
            .count(),
        1
    );
}

#[test]
fn test_keyref_may_not_target_another_keyref() {
    let doc = ParsedDocument::named("a.xsd")
        .with_component(
            RawElement::new("first")
                .with_type(xsd_qname("string"))
                .with_constraint(RawIdentityConstraint::key(
                    "realKey",
                    "item",
                    vec!["@id".to_string()],
                )),
        )
        .with_component(
            RawElement::new("second")
                .with_type(xsd_qname("string"))
                .with_constraint(RawIdentityConstraint::keyref(
                    "goodRef",
                    "item",
                    vec!["@ref".to_string()],
                    QName::local("realKey"),
                )),
        )
        .with_component(
            RawElement::new("third")
                .with_type(xsd_qname("string"))
                .with_constraint(RawIdentityConstraint::keyref(
                    "badRef",
                    "item",
                    vec!["@ref".to_string()],
                    QName::local("goodRef"),
                )),
        );
    let sts = compose(None, &[doc]).unwrap();

    let second = sts.lookup_element(&QName::local("second")).unwrap();
    assert_eq!(sts.identity_constraints_of(second).len(), 1);

    // A keyref is not a legal target, so badRef is dropped.
    let third = sts.lookup_element(&QName::local("third")).unwrap();
    assert!(sts.identity_constraints_of(third).is_empty());
    assert_eq!(
        sts.diagnostics()
            .by_code(DiagnosticCode::UnresolvedKeyrefTarget)
            .count(),
        1
    );
}

#[test]
fn test_missing_attribute_group_inside_group_chain() {
    let doc = ParsedDocument::named("a.xsd")
        .with_component(
            RawAttributeGroup::new("outer")
                .with_attribute(RawAttributeUse::local(
                    RawAttribute::new("kept").with_type(xsd_qname("string")),
                ))
                .with_attribute_group(QName::local("missingInner")),
        )
        .with_component(RawComplexType::new("T").with_attribute_group(QName::local("outer")));
    let sts = compose(None, &[doc]).unwrap();

    // The resolvable part of the chain still expands.
    let type_id = sts.lookup_type(&QName::local("T")).unwrap();
    let uses = sts.expanded_attribute_uses(type_id);
    assert_eq!(uses.len(), 1);
    assert!(!sts.is_fully_resolved());
}

// ========== Monotonic recovery ==========

#[test]
fn test_supplying_the_missing_definition_recovers() {
    let hole = ParsedDocument::named("a.xsd")
        .with_component(RawElement::new("e").with_type(QName::local("T")));
    let v1 = compose(None, &[hole]).unwrap();

    let id_v1 = v1.lookup_element(&QName::local("e")).unwrap();
    assert_eq!(v1.resolution_state(id_v1), Some(ResolutionState::Unresolved));
    assert!(v1.diagnostics().has_unresolved());

    let fill = ParsedDocument::named("b.xsd").with_component(RawComplexType::new("T"));
    let v2 = compose(Some(&v1), &[fill]).unwrap();

    let id_v2 = v2.lookup_element(&QName::local("e")).unwrap();
    assert_eq!(id_v1, id_v2);
    assert_eq!(v2.resolution_state(id_v2), Some(ResolutionState::Resolved));

    let decl = v2.component(id_v2).and_then(Component::as_element).unwrap();
    let target = v2.resolve_ref(&decl.declared_type).unwrap();
    assert_eq!(target.display_name(), "T");

    // The diagnostic for the recovered reference is gone.
    assert!(!v2.diagnostics().has_unresolved());
    assert!(v2.is_fully_resolved());
}

#[test]
fn test_component_ids_survive_redefinition() {
    let v1_doc = ParsedDocument::named("a.xsd")
        .with_component(RawComplexType::new("T"))
        .with_component(RawElement::new("e").with_type(QName::local("T")));
    let v1 = compose(None, &[v1_doc]).unwrap();

    let v2_doc = ParsedDocument::named("a.xsd")
        .with_component(
            RawComplexType::new("T").with_content(RawParticle::sequence(vec![
                RawParticle::element("added", xsd_qname("string")),
            ])),
        )
        .with_component(RawElement::new("e").with_type(QName::local("T")));
    let v2 = compose(Some(&v1), &[v2_doc]).unwrap();

    assert_eq!(
        v1.lookup_type(&QName::local("T")),
        v2.lookup_type(&QName::local("T"))
    );
    assert_eq!(
        v1.lookup_element(&QName::local("e")),
        v2.lookup_element(&QName::local("e"))
    );

    // The payload really changed under the stable id.
    let t = v2
        .component(v2.lookup_type(&QName::local("T")).unwrap())
        .and_then(Component::as_complex_type)
        .unwrap();
    assert!(!t.has_empty_content());
}

#[test]
fn test_shadowing_element_keeps_its_key_across_documents() {
    let first = ParsedDocument::named("a.xsd").with_component(
        RawElement::new("order")
            .with_type(xsd_qname("string"))
            .with_constraint(RawIdentityConstraint::key(
                "orderKey",
                "item",
                vec!["@id".to_string()],
            )),
    );
    let v1 = compose(None, &[first.clone()]).unwrap();
    assert!(v1.lookup_identity(&QName::local("orderKey")).is_some());

    // A different document takes the element name over, key included.
    let second = ParsedDocument::named("b.xsd").with_component(
        RawElement::new("order")
            .with_type(xsd_qname("string"))
            .with_constraint(RawIdentityConstraint::key(
                "orderKey",
                "row",
                vec!["@sku".to_string()],
            )),
    );
    let v2 = compose(Some(&v1), &[second.clone()]).unwrap();

    let order = v2.lookup_element(&QName::local("order")).unwrap();
    let constraints = v2.identity_constraints_of(order);
    assert_eq!(constraints.len(), 1);
    let key = v2
        .component(constraints[0])
        .and_then(Component::as_identity_constraint)
        .unwrap();
    assert_eq!(key.selector, "row");
    assert!(v2.lookup_identity(&QName::local("orderKey")).is_some());

    assert!(v2.is_fully_resolved());
    let mut out = Vec::new();
    v2.try_save(&mut out).expect("complete system saves");

    // Composing both documents directly yields the same shape.
    let direct = compose(None, &[first, second]).unwrap();
    pretty_assertions::assert_eq!(direct.snapshot(), v2.snapshot());
}

#[test]
fn test_untouched_components_carry_over_by_reference() {
    let stable = ParsedDocument::named("stable.xsd").with_component(
        RawComplexType::new("Untouched").with_content(RawParticle::sequence(vec![
            RawParticle::element("leaf", xsd_qname("string")),
        ])),
    );
    let hole = ParsedDocument::named("hole.xsd")
        .with_component(RawElement::new("broken").with_type(QName::local("Missing")));
    let v1 = compose(None, &[stable, hole]).unwrap();

    let fill = ParsedDocument::named("fill.xsd").with_component(RawComplexType::new("Missing"));
    let v2 = compose(Some(&v1), &[fill]).unwrap();

    let untouched = v1.lookup_type(&QName::local("Untouched")).unwrap();
    assert_eq!(v2.lookup_type(&QName::local("Untouched")), Some(untouched));
    assert!(Arc::ptr_eq(
        &v1.component_arc(untouched).unwrap(),
        &v2.component_arc(untouched).unwrap()
    ));

    // The broken element was re-attempted and now resolves.
    let broken = v2.lookup_element(&QName::local("broken")).unwrap();
    assert_eq!(v2.resolution_state(broken), Some(ResolutionState::Resolved));
    assert!(v2.is_fully_resolved());
}

// ========== Concurrency ==========

#[test]
fn test_type_system_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SchemaTypeSystem>();
}

#[test]
fn test_independent_builds_share_a_base_concurrently() {
    let base = compose(None, &[elemattr_v1()]).unwrap();

    thread::scope(|scope| {
        let add_types = scope.spawn(|| {
            let doc =
                ParsedDocument::named("extra.xsd").with_component(RawComplexType::new("Extra"));
            compose(Some(&base), &[doc]).unwrap()
        });
        let fix_attr = scope.spawn(|| compose(Some(&base), &[elemattr_v2()]).unwrap());

        let with_types = add_types.join().unwrap();
        let fixed = fix_attr.join().unwrap();
        assert_eq!(with_types.type_count(), 2);
        assert!(fixed.is_fully_resolved());
    });

    // The shared base is unchanged by either build.
    assert_eq!(base.type_count(), 1);
    assert!(!base.is_fully_resolved());
}
