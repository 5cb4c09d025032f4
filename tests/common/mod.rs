//! Shared document fixtures for the integration tests
//!
//! The `elemattr` pair models one schema document edited over time: the
//! first revision references an attribute nobody has defined, the second
//! revision supplies it along with two more elements. The extension pair
//! models a derived type whose base arrives in a later batch.

#![allow(dead_code)]

use psom::documents::{
    ParsedDocument, RawAttribute, RawAttributeUse, RawComplexType, RawElement, RawParticle,
};
use psom::namespaces::QName;
use psom::som::builtins::xsd_qname;

/// First revision: one type, one element, one attribute, and an
/// attribute use referencing the undefined `testAttributeComplex`
pub fn elemattr_v1() -> ParsedDocument {
    ParsedDocument::named("elemattr.xsd")
        .with_component(
            RawComplexType::new("testComplexType")
                .with_content(RawParticle::sequence(vec![RawParticle::element(
                    "embedded",
                    xsd_qname("string"),
                )]))
                .with_attribute(RawAttributeUse::reference(QName::local(
                    "testAttributeComplex",
                ))),
        )
        .with_component(
            RawElement::new("testElementComplex").with_type(QName::local("testComplexType")),
        )
        .with_component(RawAttribute::new("testAttribute").with_type(xsd_qname("string")))
}

/// Second revision of the same document: the missing attribute is
/// defined and two more elements appear
pub fn elemattr_v2() -> ParsedDocument {
    ParsedDocument::named("elemattr.xsd")
        .with_component(
            RawComplexType::new("testComplexType")
                .with_content(RawParticle::sequence(vec![RawParticle::element(
                    "embedded",
                    xsd_qname("string"),
                )]))
                .with_attribute(RawAttributeUse::reference(QName::local(
                    "testAttributeComplex",
                ))),
        )
        .with_component(
            RawElement::new("testElementComplex").with_type(QName::local("testComplexType")),
        )
        .with_component(
            RawElement::new("ComplexTypeElem").with_type(QName::local("testComplexType")),
        )
        .with_component(RawElement::new("SimpleTypeElem").with_type(xsd_qname("string")))
        .with_component(RawAttribute::new("testAttribute").with_type(xsd_qname("string")))
        .with_component(RawAttribute::new("testAttributeComplex").with_type(xsd_qname("string")))
}

/// A derived complex type and two elements; the extension base is not
/// defined in this document
pub fn derived_doc() -> ParsedDocument {
    ParsedDocument::named("derived.xsd")
        .with_component(
            RawComplexType::new("ExtensionDerivedComplexContentType")
                .extending(QName::local("ExtensionBaseType"))
                .with_content(RawParticle::sequence(vec![RawParticle::element(
                    "extra",
                    xsd_qname("string"),
                )])),
        )
        .with_component(
            RawElement::new("DerivedElem")
                .with_type(QName::local("ExtensionDerivedComplexContentType")),
        )
        .with_component(
            RawElement::new("BaseElem").with_type(QName::local("ExtensionBaseType")),
        )
}

/// The document supplying `ExtensionBaseType`
pub fn extension_base_doc() -> ParsedDocument {
    ParsedDocument::named("base.xsd").with_component(
        RawComplexType::new("ExtensionBaseType").with_content(RawParticle::sequence(vec![
            RawParticle::element("core", xsd_qname("string")),
        ])),
    )
}
