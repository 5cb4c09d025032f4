//! Built-in XML Schema types
//!
//! Every arena starts with the same built-in prefix: `xs:anyType` at slot
//! 0, `xs:anySimpleType` at slot 1, then the primitive simple types. The
//! first two slots are the fallback targets the resolver substitutes for
//! missing type references, so their ids are fixed constants. Built-ins
//! are shared `Arc`s; seeding a new build costs reference bumps only.

use once_cell::sync::Lazy;
use std::sync::Arc;

use super::base::{Component, ComponentId, ResolutionState, SymbolSpace};
use super::complex_types::ComplexTypeDef;
use super::particles::{Compositor, ModelGroup, Occurs, Particle};
use super::simple_types::SimpleTypeDef;
use super::table::{ComponentArena, ComponentTable};
use crate::namespaces::QName;

/// The XML Schema namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Source name recorded on built-in components
pub const BUILTIN_SOURCE: &str = "<builtin>";

/// The universal type
pub const XSD_ANY_TYPE: &str = "anyType";
/// The universal simple type
pub const XSD_ANY_SIMPLE_TYPE: &str = "anySimpleType";
/// xs:string
pub const XSD_STRING: &str = "string";
/// xs:boolean
pub const XSD_BOOLEAN: &str = "boolean";
/// xs:decimal
pub const XSD_DECIMAL: &str = "decimal";
/// xs:float
pub const XSD_FLOAT: &str = "float";
/// xs:double
pub const XSD_DOUBLE: &str = "double";
/// xs:duration
pub const XSD_DURATION: &str = "duration";
/// xs:dateTime
pub const XSD_DATETIME: &str = "dateTime";
/// xs:time
pub const XSD_TIME: &str = "time";
/// xs:date
pub const XSD_DATE: &str = "date";
/// xs:hexBinary
pub const XSD_HEX_BINARY: &str = "hexBinary";
/// xs:base64Binary
pub const XSD_BASE64_BINARY: &str = "base64Binary";
/// xs:anyURI
pub const XSD_ANY_URI: &str = "anyURI";
/// xs:QName
pub const XSD_QNAME: &str = "QName";
/// xs:NOTATION
pub const XSD_NOTATION: &str = "NOTATION";
/// xs:normalizedString
pub const XSD_NORMALIZED_STRING: &str = "normalizedString";
/// xs:token
pub const XSD_TOKEN: &str = "token";
/// xs:language
pub const XSD_LANGUAGE: &str = "language";
/// xs:Name
pub const XSD_NAME: &str = "Name";
/// xs:NCName
pub const XSD_NCNAME: &str = "NCName";
/// xs:ID
pub const XSD_ID: &str = "ID";
/// xs:IDREF
pub const XSD_IDREF: &str = "IDREF";
/// xs:NMTOKEN
pub const XSD_NMTOKEN: &str = "NMTOKEN";
/// xs:integer
pub const XSD_INTEGER: &str = "integer";
/// xs:long
pub const XSD_LONG: &str = "long";
/// xs:int
pub const XSD_INT: &str = "int";
/// xs:short
pub const XSD_SHORT: &str = "short";
/// xs:byte
pub const XSD_BYTE: &str = "byte";
/// xs:nonNegativeInteger
pub const XSD_NON_NEGATIVE_INTEGER: &str = "nonNegativeInteger";
/// xs:positiveInteger
pub const XSD_POSITIVE_INTEGER: &str = "positiveInteger";
/// xs:unsignedInt
pub const XSD_UNSIGNED_INT: &str = "unsignedInt";

/// Slot of `xs:anyType` in every arena
pub const ANY_TYPE_ID: ComponentId = ComponentId(0);

/// Slot of `xs:anySimpleType` in every arena
pub const ANY_SIMPLE_TYPE_ID: ComponentId = ComponentId(1);

/// Simple type names seeded after the two universal types
const SIMPLE_TYPE_NAMES: &[&str] = &[
    XSD_STRING,
    XSD_BOOLEAN,
    XSD_DECIMAL,
    XSD_FLOAT,
    XSD_DOUBLE,
    XSD_DURATION,
    XSD_DATETIME,
    XSD_TIME,
    XSD_DATE,
    XSD_HEX_BINARY,
    XSD_BASE64_BINARY,
    XSD_ANY_URI,
    XSD_QNAME,
    XSD_NOTATION,
    XSD_NORMALIZED_STRING,
    XSD_TOKEN,
    XSD_LANGUAGE,
    XSD_NAME,
    XSD_NCNAME,
    XSD_ID,
    XSD_IDREF,
    XSD_NMTOKEN,
    XSD_INTEGER,
    XSD_LONG,
    XSD_INT,
    XSD_SHORT,
    XSD_BYTE,
    XSD_NON_NEGATIVE_INTEGER,
    XSD_POSITIVE_INTEGER,
    XSD_UNSIGNED_INT,
];

static BUILTINS: Lazy<Vec<Arc<Component>>> = Lazy::new(|| {
    let mut components = Vec::with_capacity(SIMPLE_TYPE_NAMES.len() + 2);

    // anyType admits any children and any character content
    let any_type = ComplexTypeDef::new(Some(xsd_qname(XSD_ANY_TYPE)), BUILTIN_SOURCE)
        .with_mixed(true)
        .with_content(ModelGroup::new(
            Compositor::Sequence,
            vec![Particle::Wildcard {
                occurs: Occurs::zero_or_more(),
            }],
        ));
    components.push(Arc::new(Component::ComplexType(any_type)));

    components.push(Arc::new(Component::SimpleType(SimpleTypeDef::builtin(
        xsd_qname(XSD_ANY_SIMPLE_TYPE),
        BUILTIN_SOURCE,
    ))));

    for name in SIMPLE_TYPE_NAMES.iter().copied() {
        components.push(Arc::new(Component::SimpleType(SimpleTypeDef::builtin(
            xsd_qname(name),
            BUILTIN_SOURCE,
        ))));
    }

    components
});

/// Make a qualified name in the XML Schema namespace
pub fn xsd_qname(local_name: impl Into<String>) -> QName {
    QName::namespaced(XSD_NAMESPACE, local_name)
}

/// Number of seeded built-in components
pub fn count() -> usize {
    BUILTINS.len()
}

/// Seed a fresh arena and table with the built-in types
///
/// Must run before any user component is allocated; the fallback ids
/// assume the built-ins occupy the first slots.
pub fn seed(arena: &mut ComponentArena, table: &mut ComponentTable) {
    debug_assert!(arena.is_empty());

    for component in BUILTINS.iter() {
        let id = arena.alloc(Arc::clone(component), ResolutionState::Resolved);
        if let Some(name) = component.qualified_name() {
            table.define(name.clone(), SymbolSpace::Type, id);
        }
    }
}
