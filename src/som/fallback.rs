//! Fallback substitution for references that never resolved
//!
//! After the resolution passes, a reference may still point at a name
//! no document defines. Rather than reject the build, each such
//! reference is rewritten to a permissive stand-in and a diagnostic is
//! recorded:
//!
//! - unresolved type references degrade to the universal type
//!   (`anyType` for complex contexts, `anySimpleType` for simple ones),
//! - unresolved element, attribute and group references contribute
//!   nothing to the owning component,
//! - an unresolved substitution group head defers membership,
//! - an unresolved keyref target drops the constraint.
//!
//! If the missing component arrives in a later build the reference is
//! re-attempted from its recorded name and the stand-in disappears.

use crate::diagnostics::{Diagnostic, DiagnosticCode, SourceLocation};
use crate::namespaces::QName;
use crate::som::base::{ComponentKind, RefKind, ResolvedTo};
use crate::som::builtins::{ANY_SIMPLE_TYPE_ID, ANY_TYPE_ID, XSD_ANY_SIMPLE_TYPE, XSD_ANY_TYPE};

/// Stand-in for an unresolved reference of the given kind
fn fallback_target(kind: RefKind, owner_kind: ComponentKind) -> ResolvedTo {
    match kind {
        RefKind::BaseType => {
            if owner_kind == ComponentKind::SimpleType {
                ResolvedTo::Fallback(ANY_SIMPLE_TYPE_ID)
            } else {
                ResolvedTo::Fallback(ANY_TYPE_ID)
            }
        }
        RefKind::ElementType => ResolvedTo::Fallback(ANY_TYPE_ID),
        RefKind::AttributeType | RefKind::ListItemType | RefKind::UnionMemberType => {
            ResolvedTo::Fallback(ANY_SIMPLE_TYPE_ID)
        }
        RefKind::ElementRef
        | RefKind::AttributeRef
        | RefKind::ModelGroupRef
        | RefKind::AttributeGroupRef
        | RefKind::SubstitutionHead
        | RefKind::KeyrefTarget => ResolvedTo::Unresolved,
    }
}

/// Diagnostic code for an unresolved reference of the given kind
fn diagnostic_code(kind: RefKind) -> DiagnosticCode {
    match kind {
        RefKind::BaseType => DiagnosticCode::UnresolvedBaseType,
        RefKind::ElementType | RefKind::AttributeType => DiagnosticCode::UnresolvedTypeRef,
        RefKind::ListItemType | RefKind::UnionMemberType => DiagnosticCode::UnresolvedMemberType,
        RefKind::ElementRef => DiagnosticCode::UnresolvedElementRef,
        RefKind::AttributeRef => DiagnosticCode::UnresolvedAttributeRef,
        RefKind::ModelGroupRef => DiagnosticCode::UnresolvedModelGroupRef,
        RefKind::AttributeGroupRef => DiagnosticCode::UnresolvedAttributeGroupRef,
        RefKind::SubstitutionHead => DiagnosticCode::UnresolvedSubstitutionHead,
        RefKind::KeyrefTarget => DiagnosticCode::UnresolvedKeyrefTarget,
    }
}

/// Consequence of substituting, spelled out in the diagnostic message
fn consequence(kind: RefKind, target: &ResolvedTo) -> String {
    match target {
        ResolvedTo::Fallback(id) => {
            let stand_in = if *id == ANY_SIMPLE_TYPE_ID {
                XSD_ANY_SIMPLE_TYPE
            } else {
                XSD_ANY_TYPE
            };
            format!("treating it as {}", stand_in)
        }
        _ => match kind {
            RefKind::ElementRef | RefKind::ModelGroupRef => {
                "the particle expands to nothing".to_string()
            }
            RefKind::AttributeRef => "the attribute use is dropped".to_string(),
            RefKind::AttributeGroupRef => "the group contributes nothing".to_string(),
            RefKind::SubstitutionHead => "membership is deferred".to_string(),
            RefKind::KeyrefTarget => "the constraint is dropped".to_string(),
            _ => "the reference is ignored".to_string(),
        },
    }
}

/// Substitute a stand-in for an unresolved reference
///
/// Returns the target to record on the reference and the diagnostic to
/// append. The diagnostic carries the code's default severity; only a
/// missing substitution group head stays informational, everything
/// else reports as an error.
pub fn substitute(
    kind: RefKind,
    owner_kind: ComponentKind,
    owner_display: &str,
    owner_source: &str,
    name: &QName,
) -> (ResolvedTo, Diagnostic) {
    let target = fallback_target(kind, owner_kind);
    let message = format!(
        "{} '{}' of {} is not defined; {}",
        kind.describe(),
        name,
        owner_display,
        consequence(kind, &target)
    );
    let diagnostic = Diagnostic::new(
        diagnostic_code(kind),
        SourceLocation::new(owner_source, Some(owner_display.to_string())),
        message,
    );
    (target, diagnostic)
}
