//! # psom
//!
//! A partial schema object model for XML Schema: a type system builder
//! that tolerates unresolved references instead of rejecting them.
//!
//! Schema documents rarely arrive all at once. This library composes
//! whatever subset is available into a [`SchemaTypeSystem`], records a
//! diagnostic for every reference whose target is missing, substitutes
//! a universal type where one is needed, and lets a later composition
//! supply the missing pieces on top of the previous result.
//!
//! ## Features
//!
//! - Tolerant composition: missing references degrade, they never abort
//! - Incremental recomposition on top of a previous type system
//! - Stable component identities across recompositions
//! - Structured diagnostics describing every degraded reference
//! - Order-independent snapshots for comparing build results
//! - Saving is refused while any reference is still unresolved
//!
//! ## Example
//!
//! ```rust,ignore
//! use psom::documents::{ParsedDocument, RawElement};
//! use psom::namespaces::QName;
//!
//! // First build: the element's type is not defined anywhere yet.
//! let doc = ParsedDocument::named("order.xsd")
//!     .with_component(RawElement::new("order").with_type(QName::local("OrderType")));
//! let v1 = psom::compose(None, &[doc])?;
//! assert!(!v1.is_fully_resolved());
//!
//! // Second build: a later batch supplies the missing type on top of v1.
//! let v2 = psom::compose(Some(&v1), &[types_doc])?;
//! assert!(v2.is_fully_resolved());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod error;
pub mod limits;

// Naming and diagnostics
pub mod diagnostics;
pub mod names;
pub mod namespaces;

// Document input
pub mod documents;

// Schema object model and composition
pub mod som;

// Build comparison
pub mod snapshot;

// Re-exports for convenience
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
pub use documents::ParsedDocument;
pub use error::{Error, Result};
pub use limits::Limits;
pub use namespaces::QName;
pub use snapshot::StsSnapshot;
pub use som::builtins::XSD_NAMESPACE;
pub use som::{compose, compose_with_options, ComposeOptions, SchemaTypeSystem};

/// Version of the psom library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
