//! Schema object model
//!
//! This module holds the component model and the machinery that builds
//! a [`SchemaTypeSystem`] out of parsed documents: the arena and symbol
//! table the components live in, the built-in type catalog, and the
//! resolution passes that wire references together and substitute
//! universal types for names that never arrive.
//!
//! Component definitions are grouped the way the XML Schema
//! recommendation groups them: simple and complex types, elements,
//! attributes, model and attribute groups, identity constraints, and
//! notations.

pub mod attributes;
pub mod base;
pub mod builtins;
pub mod complex_types;
pub mod composer;
pub mod elements;
pub mod groups;
pub mod identities;
pub mod notations;
pub mod particles;
pub mod simple_types;
pub mod system;
pub mod table;

mod fallback;
mod graph;
mod resolver;

pub use base::{
    Component, ComponentId, ComponentKind, ComponentRef, DerivationKind, RefKind, ResolutionState,
    ResolvedTo, SymbolSpace,
};
pub use composer::{compose, compose_with_options, ComposeOptions};
pub use system::SchemaTypeSystem;
