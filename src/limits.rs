//! Limits and constraints for type system construction
//!
//! This module defines various limits to prevent resource exhaustion
//! from pathological schema inputs (very deep particle nesting, huge
//! component counts, endless derivation chains).

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum number of documents per compose call
    pub max_documents: usize,

    /// Maximum number of components across all supplied documents
    pub max_components: usize,

    /// Maximum nesting depth of particles in a content model
    pub max_particle_depth: usize,

    /// Maximum length of a base-type derivation chain
    pub max_derivation_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_documents: 1000,
            max_components: 100000,
            max_particle_depth: 256,
            max_derivation_depth: 1024,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_documents: 100,
            max_components: 10000,
            max_particle_depth: 64,
            max_derivation_depth: 128,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_documents: 10000,
            max_components: 1000000,
            max_particle_depth: 1024,
            max_derivation_depth: 8192,
        }
    }

    /// Check if the document count is within limits
    pub fn check_documents(&self, count: usize) -> Result<()> {
        if count > self.max_documents {
            Err(Error::LimitExceeded(format!(
                "Document count {} exceeds maximum {}",
                count, self.max_documents
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the component count is within limits
    pub fn check_components(&self, count: usize) -> Result<()> {
        if count > self.max_components {
            Err(Error::LimitExceeded(format!(
                "Component count {} exceeds maximum {}",
                count, self.max_components
            )))
        } else {
            Ok(())
        }
    }

    /// Check if particle nesting depth is within limits
    pub fn check_particle_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_particle_depth {
            Err(Error::LimitExceeded(format!(
                "Particle depth {} exceeds maximum {}",
                depth, self.max_particle_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a derivation chain length is within limits
    pub fn check_derivation_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_derivation_depth {
            Err(Error::LimitExceeded(format!(
                "Derivation depth {} exceeds maximum {}",
                depth, self.max_derivation_depth
            )))
        } else {
            Ok(())
        }
    }
}
