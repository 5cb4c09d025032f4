//! Error types for psom
//!
//! This module defines the fatal error surface of the library. Recoverable
//! resolution failures never appear here; they become entries in
//! [`crate::diagnostics::Diagnostics`] and the affected components degrade
//! per the fallback policy. Errors abort a build outright.

use std::fmt;
use thiserror::Error;

/// Result type alias using psom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for psom operations
#[derive(Error, Debug)]
pub enum Error {
    /// Cyclic base-type derivation chain
    #[error("cyclic definition: {0}")]
    Cycle(#[from] CycleError),

    /// Malformed input from the schema source provider
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Persistence refused or failed
    #[error("save error: {0}")]
    Save(#[from] SaveError),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Cyclic definition error with the derivation chain that closed the loop
#[derive(Debug, Clone)]
pub struct CycleError {
    /// Qualified name of the component where the cycle was detected
    pub component: String,
    /// Base-type chain walked before the cycle closed, in visit order
    pub chain: Vec<String>,
    /// Logical name of the document that introduced the component
    pub source_name: Option<String>,
}

impl CycleError {
    /// Create a new cycle error for the named component
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            chain: Vec::new(),
            source_name: None,
        }
    }

    /// Set the derivation chain that was being walked
    pub fn with_chain(mut self, chain: Vec<String>) -> Self {
        self.chain = chain;
        self
    }

    /// Set the originating document name
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base type chain of '{}' is cyclic", self.component)?;

        if !self.chain.is_empty() {
            write!(f, " ({} -> {})", self.chain.join(" -> "), self.component)?;
        }

        if let Some(ref src) = self.source_name {
            write!(f, "\n\nSource: {}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for CycleError {}

/// Malformed schema source error
#[derive(Debug, Clone)]
pub struct SourceError {
    /// Error message
    pub message: String,
    /// Logical name of the offending document
    pub source_name: Option<String>,
    /// Component being defined when the problem surfaced
    pub component: Option<String>,
}

impl SourceError {
    /// Create a new source error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source_name: None,
            component: None,
        }
    }

    /// Set the offending document name
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }

    /// Set the component being defined
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref comp) = self.component {
            write!(f, "\n\nComponent: {}", comp)?;
        }

        if let Some(ref src) = self.source_name {
            write!(f, "\n\nSource: {}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for SourceError {}

/// Save error raised by the persistence gate or the writer
#[derive(Debug, Clone)]
pub struct SaveError {
    /// Error message
    pub message: String,
    /// Number of components still unresolved at save time
    pub unresolved_components: usize,
    /// Number of outstanding unresolved-reference diagnostics
    pub outstanding_diagnostics: usize,
}

impl SaveError {
    /// Create a new save error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            unresolved_components: 0,
            outstanding_diagnostics: 0,
        }
    }

    /// Set the unresolved component count
    pub fn with_unresolved_components(mut self, count: usize) -> Self {
        self.unresolved_components = count;
        self
    }

    /// Set the outstanding diagnostic count
    pub fn with_outstanding_diagnostics(mut self, count: usize) -> Self {
        self.outstanding_diagnostics = count;
        self
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if self.unresolved_components > 0 {
            write!(f, "\n\nUnresolved components: {}", self.unresolved_components)?;
        }

        if self.outstanding_diagnostics > 0 {
            write!(
                f,
                "\n\nOutstanding diagnostics: {}",
                self.outstanding_diagnostics
            )?;
        }

        Ok(())
    }
}

impl std::error::Error for SaveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_display() {
        let err = CycleError::new("{http://example.com}A")
            .with_chain(vec![
                "{http://example.com}A".to_string(),
                "{http://example.com}B".to_string(),
            ])
            .with_source_name("cyclic.xsd");

        let msg = format!("{}", err);
        assert!(msg.contains("base type chain of '{http://example.com}A' is cyclic"));
        assert!(msg.contains("-> {http://example.com}A"));
        assert!(msg.contains("Source: cyclic.xsd"));
    }

    #[test]
    fn test_source_error_display() {
        let err = SourceError::new("component name is not a valid NCName")
            .with_component("bad name")
            .with_source_name("broken.xsd");

        let msg = format!("{}", err);
        assert!(msg.contains("not a valid NCName"));
        assert!(msg.contains("Component: bad name"));
        assert!(msg.contains("Source: broken.xsd"));
    }

    #[test]
    fn test_save_error_display() {
        let err = SaveError::new("type system is not fully resolved")
            .with_unresolved_components(2)
            .with_outstanding_diagnostics(3);

        let msg = format!("{}", err);
        assert!(msg.contains("not fully resolved"));
        assert!(msg.contains("Unresolved components: 2"));
        assert!(msg.contains("Outstanding diagnostics: 3"));
    }

    #[test]
    fn test_error_conversion() {
        let cycle = CycleError::new("A");
        let err: Error = cycle.into();
        assert!(matches!(err, Error::Cycle(_)));

        let save = SaveError::new("refused");
        let err: Error = save.into();
        assert!(matches!(err, Error::Save(_)));
    }
}
