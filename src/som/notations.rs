//! Notation declarations

use crate::namespaces::QName;

/// A notation declaration
#[derive(Debug, Clone, PartialEq)]
pub struct NotationDecl {
    /// Qualified name of the notation
    pub name: QName,
    /// Logical name of the supplying document
    pub source_name: String,
    /// Public identifier
    pub public_id: Option<String>,
    /// System identifier
    pub system_id: Option<String>,
}

impl NotationDecl {
    /// Create a notation declaration
    pub fn new(name: QName, source_name: impl Into<String>) -> Self {
        Self {
            name,
            source_name: source_name.into(),
            public_id: None,
            system_id: None,
        }
    }

    /// Set the public identifier
    pub fn with_public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }

    /// Set the system identifier
    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notation_builders() {
        let n = NotationDecl::new(QName::local("jpeg"), "doc.xsd")
            .with_public_id("image/jpeg")
            .with_system_id("viewer.exe");
        assert_eq!(n.public_id.as_deref(), Some("image/jpeg"));
        assert_eq!(n.system_id.as_deref(), Some("viewer.exe"));
    }
}
