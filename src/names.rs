//! XML name validation
//!
//! Local names of schema components must be NCNames (non-colonized names).
//! Validation happens once, when a document's components are defined into
//! a build; query paths never re-check.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

// NCName pattern (simplified - should follow XML spec exactly)
static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\-\.0-9]*$")
        .unwrap()
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    if name.is_empty() || name.contains(':') {
        return false;
    }

    NCNAME.is_match(name)
}

/// Validate an NCName and return an error if invalid
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(Error::Name(format!("Invalid NCName: '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("element"));
        assert!(is_valid_ncname("my-element"));
        assert!(is_valid_ncname("my_element"));
        assert!(is_valid_ncname("element123"));
        assert!(is_valid_ncname("_element"));

        assert!(!is_valid_ncname(""));
        assert!(!is_valid_ncname("123element"));
        assert!(!is_valid_ncname("-element"));
        assert!(!is_valid_ncname("prefix:element"));
        assert!(!is_valid_ncname("white space"));
    }

    #[test]
    fn test_validate_ncname() {
        assert!(validate_ncname("element").is_ok());
        assert!(validate_ncname("123").is_err());
        assert!(validate_ncname("a:b").is_err());
    }
}
