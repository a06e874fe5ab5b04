use serde::{Deserialize, Serialize};

/// How a caller should treat an error surfaced by one of the Conduit crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Bad user input. Surface inline next to the offending field.
    Validation,
    /// The caller referenced something that does not exist (stale provider
    /// id, missing connection). Log it and surface a generic failure.
    CallerBug,
    /// Not a failure as such; the caller decides whether to treat it as success.
    Informational,
    /// Persistence or serialization failure underneath the store.
    Internal,
}

impl ErrorClass {
    /// Return the `snake_case` string representation (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::CallerBug => "caller_bug",
            Self::Informational => "informational",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every error type so collaborators can route errors
/// without matching on each crate's variants.
pub trait Classify {
    fn class(&self) -> ErrorClass;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_as_str_matches_serde() {
        for class in [
            ErrorClass::Validation,
            ErrorClass::CallerBug,
            ErrorClass::Informational,
            ErrorClass::Internal,
        ] {
            let json = serde_json::to_string(&class).unwrap();
            assert_eq!(json, format!("\"{}\"", class.as_str()));
        }
    }
}
