use thiserror::Error;

use conduit_core::{Classify, ErrorClass, RuleId};

/// A draft rule was rejected before entering a rule set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The rule name is empty or whitespace only.
    #[error("rule name must not be empty")]
    EmptyName,
}

/// Errors that can occur while editing a rule set or loading rules from a frontend.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule failed draft validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No rule with the given id exists in the rule set.
    #[error("rule not found: {0}")]
    NotFound(RuleId),

    /// Two rules in one rule set share an id.
    #[error("duplicate rule id: {0}")]
    DuplicateId(RuleId),

    /// A parse error when loading rules from a frontend.
    #[error("parse error: {0}")]
    Parse(String),
}

impl Classify for ValidationError {
    fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }
}

impl Classify for RuleError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) | Self::DuplicateId(_) | Self::Parse(_) => ErrorClass::Validation,
            Self::NotFound(_) => ErrorClass::CallerBug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = RuleError::from(ValidationError::EmptyName);
        assert_eq!(err.to_string(), "rule name must not be empty");

        let err = RuleError::NotFound(RuleId::new("r-1"));
        assert_eq!(err.to_string(), "rule not found: r-1");

        let err = RuleError::DuplicateId(RuleId::new("r-2"));
        assert_eq!(err.to_string(), "duplicate rule id: r-2");

        let err = RuleError::Parse("unexpected token".into());
        assert_eq!(err.to_string(), "parse error: unexpected token");
    }

    #[test]
    fn classification() {
        assert_eq!(ValidationError::EmptyName.class(), ErrorClass::Validation);
        assert_eq!(
            RuleError::NotFound(RuleId::new("r")).class(),
            ErrorClass::CallerBug
        );
        assert_eq!(
            RuleError::Parse("bad".into()).class(),
            ErrorClass::Validation
        );
    }
}
