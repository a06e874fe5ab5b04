use thiserror::Error;

use conduit_core::{Classify, ErrorClass};

/// Errors raised while building the provider catalog.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A provider definition is missing required fields.
    #[error("invalid provider definition: {0}")]
    InvalidDefinition(String),
}

impl Classify for ProviderError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidDefinition(_) => ErrorClass::Validation,
        }
    }
}
