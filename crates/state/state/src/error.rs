use thiserror::Error;

use conduit_core::{Classify, ErrorClass, ProviderId};
use conduit_rules::RuleError;

use crate::settings::SettingsKind;

/// Errors from snapshot backend operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors returned by [`ConnectionStore`](crate::ConnectionStore) operations.
///
/// On any error the store's state is left exactly as it was before the call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown provider: {0}")]
    UnknownProvider(ProviderId),

    #[error("provider not connected: {0}")]
    NotConnected(ProviderId),

    #[error("provider already connected: {0}")]
    AlreadyConnected(ProviderId),

    #[error("settings for {provider} must be {expected}, got {found}")]
    SettingsMismatch {
        provider: ProviderId,
        expected: SettingsKind,
        found: SettingsKind,
    },

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedSnapshotVersion { expected: u32, found: u32 },
}

impl Classify for SnapshotError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidKey(_) => ErrorClass::CallerBug,
            Self::Io(_) | Self::Serialization(_) | Self::Backend(_) => ErrorClass::Internal,
        }
    }
}

impl Classify for StoreError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownProvider(_) | Self::NotConnected(_) => ErrorClass::CallerBug,
            Self::AlreadyConnected(_) => ErrorClass::Informational,
            Self::SettingsMismatch { .. } => ErrorClass::Validation,
            Self::Rule(e) => e.class(),
            Self::Snapshot(e) => e.class(),
            Self::UnsupportedSnapshotVersion { .. } => ErrorClass::Internal,
        }
    }
}
