use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use conduit_core::ProviderId;

use crate::settings::ConnectionSettings;

/// Lifecycle status of a provider connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    /// Reported for providers with no connection in the store.
    Disconnected,
    /// The source reported a failure (expired token, revoked access).
    Error,
}

impl ConnectionStatus {
    /// Return the `snake_case` string representation (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authorized link between this system and one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub provider_id: ProviderId,
    pub status: ConnectionStatus,
    pub connected_at: DateTime<Utc>,
    /// Account the user authorized with, e.g. `"sales@acme.com"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_label: Option<String>,
    pub settings: ConnectionSettings,
    /// Last failure reported for this connection; cleared on reconnect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
