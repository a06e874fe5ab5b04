use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use conduit_core::ProviderId;

/// The family a provider belongs to.
///
/// The category decides which settings shape a connection to the provider
/// carries and which kind of candidate records it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCategory {
    /// Customer relationship management (deals, accounts, stages).
    Crm,
    /// Chat platforms.
    Communication,
    /// Wikis, drives and document stores.
    StorageAndWiki,
    /// Sales enablement content libraries.
    Enablement,
    /// Call recording and conversation intelligence.
    CallIntelligence,
    /// Calendars producing meetings.
    Calendar,
}

impl ProviderCategory {
    /// Every category, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Crm,
        Self::Communication,
        Self::StorageAndWiki,
        Self::Enablement,
        Self::CallIntelligence,
        Self::Calendar,
    ];

    /// Return the `snake_case` string representation (matches serde serialization).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crm => "crm",
            Self::Communication => "communication",
            Self::StorageAndWiki => "storage_and_wiki",
            Self::Enablement => "enablement",
            Self::CallIntelligence => "call_intelligence",
            Self::Calendar => "calendar",
        }
    }
}

impl fmt::Display for ProviderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown provider category: {s}"))
    }
}

/// What the system may do against a provider once connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Read,
    Write,
}

/// A catalog entry describing a connectable third-party system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Unique identifier, e.g. `"gong"`.
    pub id: ProviderId,
    /// Human-readable display name.
    pub name: String,
    /// Provider family.
    pub category: ProviderCategory,
    /// Supported capabilities.
    pub capabilities: BTreeSet<Capability>,
    /// Optional one-line description shown in catalogs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Provider {
    /// Create a read-only provider with the given id, name and category.
    pub fn new(
        id: impl Into<ProviderId>,
        name: impl Into<String>,
        category: ProviderCategory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            capabilities: BTreeSet::from([Capability::Read]),
            description: None,
        }
    }

    /// Add a capability.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns `true` if the provider supports `capability`.
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}
