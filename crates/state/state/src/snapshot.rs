use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use conduit_core::ProviderId;

use crate::connection::Connection;
use crate::error::SnapshotError;

/// Storage key the store's snapshot is written under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "conduit.connections";

/// Version written into every snapshot. Snapshots with another version are
/// refused on load; there is no migration path.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of the connection store.
///
/// Providers are static and never persisted; only connections are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    #[serde(default)]
    pub connections: BTreeMap<ProviderId, Connection>,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            connections: BTreeMap::new(),
        }
    }
}

/// Persistence seam for the connection store.
///
/// Backends store opaque string values under string keys. Implementations
/// must be `Send + Sync` so one backend can be shared between store instances.
pub trait SnapshotBackend: Send + Sync {
    /// Get the value for a key. Returns `None` if nothing was saved.
    fn load(&self, key: &str) -> Result<Option<String>, SnapshotError>;

    /// Save a value, overwriting any previous value.
    fn save(&self, key: &str, value: &str) -> Result<(), SnapshotError>;

    /// Delete a key. Returns `true` if the key existed.
    fn clear(&self, key: &str) -> Result<bool, SnapshotError>;
}
