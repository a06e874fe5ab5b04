use std::sync::Arc;

use dashmap::DashMap;

use conduit_state::{SnapshotBackend, SnapshotError};

/// In-memory [`SnapshotBackend`] backed by a [`DashMap`].
///
/// Clones share the same map, so a test can hand one clone to a store and
/// keep another to inspect what was written or to rehydrate a second store.
/// Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshotBackend {
    data: Arc<DashMap<String, String>>,
}

impl MemorySnapshotBackend {
    /// Create a new, empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl SnapshotBackend for MemorySnapshotBackend {
    fn load(&self, key: &str) -> Result<Option<String>, SnapshotError> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), SnapshotError> {
        self.data.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<bool, SnapshotError> {
        Ok(self.data.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use conduit_state::testing::{run_backend_conformance_tests, run_store_roundtrip_test};

    use super::*;

    #[test]
    fn conformance() {
        let backend = MemorySnapshotBackend::new();
        run_backend_conformance_tests(&backend).expect("conformance tests should pass");
    }

    #[test]
    fn store_roundtrip() {
        let backend = MemorySnapshotBackend::new();
        run_store_roundtrip_test(Box::new(backend.clone()), Box::new(backend))
            .expect("store should rehydrate from its own snapshot");
    }

    #[test]
    fn clones_share_storage() {
        let a = MemorySnapshotBackend::new();
        let b = a.clone();
        a.save("k", "v").unwrap();
        assert_eq!(b.load("k").unwrap().as_deref(), Some("v"));
        assert_eq!(b.len(), 1);
        assert!(b.clear("k").unwrap());
        assert!(a.is_empty());
    }
}
