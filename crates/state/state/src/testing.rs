use std::sync::Arc;

use conduit_provider::ProviderRegistry;
use conduit_rules::{RecordType, RuleDraft};

use crate::error::{SnapshotError, StoreError};
use crate::snapshot::SnapshotBackend;
use crate::store::ConnectionStore;

/// Run the full snapshot backend conformance test suite.
///
/// Call this from your backend's test module with a fresh backend instance.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub fn run_backend_conformance_tests(backend: &dyn SnapshotBackend) -> Result<(), SnapshotError> {
    test_load_missing(backend)?;
    test_save_and_load(backend)?;
    test_save_overwrites(backend)?;
    test_clear(backend)?;
    test_keys_are_independent(backend)?;
    Ok(())
}

fn test_load_missing(backend: &dyn SnapshotBackend) -> Result<(), SnapshotError> {
    let val = backend.load("conformance.missing")?;
    assert!(val.is_none(), "load on missing key should return None");
    Ok(())
}

fn test_save_and_load(backend: &dyn SnapshotBackend) -> Result<(), SnapshotError> {
    backend.save("conformance.save-load", r#"{"hello":"world"}"#)?;
    let val = backend.load("conformance.save-load")?;
    assert_eq!(val.as_deref(), Some(r#"{"hello":"world"}"#));
    Ok(())
}

fn test_save_overwrites(backend: &dyn SnapshotBackend) -> Result<(), SnapshotError> {
    backend.save("conformance.overwrite", "v1")?;
    backend.save("conformance.overwrite", "v2")?;
    let val = backend.load("conformance.overwrite")?;
    assert_eq!(val.as_deref(), Some("v2"), "second save should win");
    Ok(())
}

fn test_clear(backend: &dyn SnapshotBackend) -> Result<(), SnapshotError> {
    backend.save("conformance.clear", "bye")?;
    let existed = backend.clear("conformance.clear")?;
    assert!(existed, "clear should return true for existing key");
    assert!(backend.load("conformance.clear")?.is_none());

    let existed = backend.clear("conformance.clear")?;
    assert!(!existed, "clear on missing key should return false");
    Ok(())
}

fn test_keys_are_independent(backend: &dyn SnapshotBackend) -> Result<(), SnapshotError> {
    backend.save("conformance.a", "a")?;
    backend.save("conformance.b", "b")?;
    backend.clear("conformance.a")?;
    assert_eq!(backend.load("conformance.b")?.as_deref(), Some("b"));
    Ok(())
}

/// Flush a populated store into `backend` and rehydrate a second store from
/// it, asserting the two hold identical connections.
///
/// Takes two handles onto the same underlying storage, since
/// [`ConnectionStore::init`] consumes its backend.
///
/// # Errors
///
/// Returns an error if any store operation fails.
pub fn run_store_roundtrip_test(
    writer: Box<dyn SnapshotBackend>,
    reader: Box<dyn SnapshotBackend>,
) -> Result<(), StoreError> {
    let registry = Arc::new(ProviderRegistry::builtin());
    let key = "conformance.roundtrip";

    let mut store = ConnectionStore::init(Arc::clone(&registry), writer, key)?;
    store.connect("gong", Some("sales@acme.com".into()))?;
    store.create_rule(
        "gong",
        &RuleDraft::new("Discovery calls")
            .record_type(RecordType::External)
            .keyword("Discovery")
            .user("u-42"),
    )?;
    store.connect("salesforce", None)?;
    store.mark_error("salesforce", "token expired")?;
    let expected = store.list_connections();
    store.teardown()?;

    let restored = ConnectionStore::init(registry, reader, key)?;
    assert_eq!(restored.list_connections(), expected);
    Ok(())
}
