use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use conduit_core::{ProviderId, RuleId};
use conduit_provider::{Provider, ProviderRegistry};
use conduit_rules::{
    CandidateRecord, Evaluation, EvaluationTrace, IngestionRule, RuleDraft, RuleError, RuleSet,
    evaluate, explain,
};

use crate::connection::{Connection, ConnectionStatus};
use crate::error::{SnapshotError, StoreError};
use crate::settings::{ConnectionSettings, SettingsKind};
use crate::snapshot::{SNAPSHOT_VERSION, SnapshotBackend, StoreSnapshot};

/// Source of `connected_at` timestamps.
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// How [`ConnectionStore::connect_with`] treats an existing connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectMode {
    /// Overwrite the connection, keeping its settings and rules.
    #[default]
    Reconnect,
    /// Overwrite the connection and reset settings to the category default.
    Reset,
    /// Fail with [`StoreError::AlreadyConnected`] if a connection exists.
    Exclusive,
}

struct Persistence {
    backend: Box<dyn SnapshotBackend>,
    key: String,
}

/// The single source of truth for provider connection state.
///
/// Connections are keyed by provider id, so there is at most one per provider.
/// Mutators take `&mut self` and run to completion synchronously; a host that
/// shares the store between threads serializes access itself. Every failed
/// call leaves the store unchanged.
pub struct ConnectionStore {
    registry: Arc<ProviderRegistry>,
    connections: BTreeMap<ProviderId, Connection>,
    persistence: Option<Persistence>,
    clock: Clock,
}

impl fmt::Debug for ConnectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionStore")
            .field("connections", &self.connections)
            .field(
                "storage_key",
                &self.persistence.as_ref().map(|p| p.key.as_str()),
            )
            .finish_non_exhaustive()
    }
}

impl ConnectionStore {
    /// Create an empty store with no persistence.
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            connections: BTreeMap::new(),
            persistence: None,
            clock: Box::new(Utc::now),
        }
    }

    /// Create a store backed by `backend`, rehydrating any snapshot saved
    /// under `storage_key`.
    #[instrument(skip_all, fields(storage_key = tracing::field::Empty))]
    pub fn init(
        registry: Arc<ProviderRegistry>,
        backend: Box<dyn SnapshotBackend>,
        storage_key: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let key = storage_key.into();
        tracing::Span::current().record("storage_key", key.as_str());

        let mut store = Self::new(registry);
        if let Some(raw) = backend.load(&key)? {
            store.restore(&raw)?;
            info!(connections = store.connections.len(), "restored connection snapshot");
        } else {
            debug!("no snapshot found, starting empty");
        }
        store.persistence = Some(Persistence { backend, key });
        Ok(store)
    }

    /// Replace the timestamp source (used by tests and simulations).
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// The provider catalog this store validates against.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Connect a provider, overwriting any existing connection but keeping
    /// its settings.
    pub fn connect(
        &mut self,
        provider_id: &str,
        account_label: Option<String>,
    ) -> Result<&Connection, StoreError> {
        self.connect_with(provider_id, account_label, ConnectMode::Reconnect)
    }

    /// Connect a provider with an explicit policy for existing connections.
    ///
    /// Reconnecting resets the status to `connected`, refreshes
    /// `connected_at`, and clears `last_error`.
    #[instrument(skip(self, account_label))]
    pub fn connect_with(
        &mut self,
        provider_id: &str,
        account_label: Option<String>,
        mode: ConnectMode,
    ) -> Result<&Connection, StoreError> {
        let provider = self.provider(provider_id)?;
        let category = provider.category;
        let id = provider.id.clone();

        let previous = self.connections.remove(provider_id);
        if mode == ConnectMode::Exclusive
            && let Some(existing) = previous
        {
            self.connections.insert(id.clone(), existing);
            return Err(StoreError::AlreadyConnected(id));
        }

        let settings = match previous {
            Some(existing) if mode == ConnectMode::Reconnect => {
                if existing.settings.kind() == SettingsKind::for_category(category) {
                    existing.settings
                } else {
                    warn!(
                        provider = %id,
                        found = %existing.settings.kind(),
                        "stored settings do not fit provider category, resetting"
                    );
                    ConnectionSettings::default_for(category)
                }
            }
            _ => ConnectionSettings::default_for(category),
        };

        let connection = Connection {
            provider_id: id.clone(),
            status: ConnectionStatus::Connected,
            connected_at: (self.clock)(),
            account_label,
            settings,
            last_error: None,
        };
        info!(provider = %id, "provider connected");
        // The previous entry was removed above, so this always inserts.
        Ok(self.connections.entry(id).or_insert(connection))
    }

    /// Remove a provider's connection, destroying its settings and rules.
    ///
    /// Callers are expected to have asked the user about previously ingested
    /// data before calling this.
    #[instrument(skip(self))]
    pub fn disconnect(&mut self, provider_id: &str) -> Result<Connection, StoreError> {
        let connection = self
            .connections
            .remove(provider_id)
            .ok_or_else(|| not_connected(provider_id))?;
        info!(
            provider = %provider_id,
            rules = connection.settings.rules().len(),
            "provider disconnected"
        );
        Ok(connection)
    }

    /// Replace a connection's settings wholesale.
    ///
    /// The payload must be of the kind matching the provider's category and
    /// its embedded rules must be valid; rules are re-normalized on the way in.
    #[instrument(skip(self, settings), fields(kind = %settings.kind()))]
    pub fn configure(
        &mut self,
        provider_id: &str,
        mut settings: ConnectionSettings,
    ) -> Result<(), StoreError> {
        if !self.connections.contains_key(provider_id) {
            return Err(not_connected(provider_id));
        }

        let expected = SettingsKind::for_category(self.provider(provider_id)?.category);
        if settings.kind() != expected {
            return Err(StoreError::SettingsMismatch {
                provider: ProviderId::from(provider_id),
                expected,
                found: settings.kind(),
            });
        }
        settings.normalize_and_validate()?;

        let rules = settings.rules().len();
        let connection = self
            .connections
            .get_mut(provider_id)
            .ok_or_else(|| not_connected(provider_id))?;
        connection.settings = settings;
        info!(provider = %provider_id, rules, "connection configured");
        Ok(())
    }

    /// Flag a connection as failed, keeping its settings.
    pub fn mark_error(
        &mut self,
        provider_id: &str,
        message: impl Into<String>,
    ) -> Result<(), StoreError> {
        let connection = self
            .connections
            .get_mut(provider_id)
            .ok_or_else(|| not_connected(provider_id))?;
        let message = message.into();
        warn!(provider = %provider_id, error = %message, "connection marked as failed");
        connection.status = ConnectionStatus::Error;
        connection.last_error = Some(message);
        Ok(())
    }

    /// Look up a connection.
    pub fn connection(&self, provider_id: &str) -> Option<&Connection> {
        self.connections.get(provider_id)
    }

    /// Status of a provider; `disconnected` when no connection exists.
    pub fn status(&self, provider_id: &str) -> ConnectionStatus {
        self.connections
            .get(provider_id)
            .map_or(ConnectionStatus::Disconnected, |c| c.status)
    }

    /// Snapshot of every connection, ordered by provider id.
    pub fn list_connections(&self) -> Vec<Connection> {
        self.connections.values().cloned().collect()
    }

    /// The rule set embedded in a connection's settings.
    pub fn rules(&self, provider_id: &str) -> Result<&RuleSet, StoreError> {
        self.connections
            .get(provider_id)
            .map(|c| c.settings.rules())
            .ok_or_else(|| not_connected(provider_id))
    }

    /// Validate a draft, assign it an id, and append it to the connection's rules.
    pub fn create_rule(
        &mut self,
        provider_id: &str,
        draft: &RuleDraft,
    ) -> Result<IngestionRule, StoreError> {
        self.edit_rules(provider_id, |rules| rules.create(draft).cloned())
    }

    /// Add several drafts at once. Either all are added or none are.
    pub fn import_rules(
        &mut self,
        provider_id: &str,
        drafts: &[RuleDraft],
    ) -> Result<Vec<IngestionRule>, StoreError> {
        self.edit_rules(provider_id, |rules| {
            drafts
                .iter()
                .map(|draft| rules.create(draft).cloned())
                .collect()
        })
    }

    /// Replace every field of a rule except its id and active flag.
    pub fn update_rule(
        &mut self,
        provider_id: &str,
        rule_id: &RuleId,
        draft: &RuleDraft,
    ) -> Result<IngestionRule, StoreError> {
        self.edit_rules(provider_id, |rules| rules.update(rule_id, draft).cloned())
    }

    pub fn delete_rule(
        &mut self,
        provider_id: &str,
        rule_id: &RuleId,
    ) -> Result<IngestionRule, StoreError> {
        self.edit_rules(provider_id, |rules| rules.delete(rule_id))
    }

    /// Flip a rule's active flag, returning the new value.
    pub fn toggle_rule(&mut self, provider_id: &str, rule_id: &RuleId) -> Result<bool, StoreError> {
        self.edit_rules(provider_id, |rules| rules.toggle(rule_id))
    }

    /// Evaluate a candidate record against the connection's active rules.
    pub fn evaluate(
        &self,
        provider_id: &str,
        record: &CandidateRecord,
    ) -> Result<Evaluation, StoreError> {
        Ok(evaluate(record, self.rules(provider_id)?.active()))
    }

    /// Like [`evaluate`](Self::evaluate), with a per-rule trace including inactive rules.
    pub fn explain(
        &self,
        provider_id: &str,
        record: &CandidateRecord,
    ) -> Result<EvaluationTrace, StoreError> {
        Ok(explain(record, self.rules(provider_id)?))
    }

    /// Serializable copy of the store's state.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            version: SNAPSHOT_VERSION,
            connections: self.connections.clone(),
        }
    }

    /// Write the current snapshot to the backend, if one is attached.
    pub fn flush(&self) -> Result<(), StoreError> {
        let Some(persistence) = &self.persistence else {
            debug!("no snapshot backend attached, skipping flush");
            return Ok(());
        };
        let raw = serde_json::to_string(&self.snapshot())
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        persistence.backend.save(&persistence.key, &raw)?;
        debug!(
            storage_key = %persistence.key,
            connections = self.connections.len(),
            "flushed connection snapshot"
        );
        Ok(())
    }

    /// Flush and release the store.
    pub fn teardown(self) -> Result<(), StoreError> {
        self.flush()
    }

    fn restore(&mut self, raw: &str) -> Result<(), StoreError> {
        let snapshot: StoreSnapshot = serde_json::from_str(raw)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedSnapshotVersion {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }

        let mut connections = BTreeMap::new();
        for (id, mut connection) in snapshot.connections {
            if connection.provider_id != id {
                return Err(SnapshotError::Serialization(format!(
                    "connection stored under {id} belongs to {}",
                    connection.provider_id
                ))
                .into());
            }
            if !self.registry.contains(&id) {
                warn!(provider = %id, "snapshot references a provider missing from the catalog");
            }
            connection.settings.normalize_and_validate()?;
            connections.insert(id, connection);
        }
        self.connections = connections;
        Ok(())
    }

    fn provider(&self, provider_id: &str) -> Result<&Provider, StoreError> {
        self.registry.get(provider_id).ok_or_else(|| {
            warn!(provider = %provider_id, "unknown provider");
            StoreError::UnknownProvider(ProviderId::from(provider_id))
        })
    }

    /// Apply `edit` to a copy of the connection's rules, then commit the
    /// result through [`configure`](Self::configure).
    fn edit_rules<T>(
        &mut self,
        provider_id: &str,
        edit: impl FnOnce(&mut RuleSet) -> Result<T, RuleError>,
    ) -> Result<T, StoreError> {
        let mut settings = self
            .connections
            .get(provider_id)
            .ok_or_else(|| not_connected(provider_id))?
            .settings
            .clone();
        let output = edit(settings.rules_mut())?;
        self.configure(provider_id, settings)?;
        Ok(output)
    }
}

fn not_connected(provider_id: &str) -> StoreError {
    warn!(provider = %provider_id, "operation on a provider that is not connected");
    StoreError::NotConnected(ProviderId::from(provider_id))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use chrono::TimeZone;
    use conduit_provider::ProviderCategory;
    use conduit_rules::{RecordType, ValidationError};

    use super::*;
    use crate::settings::{CallIntelligenceSettings, DocumentSettings};

    fn store() -> ConnectionStore {
        ConnectionStore::new(Arc::new(ProviderRegistry::builtin()))
    }

    /// A clock that advances one second per reading.
    fn ticking_clock() -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
        let ticks = AtomicI64::new(0);
        move || {
            let n = ticks.fetch_add(1, Ordering::SeqCst);
            Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap()
        }
    }

    fn call_settings_with(drafts: &[RuleDraft]) -> ConnectionSettings {
        let mut settings = CallIntelligenceSettings::default();
        for draft in drafts {
            settings.rules.create(draft).unwrap();
        }
        ConnectionSettings::CallIntelligence(settings)
    }

    #[test]
    fn connect_unknown_provider_fails() {
        let mut store = store();
        let err = store.connect("myspace", None).unwrap_err();
        assert!(matches!(err, StoreError::UnknownProvider(ref id) if id.as_str() == "myspace"));
        assert!(store.list_connections().is_empty());
    }

    #[test]
    fn connect_creates_default_settings_for_category() {
        let mut store = store();
        let conn = store.connect("confluence", Some("wiki@acme.com".into())).unwrap();
        assert_eq!(conn.status, ConnectionStatus::Connected);
        assert_eq!(conn.account_label.as_deref(), Some("wiki@acme.com"));
        assert_eq!(conn.settings.kind(), SettingsKind::Document);
        assert!(conn.settings.rules().is_empty());
    }

    #[test]
    fn reconnect_is_idempotent_and_refreshes_timestamp() {
        let mut store = store().with_clock(ticking_clock());
        let first = store.connect("gong", Some("a".into())).unwrap().connected_at;
        let second = store.connect("gong", Some("a".into())).unwrap().connected_at;

        assert_eq!(store.list_connections().len(), 1);
        assert!(second > first);
    }

    #[test]
    fn reconnect_preserves_settings_and_clears_error() {
        let mut store = store();
        store.connect("gong", None).unwrap();
        store
            .create_rule("gong", &RuleDraft::new("Demos").keyword("demo"))
            .unwrap();
        store.mark_error("gong", "token expired").unwrap();
        assert_eq!(store.status("gong"), ConnectionStatus::Error);

        let conn = store.connect("gong", None).unwrap();
        assert_eq!(conn.status, ConnectionStatus::Connected);
        assert!(conn.last_error.is_none());
        assert_eq!(conn.settings.rules().len(), 1);
    }

    #[test]
    fn reset_mode_clears_settings() {
        let mut store = store();
        store.connect("gong", None).unwrap();
        store.create_rule("gong", &RuleDraft::new("Demos")).unwrap();

        let conn = store
            .connect_with("gong", None, ConnectMode::Reset)
            .unwrap();
        assert!(conn.settings.rules().is_empty());
    }

    #[test]
    fn exclusive_mode_refuses_existing_connection() {
        let mut store = store().with_clock(ticking_clock());
        let first = store.connect("gong", Some("a".into())).unwrap().clone();

        let err = store
            .connect_with("gong", Some("b".into()), ConnectMode::Exclusive)
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyConnected(_)));
        assert_eq!(store.connection("gong"), Some(&first));

        store.disconnect("gong").unwrap();
        assert!(
            store
                .connect_with("gong", None, ConnectMode::Exclusive)
                .is_ok()
        );
    }

    #[test]
    fn configure_requires_connection() {
        let mut store = store();
        let err = store
            .configure("gong", call_settings_with(&[]))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotConnected(_)));
        assert!(store.list_connections().is_empty());
    }

    #[test]
    fn configure_replaces_settings_wholesale() {
        let mut store = store();
        store.connect("gong", None).unwrap();
        store.create_rule("gong", &RuleDraft::new("Old")).unwrap();

        store
            .configure("gong", call_settings_with(&[RuleDraft::new("New")]))
            .unwrap();

        let names: Vec<&str> = store
            .rules("gong")
            .unwrap()
            .iter()
            .map(IngestionRule::name)
            .collect();
        assert_eq!(names, vec!["New"]);
    }

    #[test]
    fn configure_rejects_mismatched_kind() {
        let mut store = store();
        store.connect("gong", None).unwrap();
        let err = store
            .configure(
                "gong",
                ConnectionSettings::Document(DocumentSettings::default()),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::SettingsMismatch {
                expected: SettingsKind::CallIntelligence,
                found: SettingsKind::Document,
                ..
            }
        ));
    }

    #[test]
    fn configure_rejects_invalid_rules_without_mutating() {
        let mut store = store();
        store.connect("gong", None).unwrap();
        store.create_rule("gong", &RuleDraft::new("Keep me")).unwrap();

        let payload = serde_json::json!({
            "kind": "call_intelligence",
            "rules": [{"id": "r-1", "name": "", "record_type": "all", "is_active": true}]
        });
        let settings: ConnectionSettings = serde_json::from_value(payload).unwrap();
        let err = store.configure("gong", settings).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(RuleError::Validation(ValidationError::EmptyName))
        ));
        assert_eq!(store.rules("gong").unwrap().len(), 1);
    }

    #[test]
    fn configure_normalizes_incoming_keywords() {
        let mut store = store();
        store.connect("gong", None).unwrap();
        let payload = serde_json::json!({
            "kind": "call_intelligence",
            "rules": [{
                "id": "r-1", "name": "Demos", "record_type": "external",
                "title_keywords": ["DEMO", "Demo"], "is_active": true
            }]
        });
        store
            .configure("gong", serde_json::from_value(payload).unwrap())
            .unwrap();
        let rule = store.rules("gong").unwrap().iter().next().unwrap();
        assert_eq!(rule.title_keywords().len(), 1);
        assert!(rule.title_keywords().contains("demo"));
    }

    #[test]
    fn disconnect_destroys_rules() {
        let mut store = store();
        store.connect("gong", None).unwrap();
        store.create_rule("gong", &RuleDraft::new("Demos")).unwrap();

        let removed = store.disconnect("gong").unwrap();
        assert_eq!(removed.settings.rules().len(), 1);
        assert_eq!(store.status("gong"), ConnectionStatus::Disconnected);

        assert!(matches!(
            store.configure("gong", call_settings_with(&[])),
            Err(StoreError::NotConnected(_))
        ));
        assert!(matches!(
            store.disconnect("gong"),
            Err(StoreError::NotConnected(_))
        ));

        let conn = store.connect("gong", None).unwrap();
        assert!(conn.settings.rules().is_empty());
    }

    #[test]
    fn rule_crud_through_store() {
        let mut store = store();
        store.connect("gong", None).unwrap();

        let rule = store
            .create_rule(
                "gong",
                &RuleDraft::new("Demos")
                    .record_type(RecordType::External)
                    .keyword("Demo"),
            )
            .unwrap();
        let id = rule.id().clone();

        let updated = store
            .update_rule("gong", &id, &RuleDraft::new("Kickoffs").keyword("kickoff"))
            .unwrap();
        assert_eq!(updated.id(), &id);
        assert_eq!(updated.name(), "Kickoffs");

        assert!(!store.toggle_rule("gong", &id).unwrap());
        assert_eq!(store.rules("gong").unwrap().active().count(), 0);

        store.delete_rule("gong", &id).unwrap();
        assert!(store.rules("gong").unwrap().is_empty());

        assert!(matches!(
            store.delete_rule("gong", &id),
            Err(StoreError::Rule(RuleError::NotFound(_)))
        ));
    }

    #[test]
    fn create_rule_requires_connection() {
        let mut store = store();
        assert!(matches!(
            store.create_rule("gong", &RuleDraft::new("Demos")),
            Err(StoreError::NotConnected(_))
        ));
    }

    #[test]
    fn create_rule_with_empty_name_fails() {
        let mut store = store();
        store.connect("gong", None).unwrap();
        assert!(matches!(
            store.create_rule("gong", &RuleDraft::new("  ")),
            Err(StoreError::Rule(RuleError::Validation(ValidationError::EmptyName)))
        ));
        assert!(store.rules("gong").unwrap().is_empty());
    }

    #[test]
    fn import_is_all_or_nothing() {
        let mut store = store();
        store.connect("gong", None).unwrap();

        let result = store.import_rules(
            "gong",
            &[RuleDraft::new("Fine"), RuleDraft::new("")],
        );
        assert!(result.is_err());
        assert!(store.rules("gong").unwrap().is_empty());

        let added = store
            .import_rules("gong", &[RuleDraft::new("A"), RuleDraft::new("B")])
            .unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(store.rules("gong").unwrap().len(), 2);
    }

    #[test]
    fn evaluate_uses_active_rules_only() {
        let mut store = store();
        store.connect("gong", None).unwrap();
        let id = store
            .create_rule("gong", &RuleDraft::new("Demos").keyword("demo"))
            .unwrap()
            .id()
            .clone();

        let record = CandidateRecord::new(true, "Demo walkthrough");
        assert!(store.evaluate("gong", &record).unwrap().included);

        store.toggle_rule("gong", &id).unwrap();
        assert!(!store.evaluate("gong", &record).unwrap().included);

        let trace = store.explain("gong", &record).unwrap();
        assert_eq!(trace.total_rules_skipped, 1);
    }

    #[test]
    fn evaluate_requires_connection() {
        let store = store();
        let record = CandidateRecord::new(true, "Demo");
        assert!(matches!(
            store.evaluate("gong", &record),
            Err(StoreError::NotConnected(_))
        ));
    }

    #[test]
    fn mark_error_requires_connection() {
        let mut store = store();
        assert!(matches!(
            store.mark_error("gong", "boom"),
            Err(StoreError::NotConnected(_))
        ));
    }

    #[test]
    fn list_connections_is_a_snapshot() {
        let mut store = store();
        store.connect("slack", None).unwrap();
        store.connect("gong", None).unwrap();

        let listed = store.list_connections();
        store.disconnect("gong").unwrap();

        let ids: Vec<&str> = listed.iter().map(|c| c.provider_id.as_str()).collect();
        assert_eq!(ids, vec!["gong", "slack"]);
        assert_eq!(store.list_connections().len(), 1);
    }

    #[test]
    fn flush_without_backend_is_noop() {
        let mut store = store();
        store.connect("gong", None).unwrap();
        assert!(store.flush().is_ok());
    }

    #[test]
    fn snapshot_carries_version_and_connections() {
        let mut store = store();
        store.connect("hubspot", None).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(
            snapshot.connections["hubspot"].settings.kind(),
            SettingsKind::for_category(ProviderCategory::Crm)
        );
    }
}
