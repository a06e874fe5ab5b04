use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use conduit_provider::{Capability, Provider, ProviderCategory, ProviderRegistry};
use conduit_state::{ConnectionStore, DEFAULT_STORAGE_KEY, SnapshotBackend};
use conduit_state_file::FileSnapshotBackend;
use conduit_state_memory::MemorySnapshotBackend;

/// Top-level CLI configuration, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConduitConfig {
    /// Where connection state is persisted.
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Extra providers, merged over the built-in catalog.
    ///
    /// ```toml
    /// [[providers]]
    /// id = "pipedrive"
    /// name = "Pipedrive"
    /// category = "crm"
    /// capabilities = ["read", "write"]
    /// ```
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Snapshot backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// JSON files under [`StoreConfig::path`].
    #[default]
    File,
    /// Process-local; nothing survives the invocation.
    Memory,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Directory for the file backend. Defaults to `.conduit`.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: default_store_path(),
            storage_key: default_storage_key(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".conduit")
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_owned()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives. `RUST_LOG` takes precedence when set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "warn".to_owned()
}

/// A provider definition from the config file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    pub category: ProviderCategory,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    pub description: Option<String>,
}

impl ProviderConfig {
    fn to_provider(&self) -> Provider {
        let provider = Provider::new(self.id.as_str(), self.name.as_str(), self.category);
        let provider = self
            .capabilities
            .iter()
            .fold(provider, |p, c| p.with_capability(*c));
        match &self.description {
            Some(description) => provider.with_description(description.as_str()),
            None => provider,
        }
    }
}

impl ConduitConfig {
    /// Load configuration from `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// The built-in catalog with configured providers registered on top.
    pub fn registry(&self) -> anyhow::Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::builtin();
        for entry in &self.providers {
            registry.register(entry.to_provider())?;
        }
        Ok(registry)
    }

    /// Build the registry and open the connection store on the configured backend.
    pub fn open_store(&self) -> anyhow::Result<ConnectionStore> {
        let registry = Arc::new(self.registry()?);
        let backend: Box<dyn SnapshotBackend> = match self.store.backend {
            BackendKind::File => Box::new(FileSnapshotBackend::new(&self.store.path)),
            BackendKind::Memory => Box::new(MemorySnapshotBackend::new()),
        };
        info!(
            backend = ?self.store.backend,
            storage_key = %self.store.storage_key,
            providers = registry.len(),
            "opening connection store"
        );
        ConnectionStore::init(registry, backend, self.store.storage_key.as_str())
            .context("failed to load connection state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: ConduitConfig = toml::from_str("").unwrap();
        assert_eq!(config.store.backend, BackendKind::File);
        assert_eq!(config.store.path, PathBuf::from(".conduit"));
        assert_eq!(config.store.storage_key, "conduit.connections");
        assert_eq!(config.logging.filter, "warn");
        assert!(config.providers.is_empty());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConduitConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.store.backend, BackendKind::File);
    }

    #[test]
    fn parses_full_config() {
        let config: ConduitConfig = toml::from_str(
            r#"
            [store]
            backend = "memory"
            storage_key = "team-a"

            [logging]
            filter = "conduit_state=debug"

            [[providers]]
            id = "pipedrive"
            name = "Pipedrive"
            category = "crm"
            capabilities = ["read", "write"]
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, BackendKind::Memory);
        assert_eq!(config.store.storage_key, "team-a");
        assert_eq!(config.logging.filter, "conduit_state=debug");

        let registry = config.registry().unwrap();
        let pipedrive = registry.get("pipedrive").unwrap();
        assert_eq!(pipedrive.category, ProviderCategory::Crm);
        assert!(pipedrive.supports(Capability::Write));
        assert!(registry.contains("gong"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<ConduitConfig>("[store]\nbackend = \"redis\"").is_err());
        assert!(toml::from_str::<ConduitConfig>("[server]\nport = 1").is_err());
    }

    #[test]
    fn blank_provider_id_fails_registry_build() {
        let config: ConduitConfig = toml::from_str(
            r#"
            [[providers]]
            id = " "
            name = "Nothing"
            category = "crm"
            "#,
        )
        .unwrap();
        assert!(config.registry().is_err());
    }

    #[test]
    fn file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConduitConfig {
            store: StoreConfig {
                path: dir.path().to_path_buf(),
                ..StoreConfig::default()
            },
            ..ConduitConfig::default()
        };

        let mut store = config.open_store().unwrap();
        store.connect("notion", None).unwrap();
        store.teardown().unwrap();

        let store = config.open_store().unwrap();
        assert!(store.connection("notion").is_some());
    }
}
