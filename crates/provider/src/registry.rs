use std::collections::BTreeMap;

use tracing::debug;

use conduit_core::ProviderId;

use crate::catalog;
use crate::error::ProviderError;
use crate::provider::{Provider, ProviderCategory};

/// A read-only catalog of connectable providers, keyed by provider id.
///
/// The registry is built once at startup and then shared behind an `Arc`.
/// Nothing mutates it after the connection store has been constructed.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<ProviderId, Provider>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for provider in catalog::builtin_providers() {
            registry.providers.insert(provider.id.clone(), provider);
        }
        registry
    }

    /// Register a provider, keyed by its id.
    ///
    /// If a provider with the same id already exists, it is replaced.
    pub fn register(&mut self, provider: Provider) -> Result<(), ProviderError> {
        if provider.id.trim().is_empty() {
            return Err(ProviderError::InvalidDefinition(
                "provider id must not be empty".into(),
            ));
        }
        if provider.name.trim().is_empty() {
            return Err(ProviderError::InvalidDefinition(format!(
                "provider {} has an empty name",
                provider.id
            )));
        }
        if let Some(previous) = self.providers.insert(provider.id.clone(), provider) {
            debug!(provider = %previous.id, "replaced catalog entry");
        }
        Ok(())
    }

    /// Look up a provider by id.
    pub fn get(&self, id: &str) -> Option<&Provider> {
        self.providers.get(id)
    }

    /// Returns `true` if a provider with `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Return providers sorted by id, optionally restricted to one category.
    pub fn list(&self, category: Option<ProviderCategory>) -> Vec<&Provider> {
        self.providers
            .values()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .collect()
    }

    /// Return the number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Return `true` if no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
