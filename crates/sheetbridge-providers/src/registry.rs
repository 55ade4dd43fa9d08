//! Lookup of refresh clients by provider.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sheetbridge_core::ProviderKind;

use crate::provider::RefreshClient;

/// Maps each [`ProviderKind`] to the client that refreshes its tokens.
#[derive(Clone, Default)]
pub struct RefreshRegistry {
    clients: HashMap<ProviderKind, Arc<dyn RefreshClient>>,
}

impl RefreshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client under the provider it reports, replacing any previous one.
    pub fn register(&mut self, client: Arc<dyn RefreshClient>) -> &mut Self {
        self.clients.insert(client.provider(), client);
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, client: Arc<dyn RefreshClient>) -> Self {
        self.register(client);
        self
    }

    pub fn get(&self, provider: ProviderKind) -> Option<Arc<dyn RefreshClient>> {
        self.clients.get(&provider).cloned()
    }

    pub fn contains(&self, provider: ProviderKind) -> bool {
        self.clients.contains_key(&provider)
    }

    /// Registered providers, sorted.
    pub fn providers(&self) -> Vec<ProviderKind> {
        let mut providers: Vec<_> = self.clients.keys().copied().collect();
        providers.sort();
        providers
    }
}

impl fmt::Debug for RefreshRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::UnavailableClient;

    #[test]
    fn register_and_lookup() {
        let registry = RefreshRegistry::new()
            .with(Arc::new(UnavailableClient::new(ProviderKind::HubSpot, "x")));

        assert!(registry.contains(ProviderKind::HubSpot));
        assert!(!registry.contains(ProviderKind::Google));
        assert!(registry.get(ProviderKind::Google).is_none());
        assert_eq!(
            registry.get(ProviderKind::HubSpot).unwrap().provider(),
            ProviderKind::HubSpot
        );
    }

    #[test]
    fn later_registration_wins() {
        let mut registry = RefreshRegistry::new();
        registry
            .register(Arc::new(UnavailableClient::new(ProviderKind::Google, "first")))
            .register(Arc::new(UnavailableClient::new(ProviderKind::Google, "second")))
            .register(Arc::new(UnavailableClient::new(ProviderKind::HubSpot, "hs")));

        assert_eq!(
            registry.providers(),
            vec![ProviderKind::Google, ProviderKind::HubSpot]
        );
        assert!(format!("{:?}", registry).contains("Google"));
    }
}
