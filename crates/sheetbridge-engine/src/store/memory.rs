use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use sheetbridge_core::{Credential, ProviderKind};
use sheetbridge_providers::BoxFuture;

use super::{TokenStore, TokenUpdate, UserTokens, apply_update};
use crate::error::StoreResult;

/// In-process token store. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    users: Mutex<HashMap<String, UserTokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, UserTokens>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stores a full credential, replacing any existing one.
    pub fn replace(
        &self,
        user_id: impl Into<String>,
        provider: ProviderKind,
        credential: Credential,
    ) {
        self.lock()
            .entry(user_id.into())
            .or_default()
            .insert(provider, credential);
    }

    /// Deletes a credential. Returns it if one was stored.
    pub fn remove(&self, user_id: &str, provider: ProviderKind) -> Option<Credential> {
        let mut users = self.lock();
        let tokens = users.get_mut(user_id)?;
        let removed = tokens.remove(provider);
        if tokens.is_empty() {
            users.remove(user_id);
        }
        removed
    }

    /// Synchronous snapshot of one credential.
    pub fn get(&self, user_id: &str, provider: ProviderKind) -> Option<Credential> {
        self.lock()
            .get(user_id)
            .and_then(|tokens| tokens.get(provider))
            .cloned()
    }
}

impl TokenStore for MemoryTokenStore {
    fn read<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, StoreResult<Option<UserTokens>>> {
        Box::pin(async move { Ok(self.lock().get(user_id).cloned()) })
    }

    fn write<'a>(
        &'a self,
        user_id: &'a str,
        update: TokenUpdate,
    ) -> BoxFuture<'a, StoreResult<()>> {
        Box::pin(async move { apply_update(self.lock().get_mut(user_id), user_id, &update) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_write_roundtrip() {
        let store = MemoryTokenStore::new();
        assert!(store.read("u1").await.unwrap().is_none());

        store.replace("u1", ProviderKind::Google, Credential::oauth("a", Some("r".into()), None));
        store
            .write("u1", TokenUpdate::new(ProviderKind::Google).with_access_token("b"))
            .await
            .unwrap();

        let tokens = store.read("u1").await.unwrap().unwrap();
        assert_eq!(tokens.get(ProviderKind::Google).unwrap().access_token, "b");
    }

    #[tokio::test]
    async fn write_without_credential_fails() {
        let store = MemoryTokenStore::new();
        store.replace("u1", ProviderKind::Google, Credential::static_token("g"));

        let update = TokenUpdate::new(ProviderKind::HubSpot).with_access_token("h");
        assert!(store.write("u1", update.clone()).await.is_err());
        assert!(store.write("u2", update).await.is_err());
    }

    #[test]
    fn remove_drops_empty_users() {
        let store = MemoryTokenStore::new();
        store.replace("u1", ProviderKind::HubSpot, Credential::static_token("h"));

        assert!(store.remove("u1", ProviderKind::Google).is_none());
        assert!(store.remove("u1", ProviderKind::HubSpot).is_some());
        assert!(store.get("u1", ProviderKind::HubSpot).is_none());
        assert!(store.lock().is_empty());
    }
}
