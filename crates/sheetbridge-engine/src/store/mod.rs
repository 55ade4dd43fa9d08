//! Credential persistence.
//!
//! The credential manager only needs two things from storage: read a user's
//! credentials, and apply a partial update to one provider's credential.
//! [`TokenStore`] captures that; [`MemoryTokenStore`] and [`FileTokenStore`]
//! implement it.

mod file;
mod memory;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetbridge_core::{Credential, ProviderKind};
use sheetbridge_providers::BoxFuture;

use crate::error::{StoreError, StoreResult};

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

/// All stored credentials of one user, keyed by provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserTokens(BTreeMap<ProviderKind, Credential>);

impl UserTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: adds a credential.
    pub fn with(mut self, provider: ProviderKind, credential: Credential) -> Self {
        self.0.insert(provider, credential);
        self
    }

    pub fn get(&self, provider: ProviderKind) -> Option<&Credential> {
        self.0.get(&provider)
    }

    /// Inserts or replaces a credential, returning the previous one.
    pub fn insert(&mut self, provider: ProviderKind, credential: Credential) -> Option<Credential> {
        self.0.insert(provider, credential)
    }

    pub fn remove(&mut self, provider: ProviderKind) -> Option<Credential> {
        self.0.remove(&provider)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Connected providers, in stable order.
    pub fn providers(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.0.keys().copied()
    }

    /// Applies a partial update to an existing credential.
    ///
    /// Returns false if there is no credential for the update's provider.
    pub fn apply(&mut self, update: &TokenUpdate) -> bool {
        let Some(credential) = self.0.get_mut(&update.provider) else {
            return false;
        };
        update.apply_to(credential);
        true
    }
}

/// Partial update of one provider's credential.
///
/// `None` fields are left untouched. `expires_at` is doubly optional so an
/// update can clear the expiry (`Some(None)`) as well as leave it alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUpdate {
    pub provider: ProviderKind,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl TokenUpdate {
    /// An update that changes nothing.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            access_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }

    /// The update written after a successful refresh.
    ///
    /// A `None` refresh token keeps the stored one.
    pub fn refreshed(
        provider: ProviderKind,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            provider,
            access_token: Some(access_token.into()),
            refresh_token,
            expires_at: Some(expires_at),
        }
    }

    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    fn apply_to(&self, credential: &mut Credential) {
        if let Some(access_token) = &self.access_token {
            credential.access_token = access_token.clone();
        }
        if let Some(refresh_token) = &self.refresh_token {
            credential.refresh_token = Some(refresh_token.clone());
        }
        if let Some(expires_at) = self.expires_at {
            credential.expires_at = expires_at;
        }
    }
}

/// Durable credential storage.
pub trait TokenStore: Send + Sync {
    /// Reads every credential stored for `user_id`. `None` if the user has none.
    fn read<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, StoreResult<Option<UserTokens>>>;

    /// Applies `update` to the user's existing credential for its provider.
    ///
    /// Fails with [`StoreError::NotFound`] when there is nothing to update.
    fn write<'a>(&'a self, user_id: &'a str, update: TokenUpdate)
    -> BoxFuture<'a, StoreResult<()>>;
}

fn apply_update(
    tokens: Option<&mut UserTokens>,
    user_id: &str,
    update: &TokenUpdate,
) -> StoreResult<()> {
    if let Some(tokens) = tokens
        && tokens.apply(update)
    {
        return Ok(());
    }
    Err(StoreError::not_found(user_id, update.provider))
}
