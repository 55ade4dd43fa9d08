//! Credential lifecycle management.
//!
//! [`CredentialManager::get_valid_token`] is the single entry point API
//! callers use before talking to a provider. It hands back a usable access
//! token, refreshing and persisting it first when the stored one has expired.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use sheetbridge_core::{Credential, ProviderKind, SharedClock, SystemClock, TokenBundle};
use sheetbridge_providers::{ProviderError, RefreshRegistry};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::store::{TokenStore, TokenUpdate};

type RefreshKey = (String, ProviderKind);

/// Hands out valid access tokens, refreshing expired ones on demand.
pub struct CredentialManager {
    store: Arc<dyn TokenStore>,
    registry: RefreshRegistry,
    clock: SharedClock,
    expiry_buffer: Duration,
    serialize_refreshes: bool,
    /// One async lock per `(user, provider)` that has ever needed a refresh.
    refresh_locks: Mutex<HashMap<RefreshKey, Arc<AsyncMutex<()>>>>,
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("registry", &self.registry)
            .field("expiry_buffer", &self.expiry_buffer)
            .field("serialize_refreshes", &self.serialize_refreshes)
            .finish_non_exhaustive()
    }
}

impl CredentialManager {
    pub fn new(store: Arc<dyn TokenStore>, registry: RefreshRegistry) -> Self {
        let config = EngineConfig::default();
        Self {
            store,
            registry,
            clock: SystemClock::shared(),
            expiry_buffer: config.expiry_buffer(),
            serialize_refreshes: config.serialize_refreshes,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.expiry_buffer = config.expiry_buffer();
        self.serialize_refreshes = config.serialize_refreshes;
        self
    }

    pub fn registry(&self) -> &RefreshRegistry {
        &self.registry
    }

    /// Returns a token the caller can use right now.
    ///
    /// Static credentials and unexpired OAuth credentials come back exactly
    /// as stored. An expired credential is refreshed once through the
    /// provider's refresh client and written back to the store before it is
    /// returned. A refresh that fails is not retried.
    pub async fn get_valid_token(
        &self,
        user_id: &str,
        provider: ProviderKind,
    ) -> EngineResult<TokenBundle> {
        let credential = self.load_credential(user_id, provider).await?;
        if self.is_usable(&credential) {
            debug!(user_id, %provider, "stored token is valid");
            return Ok(credential.into());
        }

        if !self.serialize_refreshes {
            return self.refresh(user_id, provider, credential).await;
        }

        let lock = self.refresh_lock(user_id, provider);
        let _guard = lock.lock().await;

        // Whoever held the lock before us may already have refreshed.
        let credential = self.load_credential(user_id, provider).await?;
        if self.is_usable(&credential) {
            debug!(user_id, %provider, "token was refreshed concurrently");
            return Ok(credential.into());
        }

        self.refresh(user_id, provider, credential).await
    }

    fn is_usable(&self, credential: &Credential) -> bool {
        credential.is_static() || credential.is_valid_at(self.clock.now())
    }

    async fn load_credential(
        &self,
        user_id: &str,
        provider: ProviderKind,
    ) -> EngineResult<Credential> {
        let tokens = self
            .store
            .read(user_id)
            .await
            .map_err(EngineError::StoreUnavailable)?;

        let credential = tokens
            .and_then(|tokens| tokens.get(provider).cloned())
            .ok_or_else(|| {
                EngineError::not_connected(
                    provider,
                    format!("no {} credentials stored", provider.display_name()),
                )
            })?;

        if !credential.has_access_token() {
            return Err(EngineError::not_connected(
                provider,
                "stored credential has no access token",
            ));
        }
        Ok(credential)
    }

    fn refresh_lock(&self, user_id: &str, provider: ProviderKind) -> Arc<AsyncMutex<()>> {
        let mut locks = self.refresh_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry((user_id.to_string(), provider))
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn refresh(
        &self,
        user_id: &str,
        provider: ProviderKind,
        credential: Credential,
    ) -> EngineResult<TokenBundle> {
        let Some(refresh_token) = credential.refresh_token() else {
            info!(user_id, %provider, "token expired and no refresh token is stored");
            return Err(EngineError::not_connected(
                provider,
                "access token expired and there is no refresh token",
            ));
        };

        let client = self.registry.get(provider).ok_or_else(|| EngineError::RefreshFailed {
            provider,
            source: ProviderError::configuration(format!(
                "no refresh client configured for {}",
                provider.display_name()
            ))
            .with_provider(provider),
        })?;

        debug!(user_id, %provider, "refreshing expired token");
        let refreshed = client.refresh(refresh_token).await.map_err(|source| {
            warn!(
                user_id,
                %provider,
                code = source.code().as_str(),
                "token refresh failed: {}",
                source.message()
            );
            EngineError::RefreshFailed { provider, source }
        })?;

        let expires_at = refreshed
            .expires_in
            .map(|secs| self.expiry_from_lifetime(secs));

        let update = TokenUpdate::refreshed(
            provider,
            refreshed.access_token.clone(),
            refreshed.refresh_token.clone(),
            expires_at,
        );
        self.store.write(user_id, update).await.map_err(|source| {
            warn!(user_id, %provider, "failed to persist refreshed token: {}", source);
            EngineError::PersistenceFailed { provider, source }
        })?;

        info!(
            user_id,
            %provider,
            rotated = refreshed.refresh_token.is_some(),
            "refreshed access token"
        );
        Ok(TokenBundle {
            access_token: refreshed.access_token,
            refresh_token: refreshed
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
            expires_at,
        })
    }

    /// Expiry for a token issued now that lives `secs` seconds.
    ///
    /// The safety buffer is capped at half the lifetime so a short-lived
    /// token is not stored as already expired.
    /// Lifetimes past chrono's range saturate at `DateTime::<Utc>::MAX_UTC`.
    fn expiry_from_lifetime(&self, secs: i64) -> DateTime<Utc> {
        let Some(lifetime) = Duration::try_seconds(secs.max(0)) else {
            return DateTime::<Utc>::MAX_UTC;
        };
        let margin = self.expiry_buffer.min(lifetime / 2);
        self.clock
            .now()
            .checked_add_signed(lifetime - margin)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
