//! The refresh capability every provider implements.
//!
//! A [`RefreshClient`] knows one provider's token endpoint and nothing else:
//! it turns a refresh token into a new access token. It keeps no state
//! between calls; persisting the result is the caller's job.

use std::future::Future;
use std::pin::Pin;

use sheetbridge_core::ProviderKind;

use crate::error::{ProviderError, ProviderResult};

/// A boxed future, so [`RefreshClient`] stays object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of a successful refresh exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    /// The newly minted access token.
    pub access_token: String,
    /// A rotated refresh token, when the provider issued one.
    pub refresh_token: Option<String>,
    /// Lifetime of `access_token` in seconds, when the provider said.
    pub expires_in: Option<i64>,
}

impl RefreshedToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
        }
    }

    /// Builder: sets the rotated refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Builder: sets the lifetime in seconds.
    pub fn with_expires_in(mut self, secs: i64) -> Self {
        self.expires_in = Some(secs);
        self
    }
}

/// Exchanges refresh tokens for access tokens against one provider.
///
/// Implementations make a single attempt per call. Retrying is left to
/// whoever called the credential manager.
///
/// ```ignore
/// impl RefreshClient for MyClient {
///     fn provider(&self) -> ProviderKind { ProviderKind::HubSpot }
///
///     fn refresh<'a>(
///         &'a self,
///         refresh_token: &'a str,
///     ) -> BoxFuture<'a, ProviderResult<RefreshedToken>> {
///         Box::pin(async move { self.endpoint.exchange(&form).await })
///     }
/// }
/// ```
pub trait RefreshClient: Send + Sync {
    /// The provider this client talks to.
    fn provider(&self) -> ProviderKind;

    /// Performs one `grant_type=refresh_token` exchange.
    fn refresh<'a>(&'a self, refresh_token: &'a str)
    -> BoxFuture<'a, ProviderResult<RefreshedToken>>;
}

/// A client that fails every refresh with a fixed error.
///
/// Registered in place of a provider whose configuration could not be
/// loaded, so the failure surfaces at refresh time with a useful message.
#[derive(Debug)]
pub struct UnavailableClient {
    provider: ProviderKind,
    reason: String,
}

impl UnavailableClient {
    pub fn new(provider: ProviderKind, reason: impl Into<String>) -> Self {
        Self {
            provider,
            reason: reason.into(),
        }
    }
}

impl RefreshClient for UnavailableClient {
    fn provider(&self) -> ProviderKind {
        self.provider
    }

    fn refresh<'a>(
        &'a self,
        _refresh_token: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RefreshedToken>> {
        let error = ProviderError::configuration(self.reason.clone()).with_provider(self.provider);
        Box::pin(async move { Err(error) })
    }
}
