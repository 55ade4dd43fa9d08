//! Google refresh client.

use sheetbridge_core::ProviderKind;

use crate::error::{ProviderError, ProviderResult};
use crate::oauth::TokenEndpoint;
use crate::provider::{BoxFuture, RefreshClient, RefreshedToken};

use super::config::GoogleConfig;

/// Refreshes Google access tokens.
#[derive(Debug)]
pub struct GoogleRefreshClient {
    config: GoogleConfig,
    endpoint: TokenEndpoint,
}

impl GoogleRefreshClient {
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(ProviderKind::Google))?;
        let endpoint = TokenEndpoint::new(ProviderKind::Google, &config.token_url, config.timeout)?;
        Ok(Self { config, endpoint })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }
}

impl RefreshClient for GoogleRefreshClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RefreshedToken>> {
        Box::pin(async move {
            let form = [
                ("client_id", self.config.credentials.client_id.as_str()),
                ("client_secret", self.config.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ];
            self.endpoint.exchange(&form).await
        })
    }
}
