//! HubSpot refresh client.

use sheetbridge_core::ProviderKind;

use crate::error::{ProviderError, ProviderResult};
use crate::oauth::TokenEndpoint;
use crate::provider::{BoxFuture, RefreshClient, RefreshedToken};

use super::config::HubSpotConfig;

/// Refreshes HubSpot OAuth access tokens.
#[derive(Debug)]
pub struct HubSpotRefreshClient {
    config: HubSpotConfig,
    endpoint: TokenEndpoint,
}

impl HubSpotRefreshClient {
    pub fn new(config: HubSpotConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(ProviderKind::HubSpot))?;
        let endpoint =
            TokenEndpoint::new(ProviderKind::HubSpot, &config.token_url, config.timeout)?;
        Ok(Self { config, endpoint })
    }

    pub fn config(&self) -> &HubSpotConfig {
        &self.config
    }
}

impl RefreshClient for HubSpotRefreshClient {
    fn provider(&self) -> ProviderKind {
        ProviderKind::HubSpot
    }

    fn refresh<'a>(
        &'a self,
        refresh_token: &'a str,
    ) -> BoxFuture<'a, ProviderResult<RefreshedToken>> {
        Box::pin(async move {
            let mut form = vec![
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
            ];
            if let Some(ref uri) = self.config.redirect_uri {
                form.push(("redirect_uri", uri.as_str()));
            }
            self.endpoint.exchange(&form).await
        })
    }
}
