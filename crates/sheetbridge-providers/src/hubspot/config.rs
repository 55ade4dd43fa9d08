//! HubSpot OAuth app configuration.

use std::time::Duration;

use crate::oauth::{DEFAULT_TIMEOUT, parse_http_url};

/// HubSpot's OAuth token endpoint.
pub const HUBSPOT_TOKEN_URL: &str = "https://api.hubapi.com/oauth/v1/token";

/// Settings for the HubSpot refresh client.
///
/// Only OAuth connections need this. Private-app tokens are stored as static
/// credentials and never reach the refresh client.
#[derive(Debug, Clone)]
pub struct HubSpotConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Sent along with the refresh grant when set.
    pub redirect_uri: Option<String>,
    pub token_url: String,
    pub timeout: Duration,
}

impl HubSpotConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: None,
            token_url: HUBSPOT_TOKEN_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.client_id.trim().is_empty() {
            return Err("client_id is required".to_string());
        }
        if self.client_secret.trim().is_empty() {
            return Err("client_secret is required".to_string());
        }
        if let Some(ref uri) = self.redirect_uri {
            parse_http_url(uri).map_err(|e| format!("redirect_uri: {}", e))?;
        }
        parse_http_url(&self.token_url).map_err(|e| format!("token_url: {}", e))?;
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}
