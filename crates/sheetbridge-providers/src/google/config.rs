//! Google OAuth client configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::oauth::{DEFAULT_TIMEOUT, parse_http_url};

/// Google's OAuth 2.0 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth client id/secret registered in the Google Cloud Console.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Layout of the client JSON downloaded from the Cloud Console.
///
/// Either a `web` / `installed` section, or the fields flat at the root.
#[derive(Debug, Deserialize)]
struct GoogleClientFile {
    installed: Option<ClientSection>,
    web: Option<ClientSection>,
    client_id: Option<String>,
    client_secret: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClientSection {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Checks the shape of the id and secret.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err("client_id should end with .apps.googleusercontent.com");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Settings for the Google refresh client.
///
/// Google's client library is built from an id/secret/redirect triple, so the
/// redirect URI is part of the configuration even though the refresh grant
/// itself doesn't send it.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub credentials: OAuthCredentials,
    pub redirect_uri: String,
    pub token_url: String,
    pub timeout: Duration,
}

impl GoogleConfig {
    pub fn new(credentials: OAuthCredentials, redirect_uri: impl Into<String>) -> Self {
        Self {
            credentials,
            redirect_uri: redirect_uri.into(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Loads a Cloud Console client JSON file.
    ///
    /// The first entry of `redirect_uris` becomes the redirect URI.
    pub fn from_client_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("failed to read Google client file: {}", e))?;
        Self::from_client_json(&content)
    }

    /// Parses a Cloud Console client JSON document.
    pub fn from_client_json(json: &str) -> Result<Self, String> {
        let file: GoogleClientFile = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse Google client JSON: {}", e))?;

        let (client_id, client_secret, redirect_uris) = match file.web.or(file.installed) {
            Some(section) => (section.client_id, section.client_secret, section.redirect_uris),
            None => match (file.client_id, file.client_secret) {
                (Some(id), Some(secret)) => (id, secret, file.redirect_uris),
                _ => {
                    return Err(
                        "Google client JSON needs a 'web'/'installed' section or root-level client_id/client_secret"
                            .to_string(),
                    );
                }
            },
        };

        let redirect_uri = redirect_uris
            .into_iter()
            .next()
            .ok_or_else(|| "Google client JSON has no redirect_uris".to_string())?;

        Ok(Self::new(
            OAuthCredentials::new(client_id, client_secret),
            redirect_uri,
        ))
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
        self.credentials.validate().map_err(str::to_string)?;
        parse_http_url(&self.redirect_uri).map_err(|e| format!("redirect_uri: {}", e))?;
        parse_http_url(&self.token_url).map_err(|e| format!("token_url: {}", e))?;
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}
