//! Connection and credential types.
//!
//! A user connects to each external provider once. What we keep per
//! `(user, provider)` pair is a [`Credential`]: an access token plus, for
//! OAuth connections, whatever is needed to mint the next one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An external platform the dashboard holds credentials for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google (Sheets, Drive).
    Google,
    /// HubSpot CMS.
    HubSpot,
}

impl ProviderKind {
    /// All known providers.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Google, ProviderKind::HubSpot];

    /// Returns the stable identifier used in config, storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::HubSpot => "hubspot",
        }
    }

    /// Returns a human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::HubSpot => "HubSpot",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a provider name that we don't know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider '{0}' (expected one of: google, hubspot)")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "hubspot" => Ok(Self::HubSpot),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// How a credential was obtained, which decides whether it can expire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Authorization-code flow; the access token is short-lived.
    #[default]
    #[serde(rename = "oauth")]
    OAuth,
    /// Manually issued token (e.g. a HubSpot private-app token). Never refreshed.
    #[serde(rename = "static")]
    Static,
}

/// Stored credential for one `(user, provider)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token presented on API calls.
    pub access_token: String,

    /// Long-lived token used to mint new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token stops being valid. `None` means it doesn't expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// OAuth or static.
    #[serde(default)]
    pub connection_kind: ConnectionKind,
}

impl Credential {
    /// Creates an OAuth credential.
    pub fn oauth(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at,
            connection_kind: ConnectionKind::OAuth,
        }
    }

    /// Creates a static (private-app) credential.
    pub fn static_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            connection_kind: ConnectionKind::Static,
        }
    }

    /// Returns true for static credentials.
    pub fn is_static(&self) -> bool {
        self.connection_kind == ConnectionKind::Static
    }

    /// Returns true if there is a non-empty access token.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Returns the refresh token, treating an empty string as absent.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Returns true if the access token is still usable at `now`.
    ///
    /// Static credentials and credentials without an expiry are always valid.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.is_static() {
            return true;
        }
        match self.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }
}

/// What callers get back from the credential manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    /// Bearer token to use right now.
    pub access_token: String,
    /// Current refresh token, if the connection has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// When `access_token` expires, if it does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&Credential> for TokenBundle {
    fn from(credential: &Credential) -> Self {
        Self {
            access_token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
            expires_at: credential.expires_at,
        }
    }
}

impl From<Credential> for TokenBundle {
    fn from(credential: Credential) -> Self {
        Self {
            access_token: credential.access_token,
            refresh_token: credential.refresh_token,
            expires_at: credential.expires_at,
        }
    }
}
