//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/sheetbridge/config.toml` by default.
//!
//! Credential values (`client_id`, `client_secret`) support secret references:
//! - `pass::path/in/store` — resolved via `pass show`
//! - `env::VAR_NAME` — resolved from the environment
//! - plain text — used as-is

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sheetbridge_core::ProviderKind;
use sheetbridge_engine::EngineConfig;
use sheetbridge_providers::{RefreshClient, RefreshRegistry, UnavailableClient};
use tracing::warn;

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the sheetbridge client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Google OAuth app settings.
    #[cfg(feature = "google")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleSettings>,

    /// HubSpot OAuth app settings.
    #[cfg(feature = "hubspot")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hubspot: Option<HubSpotSettings>,

    /// Token storage.
    pub store: StoreSettings,

    /// Credential manager and reconciler tunables.
    pub engine: EngineConfig,
}

/// Where credentials are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path of the token file. Defaults to the user data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,
}

impl StoreSettings {
    /// Returns the configured token path, or the default one.
    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| ClientConfig::default_data_dir().join("tokens.json"))
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetbridge")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetbridge")
    }

    /// Checks every section, resolving secret references on the way.
    pub fn validate(&self) -> Result<(), String> {
        self.engine
            .validate()
            .map_err(|e| format!("[engine] {}", e))?;

        #[cfg(feature = "google")]
        if let Some(ref google) = self.google {
            google
                .to_provider_config()
                .map_err(|e| format!("[google] {}", e))?;
        }

        #[cfg(feature = "hubspot")]
        if let Some(ref hubspot) = self.hubspot {
            hubspot
                .to_provider_config()
                .map_err(|e| format!("[hubspot] {}", e))?;
        }

        Ok(())
    }

    /// Providers with an OAuth app section.
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        let mut providers = Vec::new();
        #[cfg(feature = "google")]
        if self.google.is_some() {
            providers.push(ProviderKind::Google);
        }
        #[cfg(feature = "hubspot")]
        if self.hubspot.is_some() {
            providers.push(ProviderKind::HubSpot);
        }
        providers
    }

    /// Builds one refresh client per provider.
    ///
    /// A provider whose section is missing or invalid gets an
    /// [`UnavailableClient`] carrying the reason, so static credentials keep
    /// working and a refresh attempt explains what is wrong.
    pub fn refresh_registry(&self) -> RefreshRegistry {
        let mut registry = RefreshRegistry::new();
        for provider in ProviderKind::ALL {
            let client = self.refresh_client(provider).unwrap_or_else(|reason| {
                warn!(%provider, "refresh client unavailable: {}", reason);
                Arc::new(UnavailableClient::new(provider, reason))
            });
            registry.register(client);
        }
        registry
    }

    fn refresh_client(&self, provider: ProviderKind) -> Result<Arc<dyn RefreshClient>, String> {
        match provider {
            #[cfg(feature = "google")]
            ProviderKind::Google => {
                use sheetbridge_providers::google::GoogleRefreshClient;

                let settings = self
                    .google
                    .as_ref()
                    .ok_or_else(|| missing_section("google"))?;
                let client = GoogleRefreshClient::new(settings.to_provider_config()?)
                    .map_err(|e| e.to_string())?;
                Ok(Arc::new(client))
            }
            #[cfg(feature = "hubspot")]
            ProviderKind::HubSpot => {
                use sheetbridge_providers::hubspot::HubSpotRefreshClient;

                let settings = self
                    .hubspot
                    .as_ref()
                    .ok_or_else(|| missing_section("hubspot"))?;
                let client = HubSpotRefreshClient::new(settings.to_provider_config()?)
                    .map_err(|e| e.to_string())?;
                Ok(Arc::new(client))
            }
            #[allow(unreachable_patterns)]
            other => Err(format!("{} support is not compiled in", other.display_name())),
        }
    }
}

fn missing_section(name: &str) -> String {
    format!(
        "no [{}] section in {}",
        name,
        ClientConfig::default_path().display()
    )
}

fn resolve_field(section: &str, field: &str, value: Option<&str>) -> Result<String, String> {
    let raw = value.ok_or_else(|| format!("{} is missing from [{}]", field, section))?;
    crate::secret::resolve(raw).map_err(|e| format!("failed to resolve {}: {}", field, e))
}

// ---------------------------------------------------------------------------
// Provider sections
// ---------------------------------------------------------------------------

/// Google OAuth app settings.
///
/// Either `client_id`/`client_secret`/`redirect_uri` inline, or a
/// `credentials_file` downloaded from the Cloud Console.
#[cfg(feature = "google")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Redirect URI registered for the OAuth client.
    pub redirect_uri: Option<String>,

    /// Cloud Console client JSON, used when `client_id` is not set.
    pub credentials_file: Option<PathBuf>,

    /// Token endpoint override.
    pub token_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Converts to provider configuration, resolving secret references.
    pub fn to_provider_config(
        &self,
    ) -> Result<sheetbridge_providers::google::GoogleConfig, String> {
        use sheetbridge_providers::google::{GoogleConfig, OAuthCredentials};

        let mut config = match (&self.client_id, &self.credentials_file) {
            (None, Some(path)) => GoogleConfig::from_client_file(path)?,
            _ => {
                let client_id = resolve_field("google", "client_id", self.client_id.as_deref())?;
                let client_secret =
                    resolve_field("google", "client_secret", self.client_secret.as_deref())?;
                let redirect_uri = self
                    .redirect_uri
                    .clone()
                    .ok_or_else(|| "redirect_uri is missing from [google]".to_string())?;
                GoogleConfig::new(OAuthCredentials::new(client_id, client_secret), redirect_uri)
            }
        };

        if let Some(ref url) = self.token_url {
            config = config.with_token_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }
}

/// HubSpot OAuth app settings.
#[cfg(feature = "hubspot")]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubSpotSettings {
    /// OAuth client ID (supports `pass::` and `env::` prefixes).
    pub client_id: Option<String>,

    /// OAuth client secret (supports `pass::` and `env::` prefixes).
    pub client_secret: Option<String>,

    /// Sent with refresh requests when set.
    pub redirect_uri: Option<String>,

    /// Token endpoint override.
    pub token_url: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

#[cfg(feature = "hubspot")]
impl HubSpotSettings {
    /// Converts to provider configuration, resolving secret references.
    pub fn to_provider_config(
        &self,
    ) -> Result<sheetbridge_providers::hubspot::HubSpotConfig, String> {
        use sheetbridge_providers::hubspot::HubSpotConfig;

        let client_id = resolve_field("hubspot", "client_id", self.client_id.as_deref())?;
        let client_secret =
            resolve_field("hubspot", "client_secret", self.client_secret.as_deref())?;

        let mut config = HubSpotConfig::new(client_id, client_secret);
        if let Some(ref uri) = self.redirect_uri {
            config = config.with_redirect_uri(uri);
        }
        if let Some(ref url) = self.token_url {
            config = config.with_token_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[cfg(all(feature = "google", feature = "hubspot"))]
mod tests {
    use super::*;

    const FULL: &str = r#"
[google]
client_id = "123.apps.googleusercontent.com"
client_secret = "g-secret"
redirect_uri = "https://dashboard.example.com/api/google/callback"

[hubspot]
client_id = "hs-client"
client_secret = "env::_SB_TEST_HUBSPOT_SECRET"
timeout_secs = 10

[store]
token_path = "/tmp/sheetbridge-tokens.json"

[engine]
lookup_concurrency = 2
label_fields = ["title"]
"#;

    #[test]
    fn empty_config_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert!(config.google.is_none());
        assert!(config.hubspot.is_none());
        assert_eq!(config.engine, EngineConfig::default());
        assert!(config.store.token_path().ends_with("sheetbridge/tokens.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_config_parses_and_validates() {
        unsafe {
            std::env::set_var("_SB_TEST_HUBSPOT_SECRET", "hs-secret");
        }

        let config: ClientConfig = toml::from_str(FULL).unwrap();
        assert_eq!(config.engine.lookup_concurrency, 2);
        assert_eq!(config.engine.label_fields, vec!["title"]);
        assert!(config.engine.serialize_refreshes);
        assert_eq!(
            config.store.token_path(),
            PathBuf::from("/tmp/sheetbridge-tokens.json")
        );
        assert!(config.validate().is_ok());

        let hubspot = config.hubspot.as_ref().unwrap().to_provider_config().unwrap();
        assert_eq!(hubspot.client_secret, "hs-secret");
        assert_eq!(hubspot.timeout, Duration::from_secs(10));

        let registry = config.refresh_registry();
        assert_eq!(
            registry.providers(),
            vec![ProviderKind::Google, ProviderKind::HubSpot]
        );

        unsafe {
            std::env::remove_var("_SB_TEST_HUBSPOT_SECRET");
        }
    }

    #[test]
    fn google_needs_redirect_uri() {
        let settings = GoogleSettings {
            client_id: Some("123.apps.googleusercontent.com".into()),
            client_secret: Some("s".into()),
            ..Default::default()
        };
        assert!(settings.to_provider_config().unwrap_err().contains("redirect_uri"));
    }

    #[test]
    fn google_credentials_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(
            &path,
            r#"{"web": {"client_id": "9.apps.googleusercontent.com", "client_secret": "x",
                "redirect_uris": ["https://dash.example.com/cb"]}}"#,
        )
        .unwrap();

        let settings = GoogleSettings {
            credentials_file: Some(path),
            ..Default::default()
        };
        let config = settings.to_provider_config().unwrap();
        assert_eq!(config.credentials.client_id, "9.apps.googleusercontent.com");
        assert_eq!(config.redirect_uri, "https://dash.example.com/cb");
    }

    #[test]
    fn invalid_sections_are_reported_by_name() {
        let config: ClientConfig = toml::from_str("[hubspot]\nclient_id = \"x\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.starts_with("[hubspot]"));
        assert!(err.contains("client_secret"));

        let config: ClientConfig = toml::from_str("[engine]\nlookup_concurrency = 0\n").unwrap();
        assert!(config.validate().unwrap_err().starts_with("[engine]"));
    }

    #[test]
    fn missing_sections_still_register_a_client() {
        let config = ClientConfig::default();
        assert!(config.configured_providers().is_empty());
        let registry = config.refresh_registry();
        assert!(registry.contains(ProviderKind::Google));
        assert!(registry.contains(ProviderKind::HubSpot));
    }

    #[test]
    fn dump_roundtrips_through_toml() {
        let config = ClientConfig {
            hubspot: Some(HubSpotSettings {
                client_id: Some("hs".into()),
                client_secret: Some("pass::hubspot/secret".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("pass::hubspot/secret"));
        let back: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.hubspot.unwrap().client_id.as_deref(), Some("hs"));
    }
}
