//! Shared `grant_type=refresh_token` exchange.
//!
//! Google and HubSpot both speak plain RFC 6749 on their token endpoints:
//! form-encoded POST in, JSON with `access_token` / `refresh_token` /
//! `expires_in` out. The provider modules only decide which form fields to
//! send.

use std::time::Duration;

use serde::Deserialize;
use sheetbridge_core::ProviderKind;
use tracing::debug;
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::RefreshedToken;

/// Default request timeout for token endpoints.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parses and checks a token endpoint or redirect URL.
pub fn parse_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL '{}': {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("URL '{}' must use http or https, not {}", raw, other)),
    }
}

/// A provider's token endpoint plus the HTTP client used to reach it.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    provider: ProviderKind,
    url: Url,
    http_client: reqwest::Client,
}

impl TokenEndpoint {
    /// Creates an endpoint client with the given request timeout.
    pub fn new(provider: ProviderKind, url: &str, timeout: Duration) -> ProviderResult<Self> {
        let url = parse_http_url(url)
            .map_err(|e| ProviderError::configuration(e).with_provider(provider))?;
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::internal("failed to create HTTP client")
                    .with_provider(provider)
                    .with_source(e)
            })?;

        Ok(Self {
            provider,
            url,
            http_client,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// POSTs `form` and parses the token response. One attempt, no retries.
    pub async fn exchange(&self, form: &[(&str, &str)]) -> ProviderResult<RefreshedToken> {
        debug!(provider = %self.provider, url = %self.url, "requesting token refresh");

        let response = self
            .http_client
            .post(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("token refresh request failed: {}", e))
                    .with_provider(self.provider)
                    .with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read token response: {}", e))
                .with_provider(self.provider)
        })?;

        if !status.is_success() {
            let err = ProviderError::from_status(status.as_u16(), &body);
            return Err(err.with_provider(self.provider));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("invalid token response: {}", e))
                .with_provider(self.provider)
        })?;

        if parsed.access_token.is_empty() {
            let err = ProviderError::invalid_response("token response has an empty access_token");
            return Err(err.with_provider(self.provider));
        }

        debug!(
            provider = %self.provider,
            rotated_refresh_token = parsed.refresh_token.is_some(),
            expires_in = ?parsed.expires_in,
            "token endpoint issued access token"
        );

        Ok(RefreshedToken {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token.filter(|t| !t.is_empty()),
            expires_in: parsed.expires_in,
        })
    }
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    token_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use mockito::Matcher;

    fn endpoint(server: &mockito::ServerGuard) -> TokenEndpoint {
        TokenEndpoint::new(
            ProviderKind::Google,
            &format!("{}/token", server.url()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn url_validation() {
        assert!(parse_http_url("https://oauth2.googleapis.com/token").is_ok());
        assert!(parse_http_url("http://127.0.0.1:8080/token").is_ok());
        assert!(parse_http_url("ftp://example.com/token").unwrap_err().contains("http or https"));
        assert!(parse_http_url("/relative/token").is_err());
    }

    #[test]
    fn invalid_url_is_configuration_error() {
        let err = TokenEndpoint::new(ProviderKind::HubSpot, "not a url", DEFAULT_TIMEOUT)
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some(ProviderKind::HubSpot));
    }

    #[test]
    fn token_response_minimal() {
        let parsed: TokenResponse = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(parsed.access_token, "abc");
        assert!(parsed.refresh_token.is_none());
        assert!(parsed.expires_in.is_none());
    }

    #[tokio::test]
    async fn exchange_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "r-1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"a-2","refresh_token":"r-2","expires_in":1800,"token_type":"bearer"}"#,
            )
            .create_async()
            .await;

        let token = endpoint(&server)
            .exchange(&[("grant_type", "refresh_token"), ("refresh_token", "r-1")])
            .await
            .unwrap();

        assert_eq!(token.access_token, "a-2");
        assert_eq!(token.refresh_token.as_deref(), Some("r-2"));
        assert_eq!(token.expires_in, Some(1800));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn exchange_empty_refresh_token_is_dropped() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"a-2","refresh_token":""}"#)
            .create_async()
            .await;

        let token = endpoint(&server).exchange(&[]).await.unwrap();
        assert!(token.refresh_token.is_none());
    }

    #[tokio::test]
    async fn exchange_invalid_grant() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Bad Request"}"#)
            .create_async()
            .await;

        let err = endpoint(&server).exchange(&[]).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("invalid_grant"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn exchange_server_error_is_retryable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let err = endpoint(&server).exchange(&[]).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn exchange_garbage_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let err = endpoint(&server).exchange(&[]).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }

    #[tokio::test]
    async fn exchange_network_failure() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let endpoint = TokenEndpoint::new(
            ProviderKind::Google,
            "http://127.0.0.1:9/token",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = endpoint.exchange(&[]).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NetworkError);
    }
}
