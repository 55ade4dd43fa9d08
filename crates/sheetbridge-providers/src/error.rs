//! Error types for provider refresh operations.

use std::fmt;

use sheetbridge_core::ProviderKind;
use thiserror::Error;

/// Classification of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The provider rejected the grant (revoked, expired or invalid refresh token).
    AuthenticationFailed,
    /// Connection failure, timeout, DNS.
    NetworkError,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    ServerError,
    /// The response body could not be understood.
    InvalidResponse,
    /// The provider refused the request shape (4xx other than auth/rate limit).
    BadRequest,
    /// Missing or invalid client configuration.
    ConfigurationError,
    /// Unexpected local failure.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true for transient failures a caller might retry later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }

    /// Maps a non-success HTTP status from a token endpoint.
    ///
    /// OAuth servers answer a dead refresh token with 400 `invalid_grant`,
    /// so 400 counts as an authentication failure here.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 401 | 403 => Self::AuthenticationFailed,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::BadRequest,
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised while talking to a provider's token endpoint.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    provider: Option<ProviderKind>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Builds an error from a failed token endpoint response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let code = ProviderErrorCode::from_status(status);
        let detail = oauth_error_detail(body).unwrap_or_else(|| body.trim().to_string());
        Self::new(code, format!("token endpoint returned {}: {}", status, detail))
    }

    /// Tags the error with the provider that produced it.
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<ProviderKind> {
        self.provider
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Pulls `error` / `error_description` (or HubSpot's `status` / `message`)
/// out of a JSON error body.
fn oauth_error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let kind = value
        .get("error")
        .or_else(|| value.get("status"))
        .and_then(|v| v.as_str());
    let description = value
        .get("error_description")
        .or_else(|| value.get("message"))
        .and_then(|v| v.as_str());
    match (kind, description) {
        (Some(kind), Some(description)) => Some(format!("{} ({})", kind, description)),
        (Some(kind), None) => Some(kind.to_string()),
        (None, Some(description)) => Some(description.to_string()),
        (None, None) => None,
    }
}

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ProviderErrorCode::from_status(400),
            ProviderErrorCode::AuthenticationFailed
        );
        assert_eq!(
            ProviderErrorCode::from_status(401),
            ProviderErrorCode::AuthenticationFailed
        );
        assert_eq!(ProviderErrorCode::from_status(429), ProviderErrorCode::RateLimited);
        assert_eq!(ProviderErrorCode::from_status(503), ProviderErrorCode::ServerError);
        assert_eq!(ProviderErrorCode::from_status(404), ProviderErrorCode::BadRequest);
    }

    #[test]
    fn retryable_codes() {
        assert!(ProviderErrorCode::NetworkError.is_retryable());
        assert!(ProviderErrorCode::RateLimited.is_retryable());
        assert!(ProviderErrorCode::ServerError.is_retryable());
        assert!(!ProviderErrorCode::AuthenticationFailed.is_retryable());
        assert!(!ProviderErrorCode::ConfigurationError.is_retryable());
    }

    #[test]
    fn google_style_error_body() {
        let err = ProviderError::from_status(
            400,
            r#"{"error":"invalid_grant","error_description":"Token has been expired or revoked."}"#,
        );
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("invalid_grant (Token has been expired or revoked.)"));
    }

    #[test]
    fn hubspot_style_error_body() {
        let err = ProviderError::from_status(
            400,
            r#"{"status":"BAD_REFRESH_TOKEN","message":"missing or unknown refresh token"}"#,
        );
        assert!(err.message().contains("BAD_REFRESH_TOKEN"));
        assert!(err.message().contains("missing or unknown refresh token"));
    }

    #[test]
    fn plain_text_error_body() {
        let err = ProviderError::from_status(502, "  Bad Gateway\n");
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
        assert!(err.message().ends_with("Bad Gateway"));
    }

    #[test]
    fn display_includes_provider() {
        let err = ProviderError::network("connection reset").with_provider(ProviderKind::HubSpot);
        let display = err.to_string();
        assert!(display.starts_with("[hubspot] "));
        assert!(display.contains("network_error"));
        assert_eq!(err.provider(), Some(ProviderKind::HubSpot));
    }

    #[test]
    fn source_is_exposed() {
        use std::error::Error;
        let err = ProviderError::internal("boom").with_source(std::io::Error::other("disk"));
        assert!(err.source().is_some());
    }
}
