//! Google token refresh.
//!
//! Google access tokens live for about an hour. Refresh tokens are issued on
//! the first consent (`access_type=offline`) and normally are not rotated,
//! so a refresh response usually carries only `access_token` and
//! `expires_in`.
//!
//! ```ignore
//! let config = GoogleConfig::from_client_file("client_secret.json")?;
//! let client = GoogleRefreshClient::new(config)?;
//! let token = client.refresh(&stored_refresh_token).await?;
//! ```

mod config;
mod oauth;

pub use config::{GOOGLE_TOKEN_URL, GoogleConfig, OAuthCredentials};
pub use oauth::GoogleRefreshClient;
