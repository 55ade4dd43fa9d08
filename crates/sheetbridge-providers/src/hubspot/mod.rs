//! HubSpot token refresh.
//!
//! HubSpot OAuth access tokens last 30 minutes and every refresh response
//! includes a refresh token, which may or may not differ from the one sent.

mod config;
mod oauth;

pub use config::{HUBSPOT_TOKEN_URL, HubSpotConfig};
pub use oauth::HubSpotRefreshClient;
