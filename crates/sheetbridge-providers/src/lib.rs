//! Per-provider OAuth refresh clients.
//!
//! Each supported platform gets one [`RefreshClient`] implementation. The
//! credential manager looks clients up in a [`RefreshRegistry`] by
//! [`ProviderKind`](sheetbridge_core::ProviderKind) and never branches on
//! provider names itself.
//!
//! ```text
//!   CredentialManager
//!          │ registry.get(provider)
//!          ▼
//!  ┌──────────────────┐   ┌──────────────────────┐
//!  │GoogleRefreshClient│   │ HubSpotRefreshClient │
//!  └────────┬─────────┘   └──────────┬───────────┘
//!           └───────── TokenEndpoint ─┘
//!                  POST grant_type=refresh_token
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod google;
#[cfg(feature = "hubspot")]
pub mod hubspot;
pub mod oauth;
pub mod provider;
pub mod registry;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use oauth::TokenEndpoint;
pub use provider::{BoxFuture, RefreshClient, RefreshedToken, UnavailableClient};
pub use registry::RefreshRegistry;
