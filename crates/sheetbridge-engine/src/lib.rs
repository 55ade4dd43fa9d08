//! Credential lifecycle and import reconciliation.
//!
//! This crate holds the two pieces of the dashboard backend that carry real
//! logic:
//! - [`CredentialManager`]: hands out valid provider tokens, refreshing and
//!   persisting expired ones
//! - [`Reconciler`]: diffs an uploaded batch of rows against stored items
//!
//! Storage is abstracted behind [`TokenStore`] and [`RecordStore`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sheetbridge_core::ProviderKind;
//! use sheetbridge_engine::{CredentialManager, FileTokenStore};
//! use sheetbridge_providers::RefreshRegistry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileTokenStore::new("tokens.json"));
//!     let manager = CredentialManager::new(store, RefreshRegistry::new());
//!
//!     let token = manager.get_valid_token("user-1", ProviderKind::HubSpot).await?;
//!     println!("{}", token.access_token);
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod error;
mod manager;
mod records;
mod reconcile;
mod store;

pub use cache::TtlCache;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, StoreError, StoreResult};
pub use manager::CredentialManager;
pub use records::{CachedRecordStore, MemoryRecordStore, RecordStore};
pub use reconcile::{Reconciler, parse_rows};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenUpdate, UserTokens};
