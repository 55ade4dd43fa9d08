//! Subcommand implementations.

pub mod config;
pub mod connection;
pub mod reconcile;
pub mod token;

use std::sync::Arc;

use sheetbridge_engine::{CredentialManager, FileTokenStore};

use crate::config::ClientConfig;

fn token_store(config: &ClientConfig) -> FileTokenStore {
    FileTokenStore::new(config.store.token_path())
}

fn credential_manager(config: &ClientConfig) -> CredentialManager {
    CredentialManager::new(Arc::new(token_store(config)), config.refresh_registry())
        .with_config(&config.engine)
}
