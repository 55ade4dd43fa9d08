//! Command-line interface for sheetbridge.
//!
//! This crate provides the `sheetbridge` binary: storing and refreshing
//! provider credentials, and previewing what an import would change.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
