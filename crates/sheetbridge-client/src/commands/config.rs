//! Configuration commands.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
///
/// Secret references are printed as written, never resolved.
pub fn dump(config: &ClientConfig) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;

    let configured = config.configured_providers();
    for provider in sheetbridge_core::ProviderKind::ALL {
        if configured.contains(&provider) {
            println!("{}: OAuth refresh configured", provider.display_name());
        } else {
            println!("{}: not configured (static tokens only)", provider.display_name());
        }
    }
    println!("token store: {}", config.store.token_path().display());
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration and token file paths.
pub fn path(config: &ClientConfig) -> ClientResult<()> {
    println!("config: {}", ClientConfig::default_path().display());
    println!("tokens: {}", config.store.token_path().display());
    Ok(())
}
