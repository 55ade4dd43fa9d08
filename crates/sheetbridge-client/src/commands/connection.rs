//! `sheetbridge connect` and `sheetbridge disconnect`.

use chrono::{Duration, Utc};
use sheetbridge_core::Credential;
use tracing::info;

use crate::cli::{CredentialArgs, Target};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Turns CLI arguments into a credential.
pub fn credential_from_args(args: &CredentialArgs) -> ClientResult<Credential> {
    if let Some(ref token) = args.static_token {
        if token.trim().is_empty() {
            return Err(ClientError::Input("static token must not be empty".into()));
        }
        return Ok(Credential::static_token(token.trim()));
    }

    let access_token = args
        .access_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ClientError::Input("an access token or a static token is required".into()))?;

    let expires_at = match args.expires_in {
        Some(secs) if secs <= 0 => {
            return Err(ClientError::Input("--expires-in must be positive".into()));
        }
        Some(secs) => Some(Utc::now() + Duration::seconds(secs)),
        None => None,
    };

    let refresh_token = args
        .refresh_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(Credential::oauth(access_token, refresh_token, expires_at))
}

/// Stores a credential, replacing any existing one.
pub fn connect(config: &ClientConfig, target: &Target, args: &CredentialArgs) -> ClientResult<()> {
    let credential = credential_from_args(args)?;
    let kind = if credential.is_static() { "static" } else { "OAuth" };

    let store = super::token_store(config);
    store.replace(&target.user, target.provider, credential)?;

    info!(user = %target.user, provider = %target.provider, kind, "stored credential");
    println!(
        "Connected {} ({}) for user '{}'.",
        target.provider.display_name(),
        kind,
        target.user
    );
    Ok(())
}

/// Removes a stored credential.
pub fn disconnect(config: &ClientConfig, target: &Target) -> ClientResult<()> {
    let store = super::token_store(config);
    match store.remove(&target.user, target.provider)? {
        Some(_) => println!(
            "Disconnected {} for user '{}'.",
            target.provider.display_name(),
            target.user
        ),
        None => println!(
            "No {} credential stored for user '{}'.",
            target.provider.display_name(),
            target.user
        ),
    }
    Ok(())
}
