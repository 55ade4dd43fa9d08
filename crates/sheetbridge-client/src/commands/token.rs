//! `sheetbridge token`.

use tracing::debug;

use crate::cli::Target;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Prints a valid access token for the target, refreshing it if needed.
///
/// Only the token goes to stdout so the output can be piped.
pub async fn run(config: &ClientConfig, target: &Target, json: bool) -> ClientResult<()> {
    let manager = super::credential_manager(config);
    debug!(user = %target.user, provider = %target.provider, "fetching token");

    let bundle = manager
        .get_valid_token(&target.user, target.provider)
        .await?;

    if json {
        let out = serde_json::to_string_pretty(&bundle).map_err(std::io::Error::from)?;
        println!("{}", out);
    } else {
        println!("{}", bundle.access_token);
        if let Some(expires_at) = bundle.expires_at {
            eprintln!("expires at {}", expires_at.to_rfc3339());
        }
    }
    Ok(())
}
