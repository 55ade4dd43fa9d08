//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sheetbridge_core::ProviderKind;

/// sheetbridge - HubSpot and Google Sheets connection tooling
#[derive(Debug, Parser)]
#[command(name = "sheetbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "SHEETBRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a valid access token, refreshing it first if it has expired
    Token {
        #[command(flatten)]
        target: Target,

        /// Print the token bundle as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store a credential for a user
    Connect {
        #[command(flatten)]
        target: Target,

        #[command(flatten)]
        credential: CredentialArgs,
    },

    /// Remove a stored credential
    Disconnect {
        #[command(flatten)]
        target: Target,
    },

    /// Compare an import file against stored items
    Reconcile {
        /// User the items belong to
        #[arg(long, short)]
        user: String,

        /// JSON array of rows to import
        #[arg(long)]
        rows: PathBuf,

        /// JSON array of the items currently stored
        #[arg(long)]
        records: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Which stored credential a command acts on.
#[derive(Debug, Clone, Args)]
pub struct Target {
    /// User id
    #[arg(long, short)]
    pub user: String,

    /// Provider (google or hubspot)
    #[arg(long, short)]
    pub provider: ProviderKind,
}

/// Credential material for `connect`.
#[derive(Debug, Clone, Args)]
pub struct CredentialArgs {
    /// Private-app token; stored as a static credential that never expires
    #[arg(
        long,
        conflicts_with = "access_token",
        required_unless_present = "access_token"
    )]
    pub static_token: Option<String>,

    /// OAuth access token
    #[arg(long)]
    pub access_token: Option<String>,

    /// OAuth refresh token
    #[arg(long, requires = "access_token", conflicts_with = "static_token")]
    pub refresh_token: Option<String>,

    /// Seconds until the access token expires
    #[arg(long, requires = "access_token", conflicts_with = "static_token")]
    pub expires_in: Option<i64>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_token_command() {
        let cli = Cli::try_parse_from([
            "sheetbridge",
            "token",
            "-u",
            "u1",
            "-p",
            "HubSpot",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Command::Token { target, json } => {
                assert_eq!(target.user, "u1");
                assert_eq!(target.provider, ProviderKind::HubSpot);
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let args = ["sheetbridge", "token", "-u", "u1", "-p", "salesforce"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn connect_requires_exactly_one_token_source() {
        let base = ["sheetbridge", "connect", "-u", "u1", "-p", "google"];
        assert!(Cli::try_parse_from(base).is_err());

        let both = [&base[..], &["--static-token", "a", "--access-token", "b"][..]].concat();
        assert!(Cli::try_parse_from(both).is_err());

        let oauth = [
            &base[..],
            &["--access-token", "a", "--refresh-token", "r", "--expires-in", "3600"][..],
        ]
        .concat();
        let cli = Cli::try_parse_from(oauth).unwrap();
        match cli.command {
            Command::Connect { credential, .. } => {
                assert_eq!(credential.access_token.as_deref(), Some("a"));
                assert_eq!(credential.refresh_token.as_deref(), Some("r"));
                assert_eq!(credential.expires_in, Some(3600));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn oauth_only_flags_conflict_with_static_token() {
        let base = [
            "sheetbridge",
            "connect",
            "-u",
            "u1",
            "-p",
            "hubspot",
            "--static-token",
            "pat",
        ];
        for extra in [["--refresh-token", "r"], ["--expires-in", "60"]] {
            let args = [&base[..], &extra[..]].concat();
            assert!(Cli::try_parse_from(args).is_err(), "accepted {extra:?}");
        }
    }

    #[test]
    fn refresh_token_needs_access_token() {
        let args = [
            "sheetbridge",
            "connect",
            "-u",
            "u1",
            "-p",
            "google",
            "--refresh-token",
            "r",
        ];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
