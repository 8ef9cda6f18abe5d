//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Keeps stored accounts signed in by logging into each one on a schedule.
#[derive(Debug, Parser)]
#[command(name = "credrenew", version, about)]
pub struct Args {
    /// Configuration file [default: <config_dir>/credrenew/config.json]
    #[arg(long, short, global = true, env = "CREDRENEW_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Operator commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Process the next eligible account, if any
    Run,

    /// Store a new account; reads the secret and the one-time-code seed from
    /// stdin, one per line
    Store {
        /// Login identifier (email address)
        identifier: String,
    },

    /// Print the decrypted credentials of an account
    Fetch {
        /// Account id
        id: String,
    },

    /// Attempt a login for an account without recording it
    Login {
        /// Account id
        id: String,
    },

    /// Change an account's status
    SetStatus {
        /// Account id
        id: String,
        /// New status: active, disabled or locked
        status: String,
    },

    /// List accounts with their latest processing state
    Accounts,

    /// Show the processing log of an account, newest first
    History {
        /// Account id
        id: String,
        /// Maximum number of entries
        #[arg(long, short, default_value_t = 20)]
        limit: u32,
    },

    /// Delete processing log entries past their retention
    Prune,

    /// Generate a new vault key
    GenerateKey {
        /// Store the key in the system keyring instead of printing it
        #[arg(long)]
        save: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_global_config() {
        let args = Args::try_parse_from([
            "credrenew",
            "history",
            "0b5c7f2e-8d0a-4c4e-9a53-1f2d3c4b5a69",
            "--limit",
            "5",
            "--config",
            "/etc/credrenew.json",
        ])
        .unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(args.config, Some(PathBuf::from("/etc/credrenew.json")));
        assert!(matches!(args.command, Commands::History { limit: 5, .. }));
    }

    #[test]
    fn test_parse_generate_key() {
        let args = Args::try_parse_from(["credrenew", "generate-key", "--save"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(args.command, Commands::GenerateKey { save: true }));
    }
}
