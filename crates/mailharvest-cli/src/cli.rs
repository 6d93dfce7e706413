use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mailharvest")]
#[command(about = "Harvest a web-archived mailing list into Postgres")]
#[command(version)]
pub struct Cli {
    /// Environment to load (loads .env.{ENV} instead of .env)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Path to the mailharvest.toml config file
    #[arg(short, long, global = true, default_value = "mailharvest.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create mailharvest.toml and .env.example in the current directory
    Init,

    /// Create the messages table
    Setup,

    /// Harvest messages, resuming after the highest stored id
    Run {
        /// Harvest this many messages and exit instead of prompting
        #[arg(long)]
        count: Option<u64>,

        /// Fetch and parse without writing to the database
        #[arg(long)]
        dry_run: bool,
    },

    /// Show how many messages are stored and where the next run resumes
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from(["mailharvest", "run", "--count", "25", "--dry-run"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Run {
                count: Some(25),
                dry_run: true
            }
        ));
        assert_eq!(cli.config, PathBuf::from("mailharvest.toml"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["mailharvest", "status", "--env", "staging", "-c", "other.toml"])
                .unwrap();
        assert_eq!(cli.env.as_deref(), Some("staging"));
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }

    #[test]
    fn test_rejects_non_numeric_count() {
        assert!(Cli::try_parse_from(["mailharvest", "run", "--count", "lots"]).is_err());
    }
}
