//! CLI command definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// parsekit - run and hot-reload parser units
#[derive(Parser)]
#[command(name = "parsekit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Source root the unit names are resolved against
    #[arg(short = 'r', long, global = true, env = "PARSEKIT_ROOT")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Load a parser and run its entry point
    Run {
        /// Parser name
        name: Option<String>,

        /// Stay in an interactive session after loading
        #[arg(short, long)]
        interactive: bool,
    },

    /// Create a new parser package
    New {
        /// Parser name
        name: String,
    },

    /// Load a parser and list the loaded units
    Units {
        /// Parser name
        name: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_name_is_optional() {
        let cli = Cli::parse_from(["parsekit", "run"]);
        assert!(matches!(cli.command, Commands::Run { name: None, interactive: false }));

        let cli = Cli::parse_from(["parsekit", "--verbose", "run", "demo", "-i"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Run { name, interactive } => {
                assert_eq!(name.as_deref(), Some("demo"));
                assert!(interactive);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_global_root_after_subcommand() {
        let cli = Cli::parse_from(["parsekit", "units", "demo", "--root", "/tmp/p", "--json"]);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/p")));
        assert!(matches!(cli.command, Commands::Units { json: true, .. }));
    }
}
