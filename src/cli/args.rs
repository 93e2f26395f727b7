//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Ferrule front-end asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: ferrule.toml, searched upward)
    #[arg(short = 'C', long, global = true, default_value = "ferrule.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands (default: dev)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Clean, compile, then serve the staging tree with live reload
    #[command(visible_alias = "d")]
    Dev {
        #[command(flatten)]
        serve_args: ServeArgs,
    },

    /// Compile every asset kind into the staging tree once
    #[command(visible_alias = "c")]
    Compile,

    /// Produce the fingerprinted production tree
    #[command(visible_alias = "b")]
    Build,

    /// Delete the staging tree (or the dist tree with --dist)
    Clean {
        /// Delete the distribution tree instead
        #[arg(long)]
        dist: bool,
    },

    /// Run a single named task and its dependencies
    #[command(visible_alias = "r")]
    Run {
        /// Task name (e.g. `styles`, `dist:rev`)
        task: String,
    },
}

/// Development server arguments
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<std::net::IpAddr>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Subcommand with `dev` filled in when none was given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Dev {
            serve_args: ServeArgs::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_dev() {
        let cli = Cli::parse_from(["ferrule"]);
        assert!(matches!(cli.command(), Commands::Dev { .. }));
        assert_eq!(cli.config, PathBuf::from("ferrule.toml"));
    }

    #[test]
    fn test_dev_port_override() {
        let cli = Cli::parse_from(["ferrule", "dev", "--port", "9000"]);
        match cli.command() {
            Commands::Dev { serve_args } => assert_eq!(serve_args.port, Some(9000)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_clean_dist_flag() {
        let cli = Cli::parse_from(["ferrule", "clean", "--dist"]);
        assert!(matches!(cli.command(), Commands::Clean { dist: true }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["ferrule", "build", "--verbose", "-C", "site.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(matches!(cli.command(), Commands::Build));
    }
}
