//! Ferrule - a front-end asset pipeline.
//!
//! Turns a `src/` tree of markup, stylesheets, scripts and static assets into
//! a live-reloaded staging tree (`dev`) or a fingerprinted dist tree (`build`).

mod actor;
mod asset;
mod cli;
mod compiler;
mod config;
mod core;
mod embed;
mod freshness;
mod logger;
mod package;
mod pipeline;
mod reload;
mod rev;
mod task;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::FerruleConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();
    logger::set_verbose(cli.verbose);

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = Arc::new(FerruleConfig::load(&cli)?);

    let report = match cli.command() {
        Commands::Dev { .. } => return cli::serve::serve(config),
        Commands::Compile => cli::build::run_task(config, "compile")?,
        Commands::Build => cli::build::run_task(config, "build")?,
        Commands::Clean { dist } => cli::build::run_task(config, cli::build::clean_target(dist))?,
        Commands::Run { task } => cli::build::run_task(config, &task)?,
    };

    if !report.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}
