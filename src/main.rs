//! Svgen CLI - Prompt-to-SVG Generation
//!
//! Command-line interface for the svgen generation pipeline.

use std::path::Path;
use std::process;

use anyhow::Context;
use clap::Parser;
use log::info;
use tracing_subscriber::EnvFilter;

use svgen::cli::{commands, Cli, Commands};
use svgen::{AppConfig, SvgenError};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Svgen v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Some(cmd) => {
            if let Err(e) = handle_command(&config, cmd, cli.json) {
                report(&e);
                process::exit(1);
            }
            Ok(())
        }
        None => {
            println!("Svgen v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> svgen::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path),
        None => AppConfig::from_env(),
    }
}

fn handle_command(config: &AppConfig, cmd: Commands, json: bool) -> svgen::Result<()> {
    match cmd {
        Commands::Generate {
            prompt,
            model,
            filename,
            mock,
        } => commands::generate(
            config,
            &prompt,
            model.as_deref(),
            filename.as_deref(),
            mock,
            json,
        ),
        Commands::Extract { path } => commands::extract(config, &path, json),
        Commands::Validate { path } => commands::validate(config, &path, json),
        Commands::List => commands::list(config, json),
        Commands::Models => commands::models(config, json),
        Commands::Prompt { prompt } => commands::show_prompt(&prompt),
    }
}

fn report(error: &SvgenError) {
    eprintln!("ERROR [{}]: {}", error.error_code(), error.friendly_message());
    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        eprintln!();
        eprintln!("Suggestions:");
        for suggestion in suggestions {
            eprintln!("  - {}", suggestion);
        }
    }
}
