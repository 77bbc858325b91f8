//! Bundlewright - an asset pipeline for client-side template applications.

mod bundle;
mod cli;
mod config;
mod core;
mod logger;
mod pipeline;
mod source;
mod template;
mod transform;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;
use crate::core::CancelToken;

fn main() -> Result<()> {
    let cancel = CancelToken::new();
    core::setup_shutdown_handler(&cancel)?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let mut config = PipelineConfig::load(&cli.config)?;
    let env = config.environment(cli.command.env())?;
    config.validate_for(env)?;
    debug!("config"; "root {}, environment {}", config.root.display(), env);

    match &cli.command {
        Commands::Build { output, .. } => {
            if let Some(output) = output {
                config.set_output(output);
            }
            cli::build::build_bundles(config, env, &cancel).map(|_| ())
        }
        Commands::Transform { file, .. } => cli::transform::transform_file(config, env, file),
    }
}
