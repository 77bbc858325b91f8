//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Bundlewright asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: bundlewright.toml)
    #[arg(short = 'C', long, global = true, default_value = "bundlewright.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Transform sources and write every configured bundle
    #[command(visible_alias = "b")]
    Build {
        /// Build environment (development, test, production)
        #[arg(short, long)]
        env: Option<String>,

        /// Output directory path (relative to current directory)
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        output: Option<PathBuf>,
    },

    /// Print a single file after transformation, without writing bundles
    #[command(visible_alias = "t")]
    Transform {
        /// Script or template file
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Build environment (development, test, production)
        #[arg(short, long)]
        env: Option<String>,
    },
}

impl Commands {
    /// The `--env` value given to this subcommand.
    pub fn env(&self) -> Option<&str> {
        match self {
            Self::Build { env, .. } | Self::Transform { env, .. } => env.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["bundlewright", "build", "--env", "production", "-o", "dist"]);
        match cli.command {
            Commands::Build { env, output } => {
                assert_eq!(env.as_deref(), Some("production"));
                assert_eq!(output, Some(PathBuf::from("dist")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("bundlewright.toml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_transform_with_globals() {
        let cli = Cli::parse_from([
            "bundlewright",
            "-V",
            "transform",
            "app/javascripts/app.js",
            "-C",
            "other.toml",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert_eq!(cli.command.env(), None);
        assert!(matches!(cli.command, Commands::Transform { .. }));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
