use clap::Parser;
use colored::Colorize;

use chunktrace::cli::{Cli, ColorMode, Command};
use chunktrace::commands;
use chunktrace::commands::chunk::ChunkCommandOptions;
use chunktrace::commands::diff::DiffCommandOptions;
use chunktrace::commands::reconstruct::ReconstructCommandOptions;
use chunktrace::commands::simulate::SimulateCommandOptions;
use chunktrace::config::{self, Config};
use chunktrace::error::Result;
use chunktrace::hash::HashScheme;

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("{} {err}", "error:".red().bold());
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let scheme = HashScheme::new(resolve_hash_length(cli.hash_length, &config))?;
    let default_budget = config.default_split_budget;

    match cli.command {
        Command::Chunk { path, budget } => commands::chunk::run(ChunkCommandOptions {
            path,
            budget,
            default_budget,
            scheme,
            json: cli.json,
            quiet: cli.quiet,
        }),
        Command::Diff {
            path,
            diff_file,
            budget,
            timestamp,
        } => commands::diff::run(DiffCommandOptions {
            path,
            diff_file,
            budget,
            default_budget,
            timestamp,
            scheme,
            json: cli.json,
            quiet: cli.quiet,
        }),
        Command::Reconstruct { path, diff_file } => {
            commands::reconstruct::run(ReconstructCommandOptions {
                path,
                diff_file,
                scheme,
                json: cli.json,
                quiet: cli.quiet,
            })
        }
        Command::Simulate {
            repo,
            path,
            budget,
            diff_file,
        } => commands::simulate::run(SimulateCommandOptions {
            repo,
            path,
            budget,
            default_budget,
            diff_file,
            scheme,
            quiet: cli.quiet,
        }),
    }
}

fn load_config(explicit: Option<&std::path::Path>) -> Result<Config> {
    match config::find_config_file(explicit) {
        Some(path) => Config::load(&path),
        None => Ok(Config::default()),
    }
}

/// Resolve the effective hash digest width. Precedence: `--hash-length`
/// flag (or its `HASH_LENGTH` env fallback, already folded in by clap) wins
/// over the config file's `hash_length`, which wins over the built-in
/// default baked into `Config::default()`.
fn resolve_hash_length(flag: Option<usize>, config: &Config) -> usize {
    flag.unwrap_or(config.hash_length)
}
