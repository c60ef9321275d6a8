//! CLI entry point for the engine broker.
//!
//! Inspects and initializes settings, and exposes the patch builder so two
//! versions of a file can be turned into a FixIt from the shell.

use anyhow::{Context, Result};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use engine_broker::Settings;
use engine_broker::responses::FixIt;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Resolution and patch layer for code-intelligence engines
#[derive(Parser)]
#[command(
    name = "engine-broker",
    version = env!("CARGO_PKG_VERSION"),
    about = "Resolution and patch layer for code-intelligence engines",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .broker directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .broker/settings.toml")]
    Config,

    /// Print the refactor FixIt turning one file into another
    #[command(
        about = "Build the edit chunks turning OLD into NEW",
        after_help = "Example:\n  engine-broker diff before.py after.py --path src/app.py"
    )]
    Diff {
        /// Original text
        old: PathBuf,

        /// Modified text
        new: PathBuf,

        /// File path reported in the chunks (defaults to OLD)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

/// Install the fmt subscriber on stderr.
///
/// `RUST_LOG` wins; otherwise the configured filter, or `debug` when debug
/// mode is on.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = if settings.debug {
            "debug"
        } else {
            settings.log_filter.as_str()
        };
        EnvFilter::builder().parse_lossy(directive)
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(config_path) => Settings::load_from(config_path).with_context(|| {
            format!("Configuration error loading from {}", config_path.display())
        })?,
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };
    init_tracing(&settings);

    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)?;
            if force {
                println!("Overwrote configuration at: {}", path.display());
            } else {
                println!("Created configuration file at: {}", path.display());
            }
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Diff { old, new, path } => {
            let old_text = std::fs::read_to_string(&old)
                .with_context(|| format!("Failed to read {}", old.display()))?;
            let new_text = std::fs::read_to_string(&new)
                .with_context(|| format!("Failed to read {}", new.display()))?;
            let path = path.unwrap_or(old);

            let chunks = engine_broker::build_patch(&path, &old_text, &new_text)?;
            tracing::info!("{} chunks for {}", chunks.len(), path.display());
            let fixit = FixIt::refactor(format!("Diff of {}", path.display()), chunks);
            println!("{}", serde_json::to_string_pretty(&fixit)?);
        }
    }

    Ok(())
}
