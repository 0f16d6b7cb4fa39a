//! polybar-winlist CLI
//!
//! Inspection tool for polybar-winlist: read the last rendered line of a
//! bar instance's cache file, or validate the configuration.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "winlist")]
#[command(about = "Window-list tool for polybar")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/polybar-winlist/config.kdl")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the last rendered line for a bar instance and exit
    Tail {
        /// Process id of the polybar instance
        pid: i32,

        /// Cache file base path (the pid is appended); overrides the config
        cache: Option<PathBuf>,
    },

    /// Validate the configuration file
    Validate,
}

fn main() -> miette::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    match cli.command {
        Commands::Tail { pid, cache } => cmd_tail(&config_path, pid, cache),
        Commands::Validate => cmd_validate(&config_path),
    }
}

fn cmd_tail(config_path: &Path, pid: i32, cache: Option<PathBuf>) -> miette::Result<()> {
    let config =
        winlist_config::load_config(config_path).map_err(|e| miette::miette!("{}", e))?;

    let cache_path = match cache {
        Some(base) => PathBuf::from(format!("{}.{}", base.display(), pid)),
        None => config.cache_path(pid),
    };

    match std::fs::read_to_string(&cache_path) {
        Ok(content) => {
            if let Some(line) = content.lines().last() {
                println!("{}", line);
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            // The daemon may simply not be running for this instance;
            // report it as a message, not a crash
            println!("No such file or directory: '{}'", cache_path.display());
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn cmd_validate(config_path: &Path) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    match winlist_config::parse_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!("  Module: {}", config.global.module_name);
            println!("  Cache dir: {}", config.global.cache_dir.display());
            println!(
                "  Label widths: {} / {} (focused)",
                config.labels.width, config.labels.focused_width
            );
            println!(
                "  Subscribed events: {}",
                config.subscribe.events.join(", ")
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
