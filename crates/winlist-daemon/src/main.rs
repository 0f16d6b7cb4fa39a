//! polybar-winlist daemon
//!
//! Subscribes to bspwm events and keeps a polybar window-list module's
//! cache file up to date, waking the bar through its IPC FIFO after
//! every repaint.

mod controller;
mod refresh;
mod render;
mod sink;
mod snapshot;
mod wm;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "winlistd")]
#[command(about = "bspwm window-list daemon for polybar")]
struct Args {
    /// Process id of the polybar instance to feed (0 writes to stdout)
    #[arg(default_value_t = 0, allow_negative_numbers = true)]
    pid: i32,

    /// Cache file base path (the pid is appended); overrides the config
    cache: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/polybar-winlist/config.kdl")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&args.config).into_owned().into();
    let config = winlist_config::load_config(&config_path)?;

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.global.log_level.as_str())),
        )
        .init();

    tracing::info!("Loaded configuration from {}", config_path.display());

    let controller = controller::Controller::new(config, args.pid, args.cache)?;
    controller.run().await
}
