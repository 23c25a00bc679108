use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hotspot_kbm_core::ServerConfig;

mod banner;
mod server;

use server::Server;

/// Hotspot KBM — wireless keyboard and mouse server.
///
/// Creates two virtual input devices via /dev/uinput, so it must run with
/// write access to that device (typically as root).
#[derive(Debug, Parser)]
#[command(name = "hotspot-kbm-server", version)]
struct Args {
    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(true)
        .with_thread_ids(false)
        .init();

    info!("Hotspot KBM Server v{}", env!("CARGO_PKG_VERSION"));

    let mut config = ServerConfig::default();
    if let Some(name) = hostname::get().ok().and_then(|h| h.into_string().ok()) {
        config.server_name = name;
    }

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .context("installing signal handler")?;

    let mut server = Server::start(config)?;
    banner::print_banner(&server);
    info!("Server started. Waiting for a connection...");

    // Park until SIGINT/SIGTERM.
    let _ = shutdown_rx.recv();
    println!("\nShutting down...");
    server.stop();
    Ok(())
}
