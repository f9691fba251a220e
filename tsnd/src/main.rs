//! `tsnd` loads a TSN shaping configuration, compiles it into
//! per-interface descriptors, and serves create/delete/info requests
//! over a local unix-socket bus. The configuration file is watched and
//! recompiled on change.

mod config_watcher;
mod service;

use anyhow::Result;
use clap::Parser;
use service::Daemon;
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::path::PathBuf;
use tracing::{error, info, level_filters::LevelFilter};
use tsn_bus::UnixSocketServer;

#[derive(Parser)]
#[command(name = "tsnd", about = "Daemon for TSN traffic control")]
struct Args {
    /// Config file in YAML format
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Unix socket path to bind
    #[arg(short, long, default_value = tsn_bus::BUS_SOCKET_PATH)]
    bind: PathBuf,
}

/// Configure console logging, based on the RUST_LOG env var.
fn set_console_logging() {
    let level = if let Ok(level) = std::env::var("RUST_LOG") {
        match level.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::INFO,
        }
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    set_console_logging();
    let args = Args::parse();
    info!("Loading {}", args.config.display());

    let daemon = Daemon::new(args.config.clone()).map_err(|e| {
        error!("Unable to compile the configuration");
        error!("{e}");
        anyhow::anyhow!("{e}")
    })?;

    // Remove the socket file before exiting: Drop is not guaranteed to
    // run on a signal.
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let bind = args.bind.clone();
    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            info!("Received signal {signal}, shutting down");
            UnixSocketServer::signal_cleanup(&bind);
            std::process::exit(0);
        }
    });

    // Recompile when the configuration file changes.
    let watched = daemon.clone();
    let config_path = args.config.clone();
    std::thread::spawn(move || {
        config_watcher::watch_config(config_path, move || {
            let _ = watched.reload(); // failure keeps the old state
        });
    });

    let server = UnixSocketServer::new(&args.bind)?;
    let handler = daemon.clone();
    server
        .listen(move |requests| handler.handle_requests(requests))
        .await?;
    Ok(())
}
