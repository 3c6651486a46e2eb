//! relayd - TCP broadcast relay server
//!
//! Accepts many concurrent connections and relays bytes received from any
//! one connection to all the others.
//!
//! # Usage
//!
//! ```bash
//! # Listen on port 5000, all interfaces
//! relayd 5000
//!
//! # Loopback only, at most 50 clients
//! relayd 5000 --bind 127.0.0.1 --capacity 50
//!
//! # Enable debug logging
//! RUST_LOG=relayd=debug relayd 5000
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown (every connection is closed)

use std::net::{IpAddr, Ipv4Addr};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_core::cancel_on_shutdown_signal;
use relayd::config::DEFAULT_CAPACITY;
use relayd::ServerConfig;

/// Relay server - broadcasts every received byte to all other clients
#[derive(Parser, Debug)]
#[command(name = "relayd", version, about)]
struct Args {
    /// TCP port to listen on
    port: u16,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// Maximum number of simultaneous clients
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("relayd=info".parse()?)
                .add_directive("relay_core=info".parse()?),
        )
        .init();

    run_server(args)
}

/// Runs the server (async entry point, single-threaded).
#[tokio::main(flavor = "current_thread")]
async fn run_server(args: Args) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "Relay server starting"
    );

    // Create cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();
    cancel_on_shutdown_signal(cancel_token.clone());

    let config = ServerConfig {
        bind_addr: args.bind,
        capacity: args.capacity,
        ..ServerConfig::new(args.port)
    };

    relayd::server::run(config, cancel_token)
        .await
        .context("Relay server failed")?;

    println!("Server finished.");
    Ok(())
}
