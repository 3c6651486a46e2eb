//! relay - interactive client for the TCP relay
//!
//! Reads lines from standard input and sends each one as
//! `"<nickname>: <line>\n"`; prints everything the server relays.
//!
//! # Usage
//!
//! ```text
//! relay 127.0.0.1 5000 alice
//! ```
//!
//! Ctrl+C or end of input (Ctrl+D) leaves the room.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use relay_client::{ChatClient, ClientConfig, ClientExit};
use relay_core::{cancel_on_shutdown_signal, Nickname};

// ============================================================================
// CLI Arguments
// ============================================================================

/// Relay client - chat through a relay server
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Chat through a TCP relay server")]
#[command(version)]
struct Args {
    /// Server host name or address
    host: String,

    /// Server TCP port
    port: u16,

    /// Nickname shown before each of your lines
    nickname: Nickname,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the conversation.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("relay_client=warn".parse()?),
        )
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    let result = runtime.block_on(run_client(args));

    // A pending stdin read sits on a blocking thread and cannot be cancelled.
    runtime.shutdown_background();

    result
}

async fn run_client(args: Args) -> Result<()> {
    let cancel_token = CancellationToken::new();
    cancel_on_shutdown_signal(cancel_token.clone());

    let config = ClientConfig::new(args.host, args.port, args.nickname);
    let nickname = config.nickname.clone();

    let client = ChatClient::connect(config, cancel_token)
        .await
        .context("Failed to connect")?;

    println!("Connected as '{nickname}'. Type messages and press Enter. Ctrl+C to quit.");

    let exit = client
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    if exit == ClientExit::ServerClosed {
        println!("Connection closed by server.");
    }
    println!("Client finished.");

    Ok(())
}
