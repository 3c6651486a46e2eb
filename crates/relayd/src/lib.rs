//! Relay Daemon - Connection registry and broadcast server
//!
//! This crate provides the server side of the TCP relay:
//! - `registry` - Fixed-capacity slot arena owning every live connection
//! - `server` - Single-task readiness loop, accept/reject, broadcast fan-out
//! - `config` - Listener and capacity settings
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        relayd                               │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐    │
//! │  │   ChatServer    │────▶│    ConnectionRegistry       │    │
//! │  │ (TcpListener,   │     │  (slot arena, sole owner    │    │
//! │  │  select! loop)  │     │   of every Peer)            │    │
//! │  └────────┬────────┘     └──────────────┬──────────────┘    │
//! │           │                             │                   │
//! │           │ ready slots                 │ all but origin    │
//! │           ▼                             ▼                   │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐    │
//! │  │  Peer::read     │────▶│        broadcast()          │    │
//! │  │  (one chunk)    │     │  (best effort, per receiver)│    │
//! │  └─────────────────┘     └─────────────────────────────┘    │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Per-connection failures tear down that connection only

pub mod config;
pub mod registry;
pub mod server;

pub use config::ServerConfig;
pub use registry::{ConnectionRegistry, Registration, SlotId};
pub use server::{ChatServer, ServerError};
