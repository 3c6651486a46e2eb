//! Relay Client - Interactive chat client library
//!
//! This library provides the interactive side of the TCP relay.
//!
//! # Architecture
//!
//! The client is a single task multiplexing two sources:
//!
//! 1. **Input**: lines typed by the user are framed as `"<nickname>: <line>\n"`
//!    and written to the socket with complete writes
//! 2. **Socket**: bytes relayed by the server are copied to the output
//!    unmodified
//!
//! A shared `CancellationToken` ends the loop from outside (e.g. on Ctrl+C).

pub mod client;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use client::{ChatClient, ClientExit};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
