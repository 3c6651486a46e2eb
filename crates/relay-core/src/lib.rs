//! Relay Core - Shared primitives for the TCP relay
//!
//! This crate provides the pieces shared between the daemon (`relayd`)
//! and the interactive client (`relay`):
//! - `io` - complete writes and bounded line reads that retry transient
//!   interruptions
//! - `message` - nickname validation, outgoing-message framing and the fixed
//!   protocol text
//! - `shutdown` - SIGINT/SIGTERM to `CancellationToken` bridge
//! - `error` - validation errors for the above
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod error;
pub mod io;
pub mod message;
pub mod shutdown;

// Re-exports for convenience
pub use error::{ProtocolError, ProtocolResult};
pub use io::{is_transient, read_line_bounded, send_all};
pub use message::{
    MessageFramer, Nickname, MAX_LINE_LEN, MAX_NICKNAME_LEN, ROOM_FULL_NOTICE,
};
pub use shutdown::cancel_on_shutdown_signal;
