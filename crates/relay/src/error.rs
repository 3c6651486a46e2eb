//! Error types for the relay client.
//!
//! Only resource failures are errors. Every ordinary way for a session to
//! end (input closed, server gone, Ctrl+C) is a [`ClientExit`] instead.
//!
//! [`ClientExit`]: crate::client::ClientExit

use std::io;
use thiserror::Error;

/// Relay client errors.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Host name could not be resolved.
    #[error("Failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Resolution succeeded but produced no address.
    #[error("No address found for {target}")]
    NoAddress { target: String },

    /// Every resolved address refused the connection.
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Writing relayed bytes to the output failed.
    #[error("Failed to write output: {0}")]
    Output(#[source] io::Error),
}

/// Convenience Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
