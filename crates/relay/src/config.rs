//! Client configuration.

use relay_core::{Nickname, MAX_LINE_LEN};

/// Default size of one read from the socket.
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Configuration for [`ChatClient`](crate::client::ChatClient).
///
/// # Example
///
/// ```rust
/// use relay_client::ClientConfig;
/// use relay_core::Nickname;
///
/// let config = ClientConfig::new("127.0.0.1", 5000, Nickname::new("alice").unwrap());
/// assert_eq!(config.target(), "127.0.0.1:5000");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Host name or address of the relay server.
    pub host: String,

    /// TCP port of the relay server.
    pub port: u16,

    /// Nickname prefixed to every outgoing line.
    pub nickname: Nickname,

    /// Line buffer size. Each sent piece holds at most `max_line - 1` bytes
    /// of input; longer lines are sent in pieces.
    pub max_line: usize,

    /// Maximum bytes read from the socket in one operation.
    pub chunk_size: usize,
}

impl ClientConfig {
    /// Creates a configuration with default buffer sizes.
    pub fn new(host: impl Into<String>, port: u16, nickname: Nickname) -> Self {
        Self {
            host: host.into(),
            port,
            nickname,
            max_line: MAX_LINE_LEN,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// `host:port`, for logging and error messages.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
