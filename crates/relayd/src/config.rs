//! Server configuration.
//!
//! Built from command-line arguments; there are no configuration files.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default number of simultaneous connections (the historical
/// descriptor-set limit).
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default size of one relayed chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default listen backlog.
pub const DEFAULT_LISTEN_BACKLOG: u32 = 16;

/// Default bound on one send to one receiver (2 seconds).
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for [`ChatServer`](crate::server::ChatServer).
///
/// # Example
///
/// ```rust
/// use relayd::config::ServerConfig;
///
/// let config = ServerConfig {
///     capacity: 2,
///     ..ServerConfig::new(5000)
/// };
/// assert_eq!(config.socket_addr().port(), 5000);
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: IpAddr,

    /// TCP port to listen on. Zero picks an ephemeral port.
    pub port: u16,

    /// Maximum number of simultaneously registered connections.
    pub capacity: usize,

    /// Maximum bytes read from a connection in one operation.
    pub chunk_size: usize,

    /// Pending-connection backlog passed to `listen`.
    pub listen_backlog: u32,

    /// Upper bound on one send to one receiver. A receiver that stalls
    /// longer is dropped.
    pub write_timeout: Duration,
}

impl ServerConfig {
    /// Creates a configuration for `port` with every other field defaulted.
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    /// The socket address the listener binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 0,
            capacity: DEFAULT_CAPACITY,
            chunk_size: DEFAULT_CHUNK_SIZE,
            listen_backlog: DEFAULT_LISTEN_BACKLOG,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}
