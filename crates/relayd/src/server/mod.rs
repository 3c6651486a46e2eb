//! TCP relay server.
//!
//! The server:
//! - Listens on a TCP port with address reuse enabled
//! - Registers each accepted connection in a fixed-capacity registry
//! - Rejects connections beyond capacity with a "room full" notice
//! - Relays every chunk read from one connection to all the others
//! - Drops a receiver whose send fails or stalls past the write timeout
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              ChatServer (one task)              │
//! │                                                 │
//! │   select! ─┬─ cancelled()      ──▶ shutdown     │
//! │            ├─ listener.accept() ──▶ admit        │
//! │            └─ wait_readable()   ──▶ read chunk   │
//! │                                        │        │
//! │                                        ▼        │
//! │   ConnectionRegistry ◀──────────── broadcast    │
//! │   (slot arena)                                  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the task that calls [`ChatServer::run`]. Nothing is
//! spawned per connection, and the registry is never shared.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Per-connection errors are logged and allow continued operation

mod broadcast;
mod connection;

pub use broadcast::{broadcast, BroadcastReport};
pub use connection::{wait_readable, Peer, ReadOutcome, SendError};

use std::io;
use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use relay_core::is_transient;

use crate::config::ServerConfig;
use crate::registry::{ConnectionRegistry, Registration, SlotId};

/// What woke the event loop.
enum LoopEvent {
    Shutdown,
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Readable(Vec<SlotId>),
}

/// Broadcast relay server.
///
/// Owns the listening socket and the connection registry.
pub struct ChatServer {
    /// Server configuration
    config: ServerConfig,

    /// Bound listening socket
    listener: TcpListener,

    /// Active connections
    registry: ConnectionRegistry<Peer>,

    /// Cancellation token for graceful shutdown
    cancel_token: CancellationToken,

    /// Connection counter for numbering accepted connections
    connection_counter: u64,

    /// Scratch buffer for one relayed chunk
    chunk: Vec<u8>,
}

impl ChatServer {
    /// Creates the listening socket and an empty registry.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] or [`ServerError::Listen`] if the
    /// socket cannot be set up.
    pub fn bind(config: ServerConfig, cancel_token: CancellationToken) -> Result<Self, ServerError> {
        let addr = config.socket_addr();
        let listener = listen(addr, config.listen_backlog)?;

        info!(
            addr = %listener.local_addr().unwrap_or(addr),
            capacity = config.capacity,
            "Relay server listening"
        );

        let registry = ConnectionRegistry::new(config.capacity);
        let chunk = vec![0u8; config.chunk_size.max(1)];

        Ok(Self {
            config,
            listener,
            registry,
            cancel_token,
            connection_counter: 0,
            chunk,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Returns the number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Runs the event loop until the cancellation token is triggered, then
    /// releases every connection and closes the listener.
    pub async fn run(mut self) {
        loop {
            let event = tokio::select! {
                biased;

                _ = self.cancel_token.cancelled() => LoopEvent::Shutdown,

                accepted = self.listener.accept() => LoopEvent::Accepted(accepted),

                ready = wait_readable(&self.registry) => LoopEvent::Readable(ready),
            };

            match event {
                LoopEvent::Shutdown => {
                    info!("Server shutdown requested");
                    break;
                }
                LoopEvent::Accepted(Ok((stream, addr))) => {
                    self.admit(stream, addr).await;
                }
                LoopEvent::Accepted(Err(e)) if is_transient(&e) => {
                    trace!(error = %e, "Accept interrupted, retrying");
                }
                LoopEvent::Accepted(Err(e)) => {
                    // Continue accepting other connections
                    warn!(error = %e, "Failed to accept connection");
                }
                LoopEvent::Readable(slots) => {
                    for slot in slots {
                        if self.cancel_token.is_cancelled() {
                            break;
                        }
                        self.service(slot).await;
                    }
                }
            }
        }

        self.shutdown();
    }

    /// Registers a new connection, or turns it away if the room is full.
    async fn admit(&mut self, stream: TcpStream, addr: SocketAddr) {
        let connection_number = self.connection_counter;
        self.connection_counter = self.connection_counter.wrapping_add(1);

        match self.registry.register(Peer::new(stream, addr, connection_number)) {
            Registration::Registered(slot) => {
                info!(
                    slot = %slot,
                    peer = %addr,
                    connection = connection_number,
                    active = self.registry.len(),
                    "Client connected"
                );
            }
            Registration::Full(peer) => {
                warn!(
                    peer = %addr,
                    capacity = self.registry.capacity(),
                    "Room full, rejecting connection"
                );
                peer.reject(self.config.write_timeout, &self.cancel_token).await;
            }
        }
    }

    /// Reads one chunk from a ready slot and relays it.
    async fn service(&mut self, slot: SlotId) {
        let outcome = match self.registry.get(slot) {
            Some(peer) => peer.read_chunk(&mut self.chunk),
            None => return,
        };

        match outcome {
            ReadOutcome::Data(n) => {
                let chunk = self.chunk.get(..n).unwrap_or_default();
                let report = broadcast(
                    &mut self.registry,
                    chunk,
                    slot,
                    self.config.write_timeout,
                    &self.cancel_token,
                )
                .await;
                trace!(slot = %slot, bytes = n, delivered = report.delivered, "Relayed chunk");

                // A failed receiver may hold a partial chunk.
                for receiver in report.failed {
                    self.release(receiver, "send failed");
                }
            }
            ReadOutcome::Pending => {
                trace!(slot = %slot, "Spurious readiness");
            }
            ReadOutcome::Closed => {
                self.release(slot, "closed by peer");
            }
            ReadOutcome::Failed(e) => {
                debug!(slot = %slot, error = %e, "Read failed");
                self.release(slot, "read error");
            }
        }
    }

    /// Frees a slot and closes its connection.
    fn release(&mut self, slot: SlotId, reason: &str) {
        if let Some(peer) = self.registry.unregister(slot) {
            info!(
                slot = %slot,
                peer = %peer.addr(),
                connection = peer.connection_number(),
                connected_at = %peer.connected_at(),
                connected_secs = peer.connected_secs(),
                reason,
                active = self.registry.len(),
                "Client disconnected"
            );
        }
    }

    /// Closes every connection; the listener closes when `self` drops.
    fn shutdown(&mut self) {
        let released = self.registry.drain();
        for (slot, peer) in &released {
            debug!(slot = %slot, peer = %peer.addr(), "Closing connection");
        }

        info!(closed = released.len(), "Server cleanup complete");
    }
}

/// Binds and runs a server until `cancel_token` is triggered.
///
/// Returns only on shutdown or if the listener cannot be set up.
pub async fn run(config: ServerConfig, cancel_token: CancellationToken) -> Result<(), ServerError> {
    let server = ChatServer::bind(config, cancel_token)?;
    server.run().await;
    Ok(())
}

/// Creates a listening socket with `SO_REUSEADDR` set.
fn listen(addr: SocketAddr, backlog: u32) -> Result<TcpListener, ServerError> {
    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .map_err(|source| ServerError::Socket { source })?;

    socket
        .set_reuseaddr(true)
        .map_err(|source| ServerError::Socket { source })?;

    socket
        .bind(addr)
        .map_err(|source| ServerError::Bind { addr, source })?;

    socket
        .listen(backlog)
        .map_err(|source| ServerError::Listen { addr, source })
}

/// Errors that can occur while setting up the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to create socket: {source}")]
    Socket {
        #[source]
        source: io::Error,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Failed to listen on {addr}: {source}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}
