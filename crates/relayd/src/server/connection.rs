//! Server-side view of one client connection.
//!
//! A `Peer` wraps the accepted stream with the metadata used for logging.
//! Reads are non-blocking and only attempted after the readiness wait has
//! reported the peer. Sends are complete writes bounded by a timeout and
//! abandoned as soon as shutdown is requested.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - I/O failures are returned to the event loop, which decides the slot's fate

use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use relay_core::{is_transient, send_all, ROOM_FULL_NOTICE};

use crate::registry::{ConnectionRegistry, SlotId};

/// Result of one non-blocking read attempt.
#[derive(Debug)]
pub enum ReadOutcome {
    /// `n` bytes were read into the buffer.
    Data(usize),

    /// Readiness was spurious or the call was interrupted; try again later.
    Pending,

    /// The peer closed its end.
    Closed,

    /// The read failed for good.
    Failed(io::Error),
}

/// Errors from sending to a peer.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Write timeout after {0:?}")]
    Timeout(Duration),

    #[error("Send abandoned for shutdown")]
    Cancelled,
}

/// An accepted client connection.
#[derive(Debug)]
pub struct Peer {
    stream: TcpStream,
    addr: SocketAddr,
    connection_number: u64,
    connected_at: DateTime<Utc>,
}

impl Peer {
    /// Wraps a freshly accepted stream.
    pub fn new(stream: TcpStream, addr: SocketAddr, connection_number: u64) -> Self {
        Self {
            stream,
            addr,
            connection_number,
            connected_at: Utc::now(),
        }
    }

    /// Remote address of the peer.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Sequence number assigned at accept time.
    pub fn connection_number(&self) -> u64 {
        self.connection_number
    }

    /// When the connection was accepted.
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// How long the connection has been open, in whole seconds.
    pub fn connected_secs(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.connected_at)
            .num_seconds()
    }

    /// Polls the stream for read readiness.
    ///
    /// An error from the reactor also counts as ready, so that the following
    /// read surfaces it.
    pub fn poll_readable(&self, cx: &mut Context<'_>) -> Poll<()> {
        self.stream.poll_read_ready(cx).map(|_| ())
    }

    /// Attempts one non-blocking read of up to `buf.len()` bytes.
    pub fn read_chunk(&self, buf: &mut [u8]) -> ReadOutcome {
        match self.stream.try_read(buf) {
            Ok(0) => ReadOutcome::Closed,
            Ok(n) => ReadOutcome::Data(n),
            Err(e) if is_transient(&e) => ReadOutcome::Pending,
            Err(e) => ReadOutcome::Failed(e),
        }
    }

    /// Sends the whole chunk, giving up after `limit` or once `cancel_token`
    /// fires.
    ///
    /// On any error part of the chunk may already be on the wire, so the
    /// stream must not be used for relaying again.
    pub async fn send(
        &mut self,
        chunk: &[u8],
        limit: Duration,
        cancel_token: &CancellationToken,
    ) -> Result<(), SendError> {
        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => Err(SendError::Cancelled),

            result = timeout(limit, send_all(&mut self.stream, chunk)) => match result {
                Ok(sent) => sent.map_err(SendError::from),
                Err(_) => Err(SendError::Timeout(limit)),
            },
        }
    }

    /// Sends the room-full notice and closes the connection.
    ///
    /// Best effort: the connection is discarded whether or not the notice
    /// went out.
    pub async fn reject(mut self, limit: Duration, cancel_token: &CancellationToken) {
        if let Err(e) = self.send(ROOM_FULL_NOTICE, limit, cancel_token).await {
            debug!(peer = %self.addr, error = %e, "Failed to deliver room-full notice");
        }
        let _ = self.stream.shutdown().await;
    }
}

/// Waits until at least one active slot is readable.
///
/// Returns every slot that is ready in this pass, in slot order. Never
/// resolves while the registry is empty.
pub async fn wait_readable(registry: &ConnectionRegistry<Peer>) -> Vec<SlotId> {
    poll_fn(|cx| {
        let ready: Vec<SlotId> = registry
            .iter()
            .filter(|(_, peer)| peer.poll_readable(cx).is_ready())
            .map(|(id, _)| id)
            .collect();

        if ready.is_empty() {
            Poll::Pending
        } else {
            Poll::Ready(ready)
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use crate::registry::Registration;

    /// Returns (server-side peer, client-side stream).
    async fn loopback_pair(number: u64) -> (Peer, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (stream, peer_addr) = listener.accept().await.unwrap();
        (Peer::new(stream, peer_addr, number), client)
    }

    #[test]
    fn test_send_error_display() {
        let err = SendError::Timeout(Duration::from_secs(10));
        assert!(err.to_string().contains("10s"));
    }

    #[tokio::test]
    async fn test_read_chunk_outcomes() {
        let (peer, mut client) = loopback_pair(0).await;
        let mut buf = [0u8; 16];

        assert!(matches!(peer.read_chunk(&mut buf), ReadOutcome::Pending));

        client.write_all(b"hello").await.unwrap();
        peer.stream.readable().await.unwrap();
        match peer.read_chunk(&mut buf) {
            ReadOutcome::Data(n) => assert_eq!(&buf[..n], b"hello"),
            other => panic!("Expected Data, got {other:?}"),
        }

        drop(client);
        peer.stream.readable().await.unwrap();
        assert!(matches!(peer.read_chunk(&mut buf), ReadOutcome::Closed));
    }

    #[tokio::test]
    async fn test_send_delivers_whole_chunk() {
        let (mut peer, mut client) = loopback_pair(1).await;
        peer.send(b"alice: hi\n", Duration::from_secs(1), &CancellationToken::new())
            .await
            .unwrap();

        let mut received = [0u8; 10];
        client.read_exact(&mut received).await.unwrap();
        assert_eq!(&received, b"alice: hi\n");
        assert_eq!(peer.connection_number(), 1);
        assert!(peer.connected_secs() >= 0);
        assert!(peer.connected_at() <= Utc::now());
    }

    #[tokio::test]
    async fn test_send_to_stalled_peer_times_out() {
        let (mut peer, _client) = loopback_pair(3).await;
        let chunk = vec![0u8; 64 * 1024];
        let cancel_token = CancellationToken::new();

        // The client never reads, so the socket buffers eventually fill.
        let mut outcome = Ok(());
        for _ in 0..1024 {
            outcome = peer.send(&chunk, Duration::from_millis(50), &cancel_token).await;
            if outcome.is_err() {
                break;
            }
        }
        assert!(matches!(outcome, Err(SendError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_send_stops_on_cancellation() {
        let (mut peer, mut client) = loopback_pair(4).await;
        let cancel_token = CancellationToken::new();
        cancel_token.cancel();

        let err = peer
            .send(b"late\n", Duration::from_secs(60), &cancel_token)
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Cancelled));

        let mut buf = [0u8; 8];
        let nothing = timeout(Duration::from_millis(100), client.read(&mut buf)).await;
        assert!(nothing.is_err(), "cancelled send must not write");
    }

    #[tokio::test]
    async fn test_reject_sends_notice_then_closes() {
        let (peer, mut client) = loopback_pair(2).await;
        peer.reject(Duration::from_secs(1), &CancellationToken::new()).await;

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, ROOM_FULL_NOTICE);
    }

    #[tokio::test]
    async fn test_wait_readable_reports_only_ready_slots() {
        let mut registry = ConnectionRegistry::new(3);
        let (quiet, _quiet_client) = loopback_pair(0).await;
        let (chatty, mut chatty_client) = loopback_pair(1).await;

        let Registration::Registered(_quiet_slot) = registry.register(quiet) else {
            panic!("registry full");
        };
        let Registration::Registered(chatty_slot) = registry.register(chatty) else {
            panic!("registry full");
        };

        chatty_client.write_all(b"x").await.unwrap();

        let ready = timeout(Duration::from_secs(1), wait_readable(&registry))
            .await
            .expect("readiness within timeout");
        assert_eq!(ready, vec![chatty_slot]);
    }
}
