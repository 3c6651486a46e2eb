//! Integration tests for the interactive client against a real relay server.
//!
//! The client's input and output are in-memory duplex pipes, so each test
//! can type lines and watch the screen while raw TCP peers sit on the other
//! side of the relay.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use relay_client::{ChatClient, ClientConfig, ClientExit};
use relay_core::Nickname;
use relayd::{ChatServer, ServerConfig};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Constants
// ============================================================================

const SETTLE: Duration = Duration::from_millis(100);
const READ_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_PERIOD: Duration = Duration::from_millis(150);
const PIPE_SIZE: usize = 64 * 1024;

// ============================================================================
// Test Helpers
// ============================================================================

struct TestServer {
    addr: SocketAddr,
    cancel_token: CancellationToken,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with_capacity(8).await
    }

    async fn spawn_with_capacity(capacity: usize) -> Self {
        let cancel_token = CancellationToken::new();
        let config = ServerConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            capacity,
            ..ServerConfig::new(0)
        };
        let server = ChatServer::bind(config, cancel_token.clone()).expect("bind server");
        let addr = server.local_addr().expect("local addr");
        tokio::spawn(server.run());
        TestServer { addr, cancel_token }
    }

    async fn connect_raw(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).await.expect("connect raw peer");
        sleep(SETTLE).await;
        stream
    }

    async fn shutdown(self) {
        self.cancel_token.cancel();
        sleep(SETTLE).await;
    }
}

/// A running `ChatClient` with its keyboard and screen.
struct TestClient {
    keyboard: DuplexStream,
    screen: DuplexStream,
    cancel_token: CancellationToken,
    handle: JoinHandle<relay_client::Result<ClientExit>>,
}

impl TestClient {
    async fn spawn(server: &TestServer, nickname: &str) -> Self {
        Self::spawn_with(server, nickname, |config| config).await
    }

    async fn spawn_with(
        server: &TestServer,
        nickname: &str,
        adjust: impl FnOnce(ClientConfig) -> ClientConfig,
    ) -> Self {
        let config = adjust(ClientConfig::new(
            "127.0.0.1",
            server.addr.port(),
            Nickname::new(nickname).unwrap(),
        ));
        let cancel_token = CancellationToken::new();
        let client = ChatClient::connect(config, cancel_token.clone())
            .await
            .expect("client connects");

        let (keyboard, input) = duplex(PIPE_SIZE);
        let (output, screen) = duplex(PIPE_SIZE);

        let handle = tokio::spawn(client.run(BufReader::new(input), output));
        sleep(SETTLE).await;

        TestClient {
            keyboard,
            screen,
            cancel_token,
            handle,
        }
    }

    async fn type_text(&mut self, text: &[u8]) {
        self.keyboard.write_all(text).await.unwrap();
    }

    async fn read_screen(&mut self, len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        timeout(READ_TIMEOUT, self.screen.read_exact(&mut buf))
            .await
            .expect("screen output in time")
            .expect("screen read");
        buf
    }

    /// Closes the keyboard (end of input) and waits for the client to exit.
    async fn finish_input(self) -> ClientExit {
        drop(self.keyboard);
        timeout(READ_TIMEOUT, self.handle)
            .await
            .expect("client exits in time")
            .expect("client task")
            .expect("client run")
    }

    async fn wait_exit(self) -> ClientExit {
        timeout(READ_TIMEOUT, self.handle)
            .await
            .expect("client exits in time")
            .expect("client task")
            .expect("client run")
    }
}

async fn read_exact_bytes(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    timeout(READ_TIMEOUT, stream.read_exact(&mut buf))
        .await
        .expect("bytes arrive in time")
        .expect("read succeeds");
    buf
}

async fn assert_quiet(stream: &mut TcpStream) {
    let mut buf = [0u8; 64];
    if let Ok(result) = timeout(QUIET_PERIOD, stream.read(&mut buf)).await {
        let n = result.expect("read");
        panic!("Expected silence, got {:?}", String::from_utf8_lossy(&buf[..n]));
    }
}

// ============================================================================
// Outgoing Messages
// ============================================================================

#[tokio::test]
async fn test_typed_line_is_prefixed_with_nickname() {
    let server = TestServer::spawn().await;
    let mut alice = TestClient::spawn(&server, "alice").await;
    let mut bob = server.connect_raw().await;

    alice.type_text(b"hi\n").await;

    assert_eq!(read_exact_bytes(&mut bob, 10).await, b"alice: hi\n");
    assert_quiet(&mut bob).await;

    assert_eq!(alice.finish_input().await, ClientExit::InputClosed);
    server.shutdown().await;
}

#[tokio::test]
async fn test_sender_does_not_see_own_message() {
    let server = TestServer::spawn().await;
    let mut alice = TestClient::spawn(&server, "alice").await;
    let mut bob = TestClient::spawn(&server, "bob").await;

    alice.type_text(b"hi\n").await;
    assert_eq!(bob.read_screen(10).await, b"alice: hi\n");

    bob.type_text(b"hey\n").await;
    // Alice's screen shows only bob's line, never her own.
    assert_eq!(alice.read_screen(9).await, b"bob: hey\n");

    assert_eq!(alice.finish_input().await, ClientExit::InputClosed);
    assert_eq!(bob.finish_input().await, ClientExit::InputClosed);
    server.shutdown().await;
}

#[tokio::test]
async fn test_consecutive_lines_arrive_in_order() {
    let server = TestServer::spawn().await;
    let mut alice = TestClient::spawn(&server, "alice").await;
    let mut bob = server.connect_raw().await;

    alice.type_text(b"x\ny\n").await;

    assert_eq!(
        read_exact_bytes(&mut bob, 18).await,
        b"alice: x\nalice: y\n"
    );

    assert_eq!(alice.finish_input().await, ClientExit::InputClosed);
    server.shutdown().await;
}

#[tokio::test]
async fn test_final_line_without_newline_is_terminated() {
    let server = TestServer::spawn().await;
    let mut alice = TestClient::spawn(&server, "alice").await;
    let mut bob = server.connect_raw().await;

    alice.type_text(b"bye").await;
    assert_eq!(alice.finish_input().await, ClientExit::InputClosed);

    assert_eq!(read_exact_bytes(&mut bob, 11).await, b"alice: bye\n");

    // Alice's socket is closed; the server frees her slot without telling bob.
    assert_quiet(&mut bob).await;
    server.shutdown().await;
}

#[tokio::test]
async fn test_end_of_input_frees_server_slot() {
    let server = TestServer::spawn_with_capacity(2).await;
    let alice = TestClient::spawn(&server, "alice").await;
    let mut bob = server.connect_raw().await;

    assert_eq!(alice.finish_input().await, ClientExit::InputClosed);
    sleep(SETTLE).await;

    // Alice's slot is free again, so carol is admitted instead of turned away.
    let mut carol = server.connect_raw().await;
    assert_quiet(&mut carol).await;

    bob.write_all(b"bob: hi carol\n").await.unwrap();
    assert_eq!(read_exact_bytes(&mut carol, 14).await, b"bob: hi carol\n");

    server.shutdown().await;
}

#[tokio::test]
async fn test_long_line_is_sent_in_bounded_pieces() {
    let server = TestServer::spawn().await;
    let mut alice = TestClient::spawn_with(&server, "alice", |config| ClientConfig {
        max_line: 8,
        ..config
    })
    .await;
    let mut bob = server.connect_raw().await;

    alice.type_text(b"abcdefghij\n").await;

    assert_eq!(
        read_exact_bytes(&mut bob, 26).await,
        b"alice: abcdefg\nalice: hij\n"
    );

    assert_eq!(alice.finish_input().await, ClientExit::InputClosed);
    server.shutdown().await;
}

// ============================================================================
// Incoming Bytes
// ============================================================================

#[tokio::test]
async fn test_incoming_bytes_copied_unmodified() {
    let server = TestServer::spawn().await;
    let mut alice = TestClient::spawn(&server, "alice").await;
    let mut raw = server.connect_raw().await;

    // No framing is imposed on what arrives: partial lines pass straight through.
    raw.write_all(b"no newline, \xffraw").await.unwrap();
    assert_eq!(alice.read_screen(17).await, b"no newline, \xffraw");

    assert_eq!(alice.finish_input().await, ClientExit::InputClosed);
    server.shutdown().await;
}

#[tokio::test]
async fn test_room_full_notice_reaches_screen() {
    let server = TestServer::spawn_with_capacity(1).await;
    let _occupant = server.connect_raw().await;

    let mut late = TestClient::spawn(&server, "late").await;
    assert_eq!(late.read_screen(11).await, b"Sala cheia\n");
    assert_eq!(late.wait_exit().await, ClientExit::ServerClosed);

    server.shutdown().await;
}

// ============================================================================
// Session Endings
// ============================================================================

#[tokio::test]
async fn test_server_shutdown_ends_session() {
    let server = TestServer::spawn().await;
    let alice = TestClient::spawn(&server, "alice").await;

    server.shutdown().await;

    assert_eq!(alice.wait_exit().await, ClientExit::ServerClosed);
}

#[tokio::test]
async fn test_cancellation_ends_session() {
    let server = TestServer::spawn().await;
    let alice = TestClient::spawn(&server, "alice").await;

    alice.cancel_token.cancel();
    assert_eq!(alice.wait_exit().await, ClientExit::Cancelled);

    server.shutdown().await;
}
