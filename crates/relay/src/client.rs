//! Interactive relay client.
//!
//! This module provides the `ChatClient` which handles:
//! - Resolving and connecting to the relay server
//! - Framing each input line with the nickname prefix
//! - Copying relayed bytes to the output as they arrive
//!
//! **Panic-Free Policy:** This module follows the project's panic-free guidelines.
//! No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use relay_core::{is_transient, read_line_bounded, send_all, MessageFramer};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

// ============================================================================
// Exit Reasons
// ============================================================================

/// Why an interactive session ended.
///
/// Every variant is a clean shutdown (exit status 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientExit {
    /// Input reached end of stream.
    InputClosed,

    /// The server closed the connection (or reading from it failed).
    ServerClosed,

    /// Sending a message failed; the connection is considered lost.
    WriteFailed,

    /// The cancellation token was triggered.
    Cancelled,
}

/// What woke the interactive loop.
enum LoopEvent {
    Cancelled,
    Input(io::Result<usize>),
    Socket(io::Result<usize>),
}

// ============================================================================
// Chat Client
// ============================================================================

/// A connected relay client.
///
/// # Lifecycle
///
/// 1. [`ChatClient::connect`] resolves the server and connects (failure is fatal)
/// 2. [`ChatClient::run`] multiplexes input and socket until the session ends
/// 3. The socket closes when `run` returns
///
/// # Example
///
/// ```rust,ignore
/// use relay_client::{ChatClient, ClientConfig};
/// use relay_core::Nickname;
/// use tokio::io::BufReader;
/// use tokio_util::sync::CancellationToken;
///
/// let config = ClientConfig::new("127.0.0.1", 5000, Nickname::new("alice")?);
/// let client = ChatClient::connect(config, CancellationToken::new()).await?;
/// let exit = client
///     .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
///     .await?;
/// ```
pub struct ChatClient {
    config: ClientConfig,
    framer: MessageFramer,
    stream: TcpStream,
    cancel_token: CancellationToken,
}

impl ChatClient {
    /// Resolves `host:port` and connects to the first address that accepts.
    ///
    /// # Errors
    ///
    /// * [`ClientError::Resolve`] / [`ClientError::NoAddress`] if the host
    ///   cannot be resolved
    /// * [`ClientError::Connect`] if no resolved address accepts the connection
    pub async fn connect(config: ClientConfig, cancel_token: CancellationToken) -> Result<Self> {
        let target = config.target();

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((config.host.as_str(), config.port))
            .await
            .map_err(|source| ClientError::Resolve {
                target: target.clone(),
                source,
            })?
            .collect();

        let mut last_error = None;
        for addr in addrs {
            debug!(%addr, "Attempting to connect");
            match TcpStream::connect(addr).await {
                Ok(stream) => {
                    info!(%addr, nickname = %config.nickname, "Connected to relay");
                    let framer = MessageFramer::new(&config.nickname);
                    return Ok(Self {
                        config,
                        framer,
                        stream,
                        cancel_token,
                    });
                }
                Err(e) => {
                    debug!(%addr, error = %e, "Connection attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(source) => ClientError::Connect { target, source },
            None => ClientError::NoAddress { target },
        })
    }

    /// Address of the server this client is connected to.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// Runs the interactive loop until the session ends.
    ///
    /// Each line read from `input` is sent as `"<nickname>: <line>\n"`.
    /// Bytes arriving from the server are written to `output` unmodified.
    /// The socket is closed on return.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Output`] only if writing to `output` fails.
    /// All other endings are reported as a [`ClientExit`].
    pub async fn run<I, O>(self, mut input: I, mut output: O) -> Result<ClientExit>
    where
        I: AsyncBufRead + Unpin,
        O: AsyncWrite + Unpin,
    {
        let Self {
            config,
            framer,
            stream,
            cancel_token,
        } = self;

        let (mut reader, mut writer) = stream.into_split();
        let mut line = Vec::with_capacity(config.max_line);
        let mut chunk = vec![0u8; config.chunk_size.max(1)];
        let max_line = config.max_line.max(1);

        let exit = loop {
            if cancel_token.is_cancelled() {
                break ClientExit::Cancelled;
            }

            let event = tokio::select! {
                _ = cancel_token.cancelled() => LoopEvent::Cancelled,

                read = read_line_bounded(&mut input, &mut line, max_line) => LoopEvent::Input(read),

                read = reader.read(&mut chunk) => LoopEvent::Socket(read),
            };

            match event {
                LoopEvent::Cancelled => break ClientExit::Cancelled,

                LoopEvent::Input(Ok(0)) => {
                    debug!("Input reached end of stream");
                    break ClientExit::InputClosed;
                }
                LoopEvent::Input(Ok(_)) => {
                    let message = framer.frame(&line);
                    line.clear();
                    tokio::select! {
                        biased;

                        _ = cancel_token.cancelled() => break ClientExit::Cancelled,

                        sent = send_all(&mut writer, &message) => {
                            if let Err(e) = sent {
                                warn!(error = %e, "Failed to send message");
                                break ClientExit::WriteFailed;
                            }
                        }
                    }
                }
                LoopEvent::Input(Err(e)) if is_transient(&e) => continue,
                LoopEvent::Input(Err(e)) => {
                    warn!(error = %e, "Failed to read input");
                    break ClientExit::InputClosed;
                }

                LoopEvent::Socket(Ok(0)) => {
                    info!("Server closed connection");
                    break ClientExit::ServerClosed;
                }
                LoopEvent::Socket(Ok(n)) => {
                    let received = chunk.get(..n).unwrap_or_default();
                    send_all(&mut output, received)
                        .await
                        .map_err(ClientError::Output)?;
                }
                LoopEvent::Socket(Err(e)) if is_transient(&e) => continue,
                LoopEvent::Socket(Err(e)) => {
                    info!(error = %e, "Connection lost");
                    break ClientExit::ServerClosed;
                }
            }
        };

        debug!(?exit, server = %config.target(), "Closing connection");
        Ok(exit)
    }
}
