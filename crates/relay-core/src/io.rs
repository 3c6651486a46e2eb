//! Complete writes and bounded line reads.
//!
//! Both helpers retry a call that failed only because it was interrupted,
//! keeping whatever progress was already made. Any other error is handed
//! back to the caller, which decides the fate of the connection.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Slicing goes through `get()`

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Returns true if the error only means "try the same call again".
///
/// `Interrupted` is the classic signal interruption; `WouldBlock` is what a
/// non-blocking `try_read`/`try_write` reports when readiness turned out to be
/// spurious.
pub fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

/// Writes every byte of `bytes` to `writer`, then flushes.
///
/// Partial writes are accumulated and interrupted attempts are retried
/// without losing progress. Returns `Ok(())` only once the whole buffer has
/// been handed to the writer. A writer that accepts zero bytes is reported as
/// `WriteZero` instead of being retried forever.
pub async fn send_all<W>(writer: &mut W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut sent = 0usize;

    while sent < bytes.len() {
        let remaining = bytes.get(sent..).unwrap_or_default();
        match writer.write(remaining).await {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "peer accepted zero bytes",
                ));
            }
            Ok(n) => {
                sent = sent.saturating_add(n);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                trace!(sent, total = bytes.len(), "Write interrupted, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    loop {
        match writer.flush().await {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Reads one line of input, appending it to `buf`, `fgets`-style.
///
/// At most `limit - 1` bytes, `\n` included, end up in `buf`; the rest of a
/// longer line is left for the next call. Stops after a `\n`, at the bound,
/// or at end of input. Partially read bytes stay in `buf` if the future is
/// dropped, so the caller keeps `buf` and clears it only after handling a
/// complete line.
///
/// Returns the length of `buf`. Zero means end of input with no pending data.
pub async fn read_line_bounded<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    limit: usize,
) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let max = limit.saturating_sub(1).max(1);

    while buf.len() < max && !buf.ends_with(b"\n") {
        let remaining = max.saturating_sub(buf.len()) as u64;
        match (&mut *reader).take(remaining).read_until(b'\n', buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(buf.len())
}
