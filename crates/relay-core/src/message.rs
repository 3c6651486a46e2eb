//! Outgoing-message framing and fixed protocol text.
//!
//! The relay itself never parses what it forwards. Framing is a client-side
//! convention only: every line typed by a user travels as
//! `"<nickname>: <line>\n"`. Receivers must not rely on that framing
//! surviving relay boundaries, since rapid sends can arrive concatenated or
//! split.

use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};

/// Notice sent to a connection rejected because every slot is taken.
pub const ROOM_FULL_NOTICE: &[u8] = b"Sala cheia\n";

/// Maximum nickname length in bytes. The prefix `"<nickname>: "` must fit
/// in 128 bytes.
pub const MAX_NICKNAME_LEN: usize = 125;

/// Default line buffer size. One piece of input holds at most
/// `MAX_LINE_LEN - 1` bytes, terminator included; longer lines are split.
pub const MAX_LINE_LEN: usize = 1024;

/// Separator between the nickname and the text of a line.
const PREFIX_SEPARATOR: &str = ": ";

/// A validated nickname.
///
/// Guaranteed non-empty, free of line terminators, and at most
/// [`MAX_NICKNAME_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nickname(String);

impl Nickname {
    /// Validates and wraps a nickname.
    pub fn new(nickname: impl Into<String>) -> ProtocolResult<Self> {
        let nickname = nickname.into();

        if nickname.is_empty() {
            return Err(ProtocolError::EmptyNickname);
        }
        if nickname.len() > MAX_NICKNAME_LEN {
            return Err(ProtocolError::NicknameTooLong {
                len: nickname.len(),
                max: MAX_NICKNAME_LEN,
            });
        }
        if nickname.contains(['\n', '\r']) {
            return Err(ProtocolError::NicknameLineBreak);
        }

        Ok(Self(nickname))
    }

    /// Returns the nickname as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Nickname {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Builds outgoing messages for one nickname.
///
/// The prefix is computed once and reused for every line.
#[derive(Debug, Clone)]
pub struct MessageFramer {
    prefix: Vec<u8>,
}

impl MessageFramer {
    /// Creates a framer for the given nickname.
    pub fn new(nickname: &Nickname) -> Self {
        let mut prefix = Vec::with_capacity(nickname.as_str().len() + PREFIX_SEPARATOR.len());
        prefix.extend_from_slice(nickname.as_str().as_bytes());
        prefix.extend_from_slice(PREFIX_SEPARATOR.as_bytes());
        Self { prefix }
    }

    /// Frames one line of input as `prefix + line`, appending `\n` when the
    /// line lacks one (a line cut by the length bound, or the last line of
    /// input without a terminator).
    pub fn frame(&self, line: &[u8]) -> Vec<u8> {
        let needs_newline = !line.ends_with(b"\n");
        let mut message =
            Vec::with_capacity(self.prefix.len() + line.len() + usize::from(needs_newline));
        message.extend_from_slice(&self.prefix);
        message.extend_from_slice(line);
        if needs_newline {
            message.push(b'\n');
        }
        message
    }
}
