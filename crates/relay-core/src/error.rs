//! Validation errors following panic-free policy.

use thiserror::Error;

/// Errors that can occur while building outgoing messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Nickname was empty
    #[error("Nickname must not be empty")]
    EmptyNickname,

    /// Nickname does not fit the prefix bound
    #[error("Nickname too long: {len} bytes (max: {max})")]
    NicknameTooLong { len: usize, max: usize },

    /// Nickname contains a character that would break line framing
    #[error("Nickname must not contain line terminators")]
    NicknameLineBreak,
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
