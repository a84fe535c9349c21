//! Error types for the steelfix FIX protocol library.
//!
//! This module provides the runtime error hierarchy using `thiserror` for
//! typed, domain-specific errors. Dictionary load errors live in
//! `steelfix-dictionary` next to the loader; everything that can go wrong
//! while mutating, reading, or encoding a message is defined here.

use thiserror::Error;

/// Result type alias using [`FixError`] as the error type.
pub type Result<T> = std::result::Result<T, FixError>;

/// Top-level error type for runtime message operations.
#[derive(Debug, Error)]
pub enum FixError {
    /// Error while mutating or reading a message.
    #[error("message error: {0}")]
    Message(#[from] MessageError),

    /// Error during message encoding.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

/// Errors that occur while mutating or reading a FIX message.
///
/// These are local failures: the message remains in its pre-call state and
/// the caller receives a typed error. Apart from [`MessageError::NotFound`],
/// they indicate programmer error and are not expected to be retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// The tag is not defined for this message or group in the dictionary.
    #[error("unknown field: tag {tag}")]
    UnknownField {
        /// The offending tag number.
        tag: u32,
    },

    /// No message descriptor exists for the requested message type.
    #[error("unknown message type: {msg_type}")]
    UnknownMsg {
        /// The unresolved tag 35 value.
        msg_type: String,
    },

    /// The field's dictionary kind (or the stored value's variant) does not
    /// match the requested accessor.
    #[error("wrong type for tag {tag}")]
    WrongType {
        /// The offending tag number.
        tag: u32,
    },

    /// The tag does not introduce a repeating group.
    #[error("tag {tag} is not a group")]
    NotGroup {
        /// The offending tag number.
        tag: u32,
    },

    /// The tag is not set in the message or group.
    #[error("tag {tag} not found")]
    NotFound {
        /// The requested tag number.
        tag: u32,
    },

    /// The operation does not apply to the stored value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors that occur during FIX message encoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Destination buffer too small. Reallocate to `required` and retry.
    #[error("no more space: need {required} bytes, have {available}")]
    NoMoreSpace {
        /// Total bytes the encoded message needs.
        required: usize,
        /// Bytes available in the destination buffer.
        available: usize,
    },

    /// A repeating group is stored under a tag whose dictionary kind is not
    /// NumInGroup. Accepted at dictionary load, rejected here.
    #[error("tag {tag} holds a group but is not a NumInGroup field")]
    NotNumInGroup {
        /// The offending count tag.
        tag: u32,
    },

    /// A textual value contains the field delimiter byte.
    #[error("value of tag {tag} contains the field delimiter")]
    EmbeddedDelimiter {
        /// The offending tag number.
        tag: u32,
    },
}
