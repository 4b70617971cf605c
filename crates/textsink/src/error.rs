use alloc::string::String;

use thiserror::Error;

/// Errors surfaced by the encoding pipeline.
///
/// Nothing is retried automatically; every failure is reported to the
/// immediate caller. A sink failure leaves the stream in a defined but
/// effectively unusable state (the engine resets its encoder state before
/// re-raising).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// An operation was attempted after `close()`.
    #[error("stream closed")]
    Closed,

    /// A configured buffer size was zero.
    #[error("buffer size must be positive")]
    InvalidBufferSize,

    /// A ranged write referenced units outside the given slice.
    #[error("range {offset}..{end} out of bounds for length {len}")]
    OutOfBounds {
        /// First unit of the requested range.
        offset: usize,
        /// One past the last unit of the requested range.
        end: usize,
        /// Length of the slice the range was applied to.
        len: usize,
    },

    /// Malformed input (an unpaired surrogate) under the strict disposition.
    #[error("malformed input of length {0}")]
    MalformedInput(usize),

    /// A code point the encoding cannot represent, under the strict
    /// disposition.
    #[error("unmappable character of length {0}")]
    UnmappableCharacter(usize),

    /// An error propagated verbatim from the byte sink.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// An I/O failure reported by a [`ByteSink`](crate::ByteSink).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SinkError {
    message: String,
}

impl SinkError {
    /// Creates a sink error carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
