//! Buffered text-to-byte encoding: density-tagged text in, encoded bytes
//! out, with as few sink writes as the buffer sizes allow.
//!
//! The public surface is [`StreamWriter`], a buffered, lock-guarded writer
//! over any [`ByteSink`]. Behind it sits [`EncodingEngine`], which drives a
//! pluggable [`CharEncoder`] through an overflow/underflow loop and carries
//! a surrogate half split across two writes. Independent of the streaming
//! path, [`FormatItem`] and [`concat`] build formatted strings in a single
//! exactly-sized allocation on top of the backward-writing digit encoders
//! in [`digits`].
//!
//! ```rust
//! extern crate alloc;
//! use alloc::vec::Vec;
//! use textsink::{Encoding, StreamWriter};
//!
//! let mut out = Vec::new();
//! let writer = StreamWriter::new(&mut out, Encoding::Utf8);
//! writer.write_str("snow: ❄").unwrap();
//! writer.close().unwrap();
//! drop(writer);
//! assert_eq!(out, "snow: ❄".as_bytes());
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod bytes;
mod coder;
pub mod digits;
mod encodings;
mod text;

mod engine;
mod error;
mod format;
mod sink;
mod writer;

#[cfg(test)]
mod tests;

pub use bytes::ByteBuffer;
pub use coder::{CharEncoder, CoderResult, ErrorAction, UnitCursor};
pub use encodings::{ByteOrder, Encoding};
pub use engine::EncodingEngine;
pub use error::{SinkError, StreamError};
pub use format::{DecimalSymbols, FormatBuf, FormatItem, MixState, concat};
pub use sink::ByteSink;
pub use text::{Density, Text, TextBuf};
pub use writer::{StreamWriter, WriterOptions};
