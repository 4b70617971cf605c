//! The buffered, lock-guarded public writing surface.
//!
//! A writer picks one of two strategies at construction time and keeps it
//! for the stream's life. The generic strategy accumulates code units and
//! hands them to an [`EncodingEngine`]; the fast strategy applies the
//! single-byte Latin-1 rule directly into a byte buffer, skipping the
//! intermediate text copy. Both flush-then-forward any single write at
//! least as long as the maximum buffer size, so wrapping a sink in a
//! writer never fragments or copies a large write.

use alloc::{boxed::Box, vec::Vec};

use spin::Mutex;

use crate::{
    coder::{CharEncoder, ErrorAction, is_high_surrogate, is_low_surrogate},
    encodings::Encoding,
    engine::{EncodingEngine, INITIAL_BYTE_BUFFER_CAPACITY, MAX_BYTE_BUFFER_CAPACITY},
    error::StreamError,
    sink::ByteSink,
    text::{Text, TextBuf},
};

#[cfg(windows)]
const LINE_SEPARATOR: &[u8] = b"\r\n";
#[cfg(not(windows))]
const LINE_SEPARATOR: &[u8] = b"\n";

/// Buffer sizing and error disposition for a [`StreamWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WriterOptions {
    /// Starting buffer capacity, in code units (and engine bytes).
    pub initial_size: usize,
    /// Capacity at which a buffer flushes instead of growing further.
    pub max_size: usize,
    /// Disposition for malformed or unmappable input.
    pub action: ErrorAction,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            initial_size: INITIAL_BYTE_BUFFER_CAPACITY,
            max_size: MAX_BYTE_BUFFER_CAPACITY,
            action: ErrorAction::Replace,
        }
    }
}

/// A buffered text writer over a byte sink.
///
/// One coarse mutex guards the whole stream; every public operation holds
/// it for its full duration, sink calls included, so concurrent callers
/// serialize completely.
pub struct StreamWriter<S: ByteSink> {
    stream: Mutex<Strategy<S>>,
}

impl<S: ByteSink> StreamWriter<S> {
    /// A writer for `encoding` with the default buffer sizes and the
    /// replacing error disposition.
    pub fn new(out: S, encoding: Encoding) -> Self {
        let strategy = if encoding.is_fast() {
            Strategy::Fast(FastWriter {
                buf: Vec::with_capacity(INITIAL_BYTE_BUFFER_CAPACITY),
                max: MAX_BYTE_BUFFER_CAPACITY,
                out: Some(out),
            })
        } else {
            Strategy::Generic(GenericWriter {
                buf: TextBuf::with_capacity(INITIAL_BYTE_BUFFER_CAPACITY),
                max: MAX_BYTE_BUFFER_CAPACITY,
                engine: EncodingEngine::new(
                    out,
                    encoding.new_encoder(),
                    ErrorAction::Replace,
                ),
            })
        };
        Self {
            stream: Mutex::new(strategy),
        }
    }

    /// A writer for `encoding` with explicit options.
    ///
    /// The fast strategy is selected only for the designated fast encoding
    /// under the replacing disposition; a strict disposition always routes
    /// through the engine so coding errors can be reported.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidBufferSize`] if either size is zero.
    pub fn with_options(
        out: S,
        encoding: Encoding,
        options: WriterOptions,
    ) -> Result<Self, StreamError> {
        if options.initial_size == 0 || options.max_size == 0 {
            return Err(StreamError::InvalidBufferSize);
        }
        let initial = options.initial_size.min(options.max_size);
        let strategy = if encoding.is_fast() && options.action == ErrorAction::Replace {
            Strategy::Fast(FastWriter {
                buf: Vec::with_capacity(initial),
                max: options.max_size,
                out: Some(out),
            })
        } else {
            Strategy::Generic(GenericWriter {
                buf: TextBuf::with_capacity(initial),
                max: options.max_size,
                engine: EncodingEngine::with_capacity(
                    out,
                    encoding.new_encoder(),
                    options.action,
                    options.initial_size,
                    options.max_size,
                )?,
            })
        };
        Ok(Self {
            stream: Mutex::new(strategy),
        })
    }

    /// A writer driving a caller-supplied encoder through the generic
    /// strategy.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidBufferSize`] if either size is zero.
    pub fn with_encoder(
        out: S,
        encoder: Box<dyn CharEncoder + Send>,
        options: WriterOptions,
    ) -> Result<Self, StreamError> {
        if options.initial_size == 0 || options.max_size == 0 {
            return Err(StreamError::InvalidBufferSize);
        }
        Ok(Self {
            stream: Mutex::new(Strategy::Generic(GenericWriter {
                buf: TextBuf::with_capacity(
                    options.initial_size.min(options.max_size),
                ),
                max: options.max_size,
                engine: EncodingEngine::with_capacity(
                    out,
                    encoder,
                    options.action,
                    options.initial_size,
                    options.max_size,
                )?,
            })),
        })
    }

    /// Writes a single UTF-16 code unit.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after close, a coding error under the
    /// strict disposition, or a propagated sink error.
    pub fn write_unit(&self, unit: u16) -> Result<(), StreamError> {
        self.stream.lock().write_unit(unit)
    }

    /// Writes `len` code units of `units` starting at `offset`.
    ///
    /// # Errors
    ///
    /// [`StreamError::OutOfBounds`] (before any buffering side effect) if
    /// the range does not lie within `units`, plus the errors of
    /// [`write_unit`](Self::write_unit).
    pub fn write_units(
        &self,
        units: &[u16],
        offset: usize,
        len: usize,
    ) -> Result<(), StreamError> {
        let end = match offset.checked_add(len) {
            Some(end) if end <= units.len() => end,
            _ => {
                return Err(StreamError::OutOfBounds {
                    offset,
                    end: offset.saturating_add(len),
                    len: units.len(),
                });
            }
        };
        self.stream.lock().write_text(Text::Wide(&units[offset..end]))
    }

    /// Writes a string slice. ASCII input is forwarded without copying.
    ///
    /// # Errors
    ///
    /// The errors of [`write_unit`](Self::write_unit).
    pub fn write_str(&self, s: &str) -> Result<(), StreamError> {
        if s.is_ascii() {
            return self.stream.lock().write_text(Text::Narrow(s.as_bytes()));
        }
        let buf = TextBuf::from(s);
        self.stream.lock().write_text(buf.as_text())
    }

    /// Writes a density-tagged text value.
    ///
    /// # Errors
    ///
    /// The errors of [`write_unit`](Self::write_unit).
    pub fn write_text(&self, text: Text<'_>) -> Result<(), StreamError> {
        self.stream.lock().write_text(text)
    }

    /// Writes the platform line separator.
    ///
    /// # Errors
    ///
    /// The errors of [`write_unit`](Self::write_unit).
    pub fn new_line(&self) -> Result<(), StreamError> {
        self.stream.lock().write_text(Text::Narrow(LINE_SEPARATOR))
    }

    /// Drains buffered data toward the sink without flushing the sink
    /// itself.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after close, or a propagated sink error.
    pub fn flush_buffer(&self) -> Result<(), StreamError> {
        self.stream.lock().flush_buffer()
    }

    /// Drains buffered data and flushes the sink.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after close, or a propagated sink error.
    pub fn flush(&self) -> Result<(), StreamError> {
        self.stream.lock().flush()
    }

    /// Flushes everything and closes the sink exactly once. A second call
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// A coding error from draining trailing state, or a propagated sink
    /// error; the sink is closed even when draining fails.
    pub fn close(&self) -> Result<(), StreamError> {
        self.stream.lock().close()
    }
}

enum Strategy<S: ByteSink> {
    Fast(FastWriter<S>),
    Generic(GenericWriter<S>),
}

impl<S: ByteSink> Strategy<S> {
    fn write_unit(&mut self, unit: u16) -> Result<(), StreamError> {
        match self {
            Self::Fast(w) => w.write_text(Text::Wide(&[unit])),
            Self::Generic(w) => w.write_unit(unit),
        }
    }

    fn write_text(&mut self, text: Text<'_>) -> Result<(), StreamError> {
        match self {
            Self::Fast(w) => w.write_text(text),
            Self::Generic(w) => w.write_text(text),
        }
    }

    fn flush_buffer(&mut self) -> Result<(), StreamError> {
        match self {
            Self::Fast(w) => {
                w.ensure_open()?;
                w.write_pending()
            }
            Self::Generic(w) => {
                w.engine.ensure_open()?;
                w.flush_accumulated()?;
                w.engine.flush_buffer()
            }
        }
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        match self {
            Self::Fast(w) => w.flush(),
            Self::Generic(w) => {
                w.engine.ensure_open()?;
                w.flush_accumulated()?;
                w.engine.flush()
            }
        }
    }

    fn close(&mut self) -> Result<(), StreamError> {
        match self {
            Self::Fast(w) => w.close(),
            Self::Generic(w) => w.close(),
        }
    }
}

/// Direct single-byte encoding into a byte buffer, for the fast encoding
/// under the replacing disposition.
struct FastWriter<S: ByteSink> {
    buf: Vec<u8>,
    max: usize,
    out: Option<S>,
}

impl<S: ByteSink> FastWriter<S> {
    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.out.is_some() {
            Ok(())
        } else {
            Err(StreamError::Closed)
        }
    }

    fn write_text(&mut self, text: Text<'_>) -> Result<(), StreamError> {
        self.ensure_open()?;
        match text {
            Text::Narrow(bytes) => self.write_narrow(bytes),
            Text::Wide(units) => self.write_wide(units),
        }
    }

    fn write_narrow(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        if bytes.len() >= self.max {
            // Large writes bypass the buffer entirely.
            self.write_pending()?;
            if let Some(out) = self.out.as_mut() {
                out.write(bytes)?;
            }
            return Ok(());
        }
        if self.buf.len() + bytes.len() > self.max {
            self.write_pending()?;
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn write_wide(&mut self, units: &[u16]) -> Result<(), StreamError> {
        let mut i = 0;
        while i < units.len() {
            let unit = units[i];
            // One replacement per unmappable code point, so a valid
            // surrogate pair collapses to a single byte.
            let (byte, consumed) = if unit <= 0xFF {
                (unit as u8, 1)
            } else if is_high_surrogate(unit)
                && units.get(i + 1).copied().is_some_and(is_low_surrogate)
            {
                (b'?', 2)
            } else {
                (b'?', 1)
            };
            if self.buf.len() == self.max {
                self.write_pending()?;
            }
            self.buf.push(byte);
            i += consumed;
        }
        Ok(())
    }

    fn write_pending(&mut self) -> Result<(), StreamError> {
        if !self.buf.is_empty() {
            let out = self.out.as_mut().ok_or(StreamError::Closed)?;
            out.write(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.write_pending()?;
        if let Some(out) = self.out.as_mut() {
            out.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        if self.out.is_none() {
            return Ok(());
        }
        let drained = self.flush();
        let closed = match self.out.take() {
            Some(mut out) => out.close().map_err(StreamError::from),
            None => Ok(()),
        };
        self.buf.clear();
        drained.and(closed)
    }
}

/// Code-unit accumulation in front of an [`EncodingEngine`].
struct GenericWriter<S: ByteSink> {
    buf: TextBuf,
    max: usize,
    engine: EncodingEngine<S>,
}

impl<S: ByteSink> GenericWriter<S> {
    fn write_unit(&mut self, unit: u16) -> Result<(), StreamError> {
        self.engine.ensure_open()?;
        if self.buf.len() + 1 > self.max {
            self.flush_accumulated()?;
        }
        self.buf.push(unit);
        Ok(())
    }

    fn write_text(&mut self, text: Text<'_>) -> Result<(), StreamError> {
        self.engine.ensure_open()?;
        if text.len() >= self.max {
            // Never fragment a large write through the small buffer.
            self.flush_accumulated()?;
            return self.engine.write(text);
        }
        if self.buf.len() + text.len() > self.max {
            self.flush_accumulated()?;
        }
        self.buf.push_text(text);
        Ok(())
    }

    fn flush_accumulated(&mut self) -> Result<(), StreamError> {
        if !self.buf.is_empty() {
            self.engine.write(self.buf.as_text())?;
            self.buf.clear();
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        if !self.engine.is_open() {
            return Ok(());
        }
        let flushed = self.flush_accumulated();
        let closed = self.engine.close();
        self.buf.clear();
        flushed.and(closed)
    }
}
