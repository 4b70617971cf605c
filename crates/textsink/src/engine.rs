//! The charset encoding engine: drives a pluggable encoder against a
//! growable byte buffer and a sink, carrying surrogate state across calls.

use alloc::boxed::Box;

use crate::{
    bytes::ByteBuffer,
    coder::{CharEncoder, CoderResult, ErrorAction, UnitCursor},
    error::StreamError,
    sink::ByteSink,
    text::Text,
};

pub(crate) const INITIAL_BYTE_BUFFER_CAPACITY: usize = 512;
pub(crate) const MAX_BYTE_BUFFER_CAPACITY: usize = 8192;

/// The widest single encoding step (a marker or a full surrogate pair).
/// The byte buffer never shrinks below this, so every Overflow leaves at
/// least one step's worth of bytes to flush and the loop always advances.
const MIN_BYTE_BUFFER_CAPACITY: usize = 4;

/// Drives a [`CharEncoder`] through the overflow/underflow protocol.
///
/// The engine owns the byte buffer and the sink. At most one pending high
/// surrogate is carried between `write` calls so a pair split across two
/// inputs still encodes as one code point. `close` drains everything and
/// releases the sink exactly once.
pub struct EncodingEngine<S: ByteSink> {
    encoder: Box<dyn CharEncoder + Send>,
    bb: ByteBuffer,
    max_capacity: usize,
    out: Option<S>,
    leftover: Option<u16>,
    action: ErrorAction,
}

impl<S: ByteSink> EncodingEngine<S> {
    /// An engine with the default buffer sizes.
    pub fn new(out: S, encoder: Box<dyn CharEncoder + Send>, action: ErrorAction) -> Self {
        Self {
            encoder,
            bb: ByteBuffer::with_capacity(INITIAL_BYTE_BUFFER_CAPACITY),
            max_capacity: MAX_BYTE_BUFFER_CAPACITY,
            out: Some(out),
            leftover: None,
            action,
        }
    }

    /// An engine whose byte buffer starts at `initial_size` bytes and may
    /// grow to `max_size`.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidBufferSize`] if either size is zero.
    pub fn with_capacity(
        out: S,
        encoder: Box<dyn CharEncoder + Send>,
        action: ErrorAction,
        initial_size: usize,
        max_size: usize,
    ) -> Result<Self, StreamError> {
        if initial_size == 0 || max_size == 0 {
            return Err(StreamError::InvalidBufferSize);
        }
        Ok(Self {
            encoder,
            bb: ByteBuffer::with_capacity(
                initial_size.min(max_size).max(MIN_BYTE_BUFFER_CAPACITY),
            ),
            max_capacity: max_size,
            out: Some(out),
            leftover: None,
            action,
        })
    }

    pub(crate) fn is_open(&self) -> bool {
        self.out.is_some()
    }

    pub(crate) fn ensure_open(&self) -> Result<(), StreamError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StreamError::Closed)
        }
    }

    /// Encodes `text` into the byte buffer, spilling to the sink whenever
    /// the buffer fills.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after close, a coding error under the
    /// strict disposition, or a propagated sink error.
    pub fn write(&mut self, text: Text<'_>) -> Result<(), StreamError> {
        self.ensure_open()?;
        let mut src = UnitCursor::new(text);

        if self.leftover.is_some() {
            self.flush_leftover(Some(&mut src), false)?;
        }

        self.grow_byte_buffer_if_needed(src.remaining())?;
        self.encode_loop(&mut src)
    }

    fn encode_loop(&mut self, src: &mut UnitCursor<'_>) -> Result<(), StreamError> {
        while src.has_remaining() {
            match self.encoder.encode(src, &mut self.bb, false) {
                CoderResult::Underflow => {
                    debug_assert!(src.remaining() <= 1);
                    if src.remaining() == 1 {
                        // An unpaired high surrogate; hold it for the
                        // next call.
                        self.leftover = src.next();
                    }
                    break;
                }
                CoderResult::Overflow => {
                    debug_assert!(self.bb.position() > 0);
                    self.write_bytes()?;
                }
                CoderResult::Malformed(n) => self.malformed(src, n)?,
                CoderResult::Unmappable(n) => self.unmappable(src, n)?,
            }
        }
        Ok(())
    }

    fn malformed(&mut self, src: &mut UnitCursor<'_>, n: usize) -> Result<(), StreamError> {
        match self.action {
            ErrorAction::Report => Err(StreamError::MalformedInput(n)),
            ErrorAction::Replace => self.substitute(src, n),
        }
    }

    fn unmappable(&mut self, src: &mut UnitCursor<'_>, n: usize) -> Result<(), StreamError> {
        match self.action {
            ErrorAction::Report => Err(StreamError::UnmappableCharacter(n)),
            ErrorAction::Replace => self.substitute(src, n),
        }
    }

    /// Skips `n` offending units and emits the encoder's replacement.
    fn substitute(&mut self, src: &mut UnitCursor<'_>, n: usize) -> Result<(), StreamError> {
        let rep_len = self.encoder.replacement().len();
        if self.bb.remaining() < rep_len {
            self.write_bytes()?;
            self.bb.grow_to(rep_len);
        }
        let rep = self.encoder.replacement();
        self.bb.put_slice(rep);
        src.advance(n);
        Ok(())
    }

    /// Pairs a held high surrogate with the head of `src` (if any) and
    /// encodes the result; with `end_of_input` set, forces the leftover
    /// out through the error disposition.
    fn flush_leftover(
        &mut self,
        mut src: Option<&mut UnitCursor<'_>>,
        end_of_input: bool,
    ) -> Result<(), StreamError> {
        if self.leftover.is_none() && !end_of_input {
            return Ok(());
        }

        loop {
            let mut units = [0u16; 2];
            let mut len = 0;
            if let Some(unit) = self.leftover.take() {
                units[len] = unit;
                len += 1;
            }
            if let Some(unit) = src.as_deref_mut().and_then(UnitCursor::next) {
                units[len] = unit;
                len += 1;
            }
            if len == 0 && !end_of_input {
                return Ok(());
            }

            let mut lcb = UnitCursor::new(Text::Wide(&units[..len]));
            while lcb.has_remaining() || end_of_input {
                match self.encoder.encode(&mut lcb, &mut self.bb, end_of_input) {
                    CoderResult::Underflow => {
                        if lcb.has_remaining() {
                            // Still an unpaired high surrogate.
                            self.leftover = lcb.next();
                            if src.as_deref_mut().is_some_and(|src| src.has_remaining()) {
                                // More input to pair it with; go again.
                                break;
                            }
                            return Ok(());
                        }
                        self.leftover = None;
                        return Ok(());
                    }
                    CoderResult::Overflow => {
                        debug_assert!(self.bb.position() > 0);
                        self.write_bytes()?;
                    }
                    CoderResult::Malformed(n) => self.malformed(&mut lcb, n)?,
                    CoderResult::Unmappable(n) => self.unmappable(&mut lcb, n)?,
                }
            }
            if self.leftover.is_none() {
                return Ok(());
            }
        }
    }

    /// Grows the byte buffer so `len` units can encode without an
    /// intermediate overflow, capped at the configured maximum.
    fn grow_byte_buffer_if_needed(&mut self, len: usize) -> Result<(), StreamError> {
        let cap = self.bb.capacity();
        if cap < self.max_capacity {
            // Round the per-unit worst case to the nearest whole byte.
            let per_unit = (self.encoder.max_bytes_per_unit() + 0.5) as usize;
            let max_bytes = len.saturating_mul(per_unit);
            let new_cap = max_bytes.min(self.max_capacity);
            if new_cap > cap {
                self.flush_buffer()?;
                self.bb.grow_to(new_cap);
            }
        }
        Ok(())
    }

    fn write_bytes(&mut self) -> Result<(), StreamError> {
        if self.bb.position() > 0 {
            let out = self.out.as_mut().ok_or(StreamError::Closed)?;
            out.write(self.bb.pending())?;
            self.bb.clear();
        }
        Ok(())
    }

    /// Writes pending buffer bytes to the sink without flushing the sink.
    ///
    /// # Errors
    ///
    /// A propagated sink error.
    pub fn flush_buffer(&mut self) -> Result<(), StreamError> {
        self.write_bytes()
    }

    /// Writes pending bytes and flushes the sink.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] after close, or a propagated sink error.
    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.write_bytes()?;
        if let Some(out) = self.out.as_mut() {
            out.flush()?;
        }
        Ok(())
    }

    /// Drains leftover and trailing encoder state, flushes, then closes
    /// the sink. A second call is a no-op.
    ///
    /// The sink reference is cleared and the sink closed exactly once on
    /// every path; on error the encoder state is reset before the error
    /// propagates, so the stream is left defined (though unusable).
    ///
    /// # Errors
    ///
    /// A coding error from draining, or a propagated sink error.
    pub fn close(&mut self) -> Result<(), StreamError> {
        if self.out.is_none() {
            return Ok(());
        }

        let drained = self.drain();
        let close_result = match self.out.take() {
            Some(mut out) => out.close().map_err(StreamError::from),
            None => Ok(()),
        };

        let result = drained.and(close_result);
        if result.is_err() {
            self.encoder.reset();
            self.leftover = None;
            self.bb.clear();
        }
        result
    }

    fn drain(&mut self) -> Result<(), StreamError> {
        self.flush_leftover(None, true)?;

        loop {
            match self.encoder.flush(&mut self.bb) {
                CoderResult::Underflow => break,
                CoderResult::Overflow => {
                    debug_assert!(self.bb.position() > 0);
                    self.write_bytes()?;
                }
                CoderResult::Malformed(n) => return Err(StreamError::MalformedInput(n)),
                CoderResult::Unmappable(n) => {
                    return Err(StreamError::UnmappableCharacter(n));
                }
            }
        }

        self.write_bytes()?;
        if let Some(out) = self.out.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::EncodingEngine;
    use crate::{
        coder::ErrorAction,
        encodings::Encoding,
        error::{SinkError, StreamError},
        sink::ByteSink,
        text::Text,
    };

    fn utf16be_engine(
        out: &mut Vec<u8>,
        initial: usize,
        max: usize,
    ) -> EncodingEngine<&mut Vec<u8>> {
        EncodingEngine::with_capacity(
            out,
            Encoding::Utf16Be.new_encoder(),
            ErrorAction::Replace,
            initial,
            max,
        )
        .unwrap()
    }

    #[test]
    fn surrogate_pair_split_across_writes() {
        let mut out = Vec::new();
        let mut engine = utf16be_engine(&mut out, 512, 8192);
        // 𝄞 = D834 DD1E, split between two writes
        engine.write(Text::Wide(&[0x0041, 0xD834])).unwrap();
        engine.write(Text::Wide(&[0xDD1E, 0x0042])).unwrap();
        engine.close().unwrap();
        drop(engine);
        assert_eq!(out, [0x00, 0x41, 0xD8, 0x34, 0xDD, 0x1E, 0x00, 0x42]);
    }

    #[test]
    fn lone_high_surrogate_substituted_at_close() {
        let mut out = Vec::new();
        let mut engine = utf16be_engine(&mut out, 512, 8192);
        engine.write(Text::Wide(&[0xD834])).unwrap();
        engine.close().unwrap();
        drop(engine);
        assert_eq!(out, [0xFF, 0xFD]);
    }

    #[test]
    fn lone_high_surrogate_reported_under_strict() {
        let mut out = Vec::new();
        let mut engine = EncodingEngine::with_capacity(
            &mut out,
            Encoding::Utf16Be.new_encoder(),
            ErrorAction::Report,
            512,
            8192,
        )
        .unwrap();
        engine.write(Text::Wide(&[0xD834])).unwrap();
        assert_eq!(engine.close(), Err(StreamError::MalformedInput(1)));
        // sink is gone; further calls see a closed stream
        assert_eq!(engine.close(), Ok(()));
        assert_eq!(engine.write(Text::Narrow(b"x")), Err(StreamError::Closed));
    }

    #[test]
    fn tiny_buffer_forces_overflow_cycles() {
        let mut out = Vec::new();
        let mut engine = utf16be_engine(&mut out, 1, 2);
        engine.write(Text::Narrow(b"abc")).unwrap();
        engine.close().unwrap();
        drop(engine);
        assert_eq!(out, [0x00, b'a', 0x00, b'b', 0x00, b'c']);
    }

    #[test]
    fn high_then_non_low_substitutes_one_unit() {
        let mut out = Vec::new();
        let mut engine = utf16be_engine(&mut out, 512, 8192);
        engine.write(Text::Wide(&[0xD834])).unwrap();
        engine.write(Text::Wide(&[0x0041])).unwrap();
        engine.close().unwrap();
        drop(engine);
        assert_eq!(out, [0xFF, 0xFD, 0x00, 0x41]);
    }

    #[test]
    fn sink_close_failure_still_resets_the_stream() {
        struct FailOnClose {
            closes: usize,
        }

        impl ByteSink for FailOnClose {
            fn write(&mut self, _bytes: &[u8]) -> Result<(), SinkError> {
                Ok(())
            }

            fn flush(&mut self) -> Result<(), SinkError> {
                Ok(())
            }

            fn close(&mut self) -> Result<(), SinkError> {
                self.closes += 1;
                Err(SinkError::new("close refused"))
            }
        }

        let mut sink = FailOnClose { closes: 0 };
        {
            let mut engine = EncodingEngine::new(
                &mut sink,
                Encoding::Utf16.new_encoder(),
                ErrorAction::Replace,
            );
            engine.write(Text::Wide(&[0x41, 0xD834])).unwrap();
            let result = engine.close();
            assert!(matches!(result, Err(StreamError::Sink(_))), "{result:?}");
            // encoder state is reset before the error surfaces
            assert!(engine.leftover.is_none());
            assert_eq!(engine.bb.position(), 0);
            assert!(!engine.is_open());
            assert_eq!(engine.close(), Ok(()));
        }
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn zero_buffer_size_rejected() {
        let result = EncodingEngine::with_capacity(
            Vec::<u8>::new(),
            Encoding::Utf8.new_encoder(),
            ErrorAction::Replace,
            0,
            8192,
        );
        assert!(matches!(result, Err(StreamError::InvalidBufferSize)));
    }
}
