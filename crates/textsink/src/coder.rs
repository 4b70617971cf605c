//! The pluggable encoding-function contract driven by the engine.

use crate::{bytes::ByteBuffer, text::Text};

/// Outcome of one call into a pluggable encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoderResult {
    /// All consumable input was encoded; the caller may supply more.
    Underflow,
    /// The output buffer is full; drain it and retry the remaining input.
    Overflow,
    /// The next `n` units are not well-formed text (an unpaired surrogate).
    Malformed(usize),
    /// The next `n` units form a code point this encoding cannot express.
    Unmappable(usize),
}

/// Disposition applied to malformed or unmappable input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorAction {
    /// Substitute the encoder's replacement bytes and continue.
    #[default]
    Replace,
    /// Fail the call with a coding error.
    Report,
}

/// A pluggable, stateful encoding function.
///
/// Implementations must not consume units they cannot encode: on
/// [`CoderResult::Malformed`] or [`CoderResult::Unmappable`] the cursor is
/// left at the offending unit and the result carries its length, so the
/// engine can substitute or report. Pairing a surrogate split across two
/// calls is the engine's job, signalled by returning
/// [`CoderResult::Underflow`] with exactly one unpaired high surrogate
/// remaining when `end_of_input` is false.
pub trait CharEncoder {
    /// Encodes units from `src` into `dst` until one side runs out.
    fn encode(
        &mut self,
        src: &mut UnitCursor<'_>,
        dst: &mut ByteBuffer,
        end_of_input: bool,
    ) -> CoderResult;

    /// Drains any trailing encoder state at end of stream.
    fn flush(&mut self, dst: &mut ByteBuffer) -> CoderResult {
        let _ = dst;
        CoderResult::Underflow
    }

    /// Worst-case output bytes for one input unit; used for buffer sizing.
    fn max_bytes_per_unit(&self) -> f32;

    /// The byte sequence substituted for malformed/unmappable input.
    fn replacement(&self) -> &[u8];

    /// Returns the encoder to its initial state.
    fn reset(&mut self) {}
}

/// A position-tracking reader over a density-tagged text value.
#[derive(Debug, Clone, Copy)]
pub struct UnitCursor<'a> {
    text: Text<'a>,
    position: usize,
}

impl<'a> UnitCursor<'a> {
    /// A cursor at the start of `text`.
    #[must_use]
    pub fn new(text: Text<'a>) -> Self {
        Self { text, position: 0 }
    }

    /// Units left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.text.len() - self.position
    }

    /// Returns `true` if any units are left.
    #[must_use]
    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    /// The next unit, without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u16> {
        self.peek_at(0)
    }

    /// The unit `ahead` positions past the cursor, without consuming.
    #[must_use]
    pub fn peek_at(&self, ahead: usize) -> Option<u16> {
        let index = self.position + ahead;
        (index < self.text.len()).then(|| self.text.unit(index))
    }

    /// Consumes `n` units.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.position += n;
    }

    /// Consumes and returns the next unit.
    pub fn next(&mut self) -> Option<u16> {
        let unit = self.peek()?;
        self.position += 1;
        Some(unit)
    }
}

/// True for the leading half of a surrogate pair.
#[must_use]
pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..0xDC00).contains(&unit)
}

/// True for the trailing half of a surrogate pair.
#[must_use]
pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..0xE000).contains(&unit)
}

/// True for either surrogate half.
#[must_use]
pub(crate) fn is_surrogate(unit: u16) -> bool {
    (0xD800..0xE000).contains(&unit)
}

/// The code point encoded by a surrogate pair.
#[must_use]
pub(crate) fn combine_surrogates(high: u16, low: u16) -> u32 {
    0x1_0000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
}
