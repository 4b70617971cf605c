//! The built-in pluggable encoders and the [`Encoding`] selector.

use alloc::boxed::Box;

use crate::{
    bytes::ByteBuffer,
    coder::{
        CharEncoder, CoderResult, UnitCursor, combine_surrogates, is_high_surrogate,
        is_low_surrogate, is_surrogate,
    },
};

/// Endianness of a two-byte code unit on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

/// The closed set of encodings the pipeline ships with.
///
/// `Utf16` writes big-endian with a leading byte-order marker; the
/// `Utf16Be`/`Utf16Le` variants fix the order and write no marker.
/// `Latin1` is the designated fast encoding: the front-end handles it
/// without an intermediate text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// One byte per code point, `U+0000..=U+00FF`.
    Latin1,
    /// UTF-8.
    Utf8,
    /// UTF-16, big-endian, with a byte-order marker.
    Utf16,
    /// UTF-16 big-endian, no marker.
    Utf16Be,
    /// UTF-16 little-endian, no marker.
    Utf16Le,
}

impl Encoding {
    /// Builds a fresh encoder for this encoding.
    #[must_use]
    pub fn new_encoder(self) -> Box<dyn CharEncoder + Send> {
        match self {
            Encoding::Latin1 => Box::new(Latin1Encoder),
            Encoding::Utf8 => Box::new(Utf8Encoder),
            Encoding::Utf16 => Box::new(Utf16Encoder::new(ByteOrder::Big, true)),
            Encoding::Utf16Be => Box::new(Utf16Encoder::new(ByteOrder::Big, false)),
            Encoding::Utf16Le => Box::new(Utf16Encoder::new(ByteOrder::Little, false)),
        }
    }

    /// True for the encoding the front-end fast path is specialized for.
    #[must_use]
    pub(crate) fn is_fast(self) -> bool {
        matches!(self, Encoding::Latin1)
    }
}

/// Classifies a unit that is not directly encodable in a single-unit
/// encoding, looking one unit ahead for a surrogate pair.
fn surrogate_result(
    unit: u16,
    src: &UnitCursor<'_>,
    end_of_input: bool,
    pair_len: usize,
) -> CoderResult {
    if is_high_surrogate(unit) {
        match src.peek_at(1) {
            Some(low) if is_low_surrogate(low) => CoderResult::Unmappable(pair_len),
            Some(_) => CoderResult::Malformed(1),
            None if end_of_input => CoderResult::Malformed(1),
            None => CoderResult::Underflow,
        }
    } else {
        // A low surrogate with no leading half.
        CoderResult::Malformed(1)
    }
}

/// The fixed single-byte-per-code-point encoder.
#[derive(Debug, Default)]
pub struct Latin1Encoder;

impl CharEncoder for Latin1Encoder {
    fn encode(
        &mut self,
        src: &mut UnitCursor<'_>,
        dst: &mut ByteBuffer,
        end_of_input: bool,
    ) -> CoderResult {
        while let Some(unit) = src.peek() {
            if let Ok(byte) = u8::try_from(unit) {
                if dst.remaining() < 1 {
                    return CoderResult::Overflow;
                }
                dst.put(byte);
                src.advance(1);
            } else if is_surrogate(unit) {
                return surrogate_result(unit, src, end_of_input, 2);
            } else {
                return CoderResult::Unmappable(1);
            }
        }
        CoderResult::Underflow
    }

    fn max_bytes_per_unit(&self) -> f32 {
        1.0
    }

    fn replacement(&self) -> &[u8] {
        b"?"
    }
}

/// The UTF-8 encoder. Surrogate pairs become one four-byte sequence.
#[derive(Debug, Default)]
pub struct Utf8Encoder;

impl CharEncoder for Utf8Encoder {
    fn encode(
        &mut self,
        src: &mut UnitCursor<'_>,
        dst: &mut ByteBuffer,
        end_of_input: bool,
    ) -> CoderResult {
        while let Some(unit) = src.peek() {
            if unit < 0x80 {
                if dst.remaining() < 1 {
                    return CoderResult::Overflow;
                }
                dst.put(unit as u8);
                src.advance(1);
            } else if unit < 0x800 {
                if dst.remaining() < 2 {
                    return CoderResult::Overflow;
                }
                dst.put(0xC0 | (unit >> 6) as u8);
                dst.put(0x80 | (unit & 0x3F) as u8);
                src.advance(1);
            } else if is_surrogate(unit) {
                if is_high_surrogate(unit) {
                    let Some(low) = src.peek_at(1) else {
                        return if end_of_input {
                            CoderResult::Malformed(1)
                        } else {
                            CoderResult::Underflow
                        };
                    };
                    if !is_low_surrogate(low) {
                        return CoderResult::Malformed(1);
                    }
                    if dst.remaining() < 4 {
                        return CoderResult::Overflow;
                    }
                    let cp = combine_surrogates(unit, low);
                    dst.put(0xF0 | (cp >> 18) as u8);
                    dst.put(0x80 | ((cp >> 12) & 0x3F) as u8);
                    dst.put(0x80 | ((cp >> 6) & 0x3F) as u8);
                    dst.put(0x80 | (cp & 0x3F) as u8);
                    src.advance(2);
                } else {
                    return CoderResult::Malformed(1);
                }
            } else {
                if dst.remaining() < 3 {
                    return CoderResult::Overflow;
                }
                dst.put(0xE0 | (unit >> 12) as u8);
                dst.put(0x80 | ((unit >> 6) & 0x3F) as u8);
                dst.put(0x80 | (unit & 0x3F) as u8);
                src.advance(1);
            }
        }
        CoderResult::Underflow
    }

    fn max_bytes_per_unit(&self) -> f32 {
        3.0
    }

    fn replacement(&self) -> &[u8] {
        b"?"
    }
}

const BYTE_ORDER_MARK: u16 = 0xFEFF;

/// Fixed-width-16 encoder: two bytes per code unit in the configured
/// order, with an optional one-shot leading marker.
///
/// Surrogate pairs pass through as two consecutive two-byte units; the
/// engine's leftover mechanism handles pairs split across calls.
#[derive(Debug)]
pub struct Utf16Encoder {
    byte_order: ByteOrder,
    uses_mark: bool,
    needs_mark: bool,
}

impl Utf16Encoder {
    /// An encoder for `byte_order`, emitting a marker first if `mark`.
    #[must_use]
    pub fn new(byte_order: ByteOrder, mark: bool) -> Self {
        Self {
            byte_order,
            uses_mark: mark,
            needs_mark: mark,
        }
    }

    fn put(&self, unit: u16, dst: &mut ByteBuffer) {
        let [hi, lo] = unit.to_be_bytes();
        match self.byte_order {
            ByteOrder::Big => {
                dst.put(hi);
                dst.put(lo);
            }
            ByteOrder::Little => {
                dst.put(lo);
                dst.put(hi);
            }
        }
    }
}

impl CharEncoder for Utf16Encoder {
    fn encode(
        &mut self,
        src: &mut UnitCursor<'_>,
        dst: &mut ByteBuffer,
        end_of_input: bool,
    ) -> CoderResult {
        // The marker goes out once, and only ahead of actual content.
        if self.needs_mark && src.has_remaining() {
            if dst.remaining() < 2 {
                return CoderResult::Overflow;
            }
            self.put(BYTE_ORDER_MARK, dst);
            self.needs_mark = false;
        }

        while let Some(unit) = src.peek() {
            if !is_surrogate(unit) {
                if dst.remaining() < 2 {
                    return CoderResult::Overflow;
                }
                self.put(unit, dst);
                src.advance(1);
            } else if is_high_surrogate(unit) {
                match src.peek_at(1) {
                    Some(low) if is_low_surrogate(low) => {
                        if dst.remaining() < 4 {
                            return CoderResult::Overflow;
                        }
                        self.put(unit, dst);
                        self.put(low, dst);
                        src.advance(2);
                    }
                    Some(_) => return CoderResult::Malformed(1),
                    None if end_of_input => return CoderResult::Malformed(1),
                    None => return CoderResult::Underflow,
                }
            } else {
                return CoderResult::Malformed(1);
            }
        }
        CoderResult::Underflow
    }

    fn max_bytes_per_unit(&self) -> f32 {
        if self.uses_mark { 4.0 } else { 2.0 }
    }

    fn replacement(&self) -> &[u8] {
        match self.byte_order {
            ByteOrder::Big => &[0xFF, 0xFD],
            ByteOrder::Little => &[0xFD, 0xFF],
        }
    }

    fn reset(&mut self) {
        self.needs_mark = self.uses_mark;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::{ByteOrder, Latin1Encoder, Utf8Encoder, Utf16Encoder};
    use crate::{
        bytes::ByteBuffer,
        coder::{CharEncoder, CoderResult, UnitCursor},
        text::Text,
    };

    fn encode_all(enc: &mut dyn CharEncoder, units: &[u16], cap: usize) -> (CoderResult, Vec<u8>) {
        let mut dst = ByteBuffer::with_capacity(cap);
        let mut src = UnitCursor::new(Text::Wide(units));
        let result = enc.encode(&mut src, &mut dst, true);
        (result, dst.pending().to_vec())
    }

    #[test]
    fn latin1_encodes_narrow_units() {
        let (result, bytes) = encode_all(&mut Latin1Encoder, &[0x61, 0xE9], 8);
        assert_eq!(result, CoderResult::Underflow);
        assert_eq!(bytes, [0x61, 0xE9]);
    }

    #[test]
    fn latin1_rejects_wide_units() {
        let (result, _) = encode_all(&mut Latin1Encoder, &[0x4E2D], 8);
        assert_eq!(result, CoderResult::Unmappable(1));
        // A full pair is one unmappable code point of two units.
        let (result, _) = encode_all(&mut Latin1Encoder, &[0xD834, 0xDD1E], 8);
        assert_eq!(result, CoderResult::Unmappable(2));
    }

    #[test]
    fn utf8_encodes_all_widths() {
        let units: Vec<u16> = "a\u{E9}\u{4E2D}\u{1D11E}".encode_utf16().collect();
        let (result, bytes) = encode_all(&mut Utf8Encoder, &units, 16);
        assert_eq!(result, CoderResult::Underflow);
        assert_eq!(bytes, "a\u{E9}\u{4E2D}\u{1D11E}".as_bytes());
    }

    #[test]
    fn utf8_defers_trailing_high_surrogate() {
        let mut enc = Utf8Encoder;
        let mut dst = ByteBuffer::with_capacity(8);
        let mut src = UnitCursor::new(Text::Wide(&[0xD834]));
        assert_eq!(enc.encode(&mut src, &mut dst, false), CoderResult::Underflow);
        assert_eq!(src.remaining(), 1);
        assert_eq!(enc.encode(&mut src, &mut dst, true), CoderResult::Malformed(1));
    }

    #[test]
    fn utf16_byte_orders() {
        let (_, be) = encode_all(&mut Utf16Encoder::new(ByteOrder::Big, false), &[0x4E2D], 8);
        assert_eq!(be, [0x4E, 0x2D]);
        let (_, le) = encode_all(&mut Utf16Encoder::new(ByteOrder::Little, false), &[0x4E2D], 8);
        assert_eq!(le, [0x2D, 0x4E]);
    }

    #[test]
    fn utf16_marker_emitted_once() {
        let mut enc = Utf16Encoder::new(ByteOrder::Big, true);
        let (_, first) = {
            let mut dst = ByteBuffer::with_capacity(8);
            let mut src = UnitCursor::new(Text::Wide(&[0x41]));
            let r = enc.encode(&mut src, &mut dst, false);
            (r, dst.pending().to_vec())
        };
        assert_eq!(first, [0xFE, 0xFF, 0x00, 0x41]);
        let mut dst = ByteBuffer::with_capacity(8);
        let mut src = UnitCursor::new(Text::Wide(&[0x42]));
        enc.encode(&mut src, &mut dst, true);
        assert_eq!(dst.pending(), [0x00, 0x42]);
    }

    #[test]
    fn utf16_marker_not_emitted_for_empty_input() {
        let mut enc = Utf16Encoder::new(ByteOrder::Big, true);
        let (result, bytes) = {
            let mut dst = ByteBuffer::with_capacity(8);
            let mut src = UnitCursor::new(Text::Wide(&[]));
            (enc.encode(&mut src, &mut dst, true), dst.pending().to_vec())
        };
        assert_eq!(result, CoderResult::Underflow);
        assert!(bytes.is_empty());
    }

    #[test]
    fn utf16_overflow_reports_without_consuming() {
        let mut enc = Utf16Encoder::new(ByteOrder::Big, false);
        let mut dst = ByteBuffer::with_capacity(2);
        let mut src = UnitCursor::new(Text::Wide(&[0x41, 0x42]));
        assert_eq!(enc.encode(&mut src, &mut dst, false), CoderResult::Overflow);
        assert_eq!(dst.pending(), [0x00, 0x41]);
        assert_eq!(src.remaining(), 1);
    }
}
