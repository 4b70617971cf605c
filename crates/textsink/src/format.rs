//! Two-phase concatenation items built on the digit encoders.
//!
//! Building a formatted string takes exactly two passes over the operand
//! list: `mix` left to right to negotiate the total length and the result
//! density, then `prepend` right to left, each operand writing its units
//! immediately before the previously written region. The output buffer is
//! sized exactly once from the mix pass and nothing is ever shuffled; a
//! correct item writes exactly the units it mixed.

use alloc::boxed::Box;
use alloc::{vec, vec::Vec};

use crate::{
    digits::{
        decimal_size, encode_decimal, encode_hex, encode_octal, hex_size, octal_size,
    },
    text::{Density, Text, TextBuf},
};

const TRUE_LITERAL: &[u8] = b"true";
const FALSE_LITERAL: &[u8] = b"false";
const NULL_LITERAL: &[u8] = b"null";

/// Running length and density accumulated by the mix pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixState {
    /// Total length so far, in code units.
    pub len: usize,
    /// Density the result needs so far.
    pub density: Density,
}

impl MixState {
    /// An empty, narrow state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            len: 0,
            density: Density::Narrow,
        }
    }
}

impl Default for MixState {
    fn default() -> Self {
        Self::new()
    }
}

/// The output buffer of a prepend pass: unit-addressed, fixed length,
/// collapsed to the mixed density when finished.
#[derive(Debug)]
pub struct FormatBuf {
    units: Vec<u16>,
    density: Density,
}

impl FormatBuf {
    /// A zero-filled buffer sized and tiered from a finished mix pass.
    #[must_use]
    pub fn from_mixed(state: MixState) -> Self {
        Self {
            units: vec![0; state.len],
            density: state.density,
        }
    }

    fn set(&mut self, index: usize, unit: u16) {
        debug_assert!(self.density == Density::Wide || unit <= 0xFF);
        self.units[index] = unit;
    }

    /// The finished text, packed down to one byte per unit when the mix
    /// pass settled on narrow.
    #[must_use]
    pub fn into_text_buf(self) -> TextBuf {
        match self.density {
            Density::Narrow => {
                TextBuf::Narrow(self.units.iter().map(|&u| u as u8).collect())
            }
            Density::Wide => TextBuf::Wide(self.units),
        }
    }
}

/// Localized glyphs for decimal formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecimalSymbols {
    /// Separator inserted between digit groups.
    pub grouping_separator: u16,
    /// Glyph for the digit zero; the other nine digits follow it.
    pub zero_digit: u16,
    /// Glyph prefixed to negative values.
    pub minus_sign: u16,
}

impl Default for DecimalSymbols {
    fn default() -> Self {
        Self {
            grouping_separator: u16::from(b','),
            zero_digit: u16::from(b'0'),
            minus_sign: u16::from(b'-'),
        }
    }
}

/// A single-use operand of a two-pass concatenation.
///
/// Lifecycle: construct, `mix` once, `prepend` once, discard.
#[derive(Debug)]
pub enum FormatItem<'a> {
    /// A decimal integer with optional grouping, localized digits, sign
    /// or parenthesized negatives, and zero padding.
    Decimal(DecimalItem),
    /// A hexadecimal integer with optional `0x` prefix and zero padding.
    Hex(RadixItem),
    /// An octal integer with optional `0` prefix and zero padding.
    Octal(RadixItem),
    /// The literal `true` or `false`.
    Boolean(bool),
    /// The literal `null`.
    Null,
    /// One code unit.
    Char(u16),
    /// A borrowed text value, copied through.
    Text(Text<'a>),
    /// An owned text value, copied through.
    Owned(TextBuf),
    /// Another item padded with spaces on the left up to a field width.
    FillLeft {
        /// Minimum field width in units.
        width: usize,
        /// The wrapped item.
        item: Box<FormatItem<'a>>,
    },
    /// Another item padded with spaces on the right up to a field width.
    FillRight {
        /// Minimum field width in units.
        width: usize,
        /// The wrapped item.
        item: Box<FormatItem<'a>>,
    },
}

/// Precomputed state of a decimal item.
#[derive(Debug)]
pub struct DecimalItem {
    symbols: DecimalSymbols,
    /// Digit count, sign excluded.
    length: usize,
    negative: bool,
    width: usize,
    prefix_sign: Option<u16>,
    group_size: usize,
    value: i64,
    parentheses: bool,
}

impl DecimalItem {
    fn sign_length(&self) -> usize {
        usize::from(self.prefix_sign.is_some()) + if self.parentheses { 2 } else { 0 }
    }

    fn group_length(&self) -> usize {
        if self.group_size > 0 {
            (self.length - 1) / self.group_size
        } else {
            0
        }
    }

    fn base_length(&self) -> usize {
        self.length + self.sign_length() + self.group_length()
    }

    fn requires_wide(&self) -> bool {
        u32::from(self.symbols.zero_digit) + 9 > 0xFF
            || (self.group_size > 0 && self.symbols.grouping_separator > 0xFF)
            || self.prefix_sign.is_some_and(|sign| sign > 0xFF)
    }
}

/// Precomputed state of a hex or octal item.
#[derive(Debug)]
pub struct RadixItem {
    width: usize,
    has_prefix: bool,
    value: u64,
    /// Digit count without prefix or padding.
    length: usize,
}

impl RadixItem {
    fn zeroes_length(&self, prefix_len: usize) -> usize {
        self.width.saturating_sub(self.length + prefix_len)
    }
}

impl<'a> FormatItem<'a> {
    /// A decimal item. `sign` is an explicit glyph for non-negative values
    /// (`+` or space); negative values take the symbols' minus sign, or
    /// parentheses when `parentheses` is set. `group_size` of zero disables
    /// grouping. `width` zero-pads to a minimum unit count.
    #[must_use]
    pub fn decimal(
        symbols: DecimalSymbols,
        width: usize,
        sign: Option<u16>,
        parentheses: bool,
        group_size: usize,
        value: i64,
    ) -> Self {
        let negative = value < 0;
        let parentheses = parentheses && negative;
        let prefix_sign = if negative {
            if parentheses {
                None
            } else {
                Some(symbols.minus_sign)
            }
        } else {
            sign
        };
        FormatItem::Decimal(DecimalItem {
            symbols,
            length: decimal_size(value) - usize::from(negative),
            negative,
            width,
            prefix_sign,
            group_size,
            value,
            parentheses,
        })
    }

    /// A hexadecimal item; `has_prefix` always emits `0x`, value zero
    /// included.
    #[must_use]
    pub fn hex(width: usize, has_prefix: bool, value: u64) -> Self {
        FormatItem::Hex(RadixItem {
            width,
            has_prefix,
            value,
            length: hex_size(value),
        })
    }

    /// An octal item; `has_prefix` always emits a leading `0`, value zero
    /// included.
    #[must_use]
    pub fn octal(width: usize, has_prefix: bool, value: u64) -> Self {
        FormatItem::Octal(RadixItem {
            width,
            has_prefix,
            value,
            length: octal_size(value),
        })
    }

    /// An item padded on the left with spaces to `width` units.
    #[must_use]
    pub fn fill_left(width: usize, item: FormatItem<'a>) -> Self {
        FormatItem::FillLeft {
            width,
            item: Box::new(item),
        }
    }

    /// An item padded on the right with spaces to `width` units.
    #[must_use]
    pub fn fill_right(width: usize, item: FormatItem<'a>) -> Self {
        FormatItem::FillRight {
            width,
            item: Box::new(item),
        }
    }

    /// Accumulates this item's length and density requirement.
    #[must_use]
    pub fn mix(&self, state: MixState) -> MixState {
        let (len, density) = self.measure();
        MixState {
            len: state.len + len,
            density: state.density.max(density),
        }
    }

    /// This item's own length and density, independent of any running
    /// state.
    fn measure(&self) -> (usize, Density) {
        match self {
            FormatItem::Decimal(item) => (
                item.base_length().max(item.width),
                if item.requires_wide() {
                    Density::Wide
                } else {
                    Density::Narrow
                },
            ),
            FormatItem::Hex(item) => {
                let prefix = if item.has_prefix { 2 } else { 0 };
                (
                    item.length + prefix + item.zeroes_length(prefix),
                    Density::Narrow,
                )
            }
            FormatItem::Octal(item) => {
                let prefix = usize::from(item.has_prefix);
                (
                    item.length + prefix + item.zeroes_length(prefix),
                    Density::Narrow,
                )
            }
            FormatItem::Boolean(value) => (
                if *value {
                    TRUE_LITERAL.len()
                } else {
                    FALSE_LITERAL.len()
                },
                Density::Narrow,
            ),
            FormatItem::Null => (NULL_LITERAL.len(), Density::Narrow),
            FormatItem::Char(unit) => (
                1,
                if *unit > 0xFF {
                    Density::Wide
                } else {
                    Density::Narrow
                },
            ),
            FormatItem::Text(text) => (text.len(), text.density()),
            FormatItem::Owned(buf) => (buf.len(), buf.density()),
            FormatItem::FillLeft { width, item } | FormatItem::FillRight { width, item } => {
                let (len, density) = item.measure();
                (len.max(*width), density)
            }
        }
    }

    /// Writes this item's units immediately before `cursor` and returns
    /// the new cursor. Called right to left, after the whole mix pass.
    #[must_use]
    pub fn prepend(&self, cursor: usize, buf: &mut FormatBuf) -> usize {
        match self {
            FormatItem::Decimal(item) => Self::prepend_decimal(item, cursor, buf),
            FormatItem::Hex(item) => {
                let mut cursor = cursor;
                let mut digits = [0u8; 16];
                let start = encode_hex(item.value, &mut digits, item.length);
                cursor = Self::prepend_ascii(&digits[start..item.length], cursor, buf);
                let prefix = if item.has_prefix { 2 } else { 0 };
                for _ in 0..item.zeroes_length(prefix) {
                    cursor -= 1;
                    buf.set(cursor, u16::from(b'0'));
                }
                if item.has_prefix {
                    cursor = Self::prepend_ascii(b"0x", cursor, buf);
                }
                cursor
            }
            FormatItem::Octal(item) => {
                let mut cursor = cursor;
                let mut digits = [0u8; 22];
                let start = encode_octal(item.value, &mut digits, item.length);
                cursor = Self::prepend_ascii(&digits[start..item.length], cursor, buf);
                // The octal prefix is itself a zero, so it folds into the
                // padding run.
                let prefix = usize::from(item.has_prefix);
                for _ in 0..item.zeroes_length(prefix) + prefix {
                    cursor -= 1;
                    buf.set(cursor, u16::from(b'0'));
                }
                cursor
            }
            FormatItem::Boolean(value) => Self::prepend_ascii(
                if *value { TRUE_LITERAL } else { FALSE_LITERAL },
                cursor,
                buf,
            ),
            FormatItem::Null => Self::prepend_ascii(NULL_LITERAL, cursor, buf),
            FormatItem::Char(unit) => {
                let cursor = cursor - 1;
                buf.set(cursor, *unit);
                cursor
            }
            FormatItem::Text(text) => Self::prepend_text(*text, cursor, buf),
            FormatItem::Owned(owned) => Self::prepend_text(owned.as_text(), cursor, buf),
            FormatItem::FillLeft { width, item } => {
                let (len, _) = item.measure();
                let mut cursor = item.prepend(cursor, buf);
                for _ in len..(*width).max(len) {
                    cursor -= 1;
                    buf.set(cursor, u16::from(b' '));
                }
                cursor
            }
            FormatItem::FillRight { width, item } => {
                let (len, _) = item.measure();
                let mut cursor = cursor;
                for _ in len..(*width).max(len) {
                    cursor -= 1;
                    buf.set(cursor, u16::from(b' '));
                }
                item.prepend(cursor, buf)
            }
        }
    }

    fn prepend_decimal(item: &DecimalItem, cursor: usize, buf: &mut FormatBuf) -> usize {
        let mut cursor = cursor;
        if item.parentheses {
            cursor -= 1;
            buf.set(cursor, u16::from(b')'));
        }

        // i64 never takes more than 19 digits plus a sign.
        let digit_len = item.length + usize::from(item.negative);
        let mut digits = [0u8; 20];
        let start = encode_decimal(item.value, &mut digits, digit_len);
        debug_assert_eq!(start, 0);

        // Wrapping keeps the offset value-correct for any zero digit,
        // including glyphs below U+0030: zero - '0' + ('0' + d) = zero + d.
        let offset = item.symbols.zero_digit.wrapping_sub(u16::from(b'0'));
        let mut group_index = item.group_size;
        // Right to left over the digits only; the sign slot rendered by
        // the digit encoder is skipped and re-emitted as a glyph below.
        for i in 1..=item.length {
            if item.group_size > 0 && group_index == 0 {
                cursor -= 1;
                buf.set(cursor, item.symbols.grouping_separator);
                group_index = item.group_size - 1;
            } else if item.group_size > 0 {
                group_index -= 1;
            }
            cursor -= 1;
            buf.set(cursor, offset.wrapping_add(u16::from(digits[digit_len - i])));
        }

        for _ in item.base_length()..item.width {
            cursor -= 1;
            buf.set(cursor, item.symbols.zero_digit);
        }

        if item.parentheses {
            cursor -= 1;
            buf.set(cursor, u16::from(b'('));
        }
        if let Some(sign) = item.prefix_sign {
            cursor -= 1;
            buf.set(cursor, sign);
        }
        cursor
    }

    fn prepend_ascii(bytes: &[u8], cursor: usize, buf: &mut FormatBuf) -> usize {
        let cursor = cursor - bytes.len();
        for (i, &byte) in bytes.iter().enumerate() {
            buf.set(cursor + i, u16::from(byte));
        }
        cursor
    }

    fn prepend_text(text: Text<'_>, cursor: usize, buf: &mut FormatBuf) -> usize {
        let cursor = cursor - text.len();
        for i in 0..text.len() {
            buf.set(cursor + i, text.unit(i));
        }
        cursor
    }
}

/// Runs both passes over `items` and returns the finished text.
///
/// The buffer is allocated exactly once, sized by the mix pass; every item
/// writes into its final position. Debug builds assert the prepend pass
/// lands exactly at zero.
#[must_use]
pub fn concat(items: &[FormatItem<'_>]) -> TextBuf {
    let mut state = MixState::new();
    for item in items {
        state = item.mix(state);
    }

    let mut buf = FormatBuf::from_mixed(state);
    let mut cursor = state.len;
    for item in items.iter().rev() {
        cursor = item.prepend(cursor, &mut buf);
    }
    debug_assert_eq!(cursor, 0);
    buf.into_text_buf()
}
