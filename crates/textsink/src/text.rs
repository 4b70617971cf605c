//! Density-tagged text: code-unit sequences stored one byte per unit
//! (narrow) or two bytes per unit (wide).
//!
//! Density is a per-value invariant: a narrow value holds only units
//! `<= 0xFF`; a wide value may hold the full UTF-16 code-unit range,
//! including surrogate halves. [`TextBuf`] inflates narrow to wide on
//! demand and never deflates.

use alloc::{string::String, vec::Vec};

/// Storage tier of a text value: one byte per code unit or two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Density {
    /// One byte per code unit; every unit is `<= 0xFF`.
    Narrow,
    /// Two bytes per code unit; full UTF-16 code-unit range.
    Wide,
}

impl Density {
    /// The wider of two tiers.
    #[must_use]
    pub fn max(self, other: Density) -> Density {
        match (self, other) {
            (Density::Narrow, Density::Narrow) => Density::Narrow,
            _ => Density::Wide,
        }
    }
}

/// A borrowed, density-tagged code-unit sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text<'a> {
    /// Narrow tier: each byte is one code unit.
    Narrow(&'a [u8]),
    /// Wide tier: each `u16` is one code unit.
    Wide(&'a [u16]),
}

impl<'a> Text<'a> {
    /// Length in code units.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Text::Narrow(b) => b.len(),
            Text::Wide(w) => w.len(),
        }
    }

    /// Returns `true` if the value holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value's density tier.
    #[must_use]
    pub fn density(&self) -> Density {
        match self {
            Text::Narrow(_) => Density::Narrow,
            Text::Wide(_) => Density::Wide,
        }
    }

    /// The code unit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn unit(&self, index: usize) -> u16 {
        match self {
            Text::Narrow(b) => u16::from(b[index]),
            Text::Wide(w) => w[index],
        }
    }

    /// The sub-range `from..to`, keeping the density tag.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    #[must_use]
    pub fn slice(&self, from: usize, to: usize) -> Text<'a> {
        match self {
            Text::Narrow(b) => Text::Narrow(&b[from..to]),
            Text::Wide(w) => Text::Wide(&w[from..to]),
        }
    }
}

/// An owned, append-only density-tagged text accumulator.
///
/// Appending a unit above `0xFF` (or any wide text) inflates the buffer to
/// the wide tier; it stays wide for the rest of its life. `clear` drops the
/// units but keeps both the tier and the allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextBuf {
    /// Narrow tier storage.
    Narrow(Vec<u8>),
    /// Wide tier storage.
    Wide(Vec<u16>),
}

impl TextBuf {
    /// An empty narrow buffer.
    #[must_use]
    pub fn new() -> Self {
        TextBuf::Narrow(Vec::new())
    }

    /// An empty narrow buffer with room for `units` before reallocating.
    #[must_use]
    pub fn with_capacity(units: usize) -> Self {
        TextBuf::Narrow(Vec::with_capacity(units))
    }

    /// Length in code units.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            TextBuf::Narrow(b) => b.len(),
            TextBuf::Wide(w) => w.len(),
        }
    }

    /// Returns `true` if the buffer holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The buffer's current density tier.
    #[must_use]
    pub fn density(&self) -> Density {
        match self {
            TextBuf::Narrow(_) => Density::Narrow,
            TextBuf::Wide(_) => Density::Wide,
        }
    }

    /// Appends one code unit, inflating to wide if it does not fit narrow.
    pub fn push(&mut self, unit: u16) {
        match self {
            TextBuf::Narrow(b) => {
                if let Ok(narrow) = u8::try_from(unit) {
                    b.push(narrow);
                } else {
                    self.inflate();
                    self.push(unit);
                }
            }
            TextBuf::Wide(w) => w.push(unit),
        }
    }

    /// Appends a borrowed text value, inflating first if it is wide.
    pub fn push_text(&mut self, text: Text<'_>) {
        match (&mut *self, text) {
            (TextBuf::Narrow(b), Text::Narrow(src)) => b.extend_from_slice(src),
            (TextBuf::Wide(w), Text::Wide(src)) => w.extend_from_slice(src),
            (TextBuf::Wide(w), Text::Narrow(src)) => {
                w.extend(src.iter().map(|&b| u16::from(b)));
            }
            (TextBuf::Narrow(_), Text::Wide(_)) => {
                self.inflate();
                self.push_text(text);
            }
        }
    }

    /// Appends a string as UTF-16 code units.
    pub fn push_str(&mut self, s: &str) {
        match self {
            // ASCII prefixes append byte-for-byte on the narrow tier.
            TextBuf::Narrow(b) if s.is_ascii() => b.extend_from_slice(s.as_bytes()),
            _ => {
                for unit in s.encode_utf16() {
                    self.push(unit);
                }
            }
        }
    }

    /// Borrows the buffer as a density-tagged value.
    #[must_use]
    pub fn as_text(&self) -> Text<'_> {
        match self {
            TextBuf::Narrow(b) => Text::Narrow(b),
            TextBuf::Wide(w) => Text::Wide(w),
        }
    }

    /// Drops all units, keeping the tier and the allocation.
    pub fn clear(&mut self) {
        match self {
            TextBuf::Narrow(b) => b.clear(),
            TextBuf::Wide(w) => w.clear(),
        }
    }

    fn inflate(&mut self) {
        if let TextBuf::Narrow(b) = self {
            let wide: Vec<u16> = b.iter().map(|&b| u16::from(b)).collect();
            *self = TextBuf::Wide(wide);
        }
    }
}

impl Default for TextBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuf {
    fn from(s: &str) -> Self {
        let mut buf = TextBuf::with_capacity(s.len());
        buf.push_str(s);
        buf
    }
}

impl From<&TextBuf> for String {
    fn from(buf: &TextBuf) -> Self {
        match buf {
            TextBuf::Narrow(b) => b.iter().map(|&b| char::from(b)).collect(),
            TextBuf::Wide(w) => char::decode_utf16(w.iter().copied())
                .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Density, Text, TextBuf};

    #[test]
    fn narrow_push_stays_narrow() {
        let mut buf = TextBuf::new();
        buf.push(u16::from(b'a'));
        buf.push(0xE9); // é fits the narrow tier
        assert_eq!(buf.density(), Density::Narrow);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn wide_unit_inflates() {
        let mut buf = TextBuf::from("ab");
        assert_eq!(buf.density(), Density::Narrow);
        buf.push(0x4E2D); // 中
        assert_eq!(buf.density(), Density::Wide);
        assert_eq!(buf.as_text().unit(0), u16::from(b'a'));
        assert_eq!(buf.as_text().unit(2), 0x4E2D);
    }

    #[test]
    fn wide_text_append_inflates() {
        let mut buf = TextBuf::from("x");
        buf.push_text(Text::Wide(&[0x41]));
        assert_eq!(buf.density(), Density::Wide);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn clear_keeps_tier() {
        let mut buf = TextBuf::from("中");
        assert_eq!(buf.density(), Density::Wide);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.density(), Density::Wide);
    }

    #[test]
    fn surrogate_pair_round_trips_through_units() {
        let buf = TextBuf::from("𝄞");
        assert_eq!(buf.len(), 2);
        assert_eq!(alloc::string::String::from(&buf), "𝄞");
    }
}
