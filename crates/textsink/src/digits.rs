//! Table-driven numeric-to-ASCII digit encoders.
//!
//! Digits are written *backward* from a caller-supplied end index, so a
//! number's text can be built in place without knowing its length first:
//! call the matching `*_size` function, reserve that many bytes, then
//! encode. The tables pack two ASCII digits per entry so each loop
//! iteration retires two digits with a single lookup.

/// `DECIMAL_PAIRS[v]` is the two ASCII digits of `v` for `v` in `0..100`.
static DECIMAL_PAIRS: [[u8; 2]; 100] = {
    let mut table = [[0u8; 2]; 100];
    let mut i = 0;
    while i < 100 {
        table[i] = [b'0' + (i / 10) as u8, b'0' + (i % 10) as u8];
        i += 1;
    }
    table
};

/// `HEX_PAIRS[v]` is the two lowercase hex digits of `v` for `v` in `0..256`.
static HEX_PAIRS: [[u8; 2]; 256] = {
    const fn hex(d: usize) -> u8 {
        if d < 10 {
            b'0' + d as u8
        } else {
            b'a' + (d - 10) as u8
        }
    }
    let mut table = [[0u8; 2]; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = [hex(i >> 4), hex(i & 0xF)];
        i += 1;
    }
    table
};

/// `OCTAL_PAIRS[v]` is the two octal digits of `v` for `v` in `0..64`.
static OCTAL_PAIRS: [[u8; 2]; 64] = {
    let mut table = [[0u8; 2]; 64];
    let mut i = 0;
    while i < 64 {
        table[i] = [b'0' + (i >> 3) as u8, b'0' + (i & 0x7) as u8];
        i += 1;
    }
    table
};

/// Number of bytes `encode_decimal` writes for `value`, sign included.
#[must_use]
pub fn decimal_size(value: i64) -> usize {
    let negative = value < 0;
    let sign = usize::from(negative);
    // Work in negative space so i64::MIN never overflows.
    let value = if negative { value } else { -value };

    let mut precision: i64 = -10;
    for digits in 1..19 {
        if value > precision {
            return digits + sign;
        }
        // Saturates on the 18th step, where one more factor of ten
        // would leave i64; the saturated value is never compared.
        precision = precision.saturating_mul(10);
    }
    19 + sign
}

/// Writes the decimal digits of `value` (and a leading `-` if negative)
/// backward from `index` (exclusive). Returns the index of the first byte
/// written.
///
/// The input is negated into negative space so `i64::MIN` round-trips; two
/// digits are retired per division.
///
/// # Panics
///
/// Panics if `buf` is too short; reserve `decimal_size(value)` bytes ending
/// at `index`.
#[must_use]
pub fn encode_decimal(value: i64, buf: &mut [u8], index: usize) -> usize {
    let mut pos = index;
    let negative = value < 0;
    let mut value = if negative { value } else { -value };

    while value <= -100 {
        let q = value / 100;
        let rem = (q * 100 - value) as usize;
        pos -= 2;
        buf[pos..pos + 2].copy_from_slice(&DECIMAL_PAIRS[rem]);
        value = q;
    }

    // At most two digits left.
    if value < -9 {
        pos -= 2;
        buf[pos..pos + 2].copy_from_slice(&DECIMAL_PAIRS[(-value) as usize]);
    } else {
        pos -= 1;
        buf[pos] = (i64::from(b'0') - value) as u8;
    }

    if negative {
        pos -= 1;
        buf[pos] = b'-';
    }
    pos
}

/// Number of hex digits in `value`; `0` takes one digit.
#[must_use]
pub fn hex_size(value: u64) -> usize {
    if value == 0 {
        1
    } else {
        ((67 - value.leading_zeros()) >> 2) as usize
    }
}

/// Writes the lowercase hex digits of `value` backward from `index`
/// (exclusive), no leading zeros. Returns the index of the first digit.
///
/// # Panics
///
/// Panics if `buf` is too short; reserve `hex_size(value)` bytes ending at
/// `index`.
#[must_use]
pub fn encode_hex(value: u64, buf: &mut [u8], index: usize) -> usize {
    let mut pos = index;
    let mut value = value;

    while value & !0xFF != 0 {
        let pair = HEX_PAIRS[(value & 0xFF) as usize];
        value >>= 8;
        pos -= 2;
        buf[pos..pos + 2].copy_from_slice(&pair);
    }

    let pair = HEX_PAIRS[(value & 0xFF) as usize];
    pos -= 1;
    buf[pos] = pair[1];
    if value > 0xF {
        pos -= 1;
        buf[pos] = pair[0];
    }
    pos
}

/// Number of octal digits in `value`; `0` takes one digit.
#[must_use]
pub fn octal_size(value: u64) -> usize {
    if value == 0 {
        1
    } else {
        ((66 - value.leading_zeros()) / 3) as usize
    }
}

/// Writes the octal digits of `value` backward from `index` (exclusive),
/// no leading zeros. Returns the index of the first digit.
///
/// # Panics
///
/// Panics if `buf` is too short; reserve `octal_size(value)` bytes ending
/// at `index`.
#[must_use]
pub fn encode_octal(value: u64, buf: &mut [u8], index: usize) -> usize {
    let mut pos = index;
    let mut value = value;

    while value & !0x3F != 0 {
        let pair = OCTAL_PAIRS[(value & 0x3F) as usize];
        value >>= 6;
        pos -= 2;
        buf[pos..pos + 2].copy_from_slice(&pair);
    }

    let pair = OCTAL_PAIRS[(value & 0x3F) as usize];
    pos -= 1;
    buf[pos] = pair[1];
    if value > 7 {
        pos -= 1;
        buf[pos] = pair[0];
    }
    pos
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::{
        decimal_size, encode_decimal, encode_hex, encode_octal, hex_size, octal_size,
    };

    fn decimal(value: i64) -> String {
        let size = decimal_size(value);
        let mut buf = alloc::vec![0u8; size];
        let start = encode_decimal(value, &mut buf, size);
        assert_eq!(start, 0, "size/encode disagree for {value}");
        String::from_utf8(buf).unwrap()
    }

    fn hex(value: u64) -> String {
        let size = hex_size(value);
        let mut buf = alloc::vec![0u8; size];
        let start = encode_hex(value, &mut buf, size);
        assert_eq!(start, 0, "size/encode disagree for {value:#x}");
        String::from_utf8(buf).unwrap()
    }

    fn octal(value: u64) -> String {
        let size = octal_size(value);
        let mut buf = alloc::vec![0u8; size];
        let start = encode_octal(value, &mut buf, size);
        assert_eq!(start, 0, "size/encode disagree for {value:#o}");
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn decimal_basics() {
        assert_eq!(decimal(0), "0");
        assert_eq!(decimal(7), "7");
        assert_eq!(decimal(-7), "-7");
        assert_eq!(decimal(42), "42");
        assert_eq!(decimal(100), "100");
        assert_eq!(decimal(-100), "-100");
        assert_eq!(decimal(1_234_567_890), "1234567890");
    }

    #[test]
    fn decimal_extremes() {
        assert_eq!(decimal(i64::MAX), "9223372036854775807");
        assert_eq!(decimal(i64::MIN), "-9223372036854775808");
        assert_eq!(decimal(i64::from(i32::MIN)), "-2147483648");
    }

    #[test]
    fn decimal_size_around_the_nineteen_digit_boundary() {
        assert_eq!(decimal_size(999_999_999_999_999_999), 18);
        assert_eq!(decimal_size(1_000_000_000_000_000_000), 19);
        assert_eq!(decimal_size(i64::MAX), 19);
        assert_eq!(decimal_size(-999_999_999_999_999_999), 19);
        assert_eq!(decimal_size(-1_000_000_000_000_000_000), 20);
        assert_eq!(decimal_size(i64::MIN), 20);
    }

    #[test]
    fn hex_basics() {
        assert_eq!(hex(0), "0");
        assert_eq!(hex(0xF), "f");
        assert_eq!(hex(0x10), "10");
        assert_eq!(hex(0xDEAD_BEEF), "deadbeef");
        assert_eq!(hex(u64::MAX), "ffffffffffffffff");
    }

    #[test]
    fn octal_basics() {
        assert_eq!(octal(0), "0");
        assert_eq!(octal(7), "7");
        assert_eq!(octal(8), "10");
        assert_eq!(octal(0o755), "755");
        assert_eq!(octal(u64::MAX), "1777777777777777777777");
    }

    #[test]
    fn sizes_match_formatting() {
        for value in [0i64, 1, -1, 9, 10, 99, 100, i64::MAX, i64::MIN] {
            assert_eq!(decimal_size(value), std::format!("{value}").len());
        }
        for value in [0u64, 1, 15, 16, 255, 256, u64::MAX] {
            assert_eq!(hex_size(value), std::format!("{value:x}").len());
            assert_eq!(octal_size(value), std::format!("{value:o}").len());
        }
    }
}
