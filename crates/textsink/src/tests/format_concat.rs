use alloc::{string::String, vec::Vec};

use quickcheck::QuickCheck;

use crate::{DecimalSymbols, FormatItem, MixState, TextBuf, concat};

fn item_from(kind: u8, value: i64) -> FormatItem<'static> {
    let width = (value.unsigned_abs() % 12) as usize;
    match kind % 9 {
        0 => FormatItem::decimal(
            DecimalSymbols::default(),
            width,
            None,
            kind & 0x10 != 0,
            usize::from(kind & 0x20 != 0) * 3,
            value,
        ),
        1 => FormatItem::hex(width, kind & 0x10 != 0, value as u64),
        2 => FormatItem::octal(width, kind & 0x10 != 0, value as u64),
        3 => FormatItem::Boolean(value & 1 == 0),
        4 => FormatItem::Null,
        5 => FormatItem::Char(value as u16),
        6 => FormatItem::Owned(TextBuf::from("wide 文 and narrow")),
        7 => FormatItem::fill_left(
            width,
            FormatItem::decimal(DecimalSymbols::default(), 0, None, false, 0, value),
        ),
        _ => FormatItem::fill_right(width, FormatItem::hex(0, true, value as u64)),
    }
}

/// Property: the prepend pass writes exactly the length the mix pass
/// computed, for any operand sequence. `concat` debug-asserts the cursor
/// lands on zero; the result length check covers release builds.
#[test]
fn mix_and_prepend_agree_quickcheck() {
    fn prop(seeds: Vec<(u8, i64)>) -> bool {
        let items: Vec<FormatItem<'_>> =
            seeds.iter().map(|&(kind, value)| item_from(kind, value)).collect();

        let mut state = MixState::new();
        for item in &items {
            state = item.mix(state);
        }

        let result = concat(&items);
        result.len() == state.len && result.density() == state.density
    }

    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    QuickCheck::new()
        .tests(tests)
        .quickcheck(prop as fn(Vec<(u8, i64)>) -> bool);
}

#[test]
fn nested_fills_measure_once_and_agree() {
    let item = FormatItem::fill_left(
        10,
        FormatItem::fill_right(
            6,
            FormatItem::decimal(DecimalSymbols::default(), 0, None, false, 0, -42),
        ),
    );
    assert_eq!(String::from(&concat(&[item])), "    -42   ");
}

#[test]
fn wide_owned_text_forces_the_whole_result_wide() {
    let items = [
        FormatItem::hex(0, true, 0xFF),
        FormatItem::Owned(TextBuf::from("中")),
        FormatItem::Boolean(true),
    ];
    let result = concat(&items);
    assert_eq!(result.density(), crate::Density::Wide);
    assert_eq!(String::from(&result), "0xff中true");
}
