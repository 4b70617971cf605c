#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use textsink::{ByteOrder, Encoding, ErrorAction, StreamWriter, WriterOptions};

/// One fuzzed run: an encoding, buffer sizes, a chunking plan, and the
/// code units to push through the pipeline.
#[derive(Arbitrary, Debug)]
struct Plan {
    encoding: u8,
    strict: bool,
    initial: u8,
    max: u8,
    splits: Vec<u8>,
    units: Vec<u16>,
}

fuzz_target!(|plan: Plan| {
    run(&plan);
});

fn run(plan: &Plan) {
    let encoding = match plan.encoding % 5 {
        0 => Encoding::Latin1,
        1 => Encoding::Utf8,
        2 => Encoding::Utf16,
        3 => Encoding::Utf16Be,
        _ => Encoding::Utf16Le,
    };
    let options = WriterOptions {
        initial_size: 1 + usize::from(plan.initial),
        max_size: 1 + usize::from(plan.max),
        action: if plan.strict {
            ErrorAction::Report
        } else {
            ErrorAction::Replace
        },
    };

    let mut out = Vec::new();
    {
        let writer = StreamWriter::with_options(&mut out, encoding, options).unwrap();
        let mut idx = 0;
        for &split in &plan.splits {
            let remaining = plan.units.len() - idx;
            if remaining == 0 {
                break;
            }
            let size = 1 + usize::from(split) % remaining;
            if writer.write_units(&plan.units, idx, size).is_err() {
                // The strict disposition refuses ill-formed input; the
                // stream must still tear down cleanly.
                let _ = writer.close();
                return;
            }
            idx += size;
        }
        if idx < plan.units.len()
            && writer
                .write_units(&plan.units, idx, plan.units.len() - idx)
                .is_err()
        {
            let _ = writer.close();
            return;
        }
        if writer.close().is_err() {
            return;
        }
    }

    // Well-formed input must round-trip exactly through the lossless
    // encodings, whatever the chunking and buffer sizes were.
    let well_formed: Result<String, _> =
        char::decode_utf16(plan.units.iter().copied()).collect();
    if let Ok(expected) = well_formed {
        match encoding {
            Encoding::Latin1 => {}
            Encoding::Utf8 => {
                assert_eq!(String::from_utf8(out).unwrap(), expected);
            }
            Encoding::Utf16 => {
                if expected.is_empty() {
                    assert!(out.is_empty());
                } else {
                    assert_eq!(&out[..2], [0xFE, 0xFF]);
                    assert_eq!(decode_units(&out[2..], ByteOrder::Big), expected);
                }
            }
            Encoding::Utf16Be => assert_eq!(decode_units(&out, ByteOrder::Big), expected),
            Encoding::Utf16Le => {
                assert_eq!(decode_units(&out, ByteOrder::Little), expected);
            }
        }
    }
}

fn decode_units(bytes: &[u8], order: ByteOrder) -> String {
    assert_eq!(bytes.len() % 2, 0, "odd UTF-16 byte count");
    let units = bytes.chunks_exact(2).map(|pair| match order {
        ByteOrder::Big => u16::from_be_bytes([pair[0], pair[1]]),
        ByteOrder::Little => u16::from_le_bytes([pair[0], pair[1]]),
    });
    char::decode_utf16(units)
        .map(|r| r.expect("encoder emitted an ill-formed unit sequence"))
        .collect()
}
