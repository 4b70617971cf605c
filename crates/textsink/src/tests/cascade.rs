use alloc::vec::Vec;

use rstest::rstest;

use super::sinks::CountingSink;
use crate::{Encoding, StreamWriter, WriterOptions};

const MAX: usize = 16;

fn options() -> WriterOptions {
    WriterOptions {
        initial_size: MAX,
        max_size: MAX,
        ..WriterOptions::default()
    }
}

/// A single write at the buffer-size boundary never fragments: below the
/// maximum it buffers until flush, at or above it bypasses the buffer.
/// Either way the payload reaches the sink in exactly one write.
#[rstest]
#[case::one_below(MAX - 1)]
#[case::exactly_max(MAX)]
#[case::one_above(MAX + 1)]
fn boundary_write_is_never_fragmented(#[case] len: usize) {
    let payload = alloc::vec![b'x'; len];
    let mut sink = CountingSink::new();
    {
        let writer =
            StreamWriter::with_options(&mut sink, Encoding::Latin1, options()).unwrap();
        writer
            .write_str(core::str::from_utf8(&payload).unwrap())
            .unwrap();
        writer.flush().unwrap();
    }
    assert_eq!(sink.writes, 1);
    assert_eq!(sink.bytes, payload);
}

#[test]
fn pending_bytes_flush_before_a_large_write() {
    let payload = alloc::vec![b'y'; MAX];
    let mut sink = CountingSink::new();
    {
        let writer =
            StreamWriter::with_options(&mut sink, Encoding::Latin1, options()).unwrap();
        writer.write_str("abc").unwrap();
        writer
            .write_str(core::str::from_utf8(&payload).unwrap())
            .unwrap();
        writer.flush().unwrap();
    }
    // pending "abc" first, then the large payload directly
    assert_eq!(sink.writes, 2);
    assert_eq!(&sink.bytes[..3], b"abc");
    assert_eq!(sink.bytes.len(), 3 + MAX);
}

#[test]
fn small_writes_coalesce_into_one_sink_write() {
    let mut sink = CountingSink::new();
    {
        let writer =
            StreamWriter::with_options(&mut sink, Encoding::Latin1, options()).unwrap();
        for _ in 0..MAX - 1 {
            writer.write_unit(u16::from(b'z')).unwrap();
        }
        writer.flush().unwrap();
    }
    assert_eq!(sink.writes, 1);
    assert_eq!(sink.bytes, alloc::vec![b'z'; MAX - 1]);
    assert_eq!(sink.flushes, 1);
}

#[test]
fn generic_strategy_forwards_large_writes_unbuffered() {
    let units: Vec<u16> = (0..MAX as u16).map(|i| 0x40 + i).collect();
    let mut sink = CountingSink::new();
    {
        let writer =
            StreamWriter::with_options(&mut sink, Encoding::Utf16Be, options()).unwrap();
        writer.write_units(&units, 0, units.len()).unwrap();
        writer.close().unwrap();
    }
    let expected: Vec<u8> = units.iter().flat_map(|u| u.to_be_bytes()).collect();
    assert_eq!(sink.bytes, expected);
    assert_eq!(sink.closes, 1);
}
