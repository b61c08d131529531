//! Dump raw input events for debugging.
//! Run: touch-gestures dump capture.bin  (or pipe a stream on stdin).

use std::io::{Read, Write};

use crate::error::Result;
use crate::input::event::code_name;
use crate::replay::EventReader;

/// Print every decoded event of `input`. Returns the number of events read.
pub fn run_dump<R: Read, W: Write>(input: R, event_size: usize, out: &mut W) -> Result<u64> {
    let reader = EventReader::new(input, event_size)?;
    let mut n = 0u64;
    for ev in reader {
        let ev = ev?;
        n += 1;
        let name = code_name(ev.event_type, ev.code);
        writeln!(
            out,
            "{:6}  {:>10}.{:06}  {}  value={}",
            n,
            ev.when.as_secs(),
            ev.when.subsec_micros(),
            name,
            ev.value
        )?;
        if ev.is_sync_report() {
            writeln!(out)?;
        }
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::event::INPUT_EVENT_SIZE_32;

    fn record(sec: i32, usec: i32, ty: u16, code: u16, value: i32) -> Vec<u8> {
        let mut buf = Vec::with_capacity(INPUT_EVENT_SIZE_32);
        buf.extend_from_slice(&sec.to_le_bytes());
        buf.extend_from_slice(&usec.to_le_bytes());
        buf.extend_from_slice(&ty.to_le_bytes());
        buf.extend_from_slice(&code.to_le_bytes());
        buf.extend_from_slice(&value.to_le_bytes());
        buf
    }

    #[test]
    fn test_dump_lines() {
        let mut stream = record(1, 500, 3, 0x39, 7);
        stream.extend(record(1, 500, 0, 0, 0));
        let mut out = Vec::new();
        let n = run_dump(stream.as_slice(), INPUT_EVENT_SIZE_32, &mut out).unwrap();
        assert_eq!(n, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("ABS_MT_TRACKING_ID"));
        assert!(lines[0].ends_with("value=7"));
        assert!(lines[0].contains("1.000500"));
        assert!(lines[1].contains("SYN_REPORT"));
    }
}
