use super::Splitter;
use crate::Error;
use std::io::{ErrorKind, Read, Seek};

/// Newline-delimited records. Both `\n` and `\r` end a record, and a run of them is
/// treated as a single separator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Line;

fn is_eol(c: u8) -> bool {
    c == b'\n' || c == b'\r'
}

/// Read a single byte, returning `None` at end of stream.
fn next_byte<R: Read>(stream: &mut R) -> Result<Option<u8>, Error> {
    let mut c = [0u8; 1];
    loop {
        match stream.read(&mut c) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(c[0])),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

impl Splitter for Line {
    fn seek_record_begin<R: Read + Seek>(&self, stream: &mut R) -> Result<u64, Error> {
        let mut skipped = 0u64;

        // Skip the rest of the current record, including its first terminator.
        loop {
            let Some(c) = next_byte(stream)? else {
                return Ok(skipped);
            };
            skipped += 1;
            if is_eol(c) {
                break;
            }
        }

        // Skip any further terminators. The first byte of the next record is consumed from
        // the stream but not counted.
        loop {
            let Some(c) = next_byte(stream)? else {
                return Ok(skipped);
            };
            if !is_eol(c) {
                return Ok(skipped);
            }
            skipped += 1;
        }
    }

    fn find_last_record_begin(&self, buf: &[u8]) -> usize {
        (1..buf.len())
            .rev()
            .find(|&i| is_eol(buf[i]))
            .map_or(0, |i| i + 1)
    }
}
