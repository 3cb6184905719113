//! Detect record boundaries.
//!
//! A [Splitter] answers two questions about a record format: where does the next record
//! start after an arbitrary position in a file, and where does the trailing (possibly
//! incomplete) record of a buffer start. Both answers must depend only on the bytes
//! involved, never on hidden state: every worker of a job relies on obtaining the same
//! answer for the same offset.

use crate::Error;
use std::io::{Read, Seek};

mod fixed;
mod line;

pub use fixed::Fixed;
pub use line::Line;

/// Record-boundary detection for one record format.
pub trait Splitter {
    /// Advance `stream` from its current position to the start of the next record and
    /// return the number of bytes skipped.
    ///
    /// If no record starts before the end of the stream, the stream is advanced to its end
    /// and the distance to it is returned.
    fn seek_record_begin<R: Read + Seek>(&self, stream: &mut R) -> Result<u64, Error>;

    /// Return the offset in `buf` at which its trailing record begins.
    ///
    /// `buf` always starts at a record boundary. Everything before the returned offset is
    /// made of complete records; everything from it onward may be an incomplete record.
    /// Returning 0 means no complete record fits in `buf`.
    fn find_last_record_begin(&self, buf: &[u8]) -> usize;
}
