//! A growable buffer holding one generation of record-aligned bytes.

use crate::{fs::FileSystem, reader::Reader, record::Splitter, Error};
use tracing::debug;

/// Record-aligned bytes loaded from a [Reader].
///
/// The backing buffer always has one byte more than its data capacity: the trailing byte
/// is set to 0 so that text scanners downstream can rely on a terminator after the data.
#[derive(Default)]
pub struct Chunk {
    data: Vec<u8>,
    begin: usize,
    end: usize,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of data bytes the buffer can hold before it must grow.
    pub fn capacity(&self) -> usize {
        self.data.len().saturating_sub(1)
    }

    /// Returns true if no unconsumed bytes remain.
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Load the next record-aligned bytes from `reader`, holding at least `target` bytes
    /// of capacity.
    ///
    /// If not a single record fits, the capacity is doubled until one does. Returns `false`
    /// once `reader` is exhausted. Any bytes not yet extracted are discarded.
    pub fn load<F: FileSystem, S: Splitter>(
        &mut self,
        reader: &mut Reader<'_, F, S>,
        target: usize,
    ) -> Result<bool, Error> {
        self.begin = 0;
        self.end = 0;
        let mut capacity = self.capacity().max(target).max(1);
        if self.data.len() < capacity + 1 {
            self.data.resize(capacity + 1, 0);
        }
        loop {
            match reader.fill_chunk(&mut self.data[..capacity + 1])? {
                None => return Ok(false),
                Some(0) => {
                    capacity *= 2;
                    debug!(capacity, "record exceeds chunk, growing");
                    self.data.resize(capacity + 1, 0);
                }
                Some(size) => {
                    self.end = size;
                    return Ok(true);
                }
            }
        }
    }

    /// Return all unconsumed bytes and mark them consumed.
    ///
    /// Returns `None` if the chunk was already extracted since the last load.
    pub fn extract(&mut self) -> Option<&[u8]> {
        if self.is_empty() {
            return None;
        }
        let (begin, end) = (self.begin, self.end);
        self.begin = end;
        Some(&self.data[begin..end])
    }
}
