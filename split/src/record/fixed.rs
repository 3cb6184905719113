use super::Splitter;
use crate::Error;
use std::{
    io::{Read, Seek, SeekFrom},
    num::NonZeroU64,
};

/// Records of a fixed number of bytes, starting at offset 0 of every file.
///
/// Every file size must be a multiple of the record size, otherwise chunks split records.
/// Build the split with `align_bytes` equal to [Fixed::size] to have this checked.
#[derive(Clone, Copy, Debug)]
pub struct Fixed {
    size: NonZeroU64,
}

impl Fixed {
    pub fn new(size: NonZeroU64) -> Self {
        Self { size }
    }

    pub fn size(&self) -> NonZeroU64 {
        self.size
    }
}

impl Splitter for Fixed {
    fn seek_record_begin<R: Read + Seek>(&self, stream: &mut R) -> Result<u64, Error> {
        let size = self.size.get();
        let position = stream.stream_position()?;
        let skip = (size - position % size) % size;
        if skip != 0 {
            stream.seek(SeekFrom::Current(skip as i64))?;
        }
        Ok(skip)
    }

    fn find_last_record_begin(&self, buf: &[u8]) -> usize {
        let size = self.size.get() as usize;
        buf.len() / size * size
    }
}
