//! Shape the raw bytes of a [Cursor] into record-aligned buffers.

use crate::{cursor::Cursor, fs::FileSystem, record::Splitter, Error};

/// Fills caller buffers with whole records.
///
/// When a buffer fills up in the middle of a record, the incomplete tail is kept as
/// overflow and placed at the front of the next buffer.
pub struct Reader<'a, F: FileSystem, S: Splitter> {
    cursor: Cursor<'a, F>,
    splitter: S,
    overflow: Vec<u8>,
}

impl<'a, F: FileSystem, S: Splitter> Reader<'a, F, S> {
    pub fn new(cursor: Cursor<'a, F>, splitter: S) -> Self {
        Self {
            cursor,
            splitter,
            overflow: Vec::new(),
        }
    }

    pub fn cursor(&self) -> &Cursor<'a, F> {
        &self.cursor
    }

    pub fn splitter(&self) -> &S {
        &self.splitter
    }

    /// Bytes carried over from the last fill.
    pub fn overflow(&self) -> &[u8] {
        &self.overflow
    }

    /// Read raw bytes, bypassing record alignment (and any overflow).
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.cursor.read(buf)
    }

    /// Move back to the beginning of the range, dropping any overflow.
    pub fn rewind(&mut self) -> Result<(), Error> {
        self.cursor.rewind()?;
        self.overflow.clear();
        Ok(())
    }

    /// Fill `buf` with complete records.
    ///
    /// The last byte of `buf` is reserved as a terminator and set to 0; it never holds data.
    /// Returns `None` once the range (and overflow) is exhausted. Otherwise returns the
    /// number of record-aligned bytes at the front of `buf`, which is 0 if not a single
    /// record fits (the caller should retry with a larger buffer).
    pub fn fill_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Error> {
        let Some(max) = buf.len().checked_sub(1) else {
            return Ok(Some(0));
        };
        buf[max] = 0;
        let olen = self.overflow.len();
        if olen >= max {
            return Ok(Some(0));
        }
        buf[..olen].copy_from_slice(&self.overflow);

        // Keep reading until the buffer is full or the range is exhausted.
        let mut n = olen;
        while n < max {
            let read = self.cursor.read(&mut buf[n..max])?;
            if read == 0 {
                break;
            }
            n += read;
        }
        self.overflow.clear();
        if n == 0 {
            return Ok(None);
        }
        if n < max {
            // The range ends on a record boundary, so a partial fill is all whole records.
            return Ok(Some(n));
        }

        let size = self.splitter.find_last_record_begin(&buf[..n]);
        self.overflow.extend_from_slice(&buf[size..n]);
        Ok(Some(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fs::memory, index::FileIndex, range, record::Line};
    use std::num::{NonZeroU32, NonZeroU64};

    fn reader<'a>(fs: &'a memory::FileSystem, uri: &str) -> Reader<'a, memory::FileSystem, Line> {
        let index = FileIndex::init(fs, uri, NonZeroU64::MIN).unwrap();
        let range = range::compute(fs, &index, &Line, NonZeroU32::MIN, 0, NonZeroU64::MIN).unwrap();
        Reader::new(Cursor::init(fs, index, range).unwrap(), Line)
    }

    #[test]
    fn test_overflow_prefixes_next_fill() {
        let fs = memory::FileSystem::default();
        fs.insert("a", b"aa\nbbbb\ncc\n".to_vec());
        let mut reader = reader(&fs, "a");

        // 6 data bytes + guard: "aa\nbbb" -> report "aa\n", keep "bbb".
        let mut buf = [0xffu8; 7];
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), Some(3));
        assert_eq!(&buf[..3], b"aa\n");
        assert_eq!(buf[6], 0);
        let overflow = reader.overflow().to_vec();
        assert_eq!(overflow, b"bbb");

        let mut buf = [0xffu8; 7];
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), Some(5));
        assert!(buf.starts_with(&overflow));
        assert_eq!(&buf[..5], b"bbbb\n");
        assert_eq!(reader.overflow(), b"c");

        let mut buf = [0xffu8; 7];
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), Some(3));
        assert_eq!(&buf[..3], b"cc\n");
        assert!(reader.overflow().is_empty());

        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_record_larger_than_buffer() {
        let fs = memory::FileSystem::default();
        fs.insert("a", b"abcdefgh\n".to_vec());
        let mut reader = reader(&fs, "a");

        let mut buf = [0u8; 5];
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), Some(0));
        assert_eq!(reader.overflow(), b"abcd");

        // The overflow alone fills a buffer of the same size.
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), Some(0));
        assert_eq!(reader.overflow(), b"abcd");

        let mut buf = [0u8; 16];
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), Some(9));
        assert_eq!(&buf[..9], b"abcdefgh\n");
    }

    #[test]
    fn test_fill_spans_files() {
        let fs = memory::FileSystem::default();
        fs.insert("d/1", b"one\n".to_vec());
        fs.insert("d/2", b"two\n".to_vec());
        let mut reader = reader(&fs, "d");

        let mut buf = [0u8; 64];
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), Some(8));
        assert_eq!(&buf[..8], b"one\ntwo\n");
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), None);

        reader.rewind().unwrap();
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), Some(8));
    }

    #[test]
    fn test_rewind_drops_overflow() {
        let fs = memory::FileSystem::default();
        fs.insert("a", b"xx\nyyyy\n".to_vec());
        let mut reader = reader(&fs, "a");

        let mut buf = [0u8; 6];
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), Some(3));
        assert!(!reader.overflow().is_empty());
        reader.rewind().unwrap();
        assert!(reader.overflow().is_empty());
        assert_eq!(reader.cursor().position(), 0);
    }

    #[test]
    fn test_failed_fill_keeps_overflow() {
        let fs = memory::FileSystem::default();
        fs.insert("a", b"aa\nbbbb\n".to_vec());
        fs.insert("b", b"cc\n".to_vec());
        let mut reader = reader(&fs, "a;b");

        let mut buf = [0u8; 7];
        assert_eq!(reader.fill_chunk(&mut buf).unwrap(), Some(3));
        assert_eq!(reader.overflow(), b"bbb");

        assert!(fs.remove("b"));
        assert!(matches!(
            reader.fill_chunk(&mut buf),
            Err(Error::PathMissing(_))
        ));
        assert_eq!(reader.overflow(), b"bbb");
        assert!(matches!(reader.fill_chunk(&mut buf), Err(Error::Poisoned)));
    }
}
