//! Sequential reads over a range of the virtual concatenation.

use crate::{fs::FileSystem, index::FileIndex, range::Range, Error};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use tracing::{trace, warn};

/// Reads the bytes of a [Range], opening and closing the underlying files as needed.
///
/// At most one stream is open at a time. Crossing into another file drops the current
/// stream before the next one is opened, and dropping the cursor releases any open stream.
pub struct Cursor<'a, F: FileSystem> {
    fs: &'a F,
    index: FileIndex,
    range: Range,

    /// Absolute position of the next byte to read.
    position: u64,
    /// Index of the file `stream` belongs to.
    file: usize,
    stream: Option<F::Stream>,

    poisoned: bool,
}

impl<'a, F: FileSystem> Cursor<'a, F> {
    /// Create a cursor positioned at the beginning of `range`.
    ///
    /// No stream is opened for an empty range.
    pub fn init(fs: &'a F, index: FileIndex, range: Range) -> Result<Self, Error> {
        let mut cursor = Self {
            fs,
            index,
            range,
            position: range.begin,
            file: range.first_file,
            stream: None,
            poisoned: false,
        };
        cursor.rewind()?;
        Ok(cursor)
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    /// Absolute position of the next byte [Cursor::read] will return.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of bytes left before the end of the range.
    pub fn remaining(&self) -> u64 {
        self.range.end - self.position
    }

    fn open(&mut self, file: usize) -> Result<(), Error> {
        self.stream = None;
        let path = &self.index.file(file).path;
        trace!(file, path = path.as_str(), "opening stream");
        self.stream = Some(self.fs.open_for_read(path)?);
        self.file = file;
        Ok(())
    }

    /// Release the stream and refuse any further use.
    fn poison(&mut self) {
        self.poisoned = true;
        self.stream = None;
    }

    /// Move back to the beginning of the range.
    ///
    /// A failure poisons the cursor, like a failed [Cursor::read].
    pub fn rewind(&mut self) -> Result<(), Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        let result = self.seek_begin();
        if result.is_err() {
            self.poison();
        }
        result
    }

    fn seek_begin(&mut self) -> Result<(), Error> {
        if self.range.is_empty() {
            return Ok(());
        }
        let file = self.index.locate(self.range.begin);
        if self.stream.is_none() || self.file != file {
            self.open(file)?;
        }
        let offset = self.range.begin - self.index.offset(file);
        if let Some(stream) = self.stream.as_mut() {
            stream.seek(SeekFrom::Start(offset))?;
        }
        self.position = self.range.begin;
        Ok(())
    }

    /// Fill as much of `buf` as possible from the current stream, stopping early only at
    /// the end of the stream.
    fn read_stream(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };
        let mut filled = 0;
        while filled < buf.len() {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(filled)
    }

    /// Read up to `buf.len()` bytes, never past the end of the range.
    ///
    /// Returns the number of bytes placed in `buf`, which is less than requested only when
    /// the range is exhausted. Any error leaves the stream at an unknown position, so the
    /// cursor is poisoned: it releases its stream and refuses any further use. A stream
    /// ending anywhere but at a file boundary means the file changed since it was indexed
    /// and is reported as [Error::ShortRead].
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        let result = self.read_range(buf);
        if result.is_err() {
            self.poison();
        }
        result
    }

    fn read_range(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let size = self.remaining().min(buf.len() as u64) as usize;
        if size == 0 {
            return Ok(0);
        }
        let mut filled = 0;
        loop {
            let n = self.read_stream(&mut buf[filled..size])?;
            filled += n;
            self.position += n as u64;
            if filled == size {
                break;
            }

            let boundary = self.index.offset(self.file + 1);
            if self.position != boundary {
                warn!(
                    file = self.index.file(self.file).path.as_str(),
                    offset = self.position,
                    boundary,
                    "file shorter than indexed"
                );
                return Err(Error::ShortRead {
                    offset: self.position,
                    boundary,
                });
            }
            if self.file + 1 >= self.index.len() {
                break;
            }
            self.open(self.file + 1)?;
        }
        Ok(filled)
    }
}
