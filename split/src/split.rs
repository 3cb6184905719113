use crate::{
    chunk::Chunk,
    cursor::Cursor,
    fs::{FileInfo, FileSystem},
    index::FileIndex,
    range::{self, Range},
    reader::Reader,
    record::Splitter,
    Error,
};
use std::num::{NonZeroU32, NonZeroU64, NonZeroUsize};
use tracing::debug;

/// Default capacity of the chunks returned by [Split::next_chunk] (2 MiB).
pub const DEFAULT_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(2 << 20) {
    Some(size) => size,
    None => unreachable!(),
};

/// Configuration for a [Split].
#[derive(Clone, Debug)]
pub struct Config {
    /// `;`-separated list of files and directories to read, in order.
    pub uri: String,

    /// Index of this worker, in `[0, workers)`.
    pub rank: u32,

    /// Number of workers sharing the input.
    pub workers: NonZeroU32,

    /// Every input file size must be a multiple of this many bytes. Raw range boundaries
    /// are multiples of it as well.
    pub align_bytes: NonZeroU64,

    /// Initial capacity of the chunks returned by [Split::next_chunk].
    pub chunk_size: NonZeroUsize,
}

impl Config {
    /// Create a configuration with no alignment requirement and the default chunk size.
    pub fn new(uri: impl Into<String>, rank: u32, workers: NonZeroU32) -> Self {
        Self {
            uri: uri.into(),
            rank,
            workers,
            align_bytes: NonZeroU64::MIN,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// The record-aligned share of one worker over a set of input files.
pub struct Split<'a, F: FileSystem, S: Splitter> {
    reader: Reader<'a, F, S>,
    chunk: Chunk,
    chunk_size: usize,
}

impl<'a, F: FileSystem, S: Splitter> Split<'a, F, S> {
    /// Index the input, compute this worker's range and position a stream at its start.
    pub fn init(fs: &'a F, splitter: S, cfg: Config) -> Result<Self, Error> {
        let index = FileIndex::init(fs, &cfg.uri, cfg.align_bytes)?;
        let range = range::compute(
            fs,
            &index,
            &splitter,
            cfg.workers,
            cfg.rank,
            cfg.align_bytes,
        )?;
        debug!(
            rank = cfg.rank,
            begin = range.begin,
            end = range.end,
            first_file = range.first_file,
            last_file = range.last_file,
            "initialized split"
        );
        let cursor = Cursor::init(fs, index, range)?;
        Ok(Self {
            reader: Reader::new(cursor, splitter),
            chunk: Chunk::new(),
            chunk_size: cfg.chunk_size.get(),
        })
    }

    /// The range of the virtual concatenation owned by this worker.
    pub fn range(&self) -> Range {
        self.reader.cursor().range()
    }

    /// Total size of the input, across all workers.
    pub fn total_size(&self) -> u64 {
        self.reader.cursor().index().total()
    }

    /// Absolute position of the next byte [Split::read] will return.
    pub fn position(&self) -> u64 {
        self.reader.cursor().position()
    }

    /// Files holding at least one byte of this worker's range.
    pub fn files(&self) -> &[FileInfo] {
        let range = self.range();
        let files = self.reader.cursor().index().files();
        if range.is_empty() {
            return &[];
        }

        // `end` is exclusive: if it sits on a file boundary, that file is not included.
        let last = self.reader.cursor().index().locate(range.end - 1);
        &files[range.first_file..=last]
    }

    /// Read raw bytes of the range into `buf`, returning how many were read (0 at the end).
    ///
    /// Raw reads do not go through the chunk overflow; mixing them with chunked reads
    /// between two rewinds skips the bytes held as overflow.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        self.reader.read(buf)
    }

    /// Start over from the beginning of the range.
    ///
    /// The internal chunk starts over from its configured size, so a second pass yields
    /// the same sequence of chunks as the first.
    pub fn rewind(&mut self) -> Result<(), Error> {
        self.chunk = Chunk::new();
        self.reader.rewind()
    }

    /// Raise the capacity of subsequent [Split::next_chunk] calls to at least `size`.
    pub fn hint_chunk_size(&mut self, size: usize) {
        self.chunk_size = self.chunk_size.max(size);
    }

    /// Fill `buf` with complete records (see [Reader::fill_chunk]).
    pub fn fill_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Error> {
        self.reader.fill_chunk(buf)
    }

    /// Load `chunk` with the next record-aligned bytes (see [Chunk::load]).
    pub fn load(&mut self, chunk: &mut Chunk, target: usize) -> Result<bool, Error> {
        chunk.load(&mut self.reader, target)
    }

    /// Return the next record-aligned bytes of the range, or `None` at its end.
    ///
    /// The returned slice stays valid until the next call on this split.
    pub fn next_chunk(&mut self) -> Result<Option<&[u8]>, Error> {
        if self.chunk.is_empty() && !self.chunk.load(&mut self.reader, self.chunk_size)? {
            return Ok(None);
        }
        Ok(self.chunk.extract())
    }
}
