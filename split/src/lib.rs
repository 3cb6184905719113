//! Partition a concatenation of files into record-aligned ranges, one per worker.
//!
//! A job reads one logical byte space: the concatenation of every file named by a
//! `;`-separated URI (directories expand to their regular files). Each of `workers`
//! participants computes, without communicating, the contiguous range `[begin, end)`
//! it owns. Both ends of every range are moved forward to the next record start (as
//! defined by a [record::Splitter]) so that no record is read by two workers and none
//! is skipped.
//!
//! Within its range, a worker reads sequentially with [Split::read] (crossing file
//! boundaries transparently) or in record-aligned chunks with [Split::next_chunk].
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroU32;
//! use strata_split::{fs::memory, record::Line, Config, Split};
//!
//! let fs = memory::FileSystem::default();
//! fs.insert("data/a", b"alpha\nbeta\n".to_vec());
//! fs.insert("data/b", b"gamma\n".to_vec());
//!
//! let cfg = Config::new("data", 0, NonZeroU32::new(1).unwrap());
//! let mut split = Split::init(&fs, Line, cfg).unwrap();
//! let chunk = split.next_chunk().unwrap().unwrap();
//! assert_eq!(chunk, b"alpha\nbeta\ngamma\n");
//! assert!(split.next_chunk().unwrap().is_none());
//! ```
//!
//! # Determinism
//!
//! Every worker must observe the same files, in the same order, with the same sizes.
//! Directory listing order is whatever the [fs::FileSystem] returns and is never
//! re-sorted here.

pub mod chunk;
pub mod cursor;
pub mod fs;
pub mod index;
pub mod range;
pub mod reader;
pub mod record;
mod split;

pub use chunk::Chunk;
pub use index::FileIndex;
pub use range::Range;
pub use split::{Config, Split, DEFAULT_CHUNK_SIZE};

use thiserror::Error;

/// Errors that can occur when building or reading a split.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("path missing: {0}")]
    PathMissing(String),
    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(String),
    #[error("file {path} has size {size}, not a multiple of {align} bytes")]
    Misaligned { path: String, size: u64, align: u64 },
    #[error("rank {rank} out of range for {workers} workers")]
    InvalidRank { rank: u32, workers: u32 },
    #[error("short read at offset {offset}, expected file boundary at {boundary}")]
    ShortRead { offset: u64, boundary: u64 },
    #[error("split poisoned by an earlier integrity failure")]
    Poisoned,
}
