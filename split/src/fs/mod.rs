//! Filesystems that a split can read from.
//!
//! A [FileSystem] is borrowed for the lifetime of a split and is never closed by it.
//! Only the per-file [Stream]s it hands out are owned (and dropped) by the split.

use crate::Error;
use std::io::{Read, Seek};

pub mod local;
pub mod memory;

/// Whether a path names a regular file or a directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    File,
    Directory,
}

/// Metadata of a single path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
    pub kind: Kind,
}

/// A readable, seekable handle to the contents of one file.
///
/// A read returning fewer bytes than requested is only expected at end-of-stream (callers
/// retry until a read returns zero).
pub trait Stream: Read + Seek {}

impl<T: Read + Seek> Stream for T {}

/// Interface to the store holding the input files.
pub trait FileSystem {
    /// The stream returned by [FileSystem::open_for_read].
    type Stream: Stream;

    /// Return the metadata of `path`.
    fn path_info(&self, path: &str) -> Result<FileInfo, Error>;

    /// Return the immediate children of the directory at `path`.
    ///
    /// The order of the returned entries determines the global byte order of a split, so it
    /// must be identical for every worker of a job.
    fn list_directory(&self, path: &str) -> Result<Vec<FileInfo>, Error>;

    /// Open the file at `path` for reading, positioned at offset 0.
    fn open_for_read(&self, path: &str) -> Result<Self::Stream, Error>;
}
