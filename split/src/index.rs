//! Resolve a URI into an ordered list of files and a table of cumulative offsets.
//!
//! The index defines the virtual address space shared by every worker: byte `x` of the
//! job is byte `x - offsets[i]` of file `i`, where `i` is the last file whose offset is
//! not greater than `x`.

use crate::{
    fs::{FileInfo, FileSystem, Kind},
    Error,
};
use std::num::NonZeroU64;
use tracing::debug;

/// Separator between paths in a URI.
pub const DELIMITER: char = ';';

/// Ordered, non-empty files of a job and their cumulative offsets.
#[derive(Clone, Debug)]
pub struct FileIndex {
    files: Vec<FileInfo>,

    /// `offsets[i]` is the position of the first byte of `files[i]`. The last entry is
    /// the total size.
    offsets: Vec<u64>,
}

impl FileIndex {
    /// Resolve every `;`-separated path in `uri` using `fs`.
    ///
    /// Directories are expanded one level deep, keeping only regular files. Empty files
    /// are dropped. Every remaining file must have a size that is a multiple of `align`.
    pub fn init<F: FileSystem>(fs: &F, uri: &str, align: NonZeroU64) -> Result<Self, Error> {
        let mut files = Vec::new();
        for path in uri.split(DELIMITER).filter(|p| !p.is_empty()) {
            let info = fs.path_info(path)?;
            match info.kind {
                Kind::Directory => {
                    for child in fs.list_directory(&info.path)? {
                        if child.kind == Kind::File && child.size != 0 {
                            files.push(child);
                        }
                    }
                }
                Kind::File => {
                    if info.size != 0 {
                        files.push(info);
                    }
                }
            }
        }
        let index = Self::from_files(files, align)?;
        debug!(files = index.len(), total = index.total(), "indexed input");
        Ok(index)
    }

    /// Build an index from already resolved files, in the given order.
    pub fn from_files(files: Vec<FileInfo>, align: NonZeroU64) -> Result<Self, Error> {
        let mut offsets = Vec::with_capacity(files.len() + 1);
        offsets.push(0u64);
        for file in &files {
            if file.size % align.get() != 0 {
                return Err(Error::Misaligned {
                    path: file.path.clone(),
                    size: file.size,
                    align: align.get(),
                });
            }
            let last = offsets[offsets.len() - 1];
            offsets.push(last + file.size);
        }
        Ok(Self { files, offsets })
    }

    /// Total number of bytes across all files.
    pub fn total(&self) -> u64 {
        self.offsets[self.files.len()]
    }

    /// Number of files in the index.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the index holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Indexed files, in the order their bytes appear in the concatenation.
    pub fn files(&self) -> &[FileInfo] {
        &self.files
    }

    /// The `i`-th indexed file.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    pub fn file(&self, i: usize) -> &FileInfo {
        &self.files[i]
    }

    /// Position of the first byte of file `i` (or the total size, for `i == len()`).
    pub fn offset(&self, i: usize) -> u64 {
        self.offsets[i]
    }

    /// Index of the file containing `offset`.
    ///
    /// Empty files never appear in the index, so for `offset < total()` this is the unique
    /// file with `offset(i) <= offset < offset(i + 1)`. For `offset == total()` this
    /// returns `len()`.
    pub fn locate(&self, offset: u64) -> usize {
        self.offsets.partition_point(|&o| o <= offset) - 1
    }

    /// Returns true if `offset` is the first byte of some file (or the total size).
    pub fn is_boundary(&self, offset: u64) -> bool {
        self.offsets.binary_search(&offset).is_ok()
    }
}
