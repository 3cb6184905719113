//! In-memory [FileSystem](super::FileSystem).
//!
//! Directories are implicit: a path is a directory if any stored file lives beneath it.
//! Listings are sorted, so every reader of the same instance observes the same order.

use super::{FileInfo, Kind};
use crate::Error;
use bytes::Bytes;
use std::{
    collections::BTreeMap,
    io::{self, Read, Seek, SeekFrom},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

/// In-memory filesystem. Clones share the same contents.
#[derive(Clone, Default)]
pub struct FileSystem {
    files: Arc<Mutex<BTreeMap<String, Bytes>>>,
    open: Arc<AtomicUsize>,
}

fn normalize(path: &str) -> &str {
    path.trim_end_matches('/')
}

impl FileSystem {
    /// Store `content` at `path`, replacing any previous content.
    pub fn insert(&self, path: &str, content: impl Into<Bytes>) {
        let mut files = self.files.lock().unwrap();
        files.insert(normalize(path).into(), content.into());
    }

    /// Remove the file at `path`, returning whether it existed.
    pub fn remove(&self, path: &str) -> bool {
        let mut files = self.files.lock().unwrap();
        files.remove(normalize(path)).is_some()
    }

    /// Number of streams handed out by this filesystem that are still alive.
    pub fn open_streams(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl super::FileSystem for FileSystem {
    type Stream = Stream;

    fn path_info(&self, path: &str) -> Result<FileInfo, Error> {
        let path = normalize(path);
        let files = self.files.lock().unwrap();
        if let Some(content) = files.get(path) {
            return Ok(FileInfo {
                path: path.into(),
                size: content.len() as u64,
                kind: Kind::File,
            });
        }
        let prefix = format!("{path}/");
        if files.keys().any(|name| name.starts_with(&prefix)) {
            return Ok(FileInfo {
                path: path.into(),
                size: 0,
                kind: Kind::Directory,
            });
        }
        Err(Error::PathMissing(path.into()))
    }

    fn list_directory(&self, path: &str) -> Result<Vec<FileInfo>, Error> {
        let path = normalize(path);
        let prefix = format!("{path}/");
        let files = self.files.lock().unwrap();
        let mut entries: Vec<FileInfo> = Vec::new();
        for (name, content) in files.range(prefix.clone()..) {
            let Some(rest) = name.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                None => entries.push(FileInfo {
                    path: name.clone(),
                    size: content.len() as u64,
                    kind: Kind::File,
                }),
                Some((child, _)) => {
                    let child = format!("{prefix}{child}");
                    if entries.last().map(|e| &e.path) != Some(&child) {
                        entries.push(FileInfo {
                            path: child,
                            size: 0,
                            kind: Kind::Directory,
                        });
                    }
                }
            }
        }
        if entries.is_empty() {
            return Err(Error::PathMissing(path.into()));
        }
        Ok(entries)
    }

    fn open_for_read(&self, path: &str) -> Result<Stream, Error> {
        let path = normalize(path);
        let files = self.files.lock().unwrap();
        let content = files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::PathMissing(path.into()))?;
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Stream {
            inner: io::Cursor::new(content),
            open: self.open.clone(),
        })
    }
}

/// Stream over a snapshot of a file's contents, taken when it was opened.
pub struct Stream {
    inner: io::Cursor<Bytes>,
    open: Arc<AtomicUsize>,
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for Stream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
