//! [FileSystem](super::FileSystem) backed by the local disk.

use super::{FileInfo, Kind};
use crate::Error;
use std::{
    fs::{self, File, Metadata},
    io::{self, BufReader},
    path::Path,
};

/// Local filesystem. Paths are passed to [std::fs] as-is.
///
/// Directory entries whose names are not valid UTF-8 cannot be named in a URI and are
/// rejected with [Error::InvalidPath].
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSystem;

fn info(path: &Path, metadata: &Metadata) -> Result<FileInfo, Error> {
    let Some(name) = path.to_str() else {
        return Err(Error::InvalidPath(path.to_string_lossy().into_owned()));
    };
    let kind = if metadata.is_dir() {
        Kind::Directory
    } else {
        Kind::File
    };
    Ok(FileInfo {
        path: name.into(),
        size: metadata.len(),
        kind,
    })
}

fn map_missing(path: &str, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound => Error::PathMissing(path.into()),
        _ => Error::Io(err),
    }
}

impl super::FileSystem for FileSystem {
    type Stream = BufReader<File>;

    fn path_info(&self, path: &str) -> Result<FileInfo, Error> {
        let metadata = fs::metadata(path).map_err(|e| map_missing(path, e))?;
        info(Path::new(path), &metadata)
    }

    fn list_directory(&self, path: &str) -> Result<Vec<FileInfo>, Error> {
        // Entries are returned in the order the OS yields them.
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| map_missing(path, e))? {
            let path = entry?.path();
            let metadata = fs::metadata(&path)?;
            entries.push(info(&path, &metadata)?);
        }
        Ok(entries)
    }

    fn open_for_read(&self, path: &str) -> Result<Self::Stream, Error> {
        let file = File::open(path).map_err(|e| map_missing(path, e))?;
        Ok(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystem as _;
    use std::io::{Read, Seek, SeekFrom};

    #[test]
    fn test_local_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("a"), b"0123456789").unwrap();
        fs::create_dir(root.join("sub")).unwrap();

        let path = root.join("a");
        let path = path.to_str().unwrap();
        let info = FileSystem.path_info(path).unwrap();
        assert_eq!(info.size, 10);
        assert_eq!(info.kind, Kind::File);

        let info = FileSystem.path_info(root.to_str().unwrap()).unwrap();
        assert_eq!(info.kind, Kind::Directory);

        let mut entries = FileSystem.list_directory(root.to_str().unwrap()).unwrap();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![Kind::File, Kind::Directory]);

        let mut stream = FileSystem.open_for_read(path).unwrap();
        stream.seek(SeekFrom::Start(4)).unwrap();
        let mut buf = String::new();
        stream.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "456789");

        let missing = root.join("missing");
        assert!(matches!(
            FileSystem.path_info(missing.to_str().unwrap()),
            Err(Error::PathMissing(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_entry_rejected() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join(OsStr::from_bytes(b"bad\xff")), b"data").unwrap();

        assert!(matches!(
            FileSystem.list_directory(root.to_str().unwrap()),
            Err(Error::InvalidPath(path)) if path.ends_with("bad\u{fffd}")
        ));
    }
}
