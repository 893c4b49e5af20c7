//! Backing file access
//!
//! The store only ever reads the whole file once and replaces the whole
//! file on flush.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::error::{FlatKvError, Result};

/// Check that `path` can be written, before anything is read from it.
///
/// An existing file must open for writing. A missing file is accepted when
/// its parent directory exists and is writable, since the first flush will
/// create it.
pub(crate) fn check_writable(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Err(FlatKvError::file_access(path, "path is a directory")),
        Ok(_) => {
            OpenOptions::new()
                .write(true)
                .open(path)
                .map_err(|e| FlatKvError::file_access(path, e.to_string()))?;
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };

            let meta = fs::metadata(parent).map_err(|e| {
                FlatKvError::file_access(path, format!("parent directory unavailable: {}", e))
            })?;

            if !meta.is_dir() {
                return Err(FlatKvError::file_access(path, "parent is not a directory"));
            }
            dir_writable(parent).map_err(|e| {
                FlatKvError::file_access(path, format!("parent directory is not writable: {}", e))
            })
        }
        Err(e) => Err(FlatKvError::file_access(path, e.to_string())),
    }
}

/// Read the full file as text. A missing file reads as empty.
pub(crate) fn read_contents(path: &Path) -> Result<String> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(String::new()),
        Err(e) => return Err(FlatKvError::Io(e)),
    };

    String::from_utf8(bytes)
        .map_err(|e| FlatKvError::CorruptData(format!("File is not valid UTF-8: {}", e)))
}

/// Replace the file contents with `contents` in a single write
pub(crate) fn write_contents(path: &Path, contents: &str, lock: bool, sync: bool) -> Result<()> {
    let write_error = |source: io::Error| FlatKvError::Write {
        path: path.to_path_buf(),
        source,
    };

    // With a lock, truncation has to wait until the lock is held
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(!lock)
        .open(path)
        .map_err(write_error)?;

    if lock {
        lock_exclusive(&file).map_err(write_error)?;
        file.set_len(0).map_err(write_error)?;
    }

    file.write_all(contents.as_bytes()).map_err(write_error)?;

    if sync {
        file.sync_all().map_err(write_error)?;
    }

    // Dropping the handle releases the lock
    Ok(())
}

/// Whether the calling process may create entries in `dir`
#[cfg(unix)]
fn dir_writable(dir: &Path) -> io::Result<()> {
    use rustix::fs::{access, Access};

    access(dir, Access::WRITE_OK).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(not(unix))]
fn dir_writable(dir: &Path) -> io::Result<()> {
    if fs::metadata(dir)?.permissions().readonly() {
        return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
    }
    Ok(())
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> io::Result<()> {
    use rustix::fs::{flock, FlockOperation};
    use std::os::unix::io::AsFd;

    flock(file.as_fd(), FlockOperation::LockExclusive)
        .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &File) -> io::Result<()> {
    tracing::debug!("advisory flush lock not supported on this platform, skipping");
    Ok(())
}
