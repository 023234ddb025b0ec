//! Filesystem primitives for settings documents.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::debug;

use super::error::{Result, StoreError};

const SHARING_RETRIES: usize = 10;
const SHARING_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Check if an error means another process holds the file open
pub fn is_sharing_violation(err: &io::Error) -> bool {
    #[cfg(windows)]
    {
        // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
        if matches!(err.raw_os_error(), Some(32) | Some(33)) {
            return true;
        }
        if err.kind() == io::ErrorKind::PermissionDenied {
            return true;
        }
    }
    err.kind() == io::ErrorKind::WouldBlock
}

/// Run `op`, retrying while it fails with a sharing violation
pub fn with_sharing_retry<T>(op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    retry_sharing(SHARING_RETRIES, SHARING_RETRY_DELAY, op)
}

fn retry_sharing<T>(
    attempts: usize,
    delay: Duration,
    mut op: impl FnMut() -> io::Result<T>,
) -> io::Result<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if is_sharing_violation(&e) && attempt < attempts => {
                debug!("Sharing violation (attempt {}/{}): {}", attempt, attempts, e);
                attempt += 1;
                std::thread::sleep(delay);
            }
            other => return other,
        }
    }
}

/// Directory a file lives in, `.` for bare file names
fn parent_dir(path: &Path) -> Result<PathBuf> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.to_path_buf()),
        Some(_) => Ok(PathBuf::from(".")),
        None => Err(StoreError::InvalidPath(path.to_path_buf())),
    }
}

/// Read a whole file; `None` if it does not exist
pub fn read_file(path: &Path) -> Result<Option<Vec<u8>>> {
    let data = with_sharing_retry(|| match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    })?;
    Ok(data)
}

/// Replace `path` with `contents` so readers never see a partial file.
///
/// The data goes to a temp file in the target directory first and is then
/// renamed over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = parent_dir(path)?;
    fs::create_dir_all(&dir)?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;

    let mut attempt = 1;
    loop {
        match temp.persist(path) {
            Ok(_) => return Ok(()),
            Err(err) if is_sharing_violation(&err.error) && attempt < SHARING_RETRIES => {
                debug!("Target {:?} is locked (attempt {}): {}", path, attempt, err.error);
                attempt += 1;
                temp = err.file;
                std::thread::sleep(SHARING_RETRY_DELAY);
            }
            Err(err) => {
                return Err(StoreError::Persist {
                    path: path.to_path_buf(),
                    source: err.error,
                })
            }
        }
    }
}

/// Copy `from` over `to`, creating the target directory
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(parent_dir(to)?)?;
    with_sharing_retry(|| fs::copy(from, to))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_directory_and_leaves_no_temp() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("nested/deeper/settings.json");

        write_atomic(&target, b"{\"a\":1}")?;
        write_atomic(&target, b"{\"a\":2}")?;

        assert_eq!(fs::read_to_string(&target)?, "{\"a\":2}");
        let leftovers = fs::read_dir(target.parent().unwrap())?
            .filter_map(|e| e.ok())
            .filter(|e| e.path() != target)
            .count();
        assert_eq!(leftovers, 0);
        Ok(())
    }

    #[test]
    fn read_missing_file_is_none() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(read_file(&dir.path().join("absent.json"))?.is_none());
        Ok(())
    }

    #[test]
    fn retry_stops_after_attempts() {
        let mut calls = 0;
        let result: io::Result<()> = retry_sharing(3, Duration::from_millis(1), || {
            calls += 1;
            Err(io::Error::new(io::ErrorKind::WouldBlock, "locked"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn retry_returns_first_success() {
        let mut calls = 0;
        let result = retry_sharing(5, Duration::from_millis(1), || {
            calls += 1;
            if calls < 3 {
                Err(io::Error::new(io::ErrorKind::WouldBlock, "locked"))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn other_errors_are_not_retried() {
        let mut calls = 0;
        let result: io::Result<()> = retry_sharing(5, Duration::from_millis(1), || {
            calls += 1;
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
