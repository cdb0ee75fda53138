//! Single-run lock.
//!
//! Scheduled invocations can overlap when a check runs long (page loads plus
//! retry backoff). Each run takes an exclusive, non-blocking `flock` on
//! `watch.lock` before doing anything observable; a run that loses the race
//! skips cleanly.
//!
//! The lock is advisory and tied to the open file descriptor, so the kernel
//! drops it if the process dies. The file itself stays behind, zero bytes.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs_err as fs;
use tracing::debug;

use crate::error::{Result, WatchError};

/// Held lock. Released by [`RunLock::release`] or on drop.
#[derive(Debug)]
pub struct RunLock {
    file: Option<File>,
    path: PathBuf,
}

impl RunLock {
    /// Tries to take the lock without waiting.
    ///
    /// Returns `Ok(None)` when another process holds it.
    pub fn acquire(path: &Path) -> Result<Option<RunLock>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| WatchError::io("Failed to create lock directory", e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| WatchError::io(format!("Failed to open lock file {}", path.display()), e))?;

        if !try_lock_exclusive(&file)? {
            debug!(path = %path.display(), "Lock held by another run");
            return Ok(None);
        }

        Ok(Some(RunLock {
            file: Some(file),
            path: path.to_path_buf(),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Releases the lock. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            unlock(&file);
            debug!(path = %self.path.display(), "Lock released");
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(unix)]
fn try_lock_exclusive(file: &File) -> Result<bool> {
    use std::os::unix::io::AsRawFd;

    // SAFETY: flock only reads the descriptor, which `file` keeps open for the call.
    #[allow(unsafe_code)]
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }

    let err = std::io::Error::last_os_error();
    if err.kind() == std::io::ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(WatchError::io("Failed to lock run lock file", err))
    }
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::unix::io::AsRawFd;

    // SAFETY: same descriptor as the matching flock(LOCK_EX) call; failure is harmless
    // because closing the file drops the lock anyway.
    #[allow(unsafe_code)]
    let _ = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
}

#[cfg(not(unix))]
fn try_lock_exclusive(_file: &File) -> Result<bool> {
    Ok(true)
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_acquire_is_refused_while_held() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("watch.lock");

        let first = RunLock::acquire(&path).unwrap();
        assert!(first.is_some());

        let second = RunLock::acquire(&path).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn test_release_allows_reacquire_and_is_idempotent() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("logs").join("watch.lock");

        let mut lock = RunLock::acquire(&path).unwrap().unwrap();
        lock.release();
        lock.release();
        assert!(!lock.is_held());

        assert!(RunLock::acquire(&path).unwrap().is_some());
    }

    #[test]
    fn test_drop_releases() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("watch.lock");

        {
            let _held = RunLock::acquire(&path).unwrap().unwrap();
        }

        assert!(RunLock::acquire(&path).unwrap().is_some());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }
}
