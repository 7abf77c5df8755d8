//! Cross-process document locking via a sibling marker file.
//!
//! Acquisition atomically creates `<document>.lock` next to the document and
//! polls until a deadline; release removes the marker and is idempotent, so
//! an operator cleaning up after a crashed process does not race a later
//! release. The engine only reports the timeout - deciding whether an
//! existing marker is stale belongs to whoever operates the documents.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Errors that can occur acquiring or releasing the document lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock could not be acquired before the timeout elapsed.
    #[error("Timed out after {timeout:?} waiting for lock on {path}")]
    Timeout {
        /// The document path being locked.
        path: PathBuf,
        /// The configured acquisition timeout.
        timeout: Duration,
    },

    /// An I/O error occurred while creating or removing the lock file.
    #[error("Lock file I/O error on {path}: {source}")]
    Io {
        /// The lock file path.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

/// The sibling lock-file path for a document.
#[must_use]
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map_or_else(
        || std::ffi::OsString::from("document"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".lock");
    path.with_file_name(name)
}

/// Exclusive ownership of a document path for the duration of one session.
///
/// Dropping the handle releases the lock best-effort; call
/// [`LockHandle::release`] to observe removal errors.
#[derive(Debug)]
pub struct LockHandle {
    target: PathBuf,
    lock_path: PathBuf,
    released: bool,
}

impl LockHandle {
    /// The document path this handle guards.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// The marker file path.
    #[must_use]
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Remove the lock marker.
    ///
    /// Idempotent: releasing an already-released (or externally removed)
    /// lock succeeds, to tolerate crash-recovery cleanup by an operator.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Io`] if the marker exists but cannot be removed.
    pub fn release(&mut self) -> Result<(), LockError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match std::fs::remove_file(&self.lock_path) {
            Ok(()) => {
                tracing::debug!("Released lock {}", self.lock_path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LockError::Io {
                path: self.lock_path.clone(),
                source: e,
            }),
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("Failed to release lock on drop: {e}");
        }
    }
}

/// Acquire the exclusive lock for `path`, polling until `timeout` elapses.
///
/// The marker is created with an atomic create-if-absent; contention is
/// retried every `poll_interval`. A zero `timeout` makes a single attempt.
///
/// # Errors
///
/// Returns [`LockError::Timeout`] if another holder persists past the
/// deadline, or [`LockError::Io`] for unexpected filesystem failures.
pub fn acquire(
    path: &Path,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<LockHandle, LockError> {
    let lock_path = lock_path_for(path);
    let deadline = Instant::now() + timeout;

    loop {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_file) => {
                tracing::debug!("Acquired lock {}", lock_path.display());
                return Ok(LockHandle {
                    target: path.to_path_buf(),
                    lock_path,
                    released: false,
                });
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(LockError::Timeout {
                        path: path.to_path_buf(),
                        timeout,
                    });
                }
                thread::sleep(poll_interval.min(deadline - now));
            }
            Err(e) => {
                return Err(LockError::Io {
                    path: lock_path,
                    source: e,
                })
            }
        }
    }
}
