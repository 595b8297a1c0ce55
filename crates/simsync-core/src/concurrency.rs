use crate::CoreError;
use fs2::FileExt;
use simsync_schema::Udid;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock on one device, held for the duration of a
/// reconciliation. Released when dropped.
pub struct DeviceLock {
    lock_file: File,
    path: PathBuf,
}

/// `<state_dir>/locks/<udid>.lock`
pub fn lock_path(state_dir: &Path, udid: &Udid) -> PathBuf {
    state_dir.join("locks").join(format!("{udid}.lock"))
}

fn open_lock_file(path: &Path) -> Result<File, CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)?)
}

impl DeviceLock {
    /// Block until no other process holds the lock for `udid`.
    pub fn acquire(state_dir: &Path, udid: &Udid) -> Result<Self, CoreError> {
        let path = lock_path(state_dir, udid);
        let file = open_lock_file(&path)?;
        file.lock_exclusive()
            .map_err(|e| CoreError::Io(std::io::Error::new(std::io::ErrorKind::WouldBlock, e)))?;
        Ok(Self {
            lock_file: file,
            path,
        })
    }

    /// Take the lock if it is free, `None` if another process holds it.
    pub fn try_acquire(state_dir: &Path, udid: &Udid) -> Result<Option<Self>, CoreError> {
        let path = lock_path(state_dir, udid);
        let file = open_lock_file(&path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                lock_file: file,
                path,
            })),
            Err(_) => Ok(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DeviceLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}
