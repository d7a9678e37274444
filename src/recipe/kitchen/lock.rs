// src/recipe/kitchen/lock.rs

//! Exclusive lock on a cook's working area
//!
//! Different settings combinations never share a working area because the
//! area path is segmented by package id. Two cooks of the same combination
//! would, so the second one fails fast instead of waiting.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Held for the duration of a cook; released on drop
pub struct AreaLock {
    /// The lock file handle (kept open to maintain lock)
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl AreaLock {
    /// Lock file guarding a working area; lives next to the area so
    /// cleaning the area never removes it
    pub fn path_for(area: &Path) -> PathBuf {
        area.with_extension("lock")
    }

    /// Take the lock or fail with [`Error::Busy`]
    pub fn try_acquire(area: &Path) -> Result<Self> {
        let path = Self::path_for(area);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired working area lock at {}", path.display());
                Ok(Self { file, path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(Error::Busy(format!(
                "{} is locked by another cook",
                area.display()
            ))),
            Err(e) => Err(Error::IoError(format!(
                "Failed to lock {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AreaLock {
    fn drop(&mut self) {
        // Lock is released when the file is closed
        debug!("Released working area lock at {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_lock_is_busy() {
        let temp_dir = TempDir::new().unwrap();
        let area = temp_dir.path().join("widget-0.3.0").join("0123456789abcdef");

        let lock = AreaLock::try_acquire(&area).unwrap();
        assert!(lock.path().exists());
        assert!(matches!(AreaLock::try_acquire(&area), Err(Error::Busy(_))));

        drop(lock);
        assert!(AreaLock::try_acquire(&area).is_ok());
    }

    #[test]
    fn test_distinct_areas_do_not_contend() {
        let temp_dir = TempDir::new().unwrap();
        let a = AreaLock::try_acquire(&temp_dir.path().join("pkg/aaaa")).unwrap();
        let b = AreaLock::try_acquire(&temp_dir.path().join("pkg/bbbb")).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
