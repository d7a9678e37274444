// src/recipe/kitchen/manifest.rs

//! Inventory of the files installed into a package folder

use crate::error::{Error, Result};
use crate::hash::{HashAlgorithm, Hasher, hash_file};
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

/// Published next to the package; excluded from the scan
pub const PACKAGE_INFO_FILE: &str = "package_info.json";

/// A single installed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledFile {
    /// Path relative to the package folder, `/`-separated
    pub path: String,
    pub size: u64,
    pub xxh128: String,
}

/// Every file under a package folder, in path order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledManifest {
    pub files: Vec<InstalledFile>,
    /// SHA-256 over path, size and content digest of each file
    pub digest: String,
}

impl InstalledManifest {
    /// Scan a package folder
    ///
    /// Symlinks are recorded by the file they point at. The published
    /// `package_info.json` is skipped so republishing never changes the
    /// inventory.
    pub fn scan(root: &Path) -> Result<Self> {
        let mut files = Vec::new();
        let mut digest = Hasher::new(HashAlgorithm::Sha256);

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::IoError(format!("Failed to scan {}: {}", root.display(), e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(root).map_err(|_| {
                Error::Integrity(format!("{} escaped the package folder", entry.path().display()))
            })?;
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if path == PACKAGE_INFO_FILE {
                continue;
            }

            let size = entry
                .metadata()
                .map_err(|e| Error::IoError(format!("Failed to stat {}: {}", path, e)))?
                .len();
            let xxh128 = hash_file(HashAlgorithm::Xxh128, entry.path())?.value;

            digest.update_field("path", &path);
            digest.update_field("size", &size.to_string());
            digest.update_field("xxh128", &xxh128);
            files.push(InstalledFile { path, size, xxh128 });
        }

        Ok(Self {
            files,
            digest: digest.finalize().value,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether a relative path was installed
    pub fn contains(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }

    /// Total installed bytes
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}
