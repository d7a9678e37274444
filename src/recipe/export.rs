// src/recipe/export.rs

//! Exported source set: expanding a recipe's patterns and snapshotting them
//!
//! Patterns are globs relative to the recipe directory. A pattern that
//! matches a directory pulls in everything beneath it. The expanded set is
//! deduplicated and sorted so the same tree always exports the same way.

use crate::error::{Error, Result};
use crate::hash::{HashAlgorithm, Hasher, hash_file};
use crate::recipe::parser::check_relative_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// A file copied into the export destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    /// Path relative to the recipe directory, `/`-separated
    pub path: String,
    pub size: u64,
    /// xxh128 of the contents
    pub xxh128: String,
}

/// Result of exporting a recipe's sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Files in path order
    pub files: Vec<ExportedFile>,
    /// SHA-256 over every file's path, size and content digest
    pub digest: String,
}

impl ExportManifest {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }
}

fn relative_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Expand export patterns into the sorted set of files they cover
///
/// Returned paths are relative to `recipe_dir`. Every pattern must match at
/// least one path; a pattern matching nothing fails the export.
pub fn collect_export_set(recipe_dir: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    // Glob drops a leading `./`; match and strip against the resolved directory
    let recipe_dir = recipe_dir.canonicalize().map_err(|e| {
        Error::ExportFailed(format!(
            "recipe directory {} is not accessible: {}",
            recipe_dir.display(),
            e
        ))
    })?;
    let recipe_dir = recipe_dir.as_path();
    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let root = glob::Pattern::escape(&recipe_dir.to_string_lossy());
    let mut files = BTreeSet::new();

    for pattern in patterns {
        check_relative_path(pattern, "Export pattern")?;
        let full = format!("{}/{}", root.trim_end_matches('/'), pattern);

        let entries = glob::glob_with(&full, options).map_err(|e| {
            Error::Authoring(format!("Export pattern '{}' is malformed: {}", pattern, e))
        })?;

        let mut matched = 0usize;
        for entry in entries {
            let path = entry.map_err(|e| {
                Error::IoError(format!("Failed to read {}: {}", e.path().display(), e.error()))
            })?;
            matched += 1;

            if path.is_dir() {
                for item in WalkDir::new(&path).sort_by_file_name() {
                    let item = item.map_err(|e| {
                        Error::IoError(format!("Failed to walk {}: {}", path.display(), e))
                    })?;
                    if !item.file_type().is_dir() {
                        files.insert(item.into_path());
                    }
                }
            } else {
                files.insert(path);
            }
        }

        if matched == 0 {
            return Err(Error::ExportFailed(format!(
                "pattern '{}' matched nothing under {}",
                pattern,
                recipe_dir.display()
            )));
        }
        debug!("Export pattern '{}' matched {} path(s)", pattern, matched);
    }

    files
        .into_iter()
        .map(|path| {
            path.strip_prefix(recipe_dir)
                .map(Path::to_path_buf)
                .map_err(|_| {
                    Error::ExportFailed(format!(
                        "{} is outside {}",
                        path.display(),
                        recipe_dir.display()
                    ))
                })
        })
        .collect()
}

/// Copy the exported source set into `dest`
///
/// Relative paths are preserved. Files already present in `dest` are
/// overwritten; callers that need a pristine snapshot start from an empty
/// directory.
pub fn export_sources(recipe_dir: &Path, patterns: &[String], dest: &Path) -> Result<ExportManifest> {
    let set = collect_export_set(recipe_dir, patterns)?;
    fs::create_dir_all(dest).map_err(|e| {
        Error::IoError(format!("Failed to create {}: {}", dest.display(), e))
    })?;

    let mut files = Vec::with_capacity(set.len());
    let mut digest = Hasher::new(HashAlgorithm::Sha256);

    for relative in &set {
        let from = recipe_dir.join(relative);
        let to = dest.join(relative);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        let size = fs::copy(&from, &to).map_err(|e| {
            Error::IoError(format!("Failed to export {}: {}", from.display(), e))
        })?;
        let xxh128 = hash_file(HashAlgorithm::Xxh128, &to)?.value;

        let path = relative_string(relative);
        digest.update_field("path", &path);
        digest.update_field("size", &size.to_string());
        digest.update_field("xxh128", &xxh128);

        files.push(ExportedFile { path, size, xxh128 });
    }

    let manifest = ExportManifest {
        files,
        digest: digest.finalize().value,
    };
    info!(
        "Exported {} file(s) to {} ({})",
        manifest.len(),
        dest.display(),
        &manifest.digest[..12]
    );
    Ok(manifest)
}
