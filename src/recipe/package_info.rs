// src/recipe/package_info.rs

//! The consumption contract a built package exposes to its dependents

use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Where a shipped library comes from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LibraryOrigin {
    /// Built from the package's own sources
    Primary,
    /// A third-party archive built from vendored sources and shipped alongside
    Bundled,
}

/// A library file a consumer links against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryArtifact {
    /// Link name without prefix or extension (`ptm` for `libptm.a`)
    pub name: String,
    pub origin: LibraryOrigin,
}

impl LibraryArtifact {
    pub fn new(name: impl Into<String>, origin: LibraryOrigin) -> Self {
        Self {
            name: name.into(),
            origin,
        }
    }
}

/// How a library is linked, which decides its on-disk file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Static,
    Shared,
}

/// File name of a library as produced by the platform toolchain
///
/// On Windows a shared library is consumed through its import library,
/// so both kinds resolve to `<name>.lib`.
pub fn library_filename(name: &str, kind: LinkKind, settings: &Settings) -> String {
    if settings.is_windows() {
        return format!("{}.lib", name);
    }
    match kind {
        LinkKind::Static => format!("lib{}.a", name),
        LinkKind::Shared if settings.is_apple() => format!("lib{}.dylib", name),
        LinkKind::Shared => format!("lib{}.so", name),
    }
}

/// Metadata a consumer needs after a successful build
///
/// Produced only by the `package_info` phase; an immutable snapshot for
/// one settings combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Libraries in link order
    pub libs: Vec<LibraryArtifact>,
    /// Build-system target alias (`coretoolkit::coretoolkit`)
    pub target: String,
    /// Dependency aliases a consumer must also link, in declared order
    pub requires: Vec<String>,
    /// Include directories relative to the package folder
    #[serde(default = "default_include_dirs")]
    pub include_dirs: Vec<String>,
    /// Library directories relative to the package folder
    #[serde(default = "default_lib_dirs")]
    pub lib_dirs: Vec<String>,
    /// Preprocessor definitions consumers must compile with
    #[serde(default)]
    pub defines: Vec<String>,
}

pub(crate) fn default_include_dirs() -> Vec<String> {
    vec!["include".to_string()]
}

pub(crate) fn default_lib_dirs() -> Vec<String> {
    vec!["lib".to_string()]
}

impl PackageInfo {
    /// Link names in order
    pub fn library_names(&self) -> Vec<&str> {
        self.libs.iter().map(|l| l.name.as_str()).collect()
    }

    /// The library built from the package's own sources
    pub fn primary_library(&self) -> Option<&LibraryArtifact> {
        self.libs.iter().find(|l| l.origin == LibraryOrigin::Primary)
    }

    /// Libraries shipped alongside the primary one
    pub fn bundled_libraries(&self) -> impl Iterator<Item = &LibraryArtifact> {
        self.libs.iter().filter(|l| l.origin == LibraryOrigin::Bundled)
    }

    /// Serialize for publishing next to the package
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
