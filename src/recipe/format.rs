// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files that declare a package's identity, the settings
//! axes that influence its binaries, its upstream requirements, the files
//! that make up its exported source snapshot, and the consumption contract
//! it publishes once built.

use crate::hash::{HashAlgorithm, Hasher};
use crate::recipe::package_info::{
    LibraryArtifact, LibraryOrigin, LinkKind, PackageInfo, default_include_dirs, default_lib_dirs,
};
use crate::recipe::reference::{PackageReference, Requirement};
use crate::settings::{SettingAxis, Settings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

/// A complete recipe for building a package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package identity and metadata
    pub package: PackageSection,

    /// Settings axes, requirements and build-tool configuration
    #[serde(default)]
    pub build: BuildSection,

    /// Files snapshotted when the recipe is exported
    #[serde(default)]
    pub exports: ExportSection,

    /// Consumption contract published after a successful build
    #[serde(default)]
    pub package_info: PackageInfoSection,
}

/// What kind of artifact the package produces
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PackageType {
    StaticLibrary,
    SharedLibrary,
    HeaderOnly,
    Application,
}

impl PackageType {
    /// How consumers link this package's libraries, if it ships any
    pub fn link_kind(&self) -> Option<LinkKind> {
        match self {
            PackageType::StaticLibrary => Some(LinkKind::Static),
            PackageType::SharedLibrary => Some(LinkKind::Shared),
            PackageType::HeaderOnly | PackageType::Application => None,
        }
    }

    /// Whether the package must ship at least one linkable library
    pub fn is_library(&self) -> bool {
        self.link_kind().is_some()
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Package name, unique within an index
    pub name: String,

    /// Package version
    pub version: String,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Artifact kind
    #[serde(rename = "type")]
    pub package_type: PackageType,

    /// Short description
    #[serde(default)]
    pub description: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,

    /// Recipe repository URL
    #[serde(default)]
    pub url: Option<String>,

    /// Maintainer
    #[serde(default)]
    pub author: Option<String>,

    /// Index keywords
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Build section: axes, requirements and tool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    /// Axes that influence the binaries, in declared order
    #[serde(default)]
    pub settings: Vec<SettingAxis>,

    /// Upstream requirements, in declared order
    ///
    /// Format: `["onetbb/2021.12.0", "fmt/[>=10 <11]"]`
    #[serde(default)]
    pub requires: Vec<Requirement>,

    /// Build-tool generator (e.g. "Ninja"); the tool's default when unset
    #[serde(default)]
    pub generator: Option<String>,

    /// Cache variables written into the generated toolchain
    #[serde(default)]
    pub definitions: BTreeMap<String, String>,
}

/// Exported source set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportSection {
    /// Glob patterns relative to the recipe directory
    #[serde(default)]
    pub sources: Vec<String>,
}

/// A library entry as authored: bare name or name with explicit origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LibrarySpec {
    /// Shorthand; primary when equal to the package name, bundled otherwise
    Name(String),
    Detailed {
        name: String,
        origin: LibraryOrigin,
    },
}

impl LibrarySpec {
    pub fn name(&self) -> &str {
        match self {
            LibrarySpec::Name(name) => name,
            LibrarySpec::Detailed { name, .. } => name,
        }
    }
}

/// Consumption contract as authored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageInfoSection {
    /// Build-system target alias; `name::name` when unset
    #[serde(default)]
    pub target: Option<String>,

    /// Libraries in link order
    #[serde(default)]
    pub libs: Vec<LibrarySpec>,

    /// Dependency aliases consumers link; every requirement's `dep::dep` when unset
    #[serde(default)]
    pub requires: Option<Vec<String>>,

    #[serde(default)]
    pub include_dirs: Option<Vec<String>>,

    #[serde(default)]
    pub lib_dirs: Option<Vec<String>>,

    #[serde(default)]
    pub defines: Vec<String>,
}

/// The metadata surface a runtime indexes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeMetadata {
    pub name: String,
    pub version: String,
    pub license: Option<String>,
    pub package_type: PackageType,
    pub settings: Vec<SettingAxis>,
    pub requires: Vec<String>,
}

impl Recipe {
    /// `name/version` of this recipe
    pub fn reference(&self) -> PackageReference {
        PackageReference::new(&self.package.name, &self.package.version)
    }

    /// Look up a declared requirement by package name
    pub fn requirement(&self, name: &str) -> Option<&Requirement> {
        self.build.requires.iter().find(|r| r.name == name)
    }

    /// Build-system alias consumers refer to this package by
    pub fn target_alias(&self) -> String {
        self.package_info
            .target
            .clone()
            .unwrap_or_else(|| format!("{0}::{0}", self.package.name))
    }

    /// Dependency aliases a consumer must also link, in declared order
    pub fn dependency_aliases(&self) -> Vec<String> {
        match &self.package_info.requires {
            Some(aliases) => aliases.clone(),
            None => self.build.requires.iter().map(|r| r.alias()).collect(),
        }
    }

    /// Shipped libraries with their origin made explicit
    pub fn libraries(&self) -> Vec<LibraryArtifact> {
        self.package_info
            .libs
            .iter()
            .map(|spec| match spec {
                LibrarySpec::Name(name) if *name == self.package.name => {
                    LibraryArtifact::new(name, LibraryOrigin::Primary)
                }
                LibrarySpec::Name(name) => LibraryArtifact::new(name, LibraryOrigin::Bundled),
                LibrarySpec::Detailed { name, origin } => LibraryArtifact::new(name, *origin),
            })
            .collect()
    }

    /// The consumption contract; pure, performs no I/O
    pub fn package_info(&self) -> PackageInfo {
        PackageInfo {
            libs: self.libraries(),
            target: self.target_alias(),
            requires: self.dependency_aliases(),
            include_dirs: self
                .package_info
                .include_dirs
                .clone()
                .unwrap_or_else(default_include_dirs),
            lib_dirs: self
                .package_info
                .lib_dirs
                .clone()
                .unwrap_or_else(default_lib_dirs),
            defines: self.package_info.defines.clone(),
        }
    }

    /// Identity and dependency surface read by an index
    pub fn metadata(&self) -> RecipeMetadata {
        RecipeMetadata {
            name: self.package.name.clone(),
            version: self.package.version.clone(),
            license: self.package.license.clone(),
            package_type: self.package.package_type,
            settings: self.build.settings.clone(),
            requires: self.build.requires.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Binary identity for one settings combination
    ///
    /// Covers the package identity, the values of the declared axes only,
    /// and the declared requirements in order.
    pub fn package_id(&self, settings: &Settings) -> String {
        let mut hasher = Hasher::new(HashAlgorithm::Sha256);
        hasher.update_field("name", &self.package.name);
        hasher.update_field("version", &self.package.version);
        hasher.update_field("type", &self.package.package_type.to_string());

        for (key, value) in settings.canonical_entries(&self.build.settings) {
            hasher.update_field(&format!("settings.{}", key), &value);
        }
        for req in &self.build.requires {
            hasher.update_field("requires", &req.to_string());
        }
        for (key, value) in &self.build.definitions {
            hasher.update_field(&format!("define.{}", key), value);
        }

        hasher.finalize().value
    }
}
