// src/recipe/kitchen/resolver.rs

//! Dependency resolution for recipe builds
//!
//! The kitchen stays decoupled from any package index: it asks a
//! [`DependencyResolver`] for each declared requirement and hands the
//! resolved set to the generate phase.

use crate::error::{Error, Result};
use crate::recipe::kitchen::manifest::PACKAGE_INFO_FILE;
use crate::recipe::package_info::PackageInfo;
use crate::recipe::reference::{PackageReference, Requirement, lenient_version};
use crate::settings::Settings;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A requirement pinned to a concrete, built package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    /// Exact `name/version`
    pub reference: PackageReference,
    /// Root of the dependency's installed files
    pub package_folder: PathBuf,
    /// The dependency's published consumption contract
    pub info: PackageInfo,
}

impl ResolvedDependency {
    pub fn new(
        reference: PackageReference,
        package_folder: impl Into<PathBuf>,
        info: PackageInfo,
    ) -> Self {
        Self {
            reference,
            package_folder: package_folder.into(),
            info,
        }
    }
}

/// Resolved dependencies in declared order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDependencies {
    entries: Vec<ResolvedDependency>,
}

impl ResolvedDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for a package name
    pub fn insert(&mut self, dep: ResolvedDependency) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.reference.name == dep.reference.name)
        {
            Some(existing) => *existing = dep,
            None => self.entries.push(dep),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedDependency> {
        self.entries.iter().find(|e| e.reference.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ResolvedDependency> for ResolvedDependencies {
    fn from_iter<I: IntoIterator<Item = ResolvedDependency>>(iter: I) -> Self {
        let mut deps = Self::new();
        for dep in iter {
            deps.insert(dep);
        }
        deps
    }
}

/// Resolves declared requirements to built packages
///
/// Implementations back onto whatever index or cache the embedding runtime
/// has. Failing to resolve is reported as [`Error::ResolutionError`].
pub trait DependencyResolver: Send + Sync {
    fn resolve(&self, requirement: &Requirement, settings: &Settings)
    -> Result<ResolvedDependency>;
}

/// In-memory resolver over a fixed set of packages
#[derive(Debug, Default)]
pub struct StaticResolver {
    packages: HashMap<String, Vec<ResolvedDependency>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a package available
    pub fn add(&mut self, dep: ResolvedDependency) {
        self.packages
            .entry(dep.reference.name.clone())
            .or_default()
            .push(dep);
    }

    pub fn with(mut self, dep: ResolvedDependency) -> Self {
        self.add(dep);
        self
    }
}

impl DependencyResolver for StaticResolver {
    fn resolve(&self, requirement: &Requirement, _settings: &Settings) -> Result<ResolvedDependency> {
        let candidates = self.packages.get(&requirement.name).ok_or_else(|| {
            Error::ResolutionError(format!("{} is not available", requirement))
        })?;

        pick_highest(candidates.iter().filter(|d| requirement.is_satisfied_by(&d.reference)))
            .cloned()
            .ok_or_else(|| {
                Error::ResolutionError(format!("no available version satisfies {}", requirement))
            })
    }
}

fn compare_versions(a: &str, b: &str) -> Ordering {
    lenient_version(a)
        .cmp(&lenient_version(b))
        .then_with(|| a.cmp(b))
}

fn pick_highest<'a>(
    candidates: impl Iterator<Item = &'a ResolvedDependency>,
) -> Option<&'a ResolvedDependency> {
    candidates.max_by(|a, b| compare_versions(&a.reference.version, &b.reference.version))
}

/// Resolver over a directory of built packages
///
/// Expects `<root>/<name>/<version>/package_info.json`, with the package's
/// installed files alongside it.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    /// Relative roots are made absolute: generated config files point into them
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            root: std::path::absolute(&root).unwrap_or(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self, name: &str, version: &str) -> Result<ResolvedDependency> {
        let folder = self.root.join(name).join(version);
        let info_path = folder.join(PACKAGE_INFO_FILE);
        let content = fs::read_to_string(&info_path).map_err(|e| {
            Error::ResolutionError(format!(
                "{}/{}: cannot read {}: {}",
                name,
                version,
                info_path.display(),
                e
            ))
        })?;
        let info: PackageInfo = serde_json::from_str(&content).map_err(|e| {
            Error::ParseError(format!("Invalid {}: {}", info_path.display(), e))
        })?;

        Ok(ResolvedDependency::new(
            PackageReference::new(name, version),
            folder,
            info,
        ))
    }

    fn available_versions(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.root.join(name);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.path().join(PACKAGE_INFO_FILE).is_file() {
                versions.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(versions)
    }
}

impl DependencyResolver for DirectoryResolver {
    fn resolve(&self, requirement: &Requirement, _settings: &Settings) -> Result<ResolvedDependency> {
        let versions = self.available_versions(&requirement.name)?;
        let candidates: Vec<PackageReference> = versions
            .into_iter()
            .map(|v| PackageReference::new(&requirement.name, v))
            .filter(|r| requirement.is_satisfied_by(r))
            .collect();

        let best = candidates
            .iter()
            .max_by(|a, b| compare_versions(&a.version, &b.version))
            .ok_or_else(|| {
                Error::ResolutionError(format!(
                    "no package under {} satisfies {}",
                    self.root.display(),
                    requirement
                ))
            })?;

        debug!("Resolved {} to {}", requirement, best);
        self.load(&best.name, &best.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::package_info::{LibraryArtifact, LibraryOrigin};
    use tempfile::TempDir;

    fn info(name: &str) -> PackageInfo {
        PackageInfo {
            libs: vec![LibraryArtifact::new(name, LibraryOrigin::Primary)],
            target: format!("{0}::{0}", name),
            requires: Vec::new(),
            include_dirs: vec!["include".to_string()],
            lib_dirs: vec!["lib".to_string()],
            defines: Vec::new(),
        }
    }

    fn dep(name: &str, version: &str) -> ResolvedDependency {
        ResolvedDependency::new(
            PackageReference::new(name, version),
            format!("/deps/{}/{}", name, version),
            info(name),
        )
    }

    #[test]
    fn test_static_resolver_exact_and_range() {
        let resolver = StaticResolver::new()
            .with(dep("fmt", "9.1.0"))
            .with(dep("fmt", "10.1.0"))
            .with(dep("fmt", "10.2.1"));
        let settings = Settings::new();

        let exact = resolver
            .resolve(&"fmt/10.1.0".parse().unwrap(), &settings)
            .unwrap();
        assert_eq!(exact.reference.version, "10.1.0");

        let range = resolver
            .resolve(&"fmt/[>=10 <11]".parse().unwrap(), &settings)
            .unwrap();
        assert_eq!(range.reference.version, "10.2.1");

        let err = resolver
            .resolve(&"fmt/11.0.0".parse().unwrap(), &settings)
            .unwrap_err();
        assert!(matches!(err, Error::ResolutionError(_)));

        let err = resolver
            .resolve(&"spdlog/1.14.1".parse().unwrap(), &settings)
            .unwrap_err();
        assert!(err.to_string().contains("spdlog"));
    }

    #[test]
    fn test_resolved_dependencies_keep_order() {
        let deps: ResolvedDependencies = [dep("onetbb", "2021.12.0"), dep("spdlog", "1.14.1")]
            .into_iter()
            .collect();
        let names: Vec<&str> = deps.iter().map(|d| d.reference.name.as_str()).collect();
        assert_eq!(names, vec!["onetbb", "spdlog"]);
        assert!(deps.get("spdlog").is_some());
        assert!(deps.get("fmt").is_none());
    }

    fn publish(root: &Path, name: &str, version: &str) {
        let folder = root.join(name).join(version);
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(PACKAGE_INFO_FILE), info(name).to_json().unwrap()).unwrap();
    }

    #[test]
    fn test_directory_resolver_picks_highest_match() {
        let dir = TempDir::new().unwrap();
        publish(dir.path(), "spdlog", "1.13.0");
        publish(dir.path(), "spdlog", "1.14.1");
        publish(dir.path(), "spdlog", "2.0.0");
        // A version folder without published info is not a candidate
        fs::create_dir_all(dir.path().join("spdlog/1.99.0")).unwrap();

        let resolver = DirectoryResolver::new(dir.path());
        let settings = Settings::new();

        let resolved = resolver
            .resolve(&"spdlog/[>=1.0 <2.0]".parse().unwrap(), &settings)
            .unwrap();
        assert_eq!(resolved.reference, PackageReference::new("spdlog", "1.14.1"));
        assert_eq!(resolved.package_folder, dir.path().join("spdlog/1.14.1"));
        assert_eq!(resolved.info.target, "spdlog::spdlog");

        assert!(resolver
            .resolve(&"onetbb/2021.12.0".parse().unwrap(), &settings)
            .is_err());
    }

    #[test]
    fn test_directory_resolver_bad_info() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("fmt/10.2.1");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join(PACKAGE_INFO_FILE), "not json").unwrap();

        let resolver = DirectoryResolver::new(dir.path());
        let err = resolver
            .resolve(&"fmt/10.2.1".parse().unwrap(), &Settings::new())
            .unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[test]
    fn test_directory_resolver_root_is_absolute() {
        let resolver = DirectoryResolver::new("deps");
        assert!(resolver.root().is_absolute());
        assert!(resolver.root().ends_with("deps"));
    }
}
