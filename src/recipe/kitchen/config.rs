// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen

use crate::error::{Error, Result};
use crate::recipe::export::ExportManifest;
use crate::recipe::kitchen::manifest::InstalledManifest;
use crate::recipe::kitchen::phase::PhaseRecord;
use crate::recipe::package_info::PackageInfo;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Configuration for the Kitchen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitchenConfig {
    /// Root under which per-package working areas are created
    pub work_root: PathBuf,
    /// Number of parallel jobs handed to the build tool
    pub jobs: u32,
    /// Keep the build tree after a successful cook (for debugging)
    pub keep_workdir: bool,
    /// Build tool program; located on PATH when unset
    pub cmake_program: Option<PathBuf>,
    /// Generator override; the recipe's (or the tool's default) when unset
    pub generator: Option<String>,
    /// Extra cache definitions for every configure step
    pub definitions: BTreeMap<String, String>,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        Self {
            work_root: std::env::temp_dir().join("recipekit"),
            jobs,
            keep_workdir: false,
            cmake_program: None,
            generator: None,
            definitions: BTreeMap::new(),
        }
    }
}

impl KitchenConfig {
    /// Defaults overridden by `RECIPEKIT_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    ///
    /// Recognizes `RECIPEKIT_WORK_ROOT`, `RECIPEKIT_JOBS`, `RECIPEKIT_CMAKE`
    /// and `RECIPEKIT_GENERATOR`. Empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(root) = get("RECIPEKIT_WORK_ROOT") {
            config.work_root = PathBuf::from(root);
        }
        if let Some(jobs) = get("RECIPEKIT_JOBS") {
            config.jobs = jobs
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|j| *j > 0)
                .ok_or_else(|| {
                    Error::ParseError(format!("RECIPEKIT_JOBS must be a positive integer, got '{}'", jobs))
                })?;
        }
        if let Some(cmake) = get("RECIPEKIT_CMAKE") {
            config.cmake_program = Some(PathBuf::from(cmake));
        }
        if let Some(generator) = get("RECIPEKIT_GENERATOR") {
            config.generator = Some(generator);
        }

        Ok(config)
    }

    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = root.into();
        self
    }

    pub fn with_jobs(mut self, jobs: u32) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_keep_workdir(mut self, keep: bool) -> Self {
        self.keep_workdir = keep;
        self
    }

    pub fn with_cmake_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.cmake_program = Some(program.into());
        self
    }

    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    pub fn with_definition(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.definitions.insert(key.into(), value.into());
        self
    }
}

/// Result of cooking a recipe
#[derive(Debug, Clone)]
pub struct CookResult {
    /// Binary identity for the settings combination
    pub package_id: String,
    /// Where the package was installed; `package_info.json` sits at its root
    pub package_folder: PathBuf,
    /// Published consumption contract
    pub package_info: PackageInfo,
    /// Files installed by the package phase
    pub installed: InstalledManifest,
    /// Sources the build saw
    pub exported: ExportManifest,
    /// Completed phases with timings
    pub history: Vec<PhaseRecord>,
    /// Build log
    pub log: String,
    /// Non-fatal validation warnings
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_kitchen_config_default() {
        let config = KitchenConfig::default();
        assert!(config.jobs > 0);
        assert!(!config.keep_workdir);
        assert!(config.cmake_program.is_none());
        assert!(config.work_root.ends_with("recipekit"));
    }

    #[test]
    fn test_kitchen_config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("RECIPEKIT_WORK_ROOT", "/srv/cooks"),
            ("RECIPEKIT_JOBS", "3"),
            ("RECIPEKIT_CMAKE", "/opt/cmake/bin/cmake"),
            ("RECIPEKIT_GENERATOR", ""),
        ]);
        let config = KitchenConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.work_root, PathBuf::from("/srv/cooks"));
        assert_eq!(config.jobs, 3);
        assert_eq!(config.cmake_program, Some(PathBuf::from("/opt/cmake/bin/cmake")));
        assert!(config.generator.is_none());
    }

    #[test]
    fn test_kitchen_config_bad_jobs() {
        for bad in ["zero", "0", "-2"] {
            let result = KitchenConfig::from_lookup(|k| {
                (k == "RECIPEKIT_JOBS").then(|| bad.to_string())
            });
            assert!(result.is_err(), "accepted RECIPEKIT_JOBS={}", bad);
        }
    }

    #[test]
    fn test_kitchen_config_builders() {
        let config = KitchenConfig::default()
            .with_work_root("/tmp/k")
            .with_jobs(0)
            .with_keep_workdir(true)
            .with_generator("Ninja")
            .with_definition("BUILD_TESTING", "OFF");
        assert_eq!(config.jobs, 1);
        assert!(config.keep_workdir);
        assert_eq!(config.generator.as_deref(), Some("Ninja"));
        assert_eq!(config.definitions["BUILD_TESTING"], "OFF");
    }
}
