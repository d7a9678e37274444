// src/recipe/kitchen/mod.rs

//! Kitchen: the reference runtime that cooks recipes
//!
//! The Kitchen drives one recipe through its lifecycle for one settings
//! combination. It handles:
//! - Exporting sources into a clean, locked working area
//! - Resolving declared requirements through a [`DependencyResolver`]
//! - Advancing a [`Cook`] through layout, generate, build, package and
//!   package_info
//! - Publishing `package_info.json` next to the installed package

mod builder;
mod config;
mod cook;
pub mod generate;
mod layout;
mod lock;
mod manifest;
mod phase;
pub mod resolver;

pub use builder::{BuilderArgs, CMakeBuilder, ExternalBuilder, ToolOutput};
pub use config::{CookResult, KitchenConfig};
pub use cook::{Cook, CookContext};
pub use layout::{Layout, LayoutSpec, TOOLCHAIN_FILE};
pub use lock::AreaLock;
pub use manifest::{InstalledFile, InstalledManifest, PACKAGE_INFO_FILE};
pub use phase::{CookState, Phase, PhaseOutput, PhaseRecord};
pub use resolver::{
    DependencyResolver, DirectoryResolver, ResolvedDependencies, ResolvedDependency,
    StaticResolver,
};

use crate::error::{Error, Result};
use crate::recipe::export::{ExportManifest, export_sources};
use crate::recipe::format::Recipe;
use crate::recipe::package_info::PackageInfo;
use crate::recipe::parser::validate_recipe;
use crate::settings::Settings;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Length of the package-id prefix used in working-area paths
const AREA_ID_LEN: usize = 16;

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    resolver: Arc<dyn DependencyResolver>,
    builder: Arc<dyn ExternalBuilder>,
}

impl Kitchen {
    /// Create a new Kitchen
    pub fn new(
        mut config: KitchenConfig,
        resolver: Arc<dyn DependencyResolver>,
        builder: Arc<dyn ExternalBuilder>,
    ) -> Self {
        // Build tools run inside the build folder; relative roots would not resolve
        if let Ok(root) = std::path::absolute(&config.work_root) {
            config.work_root = root;
        }
        Self {
            config,
            resolver,
            builder,
        }
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Working area for one package id: `<work_root>/<name>-<version>/<id prefix>`
    pub fn working_area(&self, recipe: &Recipe, package_id: &str) -> PathBuf {
        let prefix = &package_id[..package_id.len().min(AREA_ID_LEN)];
        self.config
            .work_root
            .join(format!("{}-{}", recipe.package.name, recipe.package.version))
            .join(prefix)
    }

    /// Export a recipe's sources without building
    pub fn export(&self, recipe: &Recipe, recipe_dir: &Path, dest: &Path) -> Result<ExportManifest> {
        validate_recipe(recipe)?;
        info!(
            "Exporting {} from {}",
            recipe.reference(),
            recipe_dir.display()
        );
        export_sources(recipe_dir, &recipe.exports.sources, dest)
    }

    /// Resolve every declared requirement, in declared order
    ///
    /// All failures are collected so a single error names every
    /// unsatisfied requirement.
    pub fn resolve_dependencies(
        &self,
        recipe: &Recipe,
        settings: &Settings,
    ) -> Result<ResolvedDependencies> {
        let mut resolved = ResolvedDependencies::new();
        let mut unresolved = Vec::new();

        for req in &recipe.build.requires {
            match self.resolver.resolve(req, settings) {
                Ok(dep) if req.is_satisfied_by(&dep.reference) => {
                    debug!("{} -> {}", req, dep.package_folder.display());
                    resolved.insert(dep);
                }
                Ok(dep) => unresolved.push(format!("{} (resolver returned {})", req, dep.reference)),
                Err(e) => unresolved.push(format!("{} ({})", req, e)),
            }
        }

        if !unresolved.is_empty() {
            return Err(Error::ResolutionError(format!(
                "Unresolved requirements: {}",
                unresolved.join(", ")
            )));
        }
        Ok(resolved)
    }

    /// Cook a recipe for one settings combination
    ///
    /// # Steps
    ///
    /// 1. **Validate**: authoring checks and settings coverage
    /// 2. **Lock**: take the working area for this package id
    /// 3. **Export**: snapshot sources into a clean `<area>/source`
    /// 4. **Resolve**: pin every requirement to a built package
    /// 5. **Cook**: layout, generate, build, package, package_info
    /// 6. **Publish**: write `package_info.json` into the package folder
    /// 7. **Cleanup**: drop the build tree unless `keep_workdir` is set
    pub fn cook(&self, recipe: &Recipe, recipe_dir: &Path, settings: &Settings) -> Result<CookResult> {
        let mut cook = Cook::new(recipe.clone(), settings.clone(), Arc::clone(&self.builder))?;
        let package_id = cook.package_id().to_string();
        let area = self.working_area(recipe, &package_id);

        info!(
            "Cooking {} (package id {})",
            recipe.reference(),
            &package_id[..AREA_ID_LEN]
        );

        let _lock = AreaLock::try_acquire(&area)?;

        if area.exists() {
            debug!("Cleaning working area {}", area.display());
            fs::remove_dir_all(&area).map_err(|e| {
                Error::IoError(format!("Failed to clean {}: {}", area.display(), e))
            })?;
        }
        let source_root = area.join("source");
        let exported = export_sources(recipe_dir, &recipe.exports.sources, &source_root)?;

        let dependencies = self.resolve_dependencies(recipe, settings)?;

        let package_folder = area.join("package");
        let ctx = CookContext::new(&source_root, &area, &package_folder, dependencies)
            .with_jobs(self.config.jobs)
            .with_generator(self.config.generator.clone())
            .with_definitions(self.config.definitions.clone());

        let package_info = cook.run(&ctx)?;

        let info_path = publish_package_info(&package_folder, &package_info)?;
        debug!("Published {}", info_path.display());

        let installed = cook.installed().cloned().unwrap_or_default();

        if !self.config.keep_workdir {
            let build_tree = area.join("build");
            if let Err(e) = fs::remove_dir_all(&build_tree) {
                // Don't fail the cook just because cleanup failed
                warn!("Failed to remove {}: {}", build_tree.display(), e);
            }
        }

        info!(
            "Cooked {}: {} file(s) in {}",
            recipe.reference(),
            installed.len(),
            package_folder.display()
        );

        Ok(CookResult {
            package_id,
            package_folder,
            package_info,
            installed,
            exported,
            history: cook.history().to_vec(),
            log: cook.log().to_string(),
            warnings: cook.warnings().to_vec(),
        })
    }
}

/// Write `package_info.json` into the package folder
///
/// Written to a temporary file first and renamed into place, so a consumer
/// never reads a partial document.
fn publish_package_info(package_folder: &Path, info: &PackageInfo) -> Result<PathBuf> {
    let info_path = package_folder.join(PACKAGE_INFO_FILE);
    let json = info
        .to_json()
        .map_err(|e| Error::IoError(format!("Failed to serialize package info: {}", e)))?;

    let mut staged = NamedTempFile::new_in(package_folder)?;
    staged.write_all(json.as_bytes())?;
    staged.persist(&info_path).map_err(|e| {
        Error::IoError(format!("Failed to write {}: {}", info_path.display(), e.error))
    })?;
    Ok(info_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::package_info::{LibraryArtifact, LibraryOrigin, PackageInfo};
    use crate::recipe::parser::parse_recipe;
    use crate::recipe::reference::PackageReference;

    struct NeverBuilds;

    impl ExternalBuilder for NeverBuilds {
        fn name(&self) -> &str {
            "never"
        }

        fn configure(&self, _args: &BuilderArgs) -> Result<ToolOutput> {
            Err(Error::ToolNotFound("never".to_string()))
        }

        fn build(&self, _args: &BuilderArgs) -> Result<ToolOutput> {
            Err(Error::ToolNotFound("never".to_string()))
        }

        fn install(&self, _args: &BuilderArgs) -> Result<ToolOutput> {
            Err(Error::ToolNotFound("never".to_string()))
        }
    }

    fn recipe() -> Recipe {
        parse_recipe(
            r#"
[package]
name = "coretoolkit"
version = "1.0.0"
type = "static-library"

[build]
requires = ["onetbb/2021.12.0", "spdlog/1.14.1", "fmt/[>=10 <11]"]

[package_info]
libs = ["coretoolkit"]
"#,
        )
        .unwrap()
    }

    fn available(name: &str, version: &str) -> ResolvedDependency {
        ResolvedDependency::new(
            PackageReference::new(name, version),
            format!("/deps/{}/{}", name, version),
            PackageInfo {
                libs: vec![LibraryArtifact::new(name, LibraryOrigin::Primary)],
                target: format!("{0}::{0}", name),
                requires: Vec::new(),
                include_dirs: vec!["include".to_string()],
                lib_dirs: vec!["lib".to_string()],
                defines: Vec::new(),
            },
        )
    }

    fn kitchen(resolver: StaticResolver) -> Kitchen {
        Kitchen::new(
            KitchenConfig::default().with_work_root("/work"),
            Arc::new(resolver),
            Arc::new(NeverBuilds),
        )
    }

    #[test]
    fn test_resolve_dependencies_in_declared_order() {
        let kitchen = kitchen(
            StaticResolver::new()
                .with(available("fmt", "10.2.1"))
                .with(available("spdlog", "1.14.1"))
                .with(available("onetbb", "2021.12.0")),
        );
        let deps = kitchen.resolve_dependencies(&recipe(), &Settings::new()).unwrap();
        let names: Vec<String> = deps.iter().map(|d| d.reference.to_string()).collect();
        assert_eq!(names, vec!["onetbb/2021.12.0", "spdlog/1.14.1", "fmt/10.2.1"]);
    }

    #[test]
    fn test_resolve_dependencies_reports_every_failure() {
        let kitchen = kitchen(StaticResolver::new().with(available("onetbb", "2021.12.0")));
        let err = kitchen
            .resolve_dependencies(&recipe(), &Settings::new())
            .unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, Error::ResolutionError(_)));
        assert!(message.contains("spdlog/1.14.1"));
        assert!(message.contains("fmt/[>=10 <11]"));
        assert!(!message.contains("onetbb"));
    }

    #[test]
    fn test_working_area_segmented_by_package_id() {
        let kitchen = kitchen(StaticResolver::new());
        let recipe = recipe();
        let area = kitchen.working_area(&recipe, "0123456789abcdef0123456789abcdef");
        assert_eq!(area, PathBuf::from("/work/coretoolkit-1.0.0/0123456789abcdef"));
    }

    #[test]
    fn test_publish_package_info_replaces_previous_document() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join(PACKAGE_INFO_FILE), "stale").unwrap();

        let info = available("spdlog", "1.14.1").info;
        let path = publish_package_info(temp.path(), &info).unwrap();

        let written: PackageInfo =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, info);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_relative_work_root_made_absolute() {
        let kitchen = Kitchen::new(
            KitchenConfig::default().with_work_root("work"),
            Arc::new(StaticResolver::new()),
            Arc::new(NeverBuilds),
        );
        assert!(kitchen.config().work_root.is_absolute());
        assert!(kitchen.config().work_root.ends_with("work"));

        let area = kitchen.working_area(&recipe(), "0123456789abcdef0123456789abcdef");
        assert!(area.is_absolute());
    }
}
