// src/recipe/kitchen/layout.rs

//! Directory layout a cook works in
//!
//! The layout phase only records where things go. Folders are declared
//! relative to the roots the runtime hands over in the [`CookContext`], then
//! joined onto them; nothing is created on disk here.

use crate::error::Result;
use crate::recipe::kitchen::cook::CookContext;
use crate::recipe::parser::check_relative_path;
use crate::settings::BuildType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the toolchain file written by the generate phase
pub const TOOLCHAIN_FILE: &str = "recipekit_toolchain.cmake";

/// Folder names relative to the context roots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSpec {
    /// Relative to the exported source root
    pub source: String,
    /// Relative to the working area
    pub build: String,
    /// Relative to the working area
    pub generators: String,
}

impl LayoutSpec {
    /// The conventional CMake layout: one build tree per build type
    pub fn cmake(build_type: BuildType) -> Self {
        let build = format!("build/{}", build_type);
        Self {
            source: ".".to_string(),
            generators: format!("{}/generators", build),
            build,
        }
    }

    /// Reject absolute folders and `..` segments
    pub fn validate(&self) -> Result<()> {
        check_relative_path(&self.source, "Layout source folder")?;
        check_relative_path(&self.build, "Layout build folder")?;
        check_relative_path(&self.generators, "Layout generators folder")?;
        Ok(())
    }

    /// Join the folders onto the context roots
    pub fn resolve(&self, ctx: &CookContext) -> Result<Layout> {
        self.validate()?;
        Ok(Layout {
            source_folder: ctx.source_root.join(&self.source),
            build_folder: ctx.work_root.join(&self.build),
            generators_folder: ctx.work_root.join(&self.generators),
            package_folder: ctx.package_folder.clone(),
        })
    }
}

/// Absolute folders for one cook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub source_folder: PathBuf,
    pub build_folder: PathBuf,
    pub generators_folder: PathBuf,
    pub package_folder: PathBuf,
}

impl Layout {
    pub fn toolchain_file(&self) -> PathBuf {
        self.generators_folder.join(TOOLCHAIN_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::kitchen::resolver::ResolvedDependencies;
    use std::path::Path;

    fn context() -> CookContext {
        CookContext::new(
            "/work/area/source",
            "/work/area",
            "/work/area/package",
            ResolvedDependencies::default(),
        )
    }

    #[test]
    fn test_cmake_layout() {
        let layout = LayoutSpec::cmake(BuildType::Release)
            .resolve(&context())
            .unwrap();

        assert_eq!(layout.build_folder, Path::new("/work/area/build/Release"));
        assert_eq!(
            layout.generators_folder,
            Path::new("/work/area/build/Release/generators")
        );
        assert_eq!(layout.package_folder, Path::new("/work/area/package"));
        assert_eq!(
            layout.toolchain_file(),
            Path::new("/work/area/build/Release/generators/recipekit_toolchain.cmake")
        );
    }

    #[test]
    fn test_build_type_separates_trees() {
        let debug = LayoutSpec::cmake(BuildType::Debug);
        let release = LayoutSpec::cmake(BuildType::Release);
        assert_ne!(debug.build, release.build);
        assert_eq!(debug.build, "build/Debug");
    }

    #[test]
    fn test_malformed_layout_rejected() {
        let mut spec = LayoutSpec::cmake(BuildType::Release);
        spec.generators = "../generators".to_string();
        assert!(spec.resolve(&context()).unwrap_err().is_authoring());

        let mut spec = LayoutSpec::cmake(BuildType::Release);
        spec.build = "/tmp/build".to_string();
        assert!(spec.validate().unwrap_err().is_authoring());
    }
}
