// src/recipe/mod.rs

//! Recipe system for native library packages
//!
//! A recipe declares a package's identity, the settings axes that
//! influence its binaries, the upstream packages it requires, the files
//! that make up its exported sources, and the consumption contract it
//! publishes once built. A runtime drives it through a fixed lifecycle.
//!
//! # Culinary Terminology
//!
//! - **Recipe**: The package descriptor (like a recipe card)
//! - **Cook**: One recipe driven through its lifecycle for one settings combination
//! - **Kitchen**: The runtime that prepares a working area and runs cooks
//!
//! # Lifecycle
//!
//! `layout` → `generate` → `build` → `package` → `package_info`, always in
//! that order. Export and dependency resolution happen before `generate`.
//!
//! # Example Recipe
//!
//! ```toml
//! [package]
//! name = "coretoolkit"
//! version = "1.0.0"
//! license = "MIT"
//! type = "static-library"
//!
//! [build]
//! settings = ["os", "arch", "compiler", "build_type"]
//! requires = ["onetbb/2021.12.0", "spdlog/1.14.1"]
//!
//! [exports]
//! sources = ["CMakeLists.txt", "include/*", "src/*"]
//!
//! [package_info]
//! libs = ["coretoolkit", "ptm"]
//! requires = ["onetbb::onetbb", "spdlog::spdlog"]
//! ```

pub mod export;
mod format;
pub mod kitchen;
mod package_info;
pub mod parser;
mod reference;

pub use export::{ExportManifest, ExportedFile, collect_export_set, export_sources};
pub use format::{
    BuildSection, ExportSection, LibrarySpec, PackageInfoSection, PackageSection, PackageType,
    Recipe, RecipeMetadata,
};
pub use kitchen::{
    BuilderArgs, CMakeBuilder, Cook, CookContext, CookResult, CookState, DependencyResolver,
    DirectoryResolver, ExternalBuilder, InstalledManifest, Kitchen, KitchenConfig, Layout,
    LayoutSpec, Phase, PhaseOutput, PhaseRecord, ResolvedDependencies, ResolvedDependency,
    StaticResolver, ToolOutput,
};
pub use package_info::{LibraryArtifact, LibraryOrigin, LinkKind, PackageInfo, library_filename};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe};
pub use reference::{
    PackageReference, Requirement, VersionConstraint, lenient_version, validate_package_name,
};
