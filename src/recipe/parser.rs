// src/recipe/parser.rs

//! Recipe file parsing and authoring validation

use crate::error::{Error, Result};
use crate::recipe::format::{PackageType, Recipe};
use crate::recipe::package_info::LibraryOrigin;
use crate::recipe::reference::validate_package_name;
use std::collections::HashSet;
use std::path::{Component, Path};

/// Parse a recipe from a TOML string
pub fn parse_recipe(content: &str) -> Result<Recipe> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("Invalid recipe: {}", e)))
}

/// Parse a recipe from a file
pub fn parse_recipe_file(path: &Path) -> Result<Recipe> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::IoError(format!("Failed to read recipe file {}: {}", path.display(), e))
    })?;

    parse_recipe(&content)
}

/// Reject absolute paths and `..` segments
///
/// Shared by export patterns, package-info directories and layouts: all of
/// them are interpreted relative to a root the recipe must not escape.
pub fn check_relative_path(path: &str, what: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(Error::Authoring(format!("{} is empty", what)));
    }

    let p = Path::new(path);
    for component in p.components() {
        match component {
            Component::ParentDir => {
                return Err(Error::Authoring(format!(
                    "{} '{}' escapes its root with '..'",
                    what, path
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::Authoring(format!("{} '{}' must be relative", what, path)));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    // Windows-style absolute paths on a non-Windows host
    if path.starts_with('\\') || path.as_bytes().get(1) == Some(&b':') {
        return Err(Error::Authoring(format!("{} '{}' must be relative", what, path)));
    }

    Ok(())
}

/// Split a `package::component` alias
fn split_alias(alias: &str) -> Option<(&str, &str)> {
    let (package, component) = alias.split_once("::")?;
    if package.is_empty() || component.is_empty() || component.contains("::") {
        return None;
    }
    Some((package, component))
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_cmake_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a recipe for completeness and correctness
///
/// Everything checked here is an authoring defect: it is detectable from
/// the recipe alone, so it is rejected before any tool runs. Returns
/// non-fatal warnings on success.
pub fn validate_recipe(recipe: &Recipe) -> Result<Vec<String>> {
    let mut warnings = Vec::new();
    let package = &recipe.package;

    validate_package_name(&package.name).map_err(|e| Error::Authoring(e.to_string()))?;
    if package.version.trim().is_empty() {
        return Err(Error::Authoring("Recipe package version cannot be empty".to_string()));
    }
    if package
        .version
        .chars()
        .any(|c| c.is_whitespace() || c == '/' || c == '[' || c == ']')
    {
        return Err(Error::Authoring(format!(
            "Recipe package version '{}' is not a concrete version",
            package.version
        )));
    }

    // Settings axes
    let mut seen_axes = HashSet::new();
    for axis in &recipe.build.settings {
        if !seen_axes.insert(*axis) {
            return Err(Error::Authoring(format!("Settings axis '{}' declared twice", axis)));
        }
    }

    // Requirements
    let mut declared = HashSet::new();
    for req in &recipe.build.requires {
        if req.name == package.name {
            return Err(Error::Authoring(format!("Package '{}' requires itself", req.name)));
        }
        if !declared.insert(req.name.as_str()) {
            return Err(Error::Authoring(format!(
                "Requirement '{}' declared more than once",
                req.name
            )));
        }
    }

    // Cache definitions are written unquoted into the generated toolchain
    for key in recipe.build.definitions.keys() {
        if !is_cmake_identifier(key) {
            return Err(Error::Authoring(format!(
                "Build definition '{}' is not a valid CMake variable name",
                key
            )));
        }
    }

    // Exported source patterns
    for pattern in &recipe.exports.sources {
        check_relative_path(pattern, "Export pattern")?;
        glob::Pattern::new(pattern).map_err(|e| {
            Error::Authoring(format!("Export pattern '{}' is malformed: {}", pattern, e))
        })?;
    }
    if recipe.exports.sources.is_empty() && package.package_type != PackageType::HeaderOnly {
        warnings.push("No exported sources; the build will see an empty source tree".to_string());
    }

    // Consumption contract: target alias
    let target = recipe.target_alias();
    if split_alias(&target).is_none() {
        return Err(Error::Authoring(format!(
            "Target alias '{}' must have the form package::component",
            target
        )));
    }

    // Consumption contract: dependency aliases must point at declared requirements
    let aliases = recipe.dependency_aliases();
    let mut seen_aliases = HashSet::new();
    let mut referenced = HashSet::new();
    for alias in &aliases {
        let (dep, _) = split_alias(alias).ok_or_else(|| {
            Error::Authoring(format!(
                "Dependency alias '{}' must have the form package::component",
                alias
            ))
        })?;
        if !declared.contains(dep) {
            return Err(Error::Authoring(format!(
                "Dependency alias '{}' refers to '{}', which is not a declared requirement",
                alias, dep
            )));
        }
        if !seen_aliases.insert(alias.as_str()) {
            return Err(Error::Authoring(format!("Dependency alias '{}' listed twice", alias)));
        }
        referenced.insert(dep);
    }
    for req in &recipe.build.requires {
        if !referenced.contains(req.name.as_str()) {
            warnings.push(format!(
                "Requirement '{}' is not exposed to consumers in package_info.requires",
                req.name
            ));
        }
    }

    // Consumption contract: libraries
    let libs = recipe.libraries();
    let mut seen_libs = HashSet::new();
    for lib in &libs {
        if lib.name.trim().is_empty() || lib.name.contains(['/', '\\']) {
            return Err(Error::Authoring(format!("Invalid library name '{}'", lib.name)));
        }
        if !seen_libs.insert(lib.name.as_str()) {
            return Err(Error::Authoring(format!("Library '{}' listed twice", lib.name)));
        }
    }
    let primaries = libs
        .iter()
        .filter(|l| l.origin == LibraryOrigin::Primary)
        .count();
    match package.package_type {
        PackageType::StaticLibrary | PackageType::SharedLibrary => {
            if libs.is_empty() {
                return Err(Error::Authoring(format!(
                    "A {} package must declare at least one library in package_info.libs",
                    package.package_type
                )));
            }
            if primaries != 1 {
                return Err(Error::Authoring(format!(
                    "Expected exactly one primary library, found {}",
                    primaries
                )));
            }
        }
        PackageType::HeaderOnly => {
            if !libs.is_empty() {
                return Err(Error::Authoring(
                    "A header-only package cannot declare libraries".to_string(),
                ));
            }
        }
        PackageType::Application => {}
    }

    // Consumption contract: directories
    let info = recipe.package_info();
    for dir in info.include_dirs.iter().chain(info.lib_dirs.iter()) {
        check_relative_path(dir, "Package directory")?;
    }

    // Warn about missing fields
    if package.license.is_none() {
        warnings.push("Missing package license".to_string());
    }
    if package.description.is_none() {
        warnings.push("Missing package description".to_string());
    }

    Ok(warnings)
}
