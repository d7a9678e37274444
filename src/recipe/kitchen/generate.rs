// src/recipe/kitchen/generate.rs

//! Files the generate phase writes for the build tool
//!
//! - `recipekit_toolchain.cmake`: build type, C++ standard, static/shared
//!   selection, prefix path and cache definitions
//! - `<dep>-config.cmake` and `<dep>-config-version.cmake` per requirement,
//!   describing the resolved package as an imported target

use crate::error::{Error, Result};
use crate::recipe::format::{PackageType, Recipe};
use crate::recipe::kitchen::layout::Layout;
use crate::recipe::kitchen::resolver::{ResolvedDependencies, ResolvedDependency};
use crate::settings::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Forward-slash path for CMake scripts
fn cmake_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Toolchain file contents for one cook
pub fn toolchain_contents(recipe: &Recipe, settings: &Settings, layout: &Layout) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Generated by recipekit for {}\n", recipe.reference()));
    out.push_str("# Do not edit; regenerated on every cook\n");
    out.push('\n');

    out.push_str(&format!(
        "set(CMAKE_BUILD_TYPE {} CACHE STRING \"\" FORCE)\n",
        settings.build_type_or_default(),
    ));

    if let Some((level, gnu)) = settings.compiler.as_ref().and_then(|c| c.cxx_standard()) {
        out.push_str(&format!("set(CMAKE_CXX_STANDARD {})\n", level));
        out.push_str("set(CMAKE_CXX_STANDARD_REQUIRED ON)\n");
        out.push_str(&format!("set(CMAKE_CXX_EXTENSIONS {})\n", if gnu { "ON" } else { "OFF" }));
    }

    match recipe.package.package_type {
        PackageType::StaticLibrary => {
            out.push_str("set(BUILD_SHARED_LIBS OFF CACHE BOOL \"\" FORCE)\n");
            out.push_str("set(CMAKE_POSITION_INDEPENDENT_CODE ON)\n");
        }
        PackageType::SharedLibrary => {
            out.push_str("set(BUILD_SHARED_LIBS ON CACHE BOOL \"\" FORCE)\n");
        }
        PackageType::HeaderOnly | PackageType::Application => {}
    }

    out.push('\n');
    out.push_str(&format!(
        "list(PREPEND CMAKE_PREFIX_PATH {})\n",
        quote(&cmake_path(&layout.generators_folder)),
    ));
    out.push_str("set(CMAKE_FIND_PACKAGE_PREFER_CONFIG ON)\n");

    if !recipe.build.definitions.is_empty() {
        out.push('\n');
        for (key, value) in &recipe.build.definitions {
            out.push_str(&format!("set({} {} CACHE STRING \"\" FORCE)\n", key, quote(value)));
        }
    }

    out
}

/// `<name>-config.cmake` contents for a resolved dependency
pub fn config_contents(dep: &ResolvedDependency) -> String {
    let name = &dep.reference.name;
    let root = cmake_path(&dep.package_folder);
    let target = &dep.info.target;
    let var = name.replace(['-', '.', '+'], "_");

    let mut out = String::new();
    out.push_str(&format!("# {}\n", dep.reference));
    out.push_str(&format!("set({}_FOUND TRUE)\n", name));
    out.push_str(&format!("set({}_VERSION {})\n", name, quote(&dep.reference.version)));
    out.push_str(&format!("set(_{}_root {})\n", var, quote(&root)));
    out.push('\n');

    for transitive in &dep.info.requires {
        if let Some((package, _)) = transitive.split_once("::") {
            out.push_str(&format!("find_package({} QUIET)\n", package));
        }
    }

    out.push_str(&format!("if(NOT TARGET {})\n", target));
    out.push_str(&format!("  add_library({} INTERFACE IMPORTED)\n", target));

    let includes: Vec<String> = dep
        .info
        .include_dirs
        .iter()
        .map(|d| format!("${{_{}_root}}/{}", var, d))
        .collect();
    out.push_str(&format!(
        "  set_property(TARGET {} PROPERTY INTERFACE_INCLUDE_DIRECTORIES {})\n",
        target,
        quote(&includes.join(";")),
    ));

    let lib_dirs: Vec<String> = dep
        .info
        .lib_dirs
        .iter()
        .map(|d| format!("\"${{_{}_root}}/{}\"", var, d))
        .collect();
    for lib in &dep.info.libs {
        let lib_var = format!("{}_{}_LIBRARY", var, lib.name.replace(['-', '.', '+'], "_"));
        out.push_str(&format!(
            "  find_library({} NAMES {} PATHS {} NO_DEFAULT_PATH REQUIRED)\n",
            lib_var,
            lib.name,
            lib_dirs.join(" "),
        ));
        out.push_str(&format!(
            "  set_property(TARGET {} APPEND PROPERTY INTERFACE_LINK_LIBRARIES \"${{{}}}\")\n",
            target,
            lib_var,
        ));
    }

    for transitive in &dep.info.requires {
        out.push_str(&format!("  if(TARGET {})\n", transitive));
        out.push_str(&format!(
            "    set_property(TARGET {} APPEND PROPERTY INTERFACE_LINK_LIBRARIES {})\n",
            target,
            transitive,
        ));
        out.push_str("  endif()\n");
    }

    if !dep.info.defines.is_empty() {
        out.push_str(&format!(
            "  set_property(TARGET {} PROPERTY INTERFACE_COMPILE_DEFINITIONS {})\n",
            target,
            quote(&dep.info.defines.join(";")),
        ));
    }
    out.push_str("endif()\n");

    out
}

/// `<name>-config-version.cmake` contents: any requested version up to the
/// resolved one is compatible, equal is exact
pub fn config_version_contents(dep: &ResolvedDependency) -> String {
    let mut out = String::new();
    out.push_str(&format!("set(PACKAGE_VERSION {})\n", quote(&dep.reference.version)));
    out.push_str("if(PACKAGE_FIND_VERSION AND PACKAGE_FIND_VERSION VERSION_GREATER PACKAGE_VERSION)\n");
    out.push_str("  set(PACKAGE_VERSION_COMPATIBLE FALSE)\n");
    out.push_str("else()\n");
    out.push_str("  set(PACKAGE_VERSION_COMPATIBLE TRUE)\n");
    out.push_str("  if(PACKAGE_FIND_VERSION STREQUAL PACKAGE_VERSION)\n");
    out.push_str("    set(PACKAGE_VERSION_EXACT TRUE)\n");
    out.push_str("  endif()\n");
    out.push_str("endif()\n");
    out
}

/// Check every declared requirement has a matching resolved package
pub fn check_resolved(recipe: &Recipe, deps: &ResolvedDependencies) -> Result<()> {
    let mut problems = Vec::new();
    for req in &recipe.build.requires {
        match deps.get(&req.name) {
            None => problems.push(format!("{} was not resolved", req)),
            Some(dep) if !req.is_satisfied_by(&dep.reference) => {
                problems.push(format!("{} resolved to {}", req, dep.reference));
            }
            Some(_) => {}
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::ResolutionError(problems.join("; ")))
    }
}

/// Write the toolchain and per-dependency files into the generators folder
pub fn write_generated_files(
    recipe: &Recipe,
    settings: &Settings,
    layout: &Layout,
    deps: &ResolvedDependencies,
) -> Result<Vec<PathBuf>> {
    check_resolved(recipe, deps)?;

    let dir = &layout.generators_folder;
    fs::create_dir_all(dir)
        .map_err(|e| Error::IoError(format!("Failed to create {}: {}", dir.display(), e)))?;

    let mut written = Vec::new();
    let mut write = |path: PathBuf, contents: String| -> Result<()> {
        fs::write(&path, contents)
            .map_err(|e| Error::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!("Generated {}", path.display());
        written.push(path);
        Ok(())
    };

    write(layout.toolchain_file(), toolchain_contents(recipe, settings, layout))?;

    for req in &recipe.build.requires {
        if let Some(dep) = deps.get(&req.name) {
            write(
                dir.join(format!("{}-config.cmake", req.name)),
                config_contents(dep),
            )?;
            write(
                dir.join(format!("{}-config-version.cmake", req.name)),
                config_version_contents(dep),
            )?;
        }
    }

    Ok(written)
}
