// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use recipekit::recipe::{
    BuilderArgs, ExternalBuilder, LibraryArtifact, LibraryOrigin, PackageInfo, PackageReference,
    ResolvedDependency, StaticResolver, ToolOutput,
};
use recipekit::{BuildType, CompilerSettings, Error, Result, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use walkdir::WalkDir;

/// The scenario recipe: two requirements, default dependency aliases
pub const CORETOOLKIT_RECIPE: &str = r#"
[package]
name = "coretoolkit"
version = "1.0.0"
license = "MIT"
description = "Core toolkit for dislocation analysis"
type = "static-library"

[build]
settings = ["os", "arch", "compiler", "build_type"]
requires = ["onetbb/2021.12.0", "spdlog/1.14.1"]

[exports]
sources = ["CMakeLists.txt", "include/*", "src/*", "dependencies/*"]

[package_info]
target = "coretoolkit::coretoolkit"
libs = [
    { name = "coretoolkit", origin = "primary" },
    { name = "ptm", origin = "bundled" },
    { name = "geogram", origin = "bundled" },
]
"#;

/// A step the fake builder ran, with the arguments it was given
#[derive(Debug, Clone)]
pub struct BuilderCall {
    pub step: String,
    pub args: BuilderArgs,
}

/// Builder standing in for CMake
///
/// - configure: requires the generated toolchain file, writes a cache file
/// - build: writes `lib<name>.a` for each library into the build folder,
///   derived from the exported sources
/// - install: copies headers and libraries into the package folder
///
/// Any step can be made to exit with a given code.
pub struct FakeBuilder {
    libs: Vec<String>,
    fail: Mutex<Option<(String, i32)>>,
    calls: Mutex<Vec<BuilderCall>>,
}

impl FakeBuilder {
    pub fn new(libs: &[&str]) -> Self {
        Self {
            libs: libs.iter().map(|s| s.to_string()).collect(),
            fail: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Libraries the coretoolkit recipe declares
    pub fn coretoolkit() -> Self {
        Self::new(&["coretoolkit", "ptm", "geogram"])
    }

    /// Make `step` exit with `code`
    pub fn failing(self, step: &str, code: i32) -> Self {
        *self.fail.lock().unwrap() = Some((step.to_string(), code));
        self
    }

    pub fn calls(&self) -> Vec<BuilderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn steps(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.step).collect()
    }

    fn record(&self, step: &str, args: &BuilderArgs) -> Option<ToolOutput> {
        self.calls.lock().unwrap().push(BuilderCall {
            step: step.to_string(),
            args: args.clone(),
        });
        match &*self.fail.lock().unwrap() {
            Some((failing, code)) if failing == step => Some(ToolOutput {
                exit_code: Some(*code),
                stdout: format!("[fake] running {}", step),
                stderr: format!("[fake] {} failed", step),
            }),
            _ => None,
        }
    }
}

impl ExternalBuilder for FakeBuilder {
    fn name(&self) -> &str {
        "fake-cmake"
    }

    fn configure(&self, args: &BuilderArgs) -> Result<ToolOutput> {
        if let Some(failed) = self.record("configure", args) {
            return Ok(failed);
        }
        if !args.toolchain_file.is_file() {
            return Ok(ToolOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: format!("toolchain {} not found", args.toolchain_file.display()),
            });
        }
        fs::create_dir_all(&args.build_dir)?;
        fs::write(
            args.build_dir.join("CMakeCache.txt"),
            format!("CMAKE_BUILD_TYPE:STRING={}\n", args.build_type),
        )?;
        Ok(ToolOutput::success())
    }

    fn build(&self, args: &BuilderArgs) -> Result<ToolOutput> {
        if let Some(failed) = self.record("build", args) {
            return Ok(failed);
        }
        // Object code stand-in: every source file, in path order
        let mut object = Vec::new();
        for entry in WalkDir::new(&args.source_dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::IoError(e.to_string()))?;
            if entry.file_type().is_file() {
                object.extend(fs::read(entry.path())?);
            }
        }
        for lib in &self.libs {
            let mut contents = lib.as_bytes().to_vec();
            contents.extend(&object);
            fs::write(args.build_dir.join(format!("lib{}.a", lib)), contents)?;
        }
        Ok(ToolOutput::success())
    }

    fn install(&self, args: &BuilderArgs) -> Result<ToolOutput> {
        if let Some(failed) = self.record("install", args) {
            return Ok(failed);
        }
        let lib_dir = args.package_dir.join("lib");
        fs::create_dir_all(&lib_dir)?;
        for lib in &self.libs {
            let name = format!("lib{}.a", lib);
            fs::copy(args.build_dir.join(&name), lib_dir.join(&name))?;
        }

        let headers = args.source_dir.join("include");
        if headers.is_dir() {
            for entry in WalkDir::new(&headers) {
                let entry = entry.map_err(|e| Error::IoError(e.to_string()))?;
                if entry.file_type().is_file() {
                    let relative = entry.path().strip_prefix(&args.source_dir).unwrap_or(entry.path());
                    let dest = args.package_dir.join(relative);
                    if let Some(parent) = dest.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::copy(entry.path(), dest)?;
                }
            }
        }
        Ok(ToolOutput::success())
    }
}

/// Create a recipe directory with sources and `recipe.toml`
///
/// Returns (TempDir, recipe path) - keep the TempDir alive to prevent cleanup.
pub fn coretoolkit_tree(recipe: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let files = [
        ("CMakeLists.txt", "cmake_minimum_required(VERSION 3.20)\nproject(coretoolkit)\n"),
        ("include/coretoolkit/core.h", "#pragma once\nint ct_version();\n"),
        ("src/core.cpp", "#include <coretoolkit/core.h>\nint ct_version() { return 1; }\n"),
        ("src/analysis.cpp", "int analyze() { return 0; }\n"),
        ("dependencies/ptm/ptm.c", "int ptm_index() { return 7; }\n"),
        ("dependencies/geogram/mesh.cpp", "int mesh() { return 3; }\n"),
        ("README.md", "not exported\n"),
    ];
    for (path, contents) in files {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    let recipe_path = root.join("recipe.toml");
    fs::write(&recipe_path, recipe).unwrap();
    (temp_dir, recipe_path)
}

/// Settings covering every axis the coretoolkit recipe declares
pub fn linux_settings(build_type: BuildType) -> Settings {
    Settings::new()
        .with_os("Linux")
        .with_arch("x86_64")
        .with_compiler(
            CompilerSettings::new("gcc")
                .with_version("13")
                .with_cppstd("17"),
        )
        .with_build_type(build_type)
}

/// Package info for a dependency with one primary library
pub fn dependency_info(name: &str) -> PackageInfo {
    PackageInfo {
        libs: vec![LibraryArtifact::new(name, LibraryOrigin::Primary)],
        target: format!("{0}::{0}", name),
        requires: Vec::new(),
        include_dirs: vec!["include".to_string()],
        lib_dirs: vec!["lib".to_string()],
        defines: Vec::new(),
    }
}

pub fn dependency(root: &Path, name: &str, version: &str) -> ResolvedDependency {
    ResolvedDependency::new(
        PackageReference::new(name, version),
        root.join(name).join(version),
        dependency_info(name),
    )
}

/// Resolver providing onetbb and spdlog
pub fn coretoolkit_resolver(root: &Path) -> StaticResolver {
    StaticResolver::new()
        .with(dependency(root, "onetbb", "2021.12.0"))
        .with(dependency(root, "spdlog", "1.14.1"))
}

/// Lay out a built dependency the way `DirectoryResolver` expects
pub fn publish_dependency(root: &Path, name: &str, version: &str) {
    let folder = root.join(name).join(version);
    fs::create_dir_all(folder.join("lib")).unwrap();
    fs::create_dir_all(folder.join("include")).unwrap();
    fs::write(folder.join("lib").join(format!("lib{}.a", name)), name).unwrap();
    fs::write(
        folder.join("package_info.json"),
        dependency_info(name).to_json().unwrap(),
    )
    .unwrap();
}
