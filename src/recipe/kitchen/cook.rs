// src/recipe/kitchen/cook.rs

//! Cook: one recipe driven through the lifecycle for one settings combination
//!
//! A cook is an explicit state machine. The runtime requests phases in
//! order through [`Cook::advance`] (or the per-phase convenience methods);
//! anything else is rejected without side effects. The first failing phase
//! latches the cook into [`CookState::Failed`] and every later request is
//! refused: there is no resume and no rollback.

use crate::error::{Error, Result};
use crate::recipe::format::Recipe;
use crate::recipe::kitchen::builder::{BuilderArgs, ExternalBuilder, ToolOutput};
use crate::recipe::kitchen::generate::write_generated_files;
use crate::recipe::kitchen::layout::{Layout, LayoutSpec};
use crate::recipe::kitchen::manifest::InstalledManifest;
use crate::recipe::kitchen::phase::{CookState, Phase, PhaseOutput, PhaseRecord};
use crate::recipe::kitchen::resolver::ResolvedDependencies;
use crate::recipe::package_info::{PackageInfo, library_filename};
use crate::recipe::parser::validate_recipe;
use crate::settings::Settings;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the runtime hands a cook: directory roots and resolved dependencies
#[derive(Debug, Clone)]
pub struct CookContext {
    /// Root of the exported sources
    pub source_root: PathBuf,
    /// Working area the build tree is laid out under
    pub work_root: PathBuf,
    /// Install prefix for the package phase
    pub package_folder: PathBuf,
    pub dependencies: ResolvedDependencies,
    /// Parallel jobs for the build tool
    pub jobs: u32,
    /// Overrides the recipe's generator when set
    pub generator: Option<String>,
    /// Extra cache definitions for the configure step
    pub definitions: BTreeMap<String, String>,
}

impl CookContext {
    pub fn new(
        source_root: impl Into<PathBuf>,
        work_root: impl Into<PathBuf>,
        package_folder: impl Into<PathBuf>,
        dependencies: ResolvedDependencies,
    ) -> Self {
        let jobs = std::thread::available_parallelism()
            .map(|p| p.get() as u32)
            .unwrap_or(4);

        Self {
            source_root: source_root.into(),
            work_root: work_root.into(),
            package_folder: package_folder.into(),
            dependencies,
            jobs,
            generator: None,
            definitions: BTreeMap::new(),
        }
    }

    pub fn with_jobs(mut self, jobs: u32) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_generator(mut self, generator: Option<String>) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_definitions(mut self, definitions: BTreeMap<String, String>) -> Self {
        self.definitions = definitions;
        self
    }
}

/// A single cook operation
pub struct Cook {
    recipe: Recipe,
    settings: Settings,
    builder: Arc<dyn ExternalBuilder>,
    layout_spec: LayoutSpec,
    package_id: String,
    state: CookState,
    /// Set by the layout phase
    layout: Option<Layout>,
    /// Set by the package phase
    installed: Option<InstalledManifest>,
    warnings: Vec<String>,
    history: Vec<PhaseRecord>,
    /// Build log accumulator
    log: String,
}

impl Cook {
    /// Instantiate a cook
    ///
    /// Validates the recipe and checks that every declared axis has a value.
    /// Nothing touches the filesystem or the builder until this succeeds.
    pub fn new(recipe: Recipe, settings: Settings, builder: Arc<dyn ExternalBuilder>) -> Result<Self> {
        let warnings = validate_recipe(&recipe)?;
        settings.require(&recipe.build.settings)?;

        for warning in &warnings {
            warn!("{}: {}", recipe.reference(), warning);
        }

        let layout_spec = LayoutSpec::cmake(settings.build_type_or_default());
        let package_id = recipe.package_id(&settings);

        Ok(Self {
            recipe,
            settings,
            builder,
            layout_spec,
            package_id,
            state: CookState::Instantiated,
            layout: None,
            installed: None,
            warnings,
            history: Vec::new(),
            log: String::new(),
        })
    }

    /// Replace the conventional layout before the layout phase runs
    pub fn with_layout(mut self, spec: LayoutSpec) -> Self {
        self.layout_spec = spec;
        self
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn state(&self) -> CookState {
        self.state
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn history(&self) -> &[PhaseRecord] {
        &self.history
    }

    pub fn log(&self) -> &str {
        &self.log
    }

    /// Folders recorded by the layout phase
    pub fn current_layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Inventory recorded by the package phase
    pub fn installed(&self) -> Option<&InstalledManifest> {
        self.installed.as_ref()
    }

    /// Run the requested phase if it is the next one
    pub fn advance(&mut self, phase: Phase, ctx: &CookContext) -> Result<PhaseOutput> {
        match phase {
            Phase::Layout => self.layout(ctx).map(PhaseOutput::LayoutConfigured),
            Phase::Generate => self.generate(ctx).map(PhaseOutput::Generated),
            Phase::Build => self.build(ctx).map(|()| PhaseOutput::Built),
            Phase::Package => self.package(ctx).map(PhaseOutput::Packaged),
            Phase::PackageInfo => self.package_info(ctx).map(PhaseOutput::InfoPublished),
        }
    }

    /// Advance through every phase and return the published package info
    pub fn run(&mut self, ctx: &CookContext) -> Result<PackageInfo> {
        self.layout(ctx)?;
        self.generate(ctx)?;
        self.build(ctx)?;
        self.package(ctx)?;
        self.package_info(ctx)
    }

    pub fn layout(&mut self, ctx: &CookContext) -> Result<Layout> {
        self.step(Phase::Layout, ctx, Self::run_layout)
    }

    pub fn generate(&mut self, ctx: &CookContext) -> Result<Vec<PathBuf>> {
        self.step(Phase::Generate, ctx, Self::run_generate)
    }

    pub fn build(&mut self, ctx: &CookContext) -> Result<()> {
        self.step(Phase::Build, ctx, Self::run_build)
    }

    pub fn package(&mut self, ctx: &CookContext) -> Result<InstalledManifest> {
        self.step(Phase::Package, ctx, Self::run_package)
    }

    pub fn package_info(&mut self, ctx: &CookContext) -> Result<PackageInfo> {
        self.step(Phase::PackageInfo, ctx, Self::run_package_info)
    }

    /// Order check, state transition and bookkeeping shared by every phase
    fn step<T>(
        &mut self,
        phase: Phase,
        ctx: &CookContext,
        run: fn(&mut Self, &CookContext) -> Result<T>,
    ) -> Result<T> {
        let expected = match self.state {
            CookState::Failed(failed) => return Err(Error::PipelineFailed(failed)),
            state => state.next_phase(),
        };
        if expected != Some(phase) {
            return Err(Error::PhaseOrder {
                expected,
                requested: phase,
            });
        }

        info!("Running {} phase for {}", phase, self.recipe.reference());
        self.log_line(&format!("=== {} ===", phase));
        let started_at = Utc::now();
        let start = Instant::now();

        match run(self, ctx) {
            Ok(output) => {
                let duration = start.elapsed();
                self.state = phase.completed_state();
                self.history.push(PhaseRecord {
                    phase,
                    started_at,
                    duration,
                });
                debug!("{} phase finished in {:?}", phase, duration);
                Ok(output)
            }
            Err(e) => {
                self.state = CookState::Failed(phase);
                self.log_line(&format!("{} phase failed: {}", phase, e));
                Err(e.in_phase(phase))
            }
        }
    }

    fn require_layout(&self, phase: Phase) -> Result<Layout> {
        self.layout.clone().ok_or(Error::PhaseOrder {
            expected: Some(Phase::Layout),
            requested: phase,
        })
    }

    fn run_layout(&mut self, ctx: &CookContext) -> Result<Layout> {
        let layout = self.layout_spec.resolve(ctx)?;
        self.log_line(&format!("source folder: {}", layout.source_folder.display()));
        self.log_line(&format!("build folder: {}", layout.build_folder.display()));
        self.log_line(&format!("generators folder: {}", layout.generators_folder.display()));
        self.log_line(&format!("package folder: {}", layout.package_folder.display()));
        self.layout = Some(layout.clone());
        Ok(layout)
    }

    fn run_generate(&mut self, ctx: &CookContext) -> Result<Vec<PathBuf>> {
        let layout = self.require_layout(Phase::Generate)?;
        let files = write_generated_files(&self.recipe, &self.settings, &layout, &ctx.dependencies)?;
        for file in &files {
            self.log_line(&format!("generated {}", file.display()));
        }
        Ok(files)
    }

    fn run_build(&mut self, ctx: &CookContext) -> Result<()> {
        let layout = self.require_layout(Phase::Build)?;
        let args = self.builder_args(ctx, &layout);
        let builder = Arc::clone(&self.builder);

        let output = builder.configure(&args)?;
        self.record_tool_output("configure", &output);
        output.check(builder.name(), "configure")?;

        let output = builder.build(&args)?;
        self.record_tool_output("build", &output);
        output.check(builder.name(), "build")?;

        // The generators folder lives inside the build folder; it does not count
        let produced = match fs::read_dir(&layout.build_folder) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .any(|e| e.path() != layout.generators_folder),
            Err(_) => false,
        };
        if !produced {
            return Err(Error::Integrity(format!(
                "build folder {} is empty after {} build",
                layout.build_folder.display(),
                builder.name()
            )));
        }

        Ok(())
    }

    fn run_package(&mut self, ctx: &CookContext) -> Result<InstalledManifest> {
        let layout = self.require_layout(Phase::Package)?;
        let args = self.builder_args(ctx, &layout);
        let builder = Arc::clone(&self.builder);

        let output = builder.install(&args)?;
        self.record_tool_output("install", &output);
        output.check(builder.name(), "install")?;

        if !layout.package_folder.is_dir() {
            return Err(Error::Integrity(format!(
                "package folder {} was not created by install",
                layout.package_folder.display()
            )));
        }
        let manifest = InstalledManifest::scan(&layout.package_folder)?;
        if manifest.is_empty() {
            return Err(Error::Integrity(
                "No files installed to the package folder".to_string(),
            ));
        }

        if let Some(kind) = self.recipe.package.package_type.link_kind() {
            let info = self.recipe.package_info();
            let missing: Vec<String> = info
                .libs
                .iter()
                .map(|lib| library_filename(&lib.name, kind, &self.settings))
                .filter(|file| {
                    !info
                        .lib_dirs
                        .iter()
                        .any(|dir| layout.package_folder.join(dir).join(file).is_file())
                })
                .collect();

            if !missing.is_empty() {
                return Err(Error::Integrity(format!(
                    "libraries missing from {} under {}: {}",
                    layout.package_folder.display(),
                    info.lib_dirs.join(", "),
                    missing.join(", ")
                )));
            }
        }

        self.log_line(&format!(
            "installed {} file(s), {} bytes ({})",
            manifest.len(),
            manifest.total_size(),
            manifest.digest
        ));
        info!(
            "Packaged {} ({} files)",
            self.recipe.reference(),
            manifest.len()
        );
        self.installed = Some(manifest.clone());
        Ok(manifest)
    }

    fn run_package_info(&mut self, _ctx: &CookContext) -> Result<PackageInfo> {
        Ok(self.recipe.package_info())
    }

    fn builder_args(&self, ctx: &CookContext, layout: &Layout) -> BuilderArgs {
        BuilderArgs {
            source_dir: layout.source_folder.clone(),
            build_dir: layout.build_folder.clone(),
            generators_dir: layout.generators_folder.clone(),
            toolchain_file: layout.toolchain_file(),
            package_dir: layout.package_folder.clone(),
            build_type: self.settings.build_type_or_default(),
            jobs: ctx.jobs,
            generator: ctx
                .generator
                .clone()
                .or_else(|| self.recipe.build.generator.clone()),
            definitions: ctx.definitions.clone(),
        }
    }

    fn log_line(&mut self, line: &str) {
        self.log.push_str(line);
        self.log.push('\n');
    }

    /// Log tool output with a step header
    fn record_tool_output(&mut self, step: &str, output: &ToolOutput) {
        self.log_line(&format!("--- {} {} ---", self.builder.name(), step));
        if !output.stdout.is_empty() {
            self.log.push_str(&output.stdout);
            self.log.push('\n');
        }
        if !output.stderr.is_empty() {
            self.log.push_str(&output.stderr);
            self.log.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::parser::parse_recipe;
    use crate::settings::BuildType;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Builder that writes a plausible tree and records the steps it ran
    struct StubBuilder {
        calls: Mutex<Vec<String>>,
        fail_build: Option<i32>,
        libs: Vec<&'static str>,
    }

    impl StubBuilder {
        fn new(libs: &[&'static str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_build: None,
                libs: libs.to_vec(),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ExternalBuilder for StubBuilder {
        fn name(&self) -> &str {
            "stub"
        }

        fn configure(&self, args: &BuilderArgs) -> Result<ToolOutput> {
            self.calls.lock().unwrap().push("configure".to_string());
            fs::create_dir_all(&args.build_dir)?;
            fs::write(args.build_dir.join("CMakeCache.txt"), "cache")?;
            Ok(ToolOutput::success())
        }

        fn build(&self, _args: &BuilderArgs) -> Result<ToolOutput> {
            self.calls.lock().unwrap().push("build".to_string());
            match self.fail_build {
                Some(code) => Ok(ToolOutput {
                    exit_code: Some(code),
                    stdout: String::new(),
                    stderr: "error: no rule to make target".to_string(),
                }),
                None => Ok(ToolOutput::success()),
            }
        }

        fn install(&self, args: &BuilderArgs) -> Result<ToolOutput> {
            self.calls.lock().unwrap().push("install".to_string());
            let lib_dir = args.package_dir.join("lib");
            fs::create_dir_all(&lib_dir)?;
            for lib in &self.libs {
                fs::write(lib_dir.join(format!("lib{}.a", lib)), lib.as_bytes())?;
            }
            Ok(ToolOutput::success())
        }
    }

    const RECIPE: &str = r#"
[package]
name = "widget"
version = "0.3.0"
license = "MIT"
description = "Widget library"
type = "static-library"

[build]
settings = ["os", "build_type"]

[package_info]
libs = ["widget", "miniz"]
"#;

    fn settings() -> Settings {
        Settings::new()
            .with_os("Linux")
            .with_build_type(BuildType::Release)
    }

    fn context(dir: &TempDir) -> CookContext {
        CookContext::new(
            dir.path().join("source"),
            dir.path(),
            dir.path().join("package"),
            ResolvedDependencies::new(),
        )
        .with_jobs(2)
    }

    fn cook(builder: Arc<StubBuilder>) -> Cook {
        Cook::new(parse_recipe(RECIPE).unwrap(), settings(), builder).unwrap()
    }

    #[test]
    fn test_run_all_phases() {
        let dir = TempDir::new().unwrap();
        let builder = Arc::new(StubBuilder::new(&["widget", "miniz"]));
        let mut cook = cook(builder.clone());

        let info = cook.run(&context(&dir)).unwrap();
        assert_eq!(info.library_names(), vec!["widget", "miniz"]);
        assert_eq!(cook.state(), CookState::InfoPublished);
        assert_eq!(builder.calls(), vec!["configure", "build", "install"]);

        let phases: Vec<Phase> = cook.history().iter().map(|r| r.phase).collect();
        assert_eq!(phases, Phase::ALL.to_vec());
        assert!(cook.log().contains("=== package ==="));
        assert_eq!(cook.installed().unwrap().len(), 2);
    }

    #[test]
    fn test_out_of_order_phase_rejected_without_side_effects() {
        let dir = TempDir::new().unwrap();
        let builder = Arc::new(StubBuilder::new(&["widget", "miniz"]));
        let mut cook = cook(builder.clone());
        let ctx = context(&dir);

        let err = cook.advance(Phase::Build, &ctx).unwrap_err();
        assert!(matches!(
            err,
            Error::PhaseOrder {
                expected: Some(Phase::Layout),
                requested: Phase::Build
            }
        ));
        assert_eq!(cook.state(), CookState::Instantiated);
        assert!(builder.calls().is_empty());

        // Still usable in order
        assert!(matches!(
            cook.advance(Phase::Layout, &ctx).unwrap(),
            PhaseOutput::LayoutConfigured(_)
        ));
        assert!(cook.advance(Phase::Layout, &ctx).is_err());
    }

    #[test]
    fn test_layout_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let mut cook = cook(Arc::new(StubBuilder::new(&[])));
        let layout = cook.layout(&context(&dir)).unwrap();
        assert!(!layout.build_folder.exists());
        assert!(layout.build_folder.ends_with("build/Release"));
    }

    #[test]
    fn test_build_failure_latches() {
        let dir = TempDir::new().unwrap();
        let mut stub = StubBuilder::new(&["widget", "miniz"]);
        stub.fail_build = Some(2);
        let builder = Arc::new(stub);
        let mut cook = cook(builder.clone());
        let ctx = context(&dir);

        let err = cook.run(&ctx).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Build));
        assert_eq!(err.exit_code(), Some(2));
        assert!(err.to_string().contains("no rule to make target"));
        assert_eq!(cook.state(), CookState::Failed(Phase::Build));
        assert_eq!(builder.calls(), vec!["configure", "build"]);

        let err = cook.advance(Phase::Package, &ctx).unwrap_err();
        assert!(matches!(err, Error::PipelineFailed(Phase::Build)));
        assert!(!builder.calls().contains(&"install".to_string()));
    }

    #[test]
    fn test_missing_library_is_integrity_error() {
        let dir = TempDir::new().unwrap();
        let mut cook = cook(Arc::new(StubBuilder::new(&["widget"])));

        let err = cook.run(&context(&dir)).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Package));
        assert!(err.to_string().contains("libminiz.a"));
    }

    #[test]
    fn test_unset_axis_rejected_at_instantiation() {
        let builder = Arc::new(StubBuilder::new(&[]));
        let result = Cook::new(
            parse_recipe(RECIPE).unwrap(),
            Settings::new().with_os("Linux"),
            builder.clone(),
        );
        assert!(matches!(result, Err(Error::InvalidSettings(_))));
        assert!(builder.calls().is_empty());
    }

    #[test]
    fn test_malformed_layout_fails_layout_phase() {
        let dir = TempDir::new().unwrap();
        let mut spec = LayoutSpec::cmake(BuildType::Release);
        spec.build = "../escape".to_string();
        let mut cook = cook(Arc::new(StubBuilder::new(&[]))).with_layout(spec);

        let err = cook.layout(&context(&dir)).unwrap_err();
        assert!(err.is_authoring());
        assert_eq!(cook.state(), CookState::Failed(Phase::Layout));
    }
}
