// src/commands/cook.rs

//! Cook command - build packages from recipes

use super::{build_settings, load_recipe, recipe_dir};
use crate::cli::SettingsArgs;
use anyhow::{Context, Result};
use recipekit::recipe::{
    CMakeBuilder, DependencyResolver, DirectoryResolver, Kitchen, KitchenConfig, StaticResolver,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Options for `recipekit cook` beyond the recipe and settings
pub struct CookOptions {
    pub deps: Option<PathBuf>,
    pub work_root: Option<PathBuf>,
    pub jobs: Option<u32>,
    pub generator: Option<String>,
    pub cmake: Option<PathBuf>,
    pub keep_workdir: bool,
}

/// Cook a package from a recipe and print its package info
pub fn cmd_cook(recipe_path: &Path, settings: &SettingsArgs, options: CookOptions) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;
    let settings = build_settings(settings)?;

    // Environment first, flags override
    let mut config = KitchenConfig::from_env()?;
    if let Some(root) = options.work_root {
        config = config.with_work_root(root);
    }
    if let Some(jobs) = options.jobs {
        config = config.with_jobs(jobs);
    }
    if let Some(generator) = options.generator {
        config = config.with_generator(generator);
    }
    if let Some(cmake) = options.cmake {
        config = config.with_cmake_program(cmake);
    }
    config = config.with_keep_workdir(options.keep_workdir);

    let builder = CMakeBuilder::locate(config.cmake_program.as_deref())
        .context("Cannot cook without a build tool")?;
    info!("Using {}", builder.program().display());

    let resolver: Arc<dyn DependencyResolver> = match options.deps {
        Some(dir) => Arc::new(DirectoryResolver::new(dir)),
        None => Arc::new(StaticResolver::new()),
    };

    let kitchen = Kitchen::new(config, resolver, Arc::new(builder));
    let result = kitchen
        .cook(&recipe, &recipe_dir(recipe_path), &settings)
        .with_context(|| format!("Failed to cook {}", recipe.reference()))?;

    for warning in &result.warnings {
        eprintln!("Warning: {}", warning);
    }
    info!(
        "Package {} installed {} file(s) at {}",
        result.package_id,
        result.installed.len(),
        result.package_folder.display()
    );
    println!("{}", result.package_info.to_json()?);
    Ok(())
}
