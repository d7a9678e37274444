// src/commands/recipe.rs

//! Recipe commands that never run the build tool

use super::{build_settings, load_recipe, recipe_dir};
use crate::cli::SettingsArgs;
use anyhow::{Context, Result};
use recipekit::recipe::{export_sources, validate_recipe};
use std::path::Path;

/// Print a recipe's metadata surface as JSON
pub fn cmd_inspect(recipe_path: &Path) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;
    let metadata = recipe.metadata();
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

/// Validate a recipe and report warnings
pub fn cmd_validate(recipe_path: &Path) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;
    println!("Recipe: {}", recipe.reference());

    let warnings = validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;
    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    if warnings.is_empty() {
        println!("[OK] No issues found");
    } else {
        println!("[OK] {} warning(s)", warnings.len());
    }
    Ok(())
}

/// Export a recipe's sources into `dest`
pub fn cmd_export(recipe_path: &Path, dest: &Path) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;
    validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;

    let manifest = export_sources(&recipe_dir(recipe_path), &recipe.exports.sources, dest)
        .with_context(|| format!("Failed to export {}", recipe.reference()))?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

/// Print the package id for the given settings
pub fn cmd_package_id(recipe_path: &Path, settings: &SettingsArgs) -> Result<()> {
    let recipe = load_recipe(recipe_path)?;
    validate_recipe(&recipe).with_context(|| "Recipe validation failed")?;

    let settings = build_settings(settings)?;
    settings.require(&recipe.build.settings)?;
    println!("{}", recipe.package_id(&settings));
    Ok(())
}
