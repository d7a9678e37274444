// src/commands/mod.rs
//! Command handlers for the recipekit CLI

mod cook;
mod recipe;

pub use cook::{CookOptions, cmd_cook};
pub use recipe::{cmd_export, cmd_inspect, cmd_package_id, cmd_validate};

use crate::cli::SettingsArgs;
use anyhow::{Context, Result};
use recipekit::Settings;
use recipekit::recipe::{Recipe, parse_recipe_file};
use std::path::{Path, PathBuf};

/// Parse a recipe file, with the path in the error context
fn load_recipe(path: &Path) -> Result<Recipe> {
    parse_recipe_file(path).with_context(|| format!("Failed to parse recipe: {}", path.display()))
}

/// Directory export patterns are relative to
fn recipe_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Host defaults (unless disabled) overridden by `-s key=value` pairs
fn build_settings(args: &SettingsArgs) -> Result<Settings> {
    let mut settings = if args.no_host {
        Settings::new()
    } else {
        Settings::detect_host()
    };
    settings
        .apply_pairs(&args.settings)
        .context("Invalid --setting")?;
    Ok(settings)
}
