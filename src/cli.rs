// src/cli.rs
//! CLI definitions for recipekit
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations live in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "recipekit")]
#[command(author = "Recipekit Contributors")]
#[command(version)]
#[command(about = "Inspect, export and cook native library package recipes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Settings supplied as `key=value` pairs
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Setting value, e.g. `os=Linux` or `compiler.cppstd=17` (repeatable)
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,

    /// Start from empty settings instead of the host's os/arch/build_type
    #[arg(long)]
    pub no_host: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print a recipe's metadata surface as JSON
    Inspect {
        /// Path to the recipe file
        recipe: PathBuf,
    },

    /// Check a recipe for authoring errors and print warnings
    Validate {
        /// Path to the recipe file
        recipe: PathBuf,
    },

    /// Export a recipe's sources and print the export manifest
    Export {
        /// Path to the recipe file
        recipe: PathBuf,

        /// Destination directory
        #[arg(short, long)]
        dest: PathBuf,
    },

    /// Print the package id for a settings combination
    PackageId {
        /// Path to the recipe file
        recipe: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Cook a recipe: export, resolve, then run every lifecycle phase
    Cook {
        /// Path to the recipe file
        recipe: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Directory of built dependencies (`<name>/<version>/package_info.json`)
        #[arg(long)]
        deps: Option<PathBuf>,

        /// Root for working areas (default: $RECIPEKIT_WORK_ROOT or the temp dir)
        #[arg(long)]
        work_root: Option<PathBuf>,

        /// Number of parallel build jobs (default: auto)
        #[arg(short, long)]
        jobs: Option<u32>,

        /// Build-tool generator, e.g. Ninja
        #[arg(short = 'G', long)]
        generator: Option<String>,

        /// Path to the cmake program
        #[arg(long)]
        cmake: Option<PathBuf>,

        /// Keep the build tree after a successful cook
        #[arg(long)]
        keep_workdir: bool,
    },
}
