// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::CookOptions;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { recipe } => commands::cmd_inspect(&recipe),
        Commands::Validate { recipe } => commands::cmd_validate(&recipe),
        Commands::Export { recipe, dest } => commands::cmd_export(&recipe, &dest),
        Commands::PackageId { recipe, settings } => commands::cmd_package_id(&recipe, &settings),
        Commands::Cook {
            recipe,
            settings,
            deps,
            work_root,
            jobs,
            generator,
            cmake,
            keep_workdir,
        } => commands::cmd_cook(
            &recipe,
            &settings,
            CookOptions {
                deps,
                work_root,
                jobs,
                generator,
                cmake,
                keep_workdir,
            },
        ),
    }
}
