// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: recipe file
fn recipe_arg() -> Arg {
    Arg::new("recipe")
        .required(true)
        .value_name("RECIPE")
        .help("Path to the recipe file")
}

/// Common argument: settings pairs
fn setting_arg() -> Arg {
    Arg::new("setting")
        .short('s')
        .long("setting")
        .value_name("KEY=VALUE")
        .action(ArgAction::Append)
        .help("Setting value, e.g. os=Linux or compiler.cppstd=17 (repeatable)")
}

fn no_host_arg() -> Arg {
    Arg::new("no_host")
        .long("no-host")
        .action(ArgAction::SetTrue)
        .help("Start from empty settings instead of the host's os/arch/build_type")
}

fn build_cli() -> Command {
    Command::new("recipekit")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Recipekit Contributors")
        .about("Inspect, export and cook native library package recipes")
        .subcommand_required(true)
        .subcommand(
            Command::new("inspect")
                .about("Print a recipe's metadata surface as JSON")
                .arg(recipe_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a recipe for authoring errors and print warnings")
                .arg(recipe_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Export a recipe's sources and print the export manifest")
                .arg(recipe_arg())
                .arg(
                    Arg::new("dest")
                        .short('d')
                        .long("dest")
                        .required(true)
                        .help("Destination directory"),
                ),
        )
        .subcommand(
            Command::new("package-id")
                .about("Print the package id for a settings combination")
                .arg(recipe_arg())
                .arg(setting_arg())
                .arg(no_host_arg()),
        )
        .subcommand(
            Command::new("cook")
                .about("Cook a recipe: export, resolve, then run every lifecycle phase")
                .arg(recipe_arg())
                .arg(setting_arg())
                .arg(no_host_arg())
                .arg(
                    Arg::new("deps")
                        .long("deps")
                        .help("Directory of built dependencies (<name>/<version>/package_info.json)"),
                )
                .arg(
                    Arg::new("work_root")
                        .long("work-root")
                        .help("Root for working areas (default: $RECIPEKIT_WORK_ROOT or the temp dir)"),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help("Number of parallel build jobs (default: auto)"),
                )
                .arg(
                    Arg::new("generator")
                        .short('G')
                        .long("generator")
                        .help("Build-tool generator, e.g. Ninja"),
                )
                .arg(Arg::new("cmake").long("cmake").help("Path to the cmake program"))
                .arg(
                    Arg::new("keep_workdir")
                        .long("keep-workdir")
                        .action(ArgAction::SetTrue)
                        .help("Keep the build tree after a successful cook"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("recipekit.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
