// src/recipe/kitchen/builder.rs

//! The external build tool a cook delegates compilation to
//!
//! A cook never compiles anything itself. The build and package phases call
//! through [`ExternalBuilder`], which a runtime implements over CMake (see
//! [`CMakeBuilder`]) and tests replace with a fake.

use crate::error::{Error, Result};
use crate::settings::BuildType;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Everything a build tool needs to configure, build and install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderArgs {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub generators_dir: PathBuf,
    pub toolchain_file: PathBuf,
    /// Install prefix
    pub package_dir: PathBuf,
    pub build_type: BuildType,
    pub jobs: u32,
    /// Generator name (e.g. "Ninja"); the tool's default when unset
    pub generator: Option<String>,
    /// Extra cache definitions passed on the configure command line
    pub definitions: BTreeMap<String, String>,
}

/// Captured result of one tool invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// None when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success() -> Self {
        Self {
            exit_code: Some(0),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Convert a failed invocation into [`Error::ExternalTool`]
    pub fn check(self, tool: &str, step: &str) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        // Compiler diagnostics often land on stdout (ninja, msbuild)
        let output = [self.stdout.trim_end(), self.stderr.trim_end()]
            .into_iter()
            .filter(|stream| !stream.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        Err(Error::ExternalTool {
            tool: tool.to_string(),
            step: step.to_string(),
            exit_code: self.exit_code,
            output,
        })
    }
}

/// Capability for the configure, build and install steps
///
/// Implementations return the tool's output even when it failed; the cook
/// turns a non-zero exit into an error so the output lands in the log.
pub trait ExternalBuilder: Send + Sync {
    /// Tool name used in diagnostics
    fn name(&self) -> &str;

    fn configure(&self, args: &BuilderArgs) -> Result<ToolOutput>;

    fn build(&self, args: &BuilderArgs) -> Result<ToolOutput>;

    fn install(&self, args: &BuilderArgs) -> Result<ToolOutput>;
}

/// [`ExternalBuilder`] over the `cmake` command line
#[derive(Debug, Clone)]
pub struct CMakeBuilder {
    program: PathBuf,
}

impl CMakeBuilder {
    /// Use a specific program
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate `cmake`, preferring an explicit program when given
    pub fn locate(program: Option<&Path>) -> Result<Self> {
        match program {
            Some(path) if path.components().count() > 1 => {
                if path.is_file() {
                    Ok(Self::new(std::path::absolute(path)?))
                } else {
                    Err(Error::ToolNotFound(path.display().to_string()))
                }
            }
            Some(name) => which::which(name)
                .map(Self::new)
                .map_err(|e| Error::ToolNotFound(format!("{}: {}", name.display(), e))),
            None => which::which("cmake")
                .map(Self::new)
                .map_err(|e| Error::ToolNotFound(format!("cmake: {}", e))),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn configure_args(args: &BuilderArgs) -> Vec<String> {
        let mut argv = vec![
            "-S".to_string(),
            args.source_dir.display().to_string(),
            "-B".to_string(),
            args.build_dir.display().to_string(),
            format!("-DCMAKE_TOOLCHAIN_FILE={}", args.toolchain_file.display()),
            format!("-DCMAKE_INSTALL_PREFIX={}", args.package_dir.display()),
        ];
        if let Some(generator) = &args.generator {
            argv.push("-G".to_string());
            argv.push(generator.clone());
        }
        for (key, value) in &args.definitions {
            argv.push(format!("-D{}={}", key, value));
        }
        argv
    }

    pub fn build_args(args: &BuilderArgs) -> Vec<String> {
        vec![
            "--build".to_string(),
            args.build_dir.display().to_string(),
            "--config".to_string(),
            args.build_type.to_string(),
            "--parallel".to_string(),
            args.jobs.max(1).to_string(),
        ]
    }

    pub fn install_args(args: &BuilderArgs) -> Vec<String> {
        vec![
            "--install".to_string(),
            args.build_dir.display().to_string(),
            "--config".to_string(),
            args.build_type.to_string(),
            "--prefix".to_string(),
            args.package_dir.display().to_string(),
        ]
    }

    fn run(&self, step: &str, argv: &[String], workdir: &Path) -> Result<ToolOutput> {
        debug!("Command: {} {}", self.program.display(), argv.join(" "));

        let output = Command::new(&self.program)
            .args(argv)
            .current_dir(workdir)
            .output()
            .map_err(|e| {
                Error::IoError(format!(
                    "Failed to run {} {}: {}",
                    self.program.display(),
                    step,
                    e
                ))
            })?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl ExternalBuilder for CMakeBuilder {
    fn name(&self) -> &str {
        "cmake"
    }

    fn configure(&self, args: &BuilderArgs) -> Result<ToolOutput> {
        std::fs::create_dir_all(&args.build_dir)?;
        self.run("configure", &Self::configure_args(args), &args.build_dir)
    }

    fn build(&self, args: &BuilderArgs) -> Result<ToolOutput> {
        self.run("build", &Self::build_args(args), &args.build_dir)
    }

    fn install(&self, args: &BuilderArgs) -> Result<ToolOutput> {
        std::fs::create_dir_all(&args.package_dir)?;
        self.run("install", &Self::install_args(args), &args.build_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> BuilderArgs {
        BuilderArgs {
            source_dir: PathBuf::from("/w/source"),
            build_dir: PathBuf::from("/w/build/Release"),
            generators_dir: PathBuf::from("/w/build/Release/generators"),
            toolchain_file: PathBuf::from("/w/build/Release/generators/recipekit_toolchain.cmake"),
            package_dir: PathBuf::from("/w/package"),
            build_type: BuildType::Release,
            jobs: 8,
            generator: Some("Ninja".to_string()),
            definitions: BTreeMap::from([("WITH_TESTS".to_string(), "OFF".to_string())]),
        }
    }

    #[test]
    fn test_configure_command_line() {
        let argv = CMakeBuilder::configure_args(&args());
        assert_eq!(&argv[..4], ["-S", "/w/source", "-B", "/w/build/Release"]);
        assert!(argv.contains(
            &"-DCMAKE_TOOLCHAIN_FILE=/w/build/Release/generators/recipekit_toolchain.cmake"
                .to_string()
        ));
        assert!(argv.windows(2).any(|w| w == ["-G", "Ninja"]));
        assert_eq!(argv.last().unwrap(), "-DWITH_TESTS=OFF");
    }

    #[test]
    fn test_build_and_install_command_lines() {
        assert_eq!(
            CMakeBuilder::build_args(&args()),
            vec!["--build", "/w/build/Release", "--config", "Release", "--parallel", "8"]
        );
        assert_eq!(
            CMakeBuilder::install_args(&args()),
            vec!["--install", "/w/build/Release", "--config", "Release", "--prefix", "/w/package"]
        );
    }

    #[test]
    fn test_check_failed_output() {
        let output = ToolOutput {
            exit_code: Some(2),
            stdout: "building...".to_string(),
            stderr: "ld: undefined reference\n".to_string(),
        };
        let err = output.check("cmake", "build").unwrap_err();
        assert_eq!(err.exit_code(), Some(2));
        assert!(err.to_string().contains("ld: undefined reference"));

        assert!(ToolOutput::success().check("cmake", "build").is_ok());
    }

    #[test]
    fn test_check_keeps_both_streams() {
        let output = ToolOutput {
            exit_code: Some(1),
            stdout: "FAILED: src/core.o\nsrc/core.cpp:3: error: 'foo' was not declared\n"
                .to_string(),
            stderr: "ninja: build stopped: subcommand failed.\n".to_string(),
        };
        let err = output.check("cmake", "build").unwrap_err();
        let Error::ExternalTool { output, .. } = &err else {
            panic!("expected ExternalTool, got {:?}", err);
        };
        assert_eq!(
            output,
            "FAILED: src/core.o\nsrc/core.cpp:3: error: 'foo' was not declared\n\
             ninja: build stopped: subcommand failed."
        );

        let quiet = ToolOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "CMake Error: no CMakeLists.txt\n".to_string(),
        };
        let err = quiet.check("cmake", "configure").unwrap_err();
        assert!(err.to_string().ends_with("exit code 1\nCMake Error: no CMakeLists.txt"));
    }

    #[test]
    fn test_locate_missing_program() {
        let err = CMakeBuilder::locate(Some(Path::new("/nonexistent/bin/cmake"))).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));

        let err = CMakeBuilder::locate(Some(Path::new("recipekit-no-such-tool"))).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }
}
