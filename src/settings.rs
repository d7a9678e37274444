// src/settings.rs

//! Build settings: the axes a recipe declares and the values a runtime supplies
//!
//! A recipe only names the axes that influence its binaries. The values for
//! those axes come from the invoking runtime as an explicit [`Settings`]
//! struct; nothing here reads global state except [`Settings::detect_host`],
//! which a runtime may call to seed defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A build-parameter dimension that can produce distinct outputs
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SettingAxis {
    /// Operating system (Linux, Windows, Macos, ...)
    Os,
    /// CPU architecture (x86_64, armv8, ...)
    Arch,
    /// Compiler identity and its sub-settings
    Compiler,
    /// Build configuration (Debug, Release, ...)
    BuildType,
}

/// Build configuration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(ascii_case_insensitive)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

/// Compiler identity with optional sub-settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerSettings {
    /// Compiler family (gcc, clang, apple-clang, msvc)
    pub name: String,
    /// Compiler version (e.g. "13")
    #[serde(default)]
    pub version: Option<String>,
    /// C++ standard without the gnu/std prefix (e.g. "17", "gnu20")
    #[serde(default)]
    pub cppstd: Option<String>,
    /// C++ standard library (libstdc++11, libc++)
    #[serde(default)]
    pub libcxx: Option<String>,
}

impl CompilerSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_cppstd(mut self, cppstd: impl Into<String>) -> Self {
        self.cppstd = Some(cppstd.into());
        self
    }

    /// Numeric C++ standard for CMAKE_CXX_STANDARD and whether GNU extensions are on
    pub fn cxx_standard(&self) -> Option<(&str, bool)> {
        let cppstd = self.cppstd.as_deref()?;
        match cppstd.strip_prefix("gnu") {
            Some(level) => Some((level, true)),
            None => Some((cppstd, false)),
        }
    }
}

impl fmt::Display for CompilerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "-{}", version)?;
        }
        Ok(())
    }
}

/// Values for the settings axes, supplied by the runtime for one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub compiler: Option<CompilerSettings>,
    #[serde(default)]
    pub build_type: Option<BuildType>,
}

impl Settings {
    /// Empty settings; every axis unset
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `os`, `arch` and `build_type` from the host
    ///
    /// The compiler is left unset: it has no reliable host default and must
    /// be supplied by the caller.
    pub fn detect_host() -> Self {
        let os = match std::env::consts::OS {
            "linux" => "Linux",
            "macos" => "Macos",
            "windows" => "Windows",
            "freebsd" => "FreeBSD",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "aarch64" => "armv8",
            "x86" => "x86",
            "arm" => "armv7",
            other => other,
        };

        Self {
            os: Some(os.to_string()),
            arch: Some(arch.to_string()),
            compiler: None,
            build_type: Some(BuildType::Release),
        }
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = Some(arch.into());
        self
    }

    pub fn with_compiler(mut self, compiler: CompilerSettings) -> Self {
        self.compiler = Some(compiler);
        self
    }

    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = Some(build_type);
        self
    }

    /// Set a single value from a `key` such as `os` or `compiler.version`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::InvalidSettings(format!("empty value for '{}'", key)));
        }

        match key.trim() {
            "os" => self.os = Some(value.to_string()),
            "arch" => self.arch = Some(value.to_string()),
            "build_type" => {
                let build_type = value.parse::<BuildType>().map_err(|_| {
                    Error::InvalidSettings(format!("unknown build_type '{}'", value))
                })?;
                self.build_type = Some(build_type);
            }
            "compiler" => match &mut self.compiler {
                Some(compiler) => compiler.name = value.to_string(),
                None => self.compiler = Some(CompilerSettings::new(value)),
            },
            sub if sub.starts_with("compiler.") => {
                let compiler = self.compiler.as_mut().ok_or_else(|| {
                    Error::InvalidSettings(format!("'{}' set before 'compiler'", sub))
                })?;
                match &sub["compiler.".len()..] {
                    "version" => compiler.version = Some(value.to_string()),
                    "cppstd" => compiler.cppstd = Some(value.to_string()),
                    "libcxx" => compiler.libcxx = Some(value.to_string()),
                    other => {
                        return Err(Error::InvalidSettings(format!(
                            "unknown compiler sub-setting '{}'",
                            other
                        )));
                    }
                }
            }
            other => {
                return Err(Error::InvalidSettings(format!("unknown setting '{}'", other)));
            }
        }

        Ok(())
    }

    /// Apply `key=value` pairs on top of these settings, in order
    pub fn apply_pairs<I, S>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::InvalidSettings(format!("expected key=value, got '{}'", pair))
            })?;
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Whether a value is present for the axis
    pub fn has(&self, axis: SettingAxis) -> bool {
        match axis {
            SettingAxis::Os => self.os.is_some(),
            SettingAxis::Arch => self.arch.is_some(),
            SettingAxis::Compiler => self.compiler.is_some(),
            SettingAxis::BuildType => self.build_type.is_some(),
        }
    }

    /// Fail unless every declared axis has a value
    pub fn require(&self, axes: &[SettingAxis]) -> Result<()> {
        let missing: Vec<&str> = axes
            .iter()
            .filter(|axis| !self.has(**axis))
            .map(|axis| axis.as_ref())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidSettings(format!(
                "no value for declared axes: {}",
                missing.join(", ")
            )))
        }
    }

    /// Build type, defaulting to Release when the axis is not declared
    pub fn build_type_or_default(&self) -> BuildType {
        self.build_type.unwrap_or_default()
    }

    /// Whether the target OS is Windows
    pub fn is_windows(&self) -> bool {
        self.os
            .as_deref()
            .is_some_and(|os| os.eq_ignore_ascii_case("windows"))
    }

    /// Whether the target OS is an Apple platform
    pub fn is_apple(&self) -> bool {
        self.os.as_deref().is_some_and(|os| {
            ["macos", "ios", "tvos", "watchos"]
                .iter()
                .any(|apple| os.eq_ignore_ascii_case(apple))
        })
    }

    /// Flattened `key=value` entries for the given axes, in axis order
    ///
    /// Only declared axes contribute; this is what package ids are computed
    /// over, so undeclared settings never split the binary space.
    pub fn canonical_entries(&self, axes: &[SettingAxis]) -> Vec<(String, String)> {
        let mut sorted = axes.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut entries = Vec::new();
        for axis in sorted {
            match axis {
                SettingAxis::Os => {
                    if let Some(os) = &self.os {
                        entries.push(("os".to_string(), os.clone()));
                    }
                }
                SettingAxis::Arch => {
                    if let Some(arch) = &self.arch {
                        entries.push(("arch".to_string(), arch.clone()));
                    }
                }
                SettingAxis::Compiler => {
                    if let Some(compiler) = &self.compiler {
                        entries.push(("compiler".to_string(), compiler.name.clone()));
                        if let Some(v) = &compiler.version {
                            entries.push(("compiler.version".to_string(), v.clone()));
                        }
                        if let Some(v) = &compiler.cppstd {
                            entries.push(("compiler.cppstd".to_string(), v.clone()));
                        }
                        if let Some(v) = &compiler.libcxx {
                            entries.push(("compiler.libcxx".to_string(), v.clone()));
                        }
                    }
                }
                SettingAxis::BuildType => {
                    if let Some(build_type) = &self.build_type {
                        entries.push(("build_type".to_string(), build_type.to_string()));
                    }
                }
            }
        }
        entries
    }
}
