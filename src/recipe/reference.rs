// src/recipe/reference.rs

//! Package references and version constraints
//!
//! Requirements are written as `name/version`. The version is either an
//! exact string (`spdlog/1.14.1`) or a bracketed range whose clauses are
//! separated by whitespace (`fmt/[>=10.0 <11]`). Ranges are evaluated with
//! `semver`; versions that are not strict semver (`3.11`, `2021.12`) are
//! padded before comparison.

use crate::error::{Error, Result};
use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version part of a requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// Exactly this version string
    Exact(String),
    /// Any version satisfying the range; keeps the authored text for display
    Range { req: VersionReq, raw: String },
}

impl VersionConstraint {
    /// Parse the part after the `/`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::ParseError("empty version".to_string()));
        }

        if let Some(inner) = s.strip_prefix('[') {
            let inner = inner.strip_suffix(']').ok_or_else(|| {
                Error::ParseError(format!("unterminated version range '{}'", s))
            })?;
            let clauses: Vec<&str> = inner
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|c| !c.is_empty())
                .collect();
            if clauses.is_empty() {
                return Err(Error::ParseError(format!("empty version range '{}'", s)));
            }
            let req = VersionReq::parse(&clauses.join(", "))
                .map_err(|e| Error::ParseError(format!("invalid version range '{}': {}", s, e)))?;
            return Ok(Self::Range {
                req,
                raw: clauses.join(" "),
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c == '/' || c == '@') {
            return Err(Error::ParseError(format!("invalid version '{}'", s)));
        }

        Ok(Self::Exact(s.to_string()))
    }

    /// Whether a concrete version satisfies this constraint
    pub fn matches(&self, version: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == version,
            Self::Range { req, .. } => lenient_version(version).is_some_and(|v| req.matches(&v)),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => write!(f, "{}", v),
            Self::Range { raw, .. } => write!(f, "[{}]", raw),
        }
    }
}

/// Parse a version, padding missing minor/patch components
///
/// `semver` rejects `3.11` and `2021.12`; recipes use them routinely.
pub fn lenient_version(s: &str) -> Option<Version> {
    if let Ok(v) = Version::parse(s) {
        return Some(v);
    }

    let (core, rest) = match s.find(['-', '+']) {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    };
    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(rest);
    Version::parse(&padded).ok()
}

/// A declared dependency: package name plus version constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Requirement {
    pub name: String,
    pub constraint: VersionConstraint,
}

impl Requirement {
    /// The default build-system alias a consumer links against (`name::name`)
    pub fn alias(&self) -> String {
        format!("{0}::{0}", self.name)
    }

    /// Whether a concrete reference satisfies this requirement
    pub fn is_satisfied_by(&self, reference: &PackageReference) -> bool {
        self.name == reference.name && self.constraint.matches(&reference.version)
    }
}

impl FromStr for Requirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, version) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::ParseError(format!("expected name/version, got '{}'", s)))?;

        validate_package_name(name)?;
        let constraint = VersionConstraint::parse(version)?;

        Ok(Self {
            name: name.to_string(),
            constraint,
        })
    }
}

impl TryFrom<String> for Requirement {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Requirement> for String {
    fn from(req: Requirement) -> Self {
        req.to_string()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.constraint)
    }
}

/// A concrete, resolved package (`name/exact-version`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageReference {
    pub name: String,
    pub version: String,
}

impl PackageReference {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// Package names: lowercase ASCII letters, digits and `_ - . +`, starting
/// with a letter or digit
pub fn validate_package_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 101
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        && name.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.' | '+')
        });

    if valid {
        Ok(())
    } else {
        Err(Error::ParseError(format!("invalid package name '{}'", name)))
    }
}
