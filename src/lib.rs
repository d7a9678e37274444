// src/lib.rs

//! recipekit: package recipes for native libraries
//!
//! A recipe declares a package's identity, its settings axes, its upstream
//! requirements and the contract it publishes to consumers. A runtime drives
//! it through a fixed lifecycle of phases.
//!
//! # Architecture
//!
//! - Declarative recipes: TOML descriptors parsed into [`recipe::Recipe`]
//! - Explicit settings: values supplied per build, never read from globals
//! - State machine: [`recipe::Cook`] advances one phase at a time, in order
//! - Delegated builds: compilation goes through [`recipe::ExternalBuilder`]
//! - Package ids: SHA-256 over identity, declared axes and requirements

mod error;
pub mod hash;
pub mod recipe;
pub mod settings;

pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm, Hasher};
pub use settings::{BuildType, CompilerSettings, SettingAxis, Settings};
