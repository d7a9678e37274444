// src/recipe/kitchen/phase.rs

//! Lifecycle phases and the states a cook moves through

use crate::recipe::kitchen::layout::Layout;
use crate::recipe::kitchen::manifest::InstalledManifest;
use crate::recipe::package_info::PackageInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A named lifecycle callback, in the order a runtime must invoke them
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
pub enum Phase {
    Layout,
    Generate,
    Build,
    Package,
    PackageInfo,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Layout,
        Phase::Generate,
        Phase::Build,
        Phase::Package,
        Phase::PackageInfo,
    ];

    /// The phase that must follow this one
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Layout => Some(Phase::Generate),
            Phase::Generate => Some(Phase::Build),
            Phase::Build => Some(Phase::Package),
            Phase::Package => Some(Phase::PackageInfo),
            Phase::PackageInfo => None,
        }
    }

    /// State reached when this phase succeeds
    pub fn completed_state(self) -> CookState {
        match self {
            Phase::Layout => CookState::LayoutConfigured,
            Phase::Generate => CookState::Generated,
            Phase::Build => CookState::Built,
            Phase::Package => CookState::Packaged,
            Phase::PackageInfo => CookState::InfoPublished,
        }
    }
}

/// Where a cook is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookState {
    /// Identity and metadata populated; nothing has run
    Instantiated,
    LayoutConfigured,
    Generated,
    Built,
    Packaged,
    /// Terminal success
    InfoPublished,
    /// Terminal failure; records the phase that failed
    Failed(Phase),
}

impl CookState {
    /// The only phase that may be requested from this state
    pub fn next_phase(self) -> Option<Phase> {
        match self {
            CookState::Instantiated => Some(Phase::Layout),
            CookState::LayoutConfigured => Some(Phase::Generate),
            CookState::Generated => Some(Phase::Build),
            CookState::Built => Some(Phase::Package),
            CookState::Packaged => Some(Phase::PackageInfo),
            CookState::InfoPublished | CookState::Failed(_) => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CookState::InfoPublished | CookState::Failed(_))
    }
}

/// What a phase hands back to the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutput {
    LayoutConfigured(Layout),
    /// Files written into the generators folder
    Generated(Vec<PathBuf>),
    Built,
    Packaged(InstalledManifest),
    InfoPublished(PackageInfo),
}

/// One completed phase in a cook's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}
