// src/error.rs

//! Error types for recipe validation, export and the cook lifecycle

use crate::recipe::kitchen::Phase;
use thiserror::Error;

/// Result type used throughout recipekit
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading, validating or cooking a recipe
#[derive(Error, Debug)]
pub enum Error {
    /// The recipe itself is structurally invalid (bad patterns, dangling
    /// aliases, unknown axes, malformed layout)
    #[error("recipe authoring error: {0}")]
    Authoring(String),

    /// Recipe, reference or package info could not be parsed
    #[error("parse error: {0}")]
    ParseError(String),

    /// Supplied settings do not cover the declared axes or are malformed
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A declared dependency could not be satisfied
    #[error("dependency resolution failed: {0}")]
    ResolutionError(String),

    /// The external build tool exited unsuccessfully
    #[error("{tool} {step} failed with exit code {}\n{output}", describe_exit(.exit_code))]
    ExternalTool {
        tool: String,
        step: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// The external build tool could not be located
    #[error("build tool not found: {0}")]
    ToolNotFound(String),

    /// Outputs expected after build or package are missing
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// An export pattern matched nothing on disk
    #[error("export failed: {0}")]
    ExportFailed(String),

    /// A phase was requested out of order
    #[error("phase {requested} requested but the next phase is {}", describe_next(.expected))]
    PhaseOrder {
        expected: Option<Phase>,
        requested: Phase,
    },

    /// The lifecycle already failed and cannot be resumed
    #[error("cook already failed during {0} phase; restart from a clean working area")]
    PipelineFailed(Phase),

    /// A phase failed; carries the phase name with the underlying diagnostic
    #[error("{phase} phase failed: {source}")]
    PhaseFailed {
        phase: Phase,
        #[source]
        source: Box<Error>,
    },

    /// Another cook owns the working area for this settings combination
    #[error("working area busy: {0}")]
    Busy(String),

    /// I/O failure with context
    #[error("I/O error: {0}")]
    IoError(String),

    /// Bare I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

fn describe_next(phase: &Option<Phase>) -> String {
    match phase {
        Some(phase) => phase.to_string(),
        None => "none (lifecycle complete)".to_string(),
    }
}

impl Error {
    /// Wrap this error with the phase it occurred in
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            wrapped @ Error::PhaseFailed { .. } => wrapped,
            other => Error::PhaseFailed {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// The lifecycle phase this error was raised in, if any
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::PhaseFailed { phase, .. } => Some(*phase),
            Error::PipelineFailed(phase) => Some(*phase),
            _ => None,
        }
    }

    /// Exit status of the external tool, if this error came from one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Error::ExternalTool { exit_code, .. } => *exit_code,
            Error::PhaseFailed { source, .. } => source.exit_code(),
            _ => None,
        }
    }

    /// Whether this is an authoring defect (detectable without running any tool)
    pub fn is_authoring(&self) -> bool {
        match self {
            Error::Authoring(_) => true,
            Error::PhaseFailed { source, .. } => source.is_authoring(),
            _ => false,
        }
    }
}
