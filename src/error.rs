//! Error types
//!
//! Gameplay itself never fails: races between input, timers and state
//! transitions resolve to silent no-ops. The only hard failures are at
//! startup, when a required handle is missing or the balance file is bad.

use thiserror::Error;

/// Fatal startup errors
#[derive(Error, Debug)]
pub enum InitError {
    #[error("no global window")]
    NoWindow,

    #[error("window has no document")]
    NoDocument,

    #[error("required element '{0}' not found")]
    MissingElement(String),

    #[error("unknown level '{0}'")]
    UnknownLevel(String),

    #[error("failed to read tuning file '{path}': {source}")]
    TuningFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tuning: {0}")]
    InvalidTuning(#[from] TuningError),
}

/// Tuning file errors
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

pub type Result<T, E = InitError> = std::result::Result<T, E>;
