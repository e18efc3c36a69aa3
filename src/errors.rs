// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Two failure layers stay distinct: channel-level faults
//! ([`TransportError`]) and faults captured inside a result envelope on the
//! worker ([`CapturedFailure`]). Both are fatal to an invocation; only a clean
//! non-zero exit ([`RemoteTaskError::CommandFailed`]) may be tolerated.

use std::path::PathBuf;

use thiserror::Error;

use crate::task::CapturedFailure;
use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum RemoteTaskError {
    /// The invocation was rejected before anything was dispatched.
    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// A launch or I/O fault captured by the worker and re-raised here.
    #[error(transparent)]
    Execution(#[from] CapturedFailure),

    #[error("command failed with return code {0}")]
    CommandFailed(i32),

    #[error("reading config file at {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing TOML config from {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RemoteTaskError>;
