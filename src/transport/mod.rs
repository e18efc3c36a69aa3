// src/transport/mod.rs

//! Pluggable call/response channel to a worker.
//!
//! The coordinator talks to a [`Transport`] instead of a concrete socket.
//! This makes it easy to swap in a fake transport in tests while keeping the
//! production client in [`tcp`].
//!
//! - [`TcpTransport`] ships the descriptor to an agent over TCP using the
//!   JSON-lines messages from [`wire`].
//! - Tests can provide their own `Transport` that, for example, records which
//!   descriptors were sent and replays canned envelopes or faults.
//!
//! A transport delivers the descriptor once, has the worker routine run
//! exactly once, and returns exactly one envelope. Anything else is a
//! [`TransportError`], which the coordinator always treats as fatal.

use std::future::Future;
use std::io;
use std::pin::Pin;

use thiserror::Error;

use crate::task::{ResultEnvelope, TaskDescriptor};

pub mod tcp;
pub mod wire;

pub use tcp::TcpTransport;

/// Channel-level faults: the outcome of the command is unknown.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("could not reach worker at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("channel I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed message on channel: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("worker closed the channel before sending a result")]
    Closed,

    #[error("message exceeds the {0}-byte limit")]
    TooLarge(u64),

    #[error("worker returned an envelope with neither an exit code nor an error")]
    Incomplete,

    #[error("worker rejected the request: {0}")]
    Rejected(String),

    #[error("worker thread failed: {0}")]
    Worker(String),
}

/// Boxed future returned by [`Transport::call`].
pub type CallFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResultEnvelope, TransportError>> + Send + 'a>>;

/// Trait abstracting how a descriptor reaches a worker.
pub trait Transport: Send + Sync {
    /// Human-readable description of the target, for log lines.
    fn endpoint(&self) -> String;

    /// Run `task` on the worker and return its envelope.
    fn call(&self, task: TaskDescriptor) -> CallFuture<'_>;
}
