// src/console/mod.rs

//! The invoking user's log.
//!
//! This is the ordered text log a build step writes to, not diagnostic
//! logging (that goes through `tracing` to stderr).

use std::fmt::Debug;
use std::io::Write;

pub mod mock;

pub use mock::MemoryConsole;

/// Append-only, ordered text sink.
pub trait ConsoleLog: Send + Sync + Debug {
    /// Append one line; `text` may itself contain line separators.
    fn line(&self, text: &str);
}

/// Console backed by the process stdout.
#[derive(Debug, Clone, Default)]
pub struct StdoutConsole;

impl ConsoleLog for StdoutConsole {
    fn line(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout must not abort the invocation.
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}
