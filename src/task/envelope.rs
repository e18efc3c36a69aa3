// src/task/envelope.rs

//! Result envelope returned by the worker for one invocation.
//!
//! The envelope carries execution-time faults *inside* the value rather than
//! failing the call, so the coordinator can still log partial output before
//! deciding the invocation's outcome.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `return_code` value while no exit code has been obtained.
pub const NOT_DETERMINED: i32 = -1;

/// Separator used when joining captured lines into one text.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Which step of the worker routine failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The requested text encoding is unknown on the worker.
    Encoding,
    /// The process could not be started.
    Spawn,
    /// Reading the merged output stream failed.
    Read,
    /// Waiting for process termination failed.
    Wait,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Encoding => "encoding",
            FailureKind::Spawn => "spawn",
            FailureKind::Read => "read",
            FailureKind::Wait => "wait",
        };
        f.write_str(s)
    }
}

/// A fault captured on the worker, in a form that survives serialization.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind} failure: {message}")]
pub struct CapturedFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl CapturedFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of a single invocation.
///
/// Once finalized exactly one of these holds: `error` is set (and
/// `return_code` is still [`NOT_DETERMINED`]), or `return_code` is the real
/// exit status of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// Decoded output lines in read order.
    #[serde(default)]
    pub lines: Vec<String>,

    #[serde(default = "not_determined")]
    pub return_code: i32,

    #[serde(default)]
    pub error: Option<CapturedFailure>,
}

fn not_determined() -> i32 {
    NOT_DETERMINED
}

impl Default for ResultEnvelope {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            return_code: NOT_DETERMINED,
            error: None,
        }
    }
}

impl ResultEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Record the real exit code of the terminated process.
    pub fn complete(&mut self, return_code: i32) {
        self.return_code = return_code;
    }

    /// Record a captured fault; the return code stays undetermined.
    pub fn fail(&mut self, failure: CapturedFailure) {
        self.error = Some(failure);
    }

    /// Whether the envelope carries either a fault or a real exit code.
    pub fn is_finalized(&self) -> bool {
        self.error.is_some() || self.return_code != NOT_DETERMINED
    }

    /// Captured lines joined with the platform line separator.
    pub fn joined_output(&self) -> String {
        self.lines.join(LINE_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_envelope_is_not_finalized() {
        let env = ResultEnvelope::new();
        assert_eq!(env.return_code, NOT_DETERMINED);
        assert!(env.lines.is_empty());
        assert!(env.error.is_none());
        assert!(!env.is_finalized());
    }

    #[test]
    fn failure_keeps_partial_lines_and_sentinel() {
        let mut env = ResultEnvelope::new();
        env.push_line("partial");
        env.fail(CapturedFailure::new(FailureKind::Read, "broken pipe"));

        assert!(env.is_finalized());
        assert_eq!(env.return_code, NOT_DETERMINED);
        assert_eq!(env.lines, vec!["partial".to_string()]);
        assert_eq!(
            env.error.as_ref().map(ToString::to_string).as_deref(),
            Some("read failure: broken pipe")
        );
    }

    #[test]
    fn joined_output_uses_platform_separator() {
        let mut env = ResultEnvelope::new();
        assert_eq!(env.joined_output(), "");
        env.push_line("a");
        env.push_line("b");
        assert_eq!(env.joined_output(), format!("a{LINE_SEPARATOR}b"));
    }

    #[test]
    fn envelope_survives_the_wire() {
        let mut env = ResultEnvelope::new();
        env.push_line("a");
        env.push_line("b");
        env.complete(0);

        let json = serde_json::to_string(&env).unwrap();
        let back: ResultEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, env);
        assert_eq!(back.lines, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(back.return_code, 0);
        assert!(back.error.is_none());
        assert!(back.is_finalized());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let env: ResultEnvelope = serde_json::from_str("{}").unwrap();
        assert_eq!(env.return_code, NOT_DETERMINED);
        assert!(env.lines.is_empty());
    }
}
