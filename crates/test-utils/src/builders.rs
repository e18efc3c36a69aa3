#![allow(dead_code)]

use remote_task::task::{CapturedFailure, FailureKind, ResultEnvelope};

/// Builder for canned `ResultEnvelope`s returned by fake transports.
pub struct EnvelopeBuilder {
    envelope: ResultEnvelope,
}

impl EnvelopeBuilder {
    pub fn new() -> Self {
        Self {
            envelope: ResultEnvelope::new(),
        }
    }

    pub fn line(mut self, line: &str) -> Self {
        self.envelope.push_line(line);
        self
    }

    pub fn lines(mut self, lines: &[&str]) -> Self {
        for l in lines {
            self.envelope.push_line(*l);
        }
        self
    }

    /// Finish as a process that exited with `code`.
    pub fn exited(mut self, code: i32) -> ResultEnvelope {
        self.envelope.complete(code);
        self.envelope
    }

    /// Finish with a captured worker-side fault.
    pub fn failed(mut self, kind: FailureKind, message: &str) -> ResultEnvelope {
        self.envelope.fail(CapturedFailure::new(kind, message));
        self.envelope
    }

    /// Leave the envelope unfinalized (neither code nor error).
    pub fn unfinished(self) -> ResultEnvelope {
        self.envelope
    }
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
