// src/console/mock.rs

use std::sync::{Arc, Mutex};

use super::ConsoleLog;

/// In-memory console that records every write, in order.
///
/// Clones share the same buffer, so a test can hand one clone to the
/// coordinator and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write so far, one entry per `line` call.
    pub fn writes(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl ConsoleLog for MemoryConsole {
    fn line(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}
