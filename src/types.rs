use serde::Deserialize;

/// How captured output reaches the console when it is not returned.
///
/// - `Batched`: write the joined output once, after the call completed
///   (default; the only mode available across a transport).
/// - `PerLine`: write each line as the worker decodes it. Only honoured when
///   the command runs directly on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogMode {
    Batched,
    PerLine,
}

impl Default for LogMode {
    fn default() -> Self {
        LogMode::Batched
    }
}
