// src/task/descriptor.rs

use serde::{Deserialize, Serialize};

use crate::errors::{RemoteTaskError, Result};

/// Immutable description of a command to run on a worker.
///
/// Each token of `command` is passed to the process launcher as one argv
/// entry; there is no shell interpretation. The flags only affect how the
/// coordinator interprets the outcome, never how the worker runs it.
///
/// Deserialization re-runs the same validation as [`TaskDescriptorBuilder::build`],
/// so a descriptor received over the wire is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTaskDescriptor")]
pub struct TaskDescriptor {
    command: Vec<String>,
    return_stdout: bool,
    return_status: bool,
    encoding: Option<String>,
}

/// Wire/config shape of a descriptor before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawTaskDescriptor {
    command: Vec<String>,
    #[serde(default)]
    return_stdout: bool,
    #[serde(default)]
    return_status: bool,
    #[serde(default)]
    encoding: Option<String>,
}

impl TryFrom<RawTaskDescriptor> for TaskDescriptor {
    type Error = RemoteTaskError;

    fn try_from(raw: RawTaskDescriptor) -> std::result::Result<Self, Self::Error> {
        TaskDescriptor::builder(raw.command)
            .return_stdout(raw.return_stdout)
            .return_status(raw.return_status)
            .encoding_opt(raw.encoding)
            .build()
    }
}

impl TaskDescriptor {
    /// Descriptor with default options: output is logged, a non-zero exit is
    /// fatal, and the worker's platform encoding is used.
    pub fn new<I, S>(command: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder(command).build()
    }

    pub fn builder<I, S>(command: I) -> TaskDescriptorBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TaskDescriptorBuilder {
            command: command.into_iter().map(Into::into).collect(),
            return_stdout: false,
            return_status: false,
            encoding: None,
        }
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// The executable token (first argv entry).
    pub fn program(&self) -> &str {
        // Validation guarantees at least one token.
        &self.command[0]
    }

    pub fn args(&self) -> &[String] {
        &self.command[1..]
    }

    pub fn return_stdout(&self) -> bool {
        self.return_stdout
    }

    pub fn return_status(&self) -> bool {
        self.return_status
    }

    /// Requested encoding label, or `None` for the worker's platform default.
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Tokens joined by single spaces, for human-readable log lines.
    pub fn display_command(&self) -> String {
        self.command.join(" ")
    }
}

/// Builder for [`TaskDescriptor`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct TaskDescriptorBuilder {
    command: Vec<String>,
    return_stdout: bool,
    return_status: bool,
    encoding: Option<String>,
}

impl TaskDescriptorBuilder {
    /// Return captured output as the step value instead of logging it.
    pub fn return_stdout(mut self, val: bool) -> Self {
        self.return_stdout = val;
        self
    }

    /// Return a non-zero exit code as the step value instead of failing.
    pub fn return_status(mut self, val: bool) -> Self {
        self.return_status = val;
        self
    }

    /// Text encoding used to decode the process output. An empty label means
    /// "platform default of the worker".
    pub fn encoding(self, label: impl Into<String>) -> Self {
        self.encoding_opt(Some(label.into()))
    }

    pub fn encoding_opt(mut self, label: Option<String>) -> Self {
        self.encoding = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        self
    }

    pub fn build(self) -> Result<TaskDescriptor> {
        if self.command.is_empty() {
            return Err(RemoteTaskError::InvalidTask(
                "a command needs at least one token (the executable)".to_string(),
            ));
        }

        Ok(TaskDescriptor {
            command: self.command,
            return_stdout: self.return_stdout,
            return_status: self.return_status,
            encoding: self.encoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        let err = TaskDescriptor::new(Vec::<String>::new()).unwrap_err();
        match err {
            RemoteTaskError::InvalidTask(msg) => assert!(msg.contains("at least one token")),
            other => panic!("expected InvalidTask, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_log_and_fail() {
        let task = TaskDescriptor::new(["echo", "hello"]).unwrap();
        assert!(!task.return_stdout());
        assert!(!task.return_status());
        assert_eq!(task.encoding(), None);
        assert_eq!(task.program(), "echo");
        assert_eq!(task.args(), ["hello".to_string()]);
        assert_eq!(task.display_command(), "echo hello");
    }

    #[test]
    fn blank_encoding_means_platform_default() {
        let task = TaskDescriptor::builder(["true"]).encoding("  ").build().unwrap();
        assert_eq!(task.encoding(), None);

        let task = TaskDescriptor::builder(["true"]).encoding("UTF-16LE").build().unwrap();
        assert_eq!(task.encoding(), Some("UTF-16LE"));
    }

    #[test]
    fn tokens_are_kept_verbatim() {
        let task = TaskDescriptor::new(["sh", "-c", "echo 'a  b' | cat"]).unwrap();
        assert_eq!(task.command()[2], "echo 'a  b' | cat");
    }

    #[test]
    fn deserialization_applies_validation() {
        let ok: TaskDescriptor =
            serde_json::from_str(r#"{"command":["ls","-l"],"return_status":true}"#).unwrap();
        assert_eq!(ok.command(), ["ls".to_string(), "-l".to_string()]);
        assert!(ok.return_status());
        assert!(!ok.return_stdout());

        let err = serde_json::from_str::<TaskDescriptor>(r#"{"command":[]}"#).unwrap_err();
        assert!(err.to_string().contains("at least one token"));
    }
}
