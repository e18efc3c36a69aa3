// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::task::TaskDescriptor;
use crate::types::LogMode;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [coordinator]
/// agent = "10.0.0.7:7878"
/// log_mode = "batched"
///
/// [agent]
/// listen = "0.0.0.0:7878"
///
/// [task.version]
/// command = ["rustc", "--version"]
/// return_stdout = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub coordinator: CoordinatorSection,

    #[serde(default)]
    pub agent: AgentSection,

    /// Named tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[coordinator]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CoordinatorSection {
    /// `host:port` of the agent to dispatch to. When absent, commands run
    /// directly on this machine.
    #[serde(default)]
    pub agent: Option<String>,

    /// `"batched"` (default) or `"per_line"`; per-line only applies to
    /// direct execution.
    #[serde(default)]
    pub log_mode: LogMode,
}

/// `[agent]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

pub const DEFAULT_AGENT_PORT: u16 = 7878;

fn default_listen() -> String {
    format!("0.0.0.0:{DEFAULT_AGENT_PORT}")
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Argument vector; the first token is the executable.
    pub command: Vec<String>,

    #[serde(default)]
    pub return_stdout: bool,

    #[serde(default)]
    pub return_status: bool,

    /// Encoding label; omitted or empty means the worker's default.
    #[serde(default)]
    pub encoding: Option<String>,
}

impl TaskConfig {
    pub fn to_descriptor(&self) -> crate::errors::Result<TaskDescriptor> {
        TaskDescriptor::builder(self.command.clone())
            .return_stdout(self.return_stdout)
            .return_status(self.return_status)
            .encoding_opt(self.encoding.clone())
            .build()
    }
}

/// Validated configuration. Obtain it via `ConfigFile::try_from(raw)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub coordinator: CoordinatorSection,
    pub agent: AgentSection,
    tasks: BTreeMap<String, TaskDescriptor>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        coordinator: CoordinatorSection,
        agent: AgentSection,
        tasks: BTreeMap<String, TaskDescriptor>,
    ) -> Self {
        Self {
            coordinator,
            agent,
            tasks,
        }
    }

    pub fn task(&self, name: &str) -> Option<&TaskDescriptor> {
        self.tasks.get(name)
    }

    /// Tasks in name order.
    pub fn tasks(&self) -> impl Iterator<Item = (&str, &TaskDescriptor)> {
        self.tasks.iter().map(|(k, v)| (k.as_str(), v))
    }
}
