// src/coordinator/mod.rs

//! Coordinator side: dispatch a task and turn its envelope into a step value.
//!
//! The decision logic lives in [`interpret`] and is pure; [`Coordinator`] is
//! the async shell around it that writes the "running" line, gets an
//! envelope through the configured [`Route`], and hands it over.
//!
//! Two front doors share that path:
//! - [`Coordinator::run_step`] / [`Coordinator::run_command`]: scripted step
//!   with the full option set, returning a [`StepValue`];
//! - [`Coordinator::run_build_step`]: unconditional build step that logs all
//!   output and fails on any non-zero exit.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::console::ConsoleLog;
use crate::errors::Result;
use crate::exec::execute_blocking;
use crate::task::{ResultEnvelope, TaskDescriptor};
use crate::transport::{Transport, TransportError};
use crate::types::LogMode;

pub mod interpret;

pub use interpret::interpret;

/// What a successful step hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepValue {
    /// Joined output text (`return_stdout`).
    Stdout(String),
    /// Exit code (`return_status` without `return_stdout`).
    Status(i32),
    /// Neither flag set and the command exited with 0.
    Completed,
}

/// Where the worker routine runs.
#[derive(Clone)]
pub enum Route {
    /// In this process, on a blocking worker thread.
    Direct { log_mode: LogMode },
    /// On a remote worker reached through a transport. Output is always
    /// logged in one batch after the call returns.
    Remote(Arc<dyn Transport>),
}

impl Route {
    pub fn direct(log_mode: LogMode) -> Self {
        Route::Direct { log_mode }
    }

    pub fn remote<T: Transport + 'static>(transport: T) -> Self {
        Route::Remote(Arc::new(transport))
    }

    fn describe(&self) -> String {
        match self {
            Route::Direct { .. } => "direct".to_string(),
            Route::Remote(t) => t.endpoint(),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Direct { log_mode } => f.debug_struct("Direct").field("log_mode", log_mode).finish(),
            Route::Remote(t) => f.debug_tuple("Remote").field(&t.endpoint()).finish(),
        }
    }
}

/// Raw invocation options for [`Coordinator::run_command`].
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
    pub return_stdout: bool,
    pub return_status: bool,
    pub encoding: Option<String>,
}

/// Envelope as delivered to the coordinator, plus whether its output already
/// reached the console line by line.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub envelope: ResultEnvelope,
    pub output_logged: bool,
}

#[derive(Debug, Clone)]
pub struct Coordinator {
    route: Route,
    console: Arc<dyn ConsoleLog>,
}

impl Coordinator {
    pub fn new(route: Route, console: Arc<dyn ConsoleLog>) -> Self {
        Self { route, console }
    }

    /// Scripted step: run `task` and interpret the outcome per its flags.
    pub async fn run_step(&self, task: &TaskDescriptor) -> Result<StepValue> {
        let dispatched = self.dispatch(task).await?;
        let outcome = interpret(
            task,
            dispatched.envelope,
            self.console.as_ref(),
            dispatched.output_logged,
        );

        match &outcome {
            Ok(value) => debug!(command = %task.display_command(), ?value, "step finished"),
            Err(e) => warn!(command = %task.display_command(), error = %e, "step failed"),
        }
        outcome
    }

    /// Scripted step from raw invocation parameters; an empty command is
    /// rejected before anything is dispatched.
    pub async fn run_command(
        &self,
        command: Vec<String>,
        options: StepOptions,
    ) -> Result<StepValue> {
        let task = TaskDescriptor::builder(command)
            .return_stdout(options.return_stdout)
            .return_status(options.return_status)
            .encoding_opt(options.encoding)
            .build()?;
        self.run_step(&task).await
    }

    /// Build step: default options, all output logged, non-zero exit fails.
    pub async fn run_build_step(&self, command: Vec<String>) -> Result<()> {
        let task = TaskDescriptor::new(command)?;
        self.run_step(&task).await.map(|_| ())
    }

    /// Get an envelope for `task` through the configured route.
    ///
    /// Channel faults come back as errors here. The envelope itself is not
    /// interpreted, so callers needing both the text and the exit code can
    /// read them from it directly.
    pub async fn dispatch(&self, task: &TaskDescriptor) -> Result<Dispatched> {
        self.console
            .line(&format!("running: {}", task.display_command()));

        debug!(
            route = %self.route.describe(),
            command = %task.display_command(),
            "dispatching task"
        );

        match &self.route {
            Route::Direct { log_mode } => {
                let per_line = *log_mode == LogMode::PerLine && !task.return_stdout();
                let envelope = if per_line {
                    let console = Arc::clone(&self.console);
                    execute_blocking(task.clone(), move |line| console.line(line)).await?
                } else {
                    execute_blocking(task.clone(), |_| {}).await?
                };
                Ok(Dispatched {
                    envelope,
                    output_logged: per_line,
                })
            }
            Route::Remote(transport) => {
                let envelope = transport.call(task.clone()).await?;
                if !envelope.is_finalized() {
                    return Err(TransportError::Incomplete.into());
                }
                Ok(Dispatched {
                    envelope,
                    output_logged: false,
                })
            }
        }
    }
}
