// src/coordinator/interpret.rs

//! Pure interpretation of a result envelope.
//!
//! No Tokio, no processes, no sockets: given a descriptor and the envelope
//! that came back for it, decide what the caller sees. The order of the
//! decisions is observable (logging happens before any failure is raised)
//! and must not change:
//!
//! 1. write the joined output to the console, unless it is being returned
//!    or was already written line by line;
//! 2. re-raise a failure captured on the worker;
//! 3. fail on a non-zero exit unless status tolerance is on;
//! 4. return the output text if requested;
//! 5. otherwise return the exit code if requested.

use crate::console::ConsoleLog;
use crate::coordinator::StepValue;
use crate::errors::{RemoteTaskError, Result};
use crate::task::{ResultEnvelope, TaskDescriptor};

pub fn interpret(
    task: &TaskDescriptor,
    envelope: ResultEnvelope,
    console: &dyn ConsoleLog,
    output_logged: bool,
) -> Result<StepValue> {
    let text = envelope.joined_output();

    if !task.return_stdout() && !output_logged {
        console.line(&text);
    }

    if let Some(failure) = envelope.error {
        return Err(RemoteTaskError::Execution(failure));
    }

    let code = envelope.return_code;
    if code != 0 && !task.return_status() {
        return Err(RemoteTaskError::CommandFailed(code));
    }

    if task.return_stdout() {
        return Ok(StepValue::Stdout(text));
    }
    if task.return_status() {
        return Ok(StepValue::Status(code));
    }
    Ok(StepValue::Completed)
}
