// src/exec/worker.rs

//! Worker execution routine.
//!
//! Runs one command and returns a [`ResultEnvelope`]. Every fault is captured
//! into the envelope; nothing escapes as an error or a panic, so the
//! coordinator always receives whatever output was read before the fault.

use std::io::{self, ErrorKind, Read};
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::{debug, info, warn};

use crate::exec::decode::{LineDecoder, resolve_encoding};
use crate::task::{CapturedFailure, FailureKind, NOT_DETERMINED, ResultEnvelope, TaskDescriptor};
use crate::transport::TransportError;

const READ_CHUNK: usize = 8 * 1024;

/// Run `task` to completion on the current thread.
///
/// `on_line` sees each decoded line right after it is appended to the
/// envelope. Blocks until the output stream reaches EOF and the process has
/// exited; there is no timeout.
pub fn execute<F>(task: &TaskDescriptor, mut on_line: F) -> ResultEnvelope
where
    F: FnMut(&str),
{
    let mut envelope = ResultEnvelope::new();

    match run_into(task, &mut envelope, &mut on_line) {
        Ok(()) => {
            debug!(
                command = %task.display_command(),
                exit_code = envelope.return_code,
                lines = envelope.lines.len(),
                "process exited"
            );
        }
        Err(failure) => {
            warn!(
                command = %task.display_command(),
                lines = envelope.lines.len(),
                error = %failure,
                "captured failure while running command"
            );
            envelope.fail(failure);
        }
    }

    envelope
}

/// Run [`execute`] on Tokio's blocking pool so async callers are not stalled.
///
/// A panic or cancellation of the blocking thread is reported as a
/// channel-level fault, the same as a broken connection to a remote worker.
pub async fn execute_blocking<F>(
    task: TaskDescriptor,
    on_line: F,
) -> Result<ResultEnvelope, TransportError>
where
    F: FnMut(&str) + Send + 'static,
{
    tokio::task::spawn_blocking(move || execute(&task, on_line))
        .await
        .map_err(|e| TransportError::Worker(e.to_string()))
}

fn run_into(
    task: &TaskDescriptor,
    envelope: &mut ResultEnvelope,
    on_line: &mut dyn FnMut(&str),
) -> Result<(), CapturedFailure> {
    let encoding = resolve_encoding(task.encoding())?;

    info!(
        command = %task.display_command(),
        encoding = encoding.name(),
        "starting process"
    );

    let (mut reader, writer) = io::pipe().map_err(|e| spawn_failure(task, e))?;
    let stderr_writer = writer.try_clone().map_err(|e| spawn_failure(task, e))?;

    let mut command = Command::new(task.program());
    command
        .args(task.args())
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer);

    let spawned = command.spawn();
    // `command` still owns the parent's write ends; the reader only sees EOF
    // once they are closed.
    drop(command);
    let mut child = spawned.map_err(|e| spawn_failure(task, e))?;

    let mut decoder = LineDecoder::new(encoding);
    let mut emit = |line: String| {
        on_line(&line);
        envelope.push_line(line);
    };

    if let Err(e) = read_lines(&mut reader, &mut decoder, &mut emit) {
        // The exit code stays undetermined.
        reap(&mut child);
        return Err(CapturedFailure::new(
            FailureKind::Read,
            format!("reading output of '{}': {e}", task.display_command()),
        ));
    }
    decoder.finish(&mut emit);
    drop(reader);

    let status = child.wait().map_err(|e| {
        CapturedFailure::new(
            FailureKind::Wait,
            format!("waiting for '{}' to exit: {e}", task.display_command()),
        )
    })?;

    envelope.complete(exit_code(status));
    Ok(())
}

/// Feed `reader` into `decoder` until EOF, retrying interrupted reads.
fn read_lines<R: Read>(
    reader: &mut R,
    decoder: &mut LineDecoder,
    emit: &mut dyn FnMut(String),
) -> io::Result<()> {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        decoder.feed(&buf[..n], emit);
    }
}

/// Kill and wait for a child whose output can no longer be read.
fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(pid = child.id(), error = %e, "kill after read failure");
    }
    if let Err(e) = child.wait() {
        warn!(pid = child.id(), error = %e, "could not reap child after read failure");
    }
}

fn spawn_failure(task: &TaskDescriptor, err: io::Error) -> CapturedFailure {
    CapturedFailure::new(
        FailureKind::Spawn,
        format!("could not spawn '{}': {err}", task.display_command()),
    )
}

/// Numeric exit code; a signal death on Unix maps to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    NOT_DETERMINED
}
