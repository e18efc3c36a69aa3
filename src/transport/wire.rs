// src/transport/wire.rs

//! JSON-lines messages exchanged between coordinator and agent.
//!
//! One connection carries exactly one exchange:
//!
//! ```text
//! coordinator -> agent   {"version":1,"task":{"command":["echo","hi"],...}}\n
//! agent -> coordinator   {"status":"envelope","envelope":{"lines":["hi"],"return_code":0,"error":null}}\n
//! ```
//!
//! A request the agent cannot accept is answered with
//! `{"status":"rejected","reason":"..."}` and no process is started.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::task::{ResultEnvelope, TaskDescriptor};
use crate::transport::TransportError;

/// Bumped whenever the message shapes change incompatibly.
pub const PROTOCOL_VERSION: u32 = 1;

/// Upper bound for a request line read by the agent.
pub const MAX_REQUEST_BYTES: u64 = 1024 * 1024;

/// Upper bound for a response line read by the coordinator; it carries the
/// whole captured output.
pub const MAX_RESPONSE_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRequest {
    pub version: u32,
    pub task: TaskDescriptor,
}

impl WireRequest {
    pub fn new(task: TaskDescriptor) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            task,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WireResponse {
    Envelope { envelope: ResultEnvelope },
    Rejected { reason: String },
}

impl WireResponse {
    pub fn into_result(self) -> Result<ResultEnvelope, TransportError> {
        match self {
            WireResponse::Envelope { envelope } => Ok(envelope),
            WireResponse::Rejected { reason } => Err(TransportError::Rejected(reason)),
        }
    }
}

/// Serialize a message as one newline-terminated line.
pub fn encode_line<T: Serialize>(message: &T) -> Result<Vec<u8>, TransportError> {
    let mut bytes = serde_json::to_vec(message)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Read one message line of at most `limit` bytes.
///
/// Returns `Ok(None)` if the peer closed the stream before sending anything.
/// A final line without a trailing newline is accepted.
pub async fn read_message_line<R>(reader: R, limit: u64) -> Result<Option<String>, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut limited = reader.take(limit);
    let mut line = String::new();
    let n = limited.read_line(&mut line).await?;

    if n == 0 {
        return Ok(None);
    }
    if n as u64 >= limit && !line.ends_with('\n') {
        return Err(TransportError::TooLarge(limit));
    }
    Ok(Some(line))
}

/// Parse a request line, checking the protocol version.
///
/// Errors are returned as the rejection reason to send back.
pub fn decode_request(line: &str) -> Result<WireRequest, String> {
    let request: WireRequest =
        serde_json::from_str(line.trim_end()).map_err(|e| format!("invalid request: {e}"))?;

    if request.version != PROTOCOL_VERSION {
        return Err(format!(
            "protocol version {} is not supported (agent speaks {})",
            request.version, PROTOCOL_VERSION
        ));
    }

    Ok(request)
}
