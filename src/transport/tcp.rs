// src/transport/tcp.rs

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::task::{ResultEnvelope, TaskDescriptor};
use crate::transport::wire::{
    MAX_RESPONSE_BYTES, WireRequest, WireResponse, encode_line, read_message_line,
};
use crate::transport::{CallFuture, Transport, TransportError};

/// Transport that reaches an agent over TCP.
///
/// Opens one connection per call; nothing is retried.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    addr: String,
}

impl TcpTransport {
    /// `addr` is `host:port`; the host is resolved when connecting.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    async fn round_trip(&self, task: TaskDescriptor) -> Result<ResultEnvelope, TransportError> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|source| TransportError::Connect {
                endpoint: self.addr.clone(),
                source,
            })?;
        let (reader, mut writer) = stream.into_split();

        debug!(endpoint = %self.addr, command = %task.display_command(), "sending task to agent");

        let request = encode_line(&WireRequest::new(task))?;
        writer.write_all(&request).await?;
        writer.flush().await?;

        let line = read_message_line(BufReader::new(reader), MAX_RESPONSE_BYTES)
            .await?
            .ok_or(TransportError::Closed)?;

        let response: WireResponse = serde_json::from_str(line.trim_end())?;
        response.into_result()
    }
}

impl Transport for TcpTransport {
    fn endpoint(&self) -> String {
        self.addr.clone()
    }

    fn call(&self, task: TaskDescriptor) -> CallFuture<'_> {
        Box::pin(self.round_trip(task))
    }
}
