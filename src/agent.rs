// src/agent.rs

//! Worker-node server.
//!
//! Accepts one request per TCP connection, runs the worker routine exactly
//! once on the blocking pool, and answers with exactly one envelope. Each
//! connection is handled on its own Tokio task, so invocations never share
//! state.

use std::future::Future;

use anyhow::{Context, Result};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::exec::execute_blocking;
use crate::transport::TransportError;
use crate::transport::wire::{
    MAX_REQUEST_BYTES, WireResponse, decode_request, encode_line, read_message_line,
};

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn bind_and_serve<S>(addr: &str, shutdown: S) -> Result<()>
where
    S: Future<Output = ()>,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding agent listener on {addr}"))?;
    serve(listener, shutdown).await
}

/// Serve connections from `listener` until `shutdown` resolves.
///
/// In-flight connections are not cancelled on shutdown; their tasks finish
/// on their own.
pub async fn serve<S>(listener: TcpListener, shutdown: S) -> Result<()>
where
    S: Future<Output = ()>,
{
    let local = listener.local_addr().context("reading agent listen address")?;
    info!(addr = %local, "agent listening");

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("agent shutdown requested; no longer accepting connections");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream).await {
                                warn!(%peer, error = %e, "connection failed");
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                    }
                }
            }
        }
    }

    Ok(())
}

async fn handle_connection(stream: TcpStream) -> Result<(), TransportError> {
    let (reader, mut writer) = stream.into_split();

    let decoded = match read_message_line(BufReader::new(reader), MAX_REQUEST_BYTES).await {
        Ok(Some(line)) => decode_request(&line),
        Ok(None) => {
            debug!("peer closed connection without a request");
            return Ok(());
        }
        Err(TransportError::TooLarge(limit)) => {
            Err(format!("request exceeds the {limit}-byte limit"))
        }
        Err(e) => return Err(e),
    };

    let response = match decoded {
        Ok(request) => {
            info!(command = %request.task.display_command(), "running task for coordinator");
            let envelope = execute_blocking(request.task, |_| {}).await?;
            WireResponse::Envelope { envelope }
        }
        Err(reason) => {
            warn!(%reason, "rejecting request");
            WireResponse::Rejected { reason }
        }
    };

    writer.write_all(&encode_line(&response)?).await?;
    writer.flush().await?;
    writer.shutdown().await?;
    Ok(())
}
