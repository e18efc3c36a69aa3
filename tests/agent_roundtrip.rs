// tests/agent_roundtrip.rs

//! Coordinator and agent talking over a real loopback socket.

#![cfg(unix)]

use std::net::SocketAddr;
use std::sync::Arc;

use remote_task::agent;
use remote_task::console::MemoryConsole;
use remote_task::coordinator::{Coordinator, Route, StepOptions, StepValue};
use remote_task::errors::RemoteTaskError;
use remote_task::task::{FailureKind, TaskDescriptor};
use remote_task::transport::wire::WireResponse;
use remote_task::transport::{TcpTransport, Transport, TransportError};
use remote_task_test_utils::{init_tracing, with_timeout};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct RunningAgent {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl RunningAgent {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(agent::serve(listener, async move {
            let _ = stopped.await;
        }));
        Self { addr, stop, handle }
    }

    fn coordinator(&self) -> (Coordinator, MemoryConsole) {
        let console = MemoryConsole::new();
        let route = Route::remote(TcpTransport::new(self.addr.to_string()));
        (Coordinator::new(route, Arc::new(console.clone())), console)
    }

    async fn shutdown(self) {
        let _ = self.stop.send(());
        with_timeout(self.handle).await.unwrap().unwrap();
    }
}

fn cmd(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn build_step_runs_on_the_agent() {
    init_tracing();
    let agent = RunningAgent::start().await;
    let (coordinator, console) = agent.coordinator();

    with_timeout(coordinator.run_build_step(cmd(&["echo", "hello"])))
        .await
        .unwrap();
    assert_eq!(console.writes(), vec!["running: echo hello", "hello"]);

    agent.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn exit_status_travels_back() {
    init_tracing();
    let agent = RunningAgent::start().await;
    let (coordinator, _console) = agent.coordinator();

    let options = StepOptions {
        return_status: true,
        ..StepOptions::default()
    };
    let value = with_timeout(coordinator.run_command(cmd(&["sh", "-c", "exit 3"]), options))
        .await
        .unwrap();
    assert_eq!(value, StepValue::Status(3));

    let err = with_timeout(coordinator.run_build_step(cmd(&["sh", "-c", "exit 3"])))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteTaskError::CommandFailed(3)));

    agent.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn launch_failure_on_agent_is_captured() {
    init_tracing();
    let agent = RunningAgent::start().await;
    let (coordinator, _console) = agent.coordinator();

    let options = StepOptions {
        return_status: true,
        ..StepOptions::default()
    };
    let err = with_timeout(coordinator.run_command(cmd(&["/no/such/program"]), options))
        .await
        .unwrap_err();
    match err {
        RemoteTaskError::Execution(failure) => assert_eq!(failure.kind, FailureKind::Spawn),
        other => panic!("expected captured spawn failure, got {other:?}"),
    }

    agent.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_calls_get_their_own_envelopes() {
    init_tracing();
    let agent = RunningAgent::start().await;
    let transport = Arc::new(TcpTransport::new(agent.addr.to_string()));

    let mut calls = Vec::new();
    for i in 0..5 {
        let transport = Arc::clone(&transport);
        calls.push(tokio::spawn(async move {
            let task = TaskDescriptor::new(["echo".to_string(), format!("call{i}")]).unwrap();
            transport.call(task).await
        }));
    }

    for (i, call) in calls.into_iter().enumerate() {
        let envelope = with_timeout(call).await.unwrap().unwrap();
        assert_eq!(envelope.lines, vec![format!("call{i}")]);
        assert_eq!(envelope.return_code, 0);
    }

    agent.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_protocol_version_is_rejected() {
    init_tracing();
    let agent = RunningAgent::start().await;

    let mut stream = TcpStream::connect(agent.addr).await.unwrap();
    stream
        .write_all(b"{\"version\":99,\"task\":{\"command\":[\"touch\",\"/tmp/never\"]}}\n")
        .await
        .unwrap();

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    with_timeout(reader.read_line(&mut line)).await.unwrap();

    let response: WireResponse = serde_json::from_str(line.trim_end()).unwrap();
    match response {
        WireResponse::Rejected { reason } => assert!(reason.contains("99")),
        other => panic!("expected rejection, got {other:?}"),
    }

    agent.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_command_on_the_wire_is_rejected() {
    init_tracing();
    let agent = RunningAgent::start().await;

    let mut stream = TcpStream::connect(agent.addr).await.unwrap();
    stream
        .write_all(b"{\"version\":1,\"task\":{\"command\":[]}}\n")
        .await
        .unwrap();

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    with_timeout(reader.read_line(&mut line)).await.unwrap();

    let response: WireResponse = serde_json::from_str(line.trim_end()).unwrap();
    assert!(matches!(response, WireResponse::Rejected { .. }));

    agent.shutdown().await;
}

#[tokio::test]
async fn unreachable_agent_is_a_connect_fault() {
    init_tracing();

    // Bind then drop to get a port nobody is listening on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let console = MemoryConsole::new();
    let coordinator = Coordinator::new(
        Route::remote(TcpTransport::new(addr.to_string())),
        Arc::new(console.clone()),
    );

    let options = StepOptions {
        return_status: true,
        ..StepOptions::default()
    };
    let err = with_timeout(coordinator.run_command(cmd(&["true"]), options))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RemoteTaskError::Transport(TransportError::Connect { .. })
    ));
    assert_eq!(console.writes(), vec!["running: true"]);
}
