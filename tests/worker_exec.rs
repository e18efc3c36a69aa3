// tests/worker_exec.rs

#![cfg(unix)]

use remote_task::exec::{execute, execute_blocking};
use remote_task::task::{FailureKind, NOT_DETERMINED, TaskDescriptor};
use remote_task_test_utils::{init_tracing, with_timeout};

fn task(command: &[&str]) -> TaskDescriptor {
    TaskDescriptor::new(command.iter().copied()).unwrap()
}

#[test]
fn silent_success_has_no_lines_and_code_zero() {
    init_tracing();

    let env = execute(&task(&["true"]), |_| {});
    assert!(env.error.is_none());
    assert!(env.lines.is_empty());
    assert_eq!(env.return_code, 0);
    assert!(env.is_finalized());
}

#[test]
fn lines_keep_emission_order() {
    init_tracing();

    let env = execute(&task(&["sh", "-c", "for i in 1 2 3 4 5; do echo line$i; done"]), |_| {});
    assert_eq!(env.lines, vec!["line1", "line2", "line3", "line4", "line5"]);
    assert_eq!(env.return_code, 0);
}

#[test]
fn non_zero_exit_is_a_clean_result() {
    init_tracing();

    let env = execute(&task(&["sh", "-c", "echo before; exit 3"]), |_| {});
    assert!(env.error.is_none());
    assert_eq!(env.return_code, 3);
    assert_eq!(env.lines, vec!["before"]);
}

#[test]
fn missing_executable_is_captured_not_raised() {
    init_tracing();

    let env = execute(&task(&["/definitely/not/a/real/binary"]), |_| {});
    let failure = env.error.expect("spawn failure should be captured");
    assert_eq!(failure.kind, FailureKind::Spawn);
    assert!(failure.message.contains("/definitely/not/a/real/binary"));
    assert_eq!(env.return_code, NOT_DETERMINED);
    assert!(env.lines.is_empty());
}

#[test]
fn tokens_are_not_shell_interpreted() {
    init_tracing();

    let env = execute(&task(&["echo", "$HOME", "a;b", "*"]), |_| {});
    assert_eq!(env.lines, vec!["$HOME a;b *"]);
}

#[test]
fn stderr_is_interleaved_into_the_same_stream() {
    init_tracing();

    let env = execute(
        &task(&["sh", "-c", "echo one; echo two >&2; echo three; echo four >&2"]),
        |_| {},
    );
    assert_eq!(env.lines, vec!["one", "two", "three", "four"]);
}

#[test]
fn configured_encoding_is_used_for_decoding() {
    init_tracing();

    let latin1 = TaskDescriptor::builder(["printf", "caf\\351\\n"])
        .encoding("ISO-8859-1")
        .build()
        .unwrap();
    let env = execute(&latin1, |_| {});
    assert_eq!(env.lines, vec!["café"]);
}

#[test]
fn utf16_output_with_byte_order_mark_is_decoded() {
    init_tracing();

    let utf16 = TaskDescriptor::builder(["printf", "\\376\\377\\000h\\000i\\000\\n"])
        .encoding("UTF-16")
        .build()
        .unwrap();
    let env = execute(&utf16, |_| {});
    assert!(env.error.is_none());
    assert_eq!(env.lines, vec!["hi"]);
}

#[test]
fn latin1_maps_every_byte_to_the_same_code_point() {
    init_tracing();

    let latin1 = TaskDescriptor::builder(["printf", "\\200\\n"])
        .encoding("ISO-8859-1")
        .build()
        .unwrap();
    let env = execute(&latin1, |_| {});
    assert_eq!(env.lines, vec!["\u{80}"]);
}

#[test]
fn last_line_is_read_before_exit_code() {
    init_tracing();

    // The exit code is only sampled after EOF, so the last line is never lost.
    let env = execute(&task(&["sh", "-c", "sleep 0.2; echo late"]), |_| {});
    assert_eq!(env.lines, vec!["late"]);
    assert_eq!(env.return_code, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_invocations_are_independent() {
    init_tracing();

    let mut handles = Vec::new();
    for i in 0..8 {
        let script = format!("echo task{i}; exit {i}");
        let t = TaskDescriptor::new(["sh".to_string(), "-c".to_string(), script]).unwrap();
        handles.push(tokio::spawn(execute_blocking(t, |_| {})));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let env = with_timeout(handle).await.unwrap().unwrap();
        assert_eq!(env.lines, vec![format!("task{i}")]);
        assert_eq!(env.return_code, i as i32);
    }
}
