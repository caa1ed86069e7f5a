//! Execution integration tests.
//!
//! These tests spawn real processes through `/bin/sh` and the usual POSIX
//! utilities, so they only run on Unix.

#![cfg(unix)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use subcall::{
    call, call_blocking, execute, CallOptions, Caller, Command, ExecutionObserver,
    ExecutionOptions, ExecutionResult, OutputSanitizer, SubcallError, ValidationError,
};
use tempfile::TempDir;

const MISSING_FILE: &str = "/file/which/does/not/exist";

/// Options that report every exit code instead of failing.
fn lenient() -> CallOptions {
    CallOptions::new().assert_zero_exit_status(false)
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<String>>,
}

impl ExecutionObserver for Recorder {
    fn non_zero_exit(&self, result: &ExecutionResult) {
        self.seen.lock().unwrap().push(result.to_string());
    }
}

// ============================================================================
// Basic capture
// ============================================================================

#[tokio::test]
async fn test_echo() {
    let result = call(["echo", "foo"], &CallOptions::default()).await.unwrap();

    assert_eq!(result.exit_code(), 0);
    assert_eq!(result.stdout(), b"foo\n");
    assert_eq!(result.stderr(), b"");
    assert_eq!(
        result.to_string(),
        "<ExecutionResult cmd=\"echo foo\" ret=0 stdout=b'foo' stderr=b''>"
    );
}

#[tokio::test]
async fn test_read_file_contents() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::write(&path, "line one\nline two\n").unwrap();

    let result = call(
        Command::new(["cat"]).arg(path.to_string_lossy()),
        &CallOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.stdout(), b"line one\nline two\n");
    assert!(result.stderr().is_empty());
}

#[tokio::test]
async fn test_stdout_and_stderr_are_separate() {
    let result = call(
        ["sh", "-c", "echo out; echo err >&2"],
        &CallOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.stdout(), b"out\n");
    assert_eq!(result.stderr(), b"err\n");
}

#[tokio::test]
async fn test_missing_file_stderr() {
    let options = lenient().env("LANG", "C").env("LC_ALL", "C");
    let result = call(["cat", MISSING_FILE], &options).await.unwrap();

    assert_eq!(result.exit_code(), 1);
    assert!(result.stdout().is_empty());

    let stderr = result.stderr_lossy();
    assert!(stderr.contains(MISSING_FILE));
    assert!(stderr.contains("No such file or directory"));
    assert!(stderr.ends_with('\n'));
}

#[tokio::test]
async fn test_binary_output_is_kept_raw() {
    let result = call(
        ["printf", "\\377\\000\\001"],
        &CallOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.stdout(), [0xffu8, 0x00, 0x01]);

    let rendered = result.to_string();
    assert!(rendered.contains("stdout=b'\\xff\\x00\\x01'"));
    assert!(rendered.is_ascii());
}

// ============================================================================
// Exit-status policies
// ============================================================================

#[tokio::test]
async fn test_execution_error_contains_output() {
    let options = CallOptions::new().env("LANG", "C").env("LC_ALL", "C");
    let stderr = call(["cat", MISSING_FILE], &options.clone().assert_zero_exit_status(false))
        .await
        .unwrap()
        .stderr()
        .to_vec();

    let err = call(["cat", MISSING_FILE], &options).await.unwrap_err();
    let SubcallError::Execution(ref inner) = err else {
        panic!("expected an execution error, got {err:?}");
    };

    assert_eq!(inner.exit_code, 1);
    let message = err.to_string();
    assert!(message.contains(&format!("\"cat {MISSING_FILE}\"")));
    assert!(message.contains("exit status 1"));
    assert!(message.contains(&OutputSanitizer::render(&stderr)));
}

#[tokio::test]
async fn test_false_with_merged_stderr_fails() {
    let options = CallOptions::new().merge_stderr(true);
    let err = call(["false"], &options).await.unwrap_err();

    match err {
        SubcallError::Execution(e) => assert_eq!(e.exit_code, 1),
        other => panic!("expected an execution error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_warn_on_non_zero_exit() {
    let recorder = Arc::new(Recorder::default());
    let caller = Caller::new(recorder.clone());
    let options = lenient().warn_on_non_zero_exit_status(true);

    let result = caller
        .call(["sh", "-c", "echo nope >&2; exit 3"], &options)
        .await
        .unwrap();

    assert_eq!(result.exit_code(), 3);
    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("ret=3"));
    assert!(seen[0].contains("stderr=b'nope'"));
}

#[tokio::test]
async fn test_signal_exit_code_is_negative() {
    let result = call(["sh", "-c", "kill -9 $$"], &lenient()).await.unwrap();
    assert_eq!(result.exit_code(), -9);
}

// ============================================================================
// Launch and validation failures
// ============================================================================

#[tokio::test]
async fn test_missing_program() {
    let err = call(["this-program-does-not-exist-subcall"], &CallOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, SubcallError::Launch { .. }));
}

#[tokio::test]
async fn test_joined_line_rejected_without_spawning() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("marker");
    let line = format!("touch {}", marker.display());

    let err = call(line.as_str(), &CallOptions::default()).await.unwrap_err();

    assert!(matches!(
        err,
        SubcallError::Validation(ValidationError::JoinedCommandLine(_))
    ));
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_zero_timeout_rejected() {
    let options = CallOptions::new().timeout(Duration::ZERO);
    let err = call(["true"], &options).await.unwrap_err();
    assert!(matches!(
        err,
        SubcallError::Validation(ValidationError::ZeroTimeout)
    ));
}

// ============================================================================
// Input, environment, working directory
// ============================================================================

#[tokio::test]
async fn test_input_through_cat() {
    let options = CallOptions::new()
        .input(&b"foo"[..])
        .timeout(Duration::from_secs(10));
    let result = call(["cat"], &options).await.unwrap();

    assert_eq!(result.stdout(), b"foo");
    assert_eq!(
        result.to_string(),
        "<ExecutionResult cmd=\"cat\" ret=0 stdout=b'foo' stderr=b''>"
    );
}

#[tokio::test]
async fn test_shell_mode() {
    let options = CallOptions::new().shell(true).input(&b"foo"[..]);
    let result = call(["cat"], &options).await.unwrap();
    assert_eq!(result.stdout(), b"foo");

    let options = CallOptions::new().shell(true);
    let result = call(Command::from_line("echo a | tr a b"), &options)
        .await
        .unwrap();
    assert_eq!(result.stdout(), b"b\n");
}

#[tokio::test]
async fn test_env_clear() {
    let options = CallOptions::new()
        .execution(ExecutionOptions::new().env_clear(true).env("ONLY", "1"));
    let result = call(
        ["/bin/sh", "-c", "echo \"${ONLY:-unset} ${SUBCALL_TEST_UNSET:-unset}\""],
        &options,
    )
    .await
    .unwrap();

    assert_eq!(result.stdout(), b"1 unset\n");
}

#[tokio::test]
async fn test_working_dir() {
    let dir = TempDir::new().unwrap();
    let options = CallOptions::new().working_dir(dir.path());
    let result = call(["pwd", "-P"], &options).await.unwrap();

    let expected = dir.path().canonicalize().unwrap();
    assert_eq!(result.stdout_lossy().trim_end(), expected.to_string_lossy());
}

// ============================================================================
// Deadlock safety
// ============================================================================

#[tokio::test]
async fn test_both_streams_fill_concurrently() {
    let result = call(
        [
            "sh",
            "-c",
            "head -c 200000 /dev/zero & head -c 200000 /dev/zero >&2; wait",
        ],
        &CallOptions::new().timeout(Duration::from_secs(30)),
    )
    .await
    .unwrap();

    assert_eq!(result.stdout().len(), 200_000);
    assert_eq!(result.stderr().len(), 200_000);
}

#[tokio::test]
async fn test_large_input_round_trip() {
    let input: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
    let options = CallOptions::new()
        .input(input.clone())
        .timeout(Duration::from_secs(30));
    let result = call(["cat"], &options).await.unwrap();

    assert_eq!(result.stdout().len(), input.len());
    assert!(result.stdout() == input.as_slice());
}

#[tokio::test]
async fn test_child_ignoring_input() {
    let input = vec![b'x'; 1_000_000];
    let options = CallOptions::new()
        .input(input)
        .timeout(Duration::from_secs(30));
    let result = call(["true"], &options).await.unwrap();
    assert_eq!(result.exit_code(), 0);
}

// ============================================================================
// Detachment and timeouts
// ============================================================================

/// Process id and session id of the shell, as printed by [`SESSION_SCRIPT`].
#[cfg(target_os = "linux")]
fn pid_and_session(stdout: &str) -> (String, String) {
    let mut lines = stdout.lines().map(str::trim);
    let pid = lines.next().unwrap_or_default().to_string();
    let sid = lines.next().unwrap_or_default().to_string();
    (pid, sid)
}

#[cfg(target_os = "linux")]
const SESSION_SCRIPT: &str = "echo $$; cut -d' ' -f6 /proc/$$/stat";

/// Whether `pid` no longer runs. Zombies count as gone since only their
/// new parent can reap them.
#[cfg(target_os = "linux")]
fn process_gone(pid: &str) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .is_some_and(|state| state == "Z" || state == "X"),
        Err(_) => true,
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_detached_child_leads_new_session() {
    let result = call(["sh", "-c", SESSION_SCRIPT], &CallOptions::default())
        .await
        .unwrap();

    let (pid, sid) = pid_and_session(&result.stdout_lossy());
    assert!(!pid.is_empty());
    assert_eq!(pid, sid);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_attached_child_keeps_our_session() {
    let options = CallOptions::new().detach(false);
    let result = call(["sh", "-c", SESSION_SCRIPT], &options).await.unwrap();

    let (pid, sid) = pid_and_session(&result.stdout_lossy());
    assert!(!pid.is_empty());
    assert!(!sid.is_empty());
    assert_ne!(pid, sid);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_no_controlling_terminal() {
    let started = Instant::now();
    let options = lenient().timeout(Duration::from_secs(10)).env("LANG", "C");
    let result = call(["cat", "/dev/tty"], &options).await.unwrap();

    assert_eq!(result.exit_code(), 1);
    let stderr = result.stderr_lossy();
    if std::path::Path::new("/dev/tty").exists() {
        assert!(
            stderr.contains("No such device or address"),
            "unexpected stderr: {stderr}"
        );
    } else {
        assert!(stderr.contains("No such file"), "unexpected stderr: {stderr}");
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_timeout_keeps_partial_output() {
    let started = Instant::now();
    let options = CallOptions::new().timeout(Duration::from_millis(500));
    let err = call(
        ["sh", "-c", "echo started; echo oops >&2; sleep 30"],
        &options,
    )
    .await
    .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10));
    match err {
        SubcallError::Timeout(e) => {
            assert_eq!(e.timeout, Duration::from_millis(500));
            assert_eq!(e.stdout, b"started\n");
            assert_eq!(e.stderr, b"oops\n");
            assert!(e.to_string().contains("timed out"));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_timeout_kills_background_children() {
    let options = CallOptions::new().timeout(Duration::from_millis(500));
    let err = call(["sh", "-c", "sleep 30 & echo $!; sleep 30"], &options)
        .await
        .unwrap_err();

    let SubcallError::Timeout(e) = err else {
        panic!("expected a timeout, got {err:?}");
    };
    let pid = String::from_utf8_lossy(&e.stdout).trim().to_string();
    assert!(!pid.is_empty());

    // SIGKILL delivery is asynchronous; give the kernel a moment.
    let deadline = Instant::now() + Duration::from_secs(2);
    while !process_gone(&pid) && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(process_gone(&pid), "background process {pid} survived");
}

#[tokio::test]
async fn test_execute_ignores_exit_status() {
    let result = execute(&Command::new(["false"]), &ExecutionOptions::default())
        .await
        .unwrap();
    assert_eq!(result.exit_code(), 1);
    assert!(!result.success());
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            tokio::spawn(async move {
                let options = CallOptions::new().input(format!("job {i}"));
                call(["cat"], &options).await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.stdout_lossy(), format!("job {i}"));
    }
}

// ============================================================================
// Blocking API
// ============================================================================

#[test]
fn test_call_blocking() {
    let options = CallOptions::new().merge_stderr(true);
    let result = call_blocking(["sh", "-c", "echo out; echo err >&2"], &options).unwrap();

    assert_eq!(result.stdout(), b"out\nerr\n");
    assert!(result.stderr().is_empty());
}
