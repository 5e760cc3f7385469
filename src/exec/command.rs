// src/exec/command.rs

//! Process runner built on `tokio::process::Command`.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::backend::{CommandResult, CommandSpec, OutputMode};

/// How long the output readers may keep going after the child has exited.
///
/// A background grandchild can inherit the pipes and hold them open long
/// after the command itself is done.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    fn as_str(self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

type Captured = Arc<Mutex<String>>;

/// Run a single command to completion or until `spec.timeout` elapses.
///
/// On timeout the child is killed and `timed_out` is set; output read up to
/// that point is kept. Once the child exits its pipes get [`DRAIN_GRACE`] to
/// reach EOF, so no wait here is unbounded.
pub async fn run_command(spec: CommandSpec) -> Result<CommandResult> {
    debug!(
        program = %spec.program,
        cmd = %spec,
        dir = ?spec.dir,
        timeout_secs = spec.timeout.as_secs(),
        "starting process"
    );

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.dir {
        cmd.current_dir(dir);
    }

    let deadline = Instant::now() + spec.timeout;
    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning '{spec}'"))?;

    // Always drain both pipes so the child never blocks on a full buffer.
    let stdout_buf = Captured::default();
    let stderr_buf = Captured::default();
    let mut stdout = drain(
        child.stdout.take(),
        spec.stdout,
        &spec.program,
        StreamKind::Stdout,
        Arc::clone(&stdout_buf),
    );
    let mut stderr = drain(
        child.stderr.take(),
        spec.stderr,
        &spec.program,
        StreamKind::Stderr,
        Arc::clone(&stderr_buf),
    );

    match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(status) => {
            let status = status.with_context(|| format!("waiting for '{spec}'"))?;
            let drain_deadline = Instant::now() + DRAIN_GRACE;
            finish_drain(&mut stdout, drain_deadline, &spec.program, StreamKind::Stdout).await;
            finish_drain(&mut stderr, drain_deadline, &spec.program, StreamKind::Stderr).await;

            let result = CommandResult {
                stdout: take_captured(&stdout_buf).await,
                stderr: take_captured(&stderr_buf).await,
                timed_out: false,
                exit_code: status.code(),
            };
            debug!(
                program = %spec.program,
                exit_code = ?result.exit_code,
                success = status.success(),
                "process exited"
            );
            Ok(result)
        }
        Err(_) => {
            warn!(
                program = %spec.program,
                cmd = %spec,
                timeout_secs = spec.timeout.as_secs(),
                "process timed out; killing"
            );
            if let Err(e) = child.kill().await {
                warn!(program = %spec.program, error = %e, "failed to kill timed out process");
            }
            stdout.abort();
            stderr.abort();
            Ok(CommandResult {
                stdout: take_captured(&stdout_buf).await,
                stderr: take_captured(&stderr_buf).await,
                timed_out: true,
                exit_code: None,
            })
        }
    }
}

/// Wait for a reader to hit EOF, detaching it once `deadline` passes.
async fn finish_drain(
    handle: &mut JoinHandle<()>,
    deadline: Instant,
    program: &str,
    kind: StreamKind,
) {
    if tokio::time::timeout_at(deadline, &mut *handle).await.is_err() {
        warn!(
            program,
            stream = kind.as_str(),
            "output still open after process exit; no longer reading it"
        );
        handle.abort();
    }
}

async fn take_captured(buf: &Captured) -> String {
    std::mem::take(&mut *buf.lock().await)
}

fn drain<R>(
    reader: Option<R>,
    mode: OutputMode,
    program: &str,
    kind: StreamKind,
    captured: Captured,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let program = program.to_string();
    tokio::spawn(async move {
        let Some(reader) = reader else {
            return;
        };

        // Read raw bytes up to EOF: a line that is not UTF-8 must not stop
        // the reader, or the child dies of SIGPIPE on its next write.
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(program = %program, stream = kind.as_str(), error = %e, "read failed");
                    break;
                }
            }
            let line = decode_line(&buf);
            match (mode, kind) {
                (OutputMode::Capture, _) => {
                    let mut out = captured.lock().await;
                    out.push_str(&line);
                    out.push('\n');
                }
                (OutputMode::Stream, StreamKind::Stdout) => {
                    info!(program = %program, "{}", line);
                }
                (OutputMode::Stream, StreamKind::Stderr) => {
                    warn!(program = %program, "{}", line);
                }
            }
        }
    })
}

/// Strip the line terminator and decode, replacing invalid UTF-8.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let spec = CommandSpec::new("sh").args(["-c", "echo hello; echo oops >&2; exit 3"]);
        let result = run_command(spec).await.unwrap();

        assert!(!result.timed_out);
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "oops\n");
    }

    #[tokio::test]
    async fn streamed_output_is_not_captured() {
        let spec = CommandSpec::new("sh").args(["-c", "echo hello"]).stream();
        let result = run_command(spec).await.unwrap();

        assert!(result.success());
        assert!(result.stdout.is_empty());
    }

    #[tokio::test]
    async fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();

        let spec = CommandSpec::new("ls").current_dir(dir.path());
        let result = run_command(spec).await.unwrap();

        assert_eq!(result.stdout_lines(), vec!["marker"]);
    }

    #[tokio::test]
    async fn timeout_kills_process_and_sets_flag() {
        let spec = CommandSpec::new("sleep")
            .arg("5")
            .timeout(Duration::from_millis(100));
        let result = run_command(spec).await.unwrap();

        assert!(result.timed_out);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn invalid_utf8_output_is_decoded_and_read_to_the_end() {
        let script = r"printf 'web\n\377\ndb\n'; seq 1 200000; echo done";
        let spec = CommandSpec::new("sh").args(["-c", script]);
        let result = run_command(spec).await.unwrap();

        assert!(result.success(), "{:?}", result.failure());
        let lines = result.stdout_lines();
        assert_eq!(lines[0], "web");
        assert_eq!(lines[1], "\u{FFFD}");
        assert_eq!(lines[2], "db");
        assert_eq!(lines.last().map(String::as_str), Some("done"));
        assert_eq!(lines.len(), 3 + 200_000 + 1);
    }

    #[tokio::test]
    async fn background_child_holding_stdout_does_not_block_past_exit() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "sleep 30 & echo up"])
            .timeout(Duration::from_secs(10));
        let started = std::time::Instant::now();
        let result = run_command(spec).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(8));
        assert!(!result.timed_out);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout, "up\n");
    }

    #[tokio::test]
    async fn timeout_keeps_output_read_so_far() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo partial; sleep 5"])
            .timeout(Duration::from_millis(500));
        let result = run_command(spec).await.unwrap();

        assert!(result.timed_out);
        assert_eq!(result.stdout, "partial\n");
    }

    #[test]
    fn decode_line_strips_crlf_and_replaces_bad_bytes() {
        assert_eq!(decode_line(b"web\r\n"), "web");
        assert_eq!(decode_line(b"a\xffb"), "a\u{FFFD}b");
        assert_eq!(decode_line(b"tail"), "tail");
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let spec = CommandSpec::new("stackguard-definitely-not-a-program");
        assert!(run_command(spec).await.is_err());
    }
}
