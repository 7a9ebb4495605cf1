//! Shared subprocess management for both provisioning strategies.
//!
//! Each strategy builds a [`tokio::process::Command`] (program plus argument
//! vector) and delegates spawn, output capture and timeout handling to
//! [`run_command`].

use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::executor::{CommandOutput, ProvisioningError};

/// Maximum stdout or stderr size captured per stream (1 MiB).
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// How long to keep reading after the child exits or is killed. Grandchildren
/// that inherited the pipes can hold them open indefinitely.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Spawn `cmd`, capture stdout/stderr and wait at most `timeout`.
///
/// A spawn failure with `NotFound` is reported as
/// [`ProvisioningError::ToolMissing`]. On timeout the child is killed and
/// left to be reaped by the runtime; the caller gets whatever output was
/// captured before the kill. Either way the pipes are read for at most
/// [`OUTPUT_DRAIN_GRACE`] once the child is gone.
pub async fn run_command(
    cmd: &mut Command,
    timeout: Duration,
) -> Result<CommandOutput, ProvisioningError> {
    // `kill_on_drop(true)` kills the child when it is dropped on timeout.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ProvisioningError::ToolMissing {
            program: program.clone(),
        },
        _ => ProvisioningError::Io(e),
    })?;

    // Read both pipes in spawned tasks so `child.wait()` can borrow `child`.
    let stdout = StreamCapture::spawn(child.stdout.take());
    let stderr = StreamCapture::spawn(child.stderr.take());

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            let (stdout, stderr) = collect(stdout, stderr).await;
            let exit_code = status.code().unwrap_or(-1);
            tracing::debug!(%program, exit_code, duration_ms, "Provisioning command finished");

            Ok(CommandOutput {
                stdout,
                stderr,
                exit_code,
            })
        }
        Ok(Err(e)) => Err(ProvisioningError::Io(e)),
        Err(_elapsed) => {
            drop(child);
            let elapsed_ms = start.elapsed().as_millis() as u64;
            tracing::warn!(%program, elapsed_ms, "Provisioning command timed out, killed");

            let (stdout, stderr) = collect(stdout, stderr).await;
            Err(ProvisioningError::Timeout {
                elapsed_ms,
                stdout,
                stderr,
            })
        }
    }
}

/// Wait up to [`OUTPUT_DRAIN_GRACE`] for both pipes to close, then stop the
/// readers and return what they captured.
async fn collect(mut stdout: StreamCapture, mut stderr: StreamCapture) -> (String, String) {
    let drained = tokio::time::timeout(OUTPUT_DRAIN_GRACE, async {
        let _ = (&mut stdout.task).await;
        let _ = (&mut stderr.task).await;
    })
    .await;
    if drained.is_err() {
        tracing::debug!("Output pipes still open after grace period, reading stopped");
    }
    (stdout.finish(), stderr.finish())
}

/// Background reader of one child pipe.
struct StreamCapture {
    task: JoinHandle<()>,
    buf: Arc<Mutex<Vec<u8>>>,
}

impl StreamCapture {
    fn spawn<R>(handle: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(drain(handle, Arc::clone(&buf)));
        Self { task, buf }
    }

    /// Stop the reader (if still running) and decode the captured bytes.
    fn finish(self) -> String {
        self.task.abort();
        let bytes = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Read `handle` until EOF, keeping the first [`MAX_OUTPUT_BYTES`].
///
/// Bytes past the cap are discarded, not left unread: closing the pipe early
/// would kill a chatty script with SIGPIPE.
async fn drain<R: AsyncRead + Unpin>(handle: Option<R>, buf: Arc<Mutex<Vec<u8>>>) {
    let Some(mut h) = handle else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        let n = match h.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        let mut captured = buf.lock().unwrap_or_else(PoisonError::into_inner);
        let room = MAX_OUTPUT_BYTES.saturating_sub(captured.len());
        captured.extend_from_slice(&chunk[..n.min(room)]);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::provisioning::test_helpers::write_script;

    fn sh(script: &tempfile::TempPath) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg(script.as_os_str());
        cmd
    }

    #[tokio::test]
    async fn captures_both_streams() {
        let script = write_script("echo out\necho err >&2\n");
        let output = run_command(&mut sh(&script), Duration::from_secs(5))
            .await
            .expect("run");
        assert!(output.succeeded());
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn reports_nonzero_exit_code() {
        let script = write_script("echo broken >&2\nexit 3\n");
        let output = run_command(&mut sh(&script), Duration::from_secs(5))
            .await
            .expect("run");
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.error_text(), "broken");
    }

    #[tokio::test]
    async fn missing_program_is_tool_missing() {
        let mut cmd = Command::new("/nonexistent/erpbtp-no-such-shell");
        let result = run_command(&mut cmd, Duration::from_secs(5)).await;
        assert_matches!(
            result,
            Err(ProvisioningError::ToolMissing { program }) if program.ends_with("erpbtp-no-such-shell")
        );
    }

    #[tokio::test]
    async fn timeout_returns_partial_output() {
        // `exec` keeps the pipes owned by the killed process, so they close.
        let script = write_script("echo started\nexec sleep 60\n");
        let result = run_command(&mut sh(&script), Duration::from_millis(300)).await;
        assert_matches!(
            result,
            Err(ProvisioningError::Timeout { elapsed_ms, stdout, .. })
                if elapsed_ms >= 300 && stdout == "started\n"
        );
    }

    #[tokio::test]
    async fn background_child_does_not_hold_the_wait() {
        // `sleep` inherits stdout, so the pipe stays open after `sh` exits.
        let script = write_script("sleep 20 &\necho done\nexit 0\n");
        let started = Instant::now();
        let output = tokio::time::timeout(
            Duration::from_secs(8),
            run_command(&mut sh(&script), Duration::from_secs(2)),
        )
        .await
        .expect("run_command returned within the drain grace")
        .expect("run");

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(output.succeeded());
        assert_eq!(output.stdout, "done\n");
    }

    #[tokio::test]
    async fn output_past_the_cap_is_discarded_not_fatal() {
        // About 2 MiB on stdout, then a clean exit.
        let script = write_script(
            "head -c 2097152 /dev/zero | tr '\\0' x\necho tail >&2\nexit 0\n",
        );
        let output = run_command(&mut sh(&script), Duration::from_secs(10))
            .await
            .expect("run");

        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout.len(), MAX_OUTPUT_BYTES);
        assert!(output.stdout.bytes().all(|b| b == b'x'));
        assert_eq!(output.stderr, "tail\n");
    }

    #[tokio::test]
    async fn stdin_is_closed() {
        let script = write_script("cat\necho done\n");
        let output = run_command(&mut sh(&script), Duration::from_secs(5))
            .await
            .expect("run");
        assert_eq!(output.stdout, "done\n");
    }
}
