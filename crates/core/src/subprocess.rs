//! Child process spawn and stream capture.
//!
//! Provides [`run_command`], which spawns a prepared
//! [`tokio::process::Command`], drains stdout and stderr concurrently, and
//! waits for exit under an optional bound and cancellation token.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::InvokeError;

/// Chunk size used while draining a pipe.
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Raw result of a finished child process.
#[derive(Debug)]
pub struct Captured {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub status: ExitStatus,
    pub elapsed: Duration,
}

/// Limits applied to a single [`run_command`] call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLimits {
    pub timeout: Option<Duration>,
    pub max_output_bytes: Option<usize>,
}

/// Spawn `cmd`, capture both output streams, and wait for it to exit.
///
/// Both pipes are read concurrently until EOF before the exit status is
/// collected, so a child that fills one pipe while the other is unread
/// cannot stall. On timeout or cancellation the child is killed.
pub async fn run_command(
    cmd: &mut Command,
    limits: RunLimits,
    cancel: Option<&CancellationToken>,
) -> Result<Captured, InvokeError> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();

    // `kill_on_drop(true)` ensures the child is killed when dropped (timeout, cancel).
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|source| InvokeError::Launch {
        program: program.clone(),
        source,
    })?;

    let stdout = child.stdout.take().ok_or_else(|| missing_pipe(&program, "stdout"))?;
    let stderr = child.stderr.take().ok_or_else(|| missing_pipe(&program, "stderr"))?;

    tracing::debug!(program = %program, pid = child.id(), "Child process started");

    let max = limits.max_output_bytes;
    let finish = async {
        let (stdout, stderr) = tokio::join!(
            read_stream(stdout, "stdout", max),
            read_stream(stderr, "stderr", max)
        );
        let status = child.wait().await?;
        Ok::<_, InvokeError>((stdout, stderr, status))
    };

    let bounded = async {
        match limits.timeout {
            Some(timeout) => tokio::time::timeout(timeout, finish)
                .await
                .unwrap_or_else(|_| {
                    Err(InvokeError::Timeout {
                        elapsed: start.elapsed(),
                    })
                }),
            None => finish.await,
        }
    };

    let outcome = match cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(InvokeError::Cancelled),
            res = bounded => res,
        },
        None => bounded.await,
    };

    // On the error paths `finish` has been dropped and with it the borrow of
    // `child`; dropping `child` below kills the process.
    let (stdout, stderr, status) = outcome?;
    let elapsed = start.elapsed();

    tracing::debug!(
        program = %program,
        exit_code = ?status.code(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Child process exited"
    );

    Ok(Captured {
        stdout,
        stderr,
        status,
        elapsed,
    })
}

fn missing_pipe(program: &str, stream: &str) -> InvokeError {
    InvokeError::Launch {
        program: program.to_string(),
        source: std::io::Error::other(format!("{stream} pipe unavailable")),
    }
}

/// Read a stream to EOF, keeping at most `max` bytes.
///
/// Bytes past the cap are read and discarded so the writer never blocks.
/// A read error ends the stream early; whatever was read so far is kept.
async fn read_stream<R: AsyncRead + Unpin>(
    mut handle: R,
    stream: &'static str,
    max: Option<usize>,
) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK_BYTES];
    let mut discarded = 0usize;

    loop {
        match handle.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let keep = match max {
                    Some(max) => n.min(max.saturating_sub(buf.len())),
                    None => n,
                };
                buf.extend_from_slice(&chunk[..keep]);
                discarded += n - keep;
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(stream, error = %e, captured = buf.len(), "Failed to capture output");
                break;
            }
        }
    }

    if discarded > 0 {
        tracing::warn!(stream, discarded, "Output exceeded capture limit");
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
