// src/exec/process.rs

//! Child process helpers shared by foreground and deferred execution.

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::Result;
use crate::exec::logger::{OutputLine, ScriptLogger};

/// Exit information of a finished child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub success: bool,
    pub exit_code: i32,
}

impl From<ExitStatus> for ProcessOutcome {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            exit_code: status.code().unwrap_or(-1),
        }
    }
}

/// Build a shell command appropriate for the platform.
pub fn shell_command(command: &str, working_directory: &Path) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };
    cmd.current_dir(working_directory);
    cmd
}

/// Run `cmd` to completion.
///
/// With `tty` the child inherits the terminal and its output bypasses the
/// logger. Otherwise stdout and stderr are streamed line by line to
/// `logger` as they arrive.
pub async fn run_foreground<L: ScriptLogger + ?Sized>(
    mut cmd: Command,
    tty: bool,
    logger: &mut L,
) -> Result<ProcessOutcome> {
    if tty {
        let status = cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        return Ok(status.into());
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    let (tx, mut rx) = mpsc::channel::<OutputLine>(64);
    forward_lines(child.stdout.take(), false, tx.clone());
    forward_lines(child.stderr.take(), true, tx);

    // Closes once both pipes reach EOF.
    while let Some(line) = rx.recv().await {
        logger.log(&line);
    }

    let status = child.wait().await?;
    debug!(success = status.success(), code = ?status.code(), "foreground process exited");
    Ok(status.into())
}

/// Spawn a reader task that forwards each line of `reader` into `tx`.
///
/// Lines are decoded lossily and the pipe is read to EOF even after the
/// receiver is gone, so the child never sees a closed pipe.
pub(crate) fn forward_lines<R>(reader: Option<R>, is_error: bool, tx: mpsc::Sender<OutputLine>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(reader) = reader else {
        return;
    };
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut forwarding = true;
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if !forwarding {
                        continue;
                    }
                    let line = OutputLine::new(decode_line(&buf), is_error);
                    if tx.send(line).await.is_err() {
                        forwarding = false;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "output pipe read failed");
                    break;
                }
            }
        }
    });
}

/// Strip the line terminator and decode, replacing invalid UTF-8.
fn decode_line(buf: &[u8]) -> String {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
