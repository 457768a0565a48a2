// src/exec/deferred.rs

//! Processes started by `D: ` commands.

use std::process::Stdio;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::command::ProcessCommand;
use crate::errors::{Result, ShtaskError};
use crate::exec::logger::OutputLine;
use crate::exec::process::{ProcessOutcome, forward_lines, shell_command};

/// Buffered result of a deferred process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredOutcome {
    pub outcome: ProcessOutcome,
    pub lines: Vec<OutputLine>,
}

/// A running deferred process.
///
/// A background task drains the child's output into a buffer and waits on
/// it; nothing is reported until [`DeferredProcess::wait`] is called at a
/// barrier.
#[derive(Debug)]
pub struct DeferredProcess {
    pub command: ProcessCommand,
    pub rendered_command: String,
    handle: JoinHandle<Result<DeferredOutcome>>,
}

impl DeferredProcess {
    /// Start `rendered_command` without waiting for it.
    pub fn spawn(command: &ProcessCommand, rendered_command: String) -> Result<Self> {
        let mut cmd = shell_command(&rendered_command, &command.working_directory);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn()?;
        debug!(cmd = %rendered_command, pid = ?child.id(), "deferred process started");

        let handle = tokio::spawn(async move {
            let (tx, mut rx) = mpsc::channel::<OutputLine>(64);
            forward_lines(child.stdout.take(), false, tx.clone());
            forward_lines(child.stderr.take(), true, tx);

            let mut lines = Vec::new();
            while let Some(line) = rx.recv().await {
                lines.push(line);
            }

            let status = child.wait().await?;
            Ok::<_, ShtaskError>(DeferredOutcome {
                outcome: status.into(),
                lines,
            })
        });

        Ok(Self {
            command: command.clone(),
            rendered_command,
            handle,
        })
    }

    /// Block until the process exits and return its buffered output.
    pub async fn wait(self) -> Result<DeferredOutcome> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_err) => Err(anyhow::Error::from(join_err).into()),
        }
    }
}
