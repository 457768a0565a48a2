// src/exec/executor.rs

//! Script execution state machine.
//!
//! Commands run strictly in order. `D: ` commands are spawned without
//! blocking and collected in a list owned by the current [`execute`] call;
//! they are drained, in the order they were deferred, at the next `WAIT:`
//! and once more at the end of the script. The final drain also runs when
//! a foreground command aborted the script, so no child is left behind.
//!
//! [`execute`]: ProcessExecutor::execute

use std::fs;
use std::path::{Path, PathBuf};

use tokio::process::Command as TokioCommand;
use tokio::task;
use tracing::{debug, error, info, warn};

use crate::command::{BashCommand, Command, ProcessCommand, TemplateCommand};
use crate::environment::{Environment, Template};
use crate::errors::{Result, ShtaskError};
use crate::exec::deferred::DeferredProcess;
use crate::exec::logger::{LogStart, ScriptLogger};
use crate::exec::process::{run_foreground, shell_command};
use crate::placeholder::{render, render_bytes};
use crate::script::Script;

/// Runs parsed scripts against a resolved [`Environment`].
#[derive(Debug)]
pub struct ProcessExecutor<L: ScriptLogger> {
    environment: Environment,
    logger: L,
}

impl<L: ScriptLogger> ProcessExecutor<L> {
    pub fn new(environment: Environment, logger: L) -> Self {
        Self {
            environment,
            logger,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    pub fn into_logger(self) -> L {
        self.logger
    }

    /// Execute `commands`, which were parsed from `script`.
    ///
    /// `finish_script` is only reported when the script succeeded; on error
    /// the caller decides how to report it.
    pub async fn execute(&mut self, script: &Script, commands: &[Command]) -> Result<()> {
        self.logger.start_script(script);

        let mut outstanding: Vec<DeferredProcess> = Vec::new();
        let result = self.run_commands(commands, &mut outstanding).await;
        if let Err(err) = &result {
            error!(script = %script.qualified_name(), error = %err, "script aborted");
        }

        // Always drain, even after an abort. The first error wins.
        let drained = self.drain(&mut outstanding).await;
        result?;
        drained?;

        self.logger.finish_script(script);
        Ok(())
    }

    async fn run_commands(
        &mut self,
        commands: &[Command],
        outstanding: &mut Vec<DeferredProcess>,
    ) -> Result<()> {
        for template in self.environment.templates().to_vec() {
            let destination = self.write_template(template).await?;
            info!(destination = ?destination, "environment template written");
        }

        let total = commands.len();
        for (index, command) in commands.iter().enumerate() {
            debug!(index, total, %command, "executing command");
            match command {
                Command::Process(process) => self.run_process(process, index, total).await?,
                Command::Deferred(process) => {
                    outstanding.push(self.defer_process(process, index, total).await?)
                }
                Command::Template(template) => self.run_template(template, index, total).await?,
                Command::Wait(wait) => {
                    if !outstanding.is_empty() {
                        self.logger.log_start(&LogStart {
                            headline: "Waiting",
                            subject: "WAIT:",
                            line_number: Some(wait.line_number),
                            ignore_error: false,
                            index,
                            total,
                        });
                    }
                    self.drain(outstanding).await?;
                }
                Command::Bash(bash) => self.run_bash(bash, index, total).await?,
            }
        }

        Ok(())
    }

    async fn run_process(&mut self, command: &ProcessCommand, index: usize, total: usize) -> Result<()> {
        let rendered = self.render_text(&command.shell_command).await?;
        self.logger.log_start(&LogStart {
            headline: "Starting",
            subject: &rendered,
            line_number: Some(command.line_number),
            ignore_error: command.ignore_error,
            index,
            total,
        });

        let cmd = shell_command(&rendered, &command.working_directory);
        let outcome = run_foreground(cmd, command.tty, &mut self.logger).await?;

        if !outcome.success {
            if !command.ignore_error {
                return Err(ShtaskError::CommandFailed {
                    command: rendered,
                    line: command.line_number,
                    exit_code: outcome.exit_code,
                });
            }
            warn!(
                cmd = %rendered,
                exit_code = outcome.exit_code,
                "command failed; error ignored"
            );
        }

        Ok(())
    }

    async fn defer_process(
        &mut self,
        command: &ProcessCommand,
        index: usize,
        total: usize,
    ) -> Result<DeferredProcess> {
        let rendered = self.render_text(&command.shell_command).await?;
        self.logger.log_start(&LogStart {
            headline: "Deferring",
            subject: &rendered,
            line_number: Some(command.line_number),
            ignore_error: command.ignore_error,
            index,
            total,
        });

        DeferredProcess::spawn(command, rendered)
    }

    async fn run_template(&mut self, command: &TemplateCommand, index: usize, total: usize) -> Result<()> {
        let values = self.environment.values().clone();
        let template = command.template.clone();
        let destination = off_runtime(move || template.destination_path(&values)).await?;
        self.logger.log_start(&LogStart {
            headline: "Template",
            subject: &destination.display().to_string(),
            line_number: Some(command.line_number),
            ignore_error: false,
            index,
            total,
        });

        self.write_template(command.template.clone()).await?;
        Ok(())
    }

    async fn run_bash(&mut self, command: &BashCommand, index: usize, total: usize) -> Result<()> {
        let path = &command.script.path;
        self.logger.log_start(&LogStart {
            headline: "Starting",
            subject: &format!("bash {}", path.display()),
            line_number: None,
            ignore_error: false,
            index,
            total,
        });
        if let Some(warning) = &command.warning {
            self.logger.warn(warning);
        }

        let original = fs::read(path)?;
        let values = self.environment.values().clone();
        let content = original.clone();
        let rendered = off_runtime(move || render_bytes(&content, &values)).await?;

        let guard = RestoreOnDrop::new(path, original);
        fs::write(path, rendered)?;

        let mut cmd = TokioCommand::new("bash");
        cmd.arg(path).current_dir(&command.script.working_directory);
        let outcome = run_foreground(cmd, false, &mut self.logger).await;

        guard.restore()?;
        let outcome = outcome?;

        if !outcome.success {
            return Err(ShtaskError::ScriptFailed {
                script: path.clone(),
                exit_code: outcome.exit_code,
            });
        }
        Ok(())
    }

    /// Render `text` on the blocking pool; dynamic values run shell commands.
    async fn render_text(&self, text: &str) -> Result<String> {
        let values = self.environment.values().clone();
        let text = text.to_string();
        off_runtime(move || render(&text, &values)).await
    }

    async fn write_template(&self, template: Template) -> Result<PathBuf> {
        let values = self.environment.values().clone();
        off_runtime(move || template.render_to_disk(&values)).await
    }

    /// Wait for every outstanding deferred process, in deferral order.
    ///
    /// Failures are evaluated only after all of them were waited on and
    /// reported.
    async fn drain(&mut self, outstanding: &mut Vec<DeferredProcess>) -> Result<()> {
        if outstanding.is_empty() {
            return Ok(());
        }

        self.logger.log_wait();

        let mut finished = Vec::with_capacity(outstanding.len());
        let mut wait_error: Option<ShtaskError> = None;

        for process in outstanding.drain(..) {
            let ignore_error = process.command.ignore_error;
            let rendered = process.rendered_command.clone();

            match process.wait().await {
                Ok(result) => {
                    for line in &result.lines {
                        self.logger.log(line);
                    }
                    if result.outcome.success {
                        self.logger.log_success();
                    } else {
                        self.logger.log_failure();
                    }
                    finished.push((rendered, ignore_error, result.outcome.success));
                }
                Err(err) => {
                    self.logger.log_failure();
                    wait_error.get_or_insert(err);
                }
            }
        }

        if let Some(err) = wait_error {
            return Err(err);
        }

        let failed: Vec<String> = finished
            .into_iter()
            .filter(|(_, ignore_error, success)| !success && !ignore_error)
            .map(|(rendered, _, _)| rendered)
            .collect();

        if !failed.is_empty() {
            return Err(ShtaskError::DeferredCommandsFailed(failed));
        }
        Ok(())
    }
}

/// Run blocking work (dynamic values, file IO) without stalling the reader
/// tasks of running processes.
async fn off_runtime<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(join_err) => Err(anyhow::Error::from(join_err).into()),
    }
}

/// Writes the original script bytes back when dropped.
struct RestoreOnDrop {
    path: PathBuf,
    original: Option<Vec<u8>>,
}

impl RestoreOnDrop {
    fn new(path: &Path, original: Vec<u8>) -> Self {
        Self {
            path: path.to_path_buf(),
            original: Some(original),
        }
    }

    fn restore(mut self) -> Result<()> {
        match self.original.take() {
            Some(original) => Ok(fs::write(&self.path, original)?),
            None => Ok(()),
        }
    }
}

impl Drop for RestoreOnDrop {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(e) = fs::write(&self.path, original) {
                error!(path = ?self.path, error = %e, "failed to restore script file");
            }
        }
    }
}
