// src/exec/logger.rs

//! Progress events emitted while a script runs.
//!
//! The executor reports through [`ScriptLogger`] only; it never prints.
//! [`ConsoleLogger`] is the implementation used by the binary. Script
//! output goes to stdout/stderr, diagnostics go through `tracing`.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::script::Script;

/// Announces the command about to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogStart<'a> {
    pub headline: &'a str,
    pub subject: &'a str,
    pub line_number: Option<usize>,
    pub ignore_error: bool,
    /// 0-based position in the script's command list.
    pub index: usize,
    pub total: usize,
}

/// One line of child process output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub is_error: bool,
}

impl OutputLine {
    pub fn new(text: impl Into<String>, is_error: bool) -> Self {
        Self {
            text: text.into(),
            is_error,
        }
    }
}

pub trait ScriptLogger: Send {
    fn start_script(&mut self, script: &Script);
    fn log_start(&mut self, entry: &LogStart<'_>);
    fn log(&mut self, line: &OutputLine);
    /// A barrier started waiting on deferred processes.
    fn log_wait(&mut self);
    /// The deferred process reported last succeeded.
    fn log_success(&mut self);
    /// The deferred process reported last failed.
    fn log_failure(&mut self);
    fn warn(&mut self, message: &str);
    fn finish_script(&mut self, script: &Script);
}

/// Human-readable console output.
#[derive(Debug, Default)]
pub struct ConsoleLogger {
    started: Option<Instant>,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }
}

impl ScriptLogger for ConsoleLogger {
    fn start_script(&mut self, script: &Script) {
        self.started = Some(Instant::now());
        info!(script = %script.qualified_name(), path = ?script.path, "script started");
        println!();
        println!(
            "Starting execution of '{}' ({})",
            script.qualified_name(),
            script.path.display()
        );
        println!();
    }

    fn log_start(&mut self, entry: &LogStart<'_>) {
        let ignore = if entry.ignore_error { " (ignoring errors)" } else { "" };
        match entry.line_number {
            Some(line) => println!(
                "({}/{}) {}{} [line {}]",
                entry.index + 1,
                entry.total,
                entry.headline,
                ignore,
                line
            ),
            None => println!(
                "({}/{}) {}{}",
                entry.index + 1,
                entry.total,
                entry.headline,
                ignore
            ),
        }
        println!("> {}", entry.subject);
    }

    fn log(&mut self, line: &OutputLine) {
        if line.is_error {
            eprintln!("\t{}", line.text);
        } else {
            println!("\t{}", line.text);
        }
    }

    fn log_wait(&mut self) {
        println!("  waiting for deferred commands...");
    }

    fn log_success(&mut self) {
        println!("  ✓ deferred command succeeded");
    }

    fn log_failure(&mut self) {
        println!("  ✗ deferred command failed");
    }

    fn warn(&mut self, message: &str) {
        warn!("{message}");
        eprintln!("WARNING: {message}");
    }

    fn finish_script(&mut self, script: &Script) {
        let elapsed = self.elapsed();
        info!(
            script = %script.qualified_name(),
            elapsed_ms = elapsed.as_millis() as u64,
            "script finished"
        );
        println!();
        println!("Duration: {:.2}s", elapsed.as_secs_f64());
    }
}
