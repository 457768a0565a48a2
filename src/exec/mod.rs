// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs parsed commands as child processes using
//! `tokio::process::Command` and reports progress to a [`ScriptLogger`].
//!
//! - [`executor`] owns the per-script state machine (foreground commands,
//!   deferred processes and wait barriers).
//! - [`deferred`] wraps a process started without blocking.
//! - [`process`] holds the spawning and output-streaming helpers.
//! - [`logger`] defines the progress events and the console logger.

pub mod deferred;
pub mod executor;
pub mod logger;
pub mod process;

pub use deferred::{DeferredOutcome, DeferredProcess};
pub use executor::ProcessExecutor;
pub use logger::{ConsoleLogger, LogStart, OutputLine, ScriptLogger};
pub use process::ProcessOutcome;
