// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShtaskError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Dotenv error: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("Value '{0}' is defined more than once (names are case-insensitive)")]
    DuplicateValueName(String),

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("Unable to find include '{include}' referenced from {script:?}")]
    IncludeNotFound { include: String, script: PathBuf },

    #[error("Unable to find action '{action}' referenced from {script:?}")]
    ActionNotFound { action: String, script: PathBuf },

    #[error("Include cycle detected: {0:?} is already being parsed")]
    IncludeCycle(PathBuf),

    #[error("Malformed template line {line} in {script:?}: expected 'TEMPLATE: <source>:<destination>'")]
    MalformedTemplate { line: usize, script: PathBuf },

    #[error("Unsupported script {script:?}: {reason}")]
    UnsupportedScript { script: PathBuf, reason: String },

    #[error("Missing required parameter: {0}")]
    MissingRequiredParameter(String),

    #[error("Command '{command}' failed with exit code {exit_code}: {stderr}")]
    ProcessExecution {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Execution aborted: '{command}' (line {line}) exited with code {exit_code}")]
    CommandFailed {
        command: String,
        line: usize,
        exit_code: i32,
    },

    #[error("Execution aborted: bash script {script:?} exited with code {exit_code}")]
    ScriptFailed { script: PathBuf, exit_code: i32 },

    #[error("Deferred command(s) failed: {}", .0.join(", "))]
    DeferredCommandsFailed(Vec<String>),

    #[error("Template source {path:?} does not exist or is not readable: {source}")]
    TemplateNotValid {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write template destination {path:?}: {source}")]
    TemplateWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ShtaskError>;
