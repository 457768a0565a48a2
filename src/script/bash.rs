// src/script/bash.rs

//! Scripts executed as a single bash invocation.
//!
//! A script whose content contains [`BASH_MARKER`] is not parsed line by
//! line. The executor renders the whole file in place, runs it, and
//! restores the original bytes afterwards, so the file must be executable
//! and its directory writable. Scripts should start with [`STRICT_MODE`].

use std::fs;
use std::path::Path;

use crate::command::BashCommand;
use crate::errors::{Result, ShtaskError};
use crate::script::Script;

/// Sentinel marking a script for whole-file bash execution.
pub const BASH_MARKER: &str = "<SHTASK_EXECUTE_AS_BASH>";

/// Shell options a bash-mode script is expected to enable.
pub const STRICT_MODE: &str = "set -euo pipefail";

pub fn is_bash_script(content: &str) -> bool {
    content.contains(BASH_MARKER)
}

/// Validate `script` for bash-mode execution and build its command.
pub fn parse_bash_script(script: &Script, content: &str) -> Result<BashCommand> {
    if !is_executable(&script.path)? {
        return Err(ShtaskError::UnsupportedScript {
            script: script.path.clone(),
            reason: "bash scripts must be executable".to_string(),
        });
    }

    let directory = script.directory();
    if !is_writable_dir(directory) {
        return Err(ShtaskError::UnsupportedScript {
            script: script.path.clone(),
            reason: format!("directory {:?} must be writable", directory),
        });
    }

    let warning = (!starts_with_strict_mode(content)).then(|| {
        format!(
            "{} does not enable strict mode; consider adding '{}' at the top",
            script.path.display(),
            STRICT_MODE
        )
    });

    Ok(BashCommand {
        script: script.clone(),
        warning,
    })
}

/// Whether the first statement (after the shebang, comments and blank
/// lines) enables strict mode.
fn starts_with_strict_mode(content: &str) -> bool {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .is_some_and(|line| line.starts_with(STRICT_MODE))
}

/// Check by creating a scratch file; permission bits alone ignore ownership.
fn is_writable_dir(directory: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".shtask-")
        .tempfile_in(directory)
        .is_ok()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> Result<bool> {
    Ok(path.is_file())
}
