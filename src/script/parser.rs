// src/script/parser.rs

//! Line-based script parser.
//!
//! Each physical line is classified in this order:
//!
//! 1. blank lines and `#` comments are skipped
//! 2. lines starting with three spaces continue the previous logical line
//! 3. `ACTION: <script>` splices in another catalog script
//! 4. `INCLUDE: <path>` splices in another file
//! 5. `TEMPLATE: <source>:<destination>`
//! 6. `WAIT:`
//! 7. `I: `, `TTY: ` and `D: ` modifiers, in any order
//! 8. anything else is a shell command
//!
//! Nested files are parsed into their own command list which the caller
//! splices in; there is no shared accumulator.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::command::{Command, ProcessCommand, TemplateCommand, WaitCommand};
use crate::environment::Template;
use crate::errors::{Result, ShtaskError};
use crate::script::bash::{is_bash_script, parse_bash_script};
use crate::script::{Script, ScriptCatalog};

pub const CONTINUATION: &str = "   ";
pub const ACTION: &str = "ACTION: ";
pub const INCLUDE: &str = "INCLUDE: ";
pub const TEMPLATE: &str = "TEMPLATE: ";
pub const WAIT: &str = "WAIT:";
pub const IGNORE_ERROR: &str = "I: ";
pub const TTY: &str = "TTY: ";
pub const DEFERRED: &str = "D: ";

/// A command line after continuations have been folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// 1-based line where the logical line starts.
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Default, Clone, Copy)]
struct Modifiers {
    ignore_error: bool,
    tty: bool,
    deferred: bool,
}

pub struct Parser<'a> {
    catalog: &'a dyn ScriptCatalog,
    /// Files currently being parsed, outermost first.
    stack: Vec<PathBuf>,
}

impl<'a> Parser<'a> {
    pub fn new(catalog: &'a dyn ScriptCatalog) -> Self {
        Self {
            catalog,
            stack: Vec::new(),
        }
    }

    /// Parse `script` into its command list.
    pub fn parse(&mut self, script: &Script) -> Result<Vec<Command>> {
        // Bash scripts are rendered as bytes, so they need not be UTF-8.
        let bytes = fs::read(&script.path)?;
        let content = String::from_utf8_lossy(&bytes);
        if is_bash_script(&content) {
            debug!(script = %script.qualified_name(), "script runs in bash mode");
            return Ok(vec![Command::Bash(parse_bash_script(script, &content)?)]);
        }
        self.parse_file(&script.path, script)
    }

    fn parse_file(&mut self, path: &Path, script: &Script) -> Result<Vec<Command>> {
        let canonical = fs::canonicalize(path)?;
        if self.stack.contains(&canonical) {
            return Err(ShtaskError::IncludeCycle(canonical));
        }

        let content = fs::read_to_string(path)?;
        self.stack.push(canonical);
        let result = self.parse_lines(&content, path, script);
        self.stack.pop();
        result
    }

    /// Parse `content` read from `source`, which belongs to `script`.
    pub fn parse_lines(&mut self, content: &str, source: &Path, script: &Script) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        for line in logical_lines(content) {
            commands.extend(self.parse_line(&line, source, script)?);
        }
        Ok(commands)
    }

    fn parse_line(&mut self, line: &LogicalLine, source: &Path, script: &Script) -> Result<Vec<Command>> {
        let text = line.text.as_str();
        let source_dir = source.parent().unwrap_or_else(|| Path::new("."));

        if let Some(name) = text.strip_prefix(ACTION) {
            let name = name.trim();
            let action = self
                .catalog
                .find_script_by_name(name)
                .map_err(|_| ShtaskError::ActionNotFound {
                    action: name.to_string(),
                    script: source.to_path_buf(),
                })?;
            return self.parse(&action);
        }

        if let Some(include) = text.strip_prefix(INCLUDE) {
            let include = include.trim();
            let path = resolve_include(include, source_dir).ok_or_else(|| {
                ShtaskError::IncludeNotFound {
                    include: include.to_string(),
                    script: source.to_path_buf(),
                }
            })?;
            return self.parse_file(&path, script);
        }

        if let Some(spec) = text.strip_prefix(TEMPLATE) {
            let Some((src, dst)) = spec.split_once(':') else {
                return Err(ShtaskError::MalformedTemplate {
                    line: line.number,
                    script: source.to_path_buf(),
                });
            };
            let template = Template::new(
                source_dir.join(src.trim()),
                dst.trim(),
                script.working_directory.clone(),
            );
            return Ok(vec![Command::Template(TemplateCommand {
                template,
                line_number: line.number,
            })]);
        }

        if text.starts_with(WAIT) {
            return Ok(vec![Command::Wait(WaitCommand {
                line_number: line.number,
            })]);
        }

        let (modifiers, shell_command) = strip_modifiers(text);
        let process = ProcessCommand {
            shell_command: shell_command.to_string(),
            line_number: line.number,
            ignore_error: modifiers.ignore_error,
            tty: modifiers.tty,
            working_directory: script.working_directory.clone(),
        };

        Ok(vec![if modifiers.deferred {
            Command::Deferred(process)
        } else {
            Command::Process(process)
        }])
    }
}

/// Fold continuation lines into logical lines, dropping blanks and comments.
pub fn logical_lines(content: &str) -> Vec<LogicalLine> {
    let mut lines: Vec<LogicalLine> = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if raw.starts_with(CONTINUATION) {
            if let Some(previous) = lines.last_mut() {
                previous.text.push(' ');
                previous.text.push_str(trimmed);
                continue;
            }
        }

        lines.push(LogicalLine {
            number: idx + 1,
            text: trimmed.to_string(),
        });
    }

    lines
}

fn strip_modifiers(mut text: &str) -> (Modifiers, &str) {
    let mut modifiers = Modifiers::default();
    loop {
        if let Some(rest) = text.strip_prefix(IGNORE_ERROR) {
            modifiers.ignore_error = true;
            text = rest.trim_start();
        } else if let Some(rest) = text.strip_prefix(TTY) {
            modifiers.tty = true;
            text = rest.trim_start();
        } else if let Some(rest) = text.strip_prefix(DEFERRED) {
            modifiers.deferred = true;
            text = rest.trim_start();
        } else {
            return (modifiers, text);
        }
    }
}

/// Resolve an include as given first, then relative to `script_dir`.
fn resolve_include(include: &str, script_dir: &Path) -> Option<PathBuf> {
    let direct = PathBuf::from(include);
    if direct.is_file() {
        return Some(direct);
    }
    let relative = script_dir.join(include);
    relative.is_file().then_some(relative)
}
