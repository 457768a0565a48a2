// src/command.rs

//! Executable steps produced by the script parser.

use std::fmt;
use std::path::PathBuf;

use crate::environment::Template;
use crate::script::Script;

/// One step of a parsed script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run to completion before the next command starts.
    Process(ProcessCommand),
    /// Start without blocking; checked at the next `WAIT:` or script end.
    Deferred(ProcessCommand),
    /// Render a template file.
    Template(TemplateCommand),
    /// Barrier for all outstanding deferred processes.
    Wait(WaitCommand),
    /// Run a whole script file as one bash invocation.
    Bash(BashCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub shell_command: String,
    pub line_number: usize,
    pub ignore_error: bool,
    pub tty: bool,
    pub working_directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCommand {
    pub template: Template,
    pub line_number: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitCommand {
    pub line_number: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BashCommand {
    pub script: Script,
    /// Best-practice hint shown before the script runs.
    pub warning: Option<String>,
}

impl Command {
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Command::Process(c) | Command::Deferred(c) => Some(c.line_number),
            Command::Template(c) => Some(c.line_number),
            Command::Wait(c) => Some(c.line_number),
            Command::Bash(_) => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Command::Deferred(_))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Process(c) => {
                if c.ignore_error {
                    write!(f, "I: ")?;
                }
                if c.tty {
                    write!(f, "TTY: ")?;
                }
                write!(f, "{}", c.shell_command)
            }
            Command::Deferred(c) => {
                write!(f, "D: ")?;
                if c.ignore_error {
                    write!(f, "I: ")?;
                }
                write!(f, "{}", c.shell_command)
            }
            Command::Template(c) => write!(
                f,
                "TEMPLATE: {}:{}",
                c.template.source.display(),
                c.template.destination
            ),
            Command::Wait(_) => write!(f, "WAIT:"),
            Command::Bash(c) => write!(f, "bash {}", c.script.path.display()),
        }
    }
}
