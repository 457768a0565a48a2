// src/script/mod.rs

//! Scripts and how they become commands.
//!
//! - [`catalog`] discovers scripts on disk and looks them up by name.
//! - [`parser`] turns a script file into an ordered [`Command`](crate::command::Command) list.
//! - [`bash`] handles scripts that run as a single bash invocation.

pub mod bash;
pub mod catalog;
pub mod parser;

use std::fs;
use std::path::{Path, PathBuf};

pub use catalog::{DirectoryCatalog, ScriptCatalog};
pub use parser::Parser;

/// Comment prefix that carries a script's description.
pub const DESCRIPTION_PREFIX: &str = "# description:";

/// A runnable script file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub name: String,
    pub namespace: Option<String>,
    pub path: PathBuf,
    /// Directory commands run in.
    pub working_directory: PathBuf,
    pub description: Option<String>,
}

impl Script {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            path: path.into(),
            working_directory: working_directory.into(),
            description: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// `namespace:name`, or just `name` outside a namespace.
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Directory containing the script file.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Read the description comment from the script file, if any.
    pub fn load_description(&mut self) {
        self.description = fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| description_from(&content));
    }
}

fn description_from(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        line.trim()
            .strip_prefix(DESCRIPTION_PREFIX)
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
    })
}
