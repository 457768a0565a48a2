// src/script/catalog.rs

//! Script discovery and lookup.

use std::fs;
use std::path::PathBuf;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::errors::{Result, ShtaskError};
use crate::script::Script;

/// Lookup of scripts by (qualified) name.
pub trait ScriptCatalog: Send + Sync {
    fn all_scripts(&self) -> Vec<Script>;

    fn find_script_by_name(&self, name: &str) -> Result<Script> {
        self.all_scripts()
            .into_iter()
            .find(|s| s.qualified_name() == name)
            .ok_or_else(|| ShtaskError::ScriptNotFound(name.to_string()))
    }

    /// Look up every name, preserving order. Fails on the first miss.
    fn find_scripts_in_order(&self, names: &[String]) -> Result<Vec<Script>> {
        names.iter().map(|n| self.find_script_by_name(n)).collect()
    }
}

/// A directory to scan for scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPath {
    pub path: PathBuf,
    pub namespace: Option<String>,
}

impl ScriptPath {
    pub fn new(path: impl Into<PathBuf>, namespace: Option<String>) -> Self {
        Self {
            path: path.into(),
            namespace,
        }
    }
}

/// Catalog built by scanning directories (non-recursively) for `*.sh` and
/// `*.psh` files.
#[derive(Debug, Clone, Default)]
pub struct DirectoryCatalog {
    scripts: Vec<Script>,
}

impl DirectoryCatalog {
    pub fn scan(paths: &[ScriptPath], working_directory: impl Into<PathBuf>) -> Result<Self> {
        let working_directory = working_directory.into();
        let matcher = script_matcher()?;
        let mut scripts = Vec::new();

        for entry in paths {
            if !entry.path.is_dir() {
                warn!(path = ?entry.path, "script path is not a directory; skipping");
                continue;
            }

            for item in fs::read_dir(&entry.path)? {
                let path = item?.path();
                let Some(file_name) = path.file_name() else {
                    continue;
                };
                if !path.is_file() || !matcher.is_match(file_name) {
                    continue;
                }
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };

                let mut script = Script::new(stem, path.clone(), working_directory.clone());
                if let Some(ns) = &entry.namespace {
                    script = script.with_namespace(ns.clone());
                }
                script.load_description();
                scripts.push(script);
            }
        }

        scripts.sort_by_key(|s| s.qualified_name());
        debug!(count = scripts.len(), "script catalog scanned");

        Ok(Self { scripts })
    }

    pub fn from_scripts(scripts: Vec<Script>) -> Self {
        Self { scripts }
    }
}

impl ScriptCatalog for DirectoryCatalog {
    fn all_scripts(&self) -> Vec<Script> {
        self.scripts.clone()
    }
}

fn script_matcher() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in ["*.sh", "*.psh"] {
        builder.add(Glob::new(pattern).map_err(anyhow::Error::from)?);
    }
    Ok(builder.build().map_err(anyhow::Error::from)?)
}
