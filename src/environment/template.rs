// src/environment/template.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::environment::ValueMap;
use crate::errors::{Result, ShtaskError};
use crate::placeholder::{render, render_bytes};

/// A file rendered through the placeholder engine.
///
/// `destination` may itself contain placeholders. Relative destinations are
/// resolved against `working_directory` at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub source: PathBuf,
    pub destination: String,
    pub working_directory: PathBuf,
}

impl Template {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<String>,
        working_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            working_directory: working_directory.into(),
        }
    }

    /// Render the destination path against `values`.
    pub fn destination_path(&self, values: &ValueMap) -> Result<PathBuf> {
        let rendered = render(&self.destination, values)?;
        Ok(resolve_against(&self.working_directory, Path::new(&rendered)))
    }

    /// Read the source, render it and write it to the rendered destination.
    ///
    /// The source is treated as bytes, so binary or non-UTF-8 content
    /// outside placeholders is written back unchanged. Nothing is written
    /// unless both the source and the destination path render successfully.
    pub fn render_to_disk(&self, values: &ValueMap) -> Result<PathBuf> {
        let source = resolve_against(&self.working_directory, &self.source);
        let content = fs::read(&source).map_err(|e| ShtaskError::TemplateNotValid {
            path: source.clone(),
            source: e,
        })?;

        let destination = self.destination_path(values)?;
        let rendered = render_bytes(&content, values)?;

        debug!(source = ?source, destination = ?destination, "writing template");

        write_file(&destination, &rendered).map_err(|e| {
            ShtaskError::TemplateWriteFailed {
                path: destination.clone(),
                source: e,
            }
        })?;

        Ok(destination)
    }
}

fn write_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)
}

fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
