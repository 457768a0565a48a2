// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, ShtaskError};

/// Default config file name.
pub const CONFIG_FILE: &str = "shtask.toml";
/// Fallback used when [`CONFIG_FILE`] is absent.
pub const DIST_CONFIG_FILE: &str = "shtask.toml.dist";
/// Merged on top of the main config when present.
pub const OVERRIDE_CONFIG_FILE: &str = "shtask.toml.override";

/// Load a single configuration file and its `imports`.
///
/// Imports are merged underneath the importing file, so the importer wins.
/// Relative paths are rebased onto the directory of the file declaring them.
/// This does **not** validate; use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let mut stack = Vec::new();
    load_with_imports(path.as_ref(), &mut stack)
}

fn load_with_imports(path: &Path, stack: &mut Vec<PathBuf>) -> Result<RawConfigFile> {
    let canonical = fs::canonicalize(path)?;
    if stack.contains(&canonical) {
        return Err(ShtaskError::ConfigError(format!(
            "import cycle detected at {:?}",
            canonical
        )));
    }

    let contents = fs::read_to_string(path)?;
    let mut config: RawConfigFile = toml::from_str(&contents)?;
    let dir = canonical
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    config.rebase(&dir);

    let imports = std::mem::take(&mut config.imports);
    if imports.is_empty() {
        return Ok(config);
    }

    stack.push(canonical);
    let mut merged = RawConfigFile::default();
    for import in imports.iter() {
        debug!(import = ?import, "loading imported config");
        merged = merged.merge(load_with_imports(import, stack)?);
    }
    stack.pop();

    Ok(merged.merge(config))
}

/// Locate the config file in `dir`: [`CONFIG_FILE`], else [`DIST_CONFIG_FILE`].
pub fn discover_config(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    [CONFIG_FILE, DIST_CONFIG_FILE]
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            ShtaskError::ConfigError(format!(
                "no {CONFIG_FILE} or {DIST_CONFIG_FILE} found in {:?}",
                dir
            ))
        })
}

/// Load configuration and run validation.
///
/// `path` may be a config file or a directory to discover one in. A
/// [`OVERRIDE_CONFIG_FILE`] next to the config file is merged on top.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let file = if path.is_dir() {
        discover_config(path)?
    } else {
        path.to_path_buf()
    };

    let mut raw = load_from_path(&file)?;

    let root_dir = fs::canonicalize(&file)?
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let override_file = root_dir.join(OVERRIDE_CONFIG_FILE);
    if override_file.is_file() {
        debug!(path = ?override_file, "merging override config");
        raw = raw.merge(load_from_path(&override_file)?);
    }

    raw.root_dir = root_dir;
    ConfigFile::try_from(raw)
}
