// src/config/validate.rs

use std::collections::{BTreeMap, HashSet};

use crate::config::model::{ConfigFile, DEFAULT_ENVIRONMENT, EnvironmentSection, RawConfigFile};
use crate::errors::{Result, ShtaskError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ShtaskError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.header,
            raw.base,
            raw.environments,
            raw.root_dir,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_section(DEFAULT_ENVIRONMENT, &cfg.base)?;
    for (name, section) in cfg.environments.iter() {
        validate_environment_name(name)?;
        validate_section(name, section)?;
    }
    Ok(())
}

fn validate_environment_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ShtaskError::ConfigError(
            "environment names must not be empty".to_string(),
        ));
    }
    if name == DEFAULT_ENVIRONMENT {
        return Err(ShtaskError::ConfigError(format!(
            "'{DEFAULT_ENVIRONMENT}' is reserved for the top-level tables; use another environment name"
        )));
    }
    Ok(())
}

fn validate_section(env: &str, section: &EnvironmentSection) -> Result<()> {
    ensure_unique_names(&section.constants)?;
    ensure_unique_names(&section.dynamic)?;

    for entry in section.paths.iter() {
        if entry.path.as_os_str().is_empty() {
            return Err(ShtaskError::ConfigError(format!(
                "environment '{env}' has a path entry with an empty path"
            )));
        }
    }

    for template in section.templates.iter() {
        if template.source.as_os_str().is_empty() || template.destination.trim().is_empty() {
            return Err(ShtaskError::ConfigError(format!(
                "environment '{env}' has a template without source or destination"
            )));
        }
    }

    Ok(())
}

fn ensure_unique_names(values: &BTreeMap<String, String>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in values.keys() {
        if !seen.insert(name.to_uppercase()) {
            return Err(ShtaskError::DuplicateValueName(name.clone()));
        }
    }
    Ok(())
}
