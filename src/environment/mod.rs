// src/environment/mod.rs

//! Resolved execution environment.
//!
//! An [`Environment`] is the value map placeholders are rendered against,
//! plus the templates written before a script starts. It is built from
//! [`EnvironmentInputs`] (produced by the config layer) with this
//! precedence, lowest first:
//!
//! 1. constants
//! 2. dotenv files, in order
//! 3. dynamic variables (shell commands, memoized per environment)
//! 4. explicit parameters (e.g. `--param` on the CLI)

pub mod template;
pub mod values;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{Result, ShtaskError};

pub use template::Template;
pub use values::{
    CachedValueProvider, ProcessValueProvider, SimpleValueProvider, ValueMap, ValueProvider,
};

/// Unresolved inputs for one named environment.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentInputs {
    pub constants: BTreeMap<String, String>,
    pub dynamic: BTreeMap<String, String>,
    pub dotenv: Vec<PathBuf>,
    pub templates: Vec<Template>,
    /// Directory dynamic variables run in.
    pub working_directory: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: ValueMap,
    templates: Vec<Template>,
}

impl Environment {
    pub fn new(values: ValueMap, templates: Vec<Template>) -> Self {
        Self { values, templates }
    }

    /// Build the layered value map from config inputs.
    ///
    /// Dotenv files are read eagerly; dynamic variables are not executed
    /// until a placeholder first asks for them.
    pub fn resolve(inputs: &EnvironmentInputs) -> Result<Self> {
        let mut values = ValueMap::new();

        let mut constants = ValueMap::new();
        for (name, value) in &inputs.constants {
            constants.insert_unique(name, Arc::new(SimpleValueProvider::new(value.clone())))?;
        }
        values.extend(constants);

        for path in &inputs.dotenv {
            values.extend(load_dotenv(path)?);
        }

        let mut dynamic = ValueMap::new();
        for (name, command) in &inputs.dynamic {
            let mut provider = ProcessValueProvider::new(command.clone());
            if !inputs.working_directory.as_os_str().is_empty() {
                provider = provider.with_working_directory(&inputs.working_directory);
            }
            dynamic.insert_unique(name, Arc::new(CachedValueProvider::new(provider)))?;
        }
        values.extend(dynamic);

        debug!(
            values = values.len(),
            templates = inputs.templates.len(),
            "environment resolved"
        );

        Ok(Self {
            values,
            templates: inputs.templates.clone(),
        })
    }

    /// Layer `params` on top of every other value.
    pub fn with_params(mut self, params: ValueMap) -> Self {
        self.values.extend(params);
        self
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }
}

fn load_dotenv(path: &Path) -> Result<ValueMap> {
    if !path.is_file() {
        return Err(ShtaskError::ConfigError(format!(
            "dotenv file {:?} does not exist",
            path
        )));
    }

    let mut values = ValueMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (name, value) = item?;
        values.insert_literal(&name, value);
    }
    debug!(path = ?path, count = values.len(), "loaded dotenv file");
    Ok(values)
}
