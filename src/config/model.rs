// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::environment::{EnvironmentInputs, Template};
use crate::errors::{Result, ShtaskError};
use crate::script::catalog::ScriptPath;

/// Name of the environment formed by the top-level tables.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Configuration as read from a TOML file (or several merged files),
/// before validation.
///
/// ```toml
/// header = "My project"
/// imports = ["shared/shtask.toml"]
/// dotenv = [".env"]
///
/// [[paths]]
/// path = "scripts"
///
/// [const]
/// APP = "shop"
///
/// [dynamic]
/// USER_ID = "id -u"
///
/// [[templates]]
/// source = "templates/app.conf.tpl"
/// destination = "config/app-__APP__.conf"
///
/// [environments.prod]
/// paths = [{ path = "scripts/prod", namespace = "prod" }]
/// const = { MODE = "production" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Banner printed before scripts run.
    #[serde(default)]
    pub header: Option<String>,

    /// Other config files merged underneath this one.
    #[serde(default)]
    pub imports: Vec<PathBuf>,

    /// The `default` environment.
    #[serde(flatten)]
    pub base: EnvironmentSection,

    /// Named environments from `[environments.<name>]`.
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentSection>,

    /// Directory of the top-level config file; set by the loader.
    #[serde(skip)]
    pub root_dir: PathBuf,
}

/// Settings shared by the default environment and named environments.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EnvironmentSection {
    #[serde(default)]
    pub paths: Vec<PathEntry>,

    #[serde(default, rename = "const")]
    pub constants: BTreeMap<String, String>,

    /// Values produced by running a shell command.
    #[serde(default)]
    pub dynamic: BTreeMap<String, String>,

    #[serde(default)]
    pub dotenv: Vec<PathBuf>,

    #[serde(default)]
    pub templates: Vec<TemplateEntry>,
}

/// A `[[paths]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PathEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// A `[[templates]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TemplateEntry {
    pub source: PathBuf,
    pub destination: String,
}

impl RawConfigFile {
    /// Merge `overlay` on top of `self`.
    ///
    /// Scalars and map entries from `overlay` win; lists are appended.
    pub fn merge(mut self, overlay: RawConfigFile) -> RawConfigFile {
        if overlay.header.is_some() {
            self.header = overlay.header;
        }
        self.imports.extend(overlay.imports);
        self.base = self.base.merge(overlay.base);
        for (name, section) in overlay.environments {
            let merged = match self.environments.remove(&name) {
                Some(existing) => existing.merge(section),
                None => section,
            };
            self.environments.insert(name, merged);
        }
        self
    }

    /// Make every relative path absolute against `dir`.
    pub fn rebase(&mut self, dir: &Path) {
        self.imports = self.imports.iter().map(|p| absolutize(dir, p)).collect();
        self.base.rebase(dir);
        for section in self.environments.values_mut() {
            section.rebase(dir);
        }
    }
}

impl EnvironmentSection {
    pub fn merge(mut self, overlay: EnvironmentSection) -> EnvironmentSection {
        self.paths.extend(overlay.paths);
        merge_values(&mut self.constants, overlay.constants);
        merge_values(&mut self.dynamic, overlay.dynamic);
        self.dotenv.extend(overlay.dotenv);
        self.templates.extend(overlay.templates);
        self
    }

    fn rebase(&mut self, dir: &Path) {
        for entry in &mut self.paths {
            entry.path = absolutize(dir, &entry.path);
        }
        self.dotenv = self.dotenv.iter().map(|p| absolutize(dir, p)).collect();
        // Destinations may contain placeholders; `Template` resolves them
        // against the config root after rendering.
        for template in &mut self.templates {
            template.source = absolutize(dir, &template.source);
        }
    }
}

/// Override entries case-insensitively so `foo` replaces `FOO`.
fn merge_values(base: &mut BTreeMap<String, String>, overlay: BTreeMap<String, String>) {
    for (name, value) in overlay {
        base.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        base.insert(name, value);
    }
}

fn absolutize(dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

/// Validated configuration.
///
/// Built through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub header: Option<String>,
    pub base: EnvironmentSection,
    pub environments: BTreeMap<String, EnvironmentSection>,
    pub root_dir: PathBuf,
}

impl ConfigFile {
    pub fn new_unchecked(
        header: Option<String>,
        base: EnvironmentSection,
        environments: BTreeMap<String, EnvironmentSection>,
        root_dir: PathBuf,
    ) -> Self {
        Self {
            header,
            base,
            environments,
            root_dir,
        }
    }

    pub fn environment_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(DEFAULT_ENVIRONMENT).chain(self.environments.keys().map(|k| k.as_str()))
    }

    /// The default section with environment `name` merged on top.
    pub fn section(&self, name: &str) -> Result<EnvironmentSection> {
        if name == DEFAULT_ENVIRONMENT {
            return Ok(self.base.clone());
        }
        let section = self.environments.get(name).ok_or_else(|| {
            ShtaskError::ConfigError(format!("unknown environment '{name}'"))
        })?;
        Ok(self.base.clone().merge(section.clone()))
    }

    /// Inputs for resolving environment `name`.
    pub fn environment_inputs(&self, name: &str) -> Result<EnvironmentInputs> {
        let section = self.section(name)?;
        let templates = section
            .templates
            .iter()
            .map(|t| Template::new(t.source.clone(), t.destination.clone(), self.root_dir.clone()))
            .collect();

        Ok(EnvironmentInputs {
            constants: section.constants,
            dynamic: section.dynamic,
            dotenv: section.dotenv,
            templates,
            working_directory: self.root_dir.clone(),
        })
    }

    /// Script directories visible in environment `name`.
    pub fn script_paths(&self, name: &str) -> Result<Vec<ScriptPath>> {
        Ok(self
            .section(name)?
            .paths
            .into_iter()
            .map(|p| ScriptPath::new(p.path, p.namespace))
            .collect())
    }
}
