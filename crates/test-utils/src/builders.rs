#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use shtask::environment::{Environment, ProcessValueProvider, Template, ValueMap};
use shtask::script::Script;

/// Builder that writes a script file and returns the matching `Script`.
pub struct ScriptBuilder {
    name: String,
    namespace: Option<String>,
    lines: Vec<String>,
    executable: bool,
    working_directory: Option<PathBuf>,
}

impl ScriptBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: None,
            lines: Vec::new(),
            executable: false,
            working_directory: None,
        }
    }

    pub fn line(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn lines(mut self, lines: &[&str]) -> Self {
        self.lines.extend(lines.iter().map(|l| l.to_string()));
        self
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Mark the written file executable (needed for bash-mode scripts).
    pub fn executable(mut self) -> Self {
        self.executable = true;
        self
    }

    pub fn working_directory(mut self, dir: &Path) -> Self {
        self.working_directory = Some(dir.to_path_buf());
        self
    }

    /// Write `<dir>/<name>.sh`. The working directory defaults to `dir`.
    pub fn write(self, dir: &Path) -> Result<Script> {
        let path = dir.join(format!("{}.sh", self.name));
        let mut content = self.lines.join("\n");
        content.push('\n');
        fs::write(&path, content)?;

        if self.executable {
            set_executable(&path)?;
        }

        let working_directory = self.working_directory.unwrap_or_else(|| dir.to_path_buf());
        let mut script = Script::new(self.name, path, working_directory);
        if let Some(ns) = self.namespace {
            script = script.with_namespace(ns);
        }
        script.load_description();
        Ok(script)
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Builder for a resolved `Environment`.
#[derive(Default)]
pub struct EnvironmentBuilder {
    values: ValueMap,
    templates: Vec<Template>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(mut self, name: &str, value: &str) -> Self {
        self.values.insert_literal(name, value);
        self
    }

    pub fn dynamic(mut self, name: &str, command: &str) -> Self {
        self.values
            .insert(name, Arc::new(ProcessValueProvider::new(command)));
        self
    }

    pub fn template(mut self, template: Template) -> Self {
        self.templates.push(template);
        self
    }

    pub fn build(self) -> Environment {
        Environment::new(self.values, self.templates)
    }
}
