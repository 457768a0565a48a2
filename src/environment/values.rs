// src/environment/values.rs

//! Named values used for placeholder substitution.
//!
//! - [`SimpleValueProvider`] wraps a literal (constants, dotenv entries,
//!   CLI parameters).
//! - [`ProcessValueProvider`] runs a shell command on every call and returns
//!   its trimmed stdout (dynamic variables).
//! - [`CachedValueProvider`] memoizes another provider; the environment
//!   wraps dynamic variables in it so a command runs at most once per
//!   environment.
//! - [`ValueMap`] stores providers under uppercased names, which makes
//!   every lookup case-insensitive.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::errors::{Result, ShtaskError};

/// A lazily or immediately available string value.
pub trait ValueProvider: Send + Sync + fmt::Debug {
    fn value(&self) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleValueProvider(String);

impl SimpleValueProvider {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl ValueProvider for SimpleValueProvider {
    fn value(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Runs `command` through the system shell every time the value is read.
#[derive(Debug, Clone)]
pub struct ProcessValueProvider {
    command: String,
    working_directory: Option<PathBuf>,
}

impl ProcessValueProvider {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_directory: None,
        }
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl ValueProvider for ProcessValueProvider {
    fn value(&self) -> Result<String> {
        debug!(cmd = %self.command, "resolving dynamic value");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.command);
            c
        };
        cmd.stdin(Stdio::null());
        if let Some(dir) = &self.working_directory {
            cmd.current_dir(dir);
        }

        let output = cmd.output()?;
        if !output.status.success() {
            return Err(ShtaskError::ProcessExecution {
                command: self.command.clone(),
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Keeps the first successful value of `inner`. Failures are not cached.
#[derive(Debug)]
pub struct CachedValueProvider<P> {
    inner: P,
    cached: Mutex<Option<String>>,
}

impl<P: ValueProvider> CachedValueProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cached: Mutex::new(None),
        }
    }
}

impl<P: ValueProvider> ValueProvider for CachedValueProvider<P> {
    fn value(&self) -> Result<String> {
        let mut guard = self
            .cached
            .lock()
            .map_err(|_| anyhow::anyhow!("value cache lock poisoned"))?;
        if let Some(value) = guard.as_ref() {
            return Ok(value.clone());
        }
        let value = self.inner.value()?;
        *guard = Some(value.clone());
        Ok(value)
    }
}

/// Providers keyed by uppercased name.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    values: BTreeMap<String, Arc<dyn ValueProvider>>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or override `name`.
    pub fn insert(&mut self, name: &str, provider: Arc<dyn ValueProvider>) {
        self.values.insert(name.to_uppercase(), provider);
    }

    /// Insert `name`, failing if a case-insensitively equal name exists.
    pub fn insert_unique(&mut self, name: &str, provider: Arc<dyn ValueProvider>) -> Result<()> {
        let key = name.to_uppercase();
        if self.values.contains_key(&key) {
            return Err(ShtaskError::DuplicateValueName(name.to_string()));
        }
        self.values.insert(key, provider);
        Ok(())
    }

    /// Convenience for literal values.
    pub fn insert_literal(&mut self, name: &str, value: impl Into<String>) {
        self.insert(name, Arc::new(SimpleValueProvider::new(value)));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ValueProvider>> {
        self.values.get(&name.to_uppercase())
    }

    /// Layer `other` on top of `self`; entries in `other` win.
    pub fn extend(&mut self, other: ValueMap) {
        self.values.extend(other.values);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert_literal(k.as_ref(), v);
        }
        map
    }
}
