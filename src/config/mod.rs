// src/config/mod.rs

//! Configuration loading and validation for shtask.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file, its imports and its override file (`loader.rs`).
//! - Validate value names and entries (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{discover_config, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, DEFAULT_ENVIRONMENT, EnvironmentSection, PathEntry, RawConfigFile, TemplateEntry,
};
