// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_ENVIRONMENT;

/// Command-line arguments for `shtask`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "shtask",
    version,
    about = "Run shell scripts with placeholders, templates and deferred commands.",
    long_about = None
)]
pub struct CliArgs {
    /// Scripts to run, in order (`name` or `namespace:name`).
    ///
    /// Several scripts may also be given comma-separated. Without any
    /// script the available scripts are listed.
    #[arg(value_name = "SCRIPT", value_delimiter = ',')]
    pub scripts: Vec<String>,

    /// Config file, or a directory containing `shtask.toml`.
    ///
    /// Default: the current working directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Environment to resolve values and script paths from.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_ENVIRONMENT)]
    pub env: String,

    /// Extra value overriding every configured one (repeatable).
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// List available scripts and exit.
    #[arg(long)]
    pub list: bool,

    /// Parse scripts and print their commands without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SHTASK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Parse `KEY=VALUE`.
pub fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid parameter '{s}' (expected KEY=VALUE)")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
