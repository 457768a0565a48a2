// src/lib.rs

pub mod cli;
pub mod command;
pub mod config;
pub mod environment;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod placeholder;
pub mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::command::Command;
use crate::config::load_and_validate;
use crate::environment::{Environment, ValueMap};
use crate::exec::{ConsoleLogger, ProcessExecutor};
use crate::placeholder::placeholder_names;
use crate::script::{DirectoryCatalog, Parser, Script, ScriptCatalog};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and environment selection
/// - script discovery
/// - parsing every requested script up front
/// - executing the scripts in order, stopping at the first failure
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(|| PathBuf::from("."));
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config from {:?}", config_path))?;

    if let Some(header) = &cfg.header {
        println!("{header}");
    }

    let paths = cfg.script_paths(&args.env)?;
    let catalog = DirectoryCatalog::scan(&paths, &cfg.root_dir)?;

    if args.list || args.scripts.is_empty() {
        print_scripts(&catalog, &args.env);
        return Ok(());
    }

    // Parse everything first so configuration errors surface before any
    // process is spawned.
    let scripts = catalog.find_scripts_in_order(&args.scripts)?;
    let mut parsed: Vec<(Script, Vec<Command>)> = Vec::with_capacity(scripts.len());
    for script in scripts {
        let commands = Parser::new(&catalog)
            .parse(&script)
            .with_context(|| format!("parsing script '{}'", script.qualified_name()))?;
        debug!(script = %script.qualified_name(), commands = commands.len(), "script parsed");
        parsed.push((script, commands));
    }

    if args.dry_run {
        print_dry_run(&parsed);
        return Ok(());
    }

    let params: ValueMap = args.params.iter().cloned().collect();
    let environment = Environment::resolve(&cfg.environment_inputs(&args.env)?)?.with_params(params);
    info!(env = %args.env, values = environment.values().len(), "environment ready");

    let mut executor = ProcessExecutor::new(environment, ConsoleLogger::new());
    for (script, commands) in parsed.iter() {
        executor
            .execute(script, commands)
            .await
            .with_context(|| format!("executing script '{}'", script.qualified_name()))?;
    }

    Ok(())
}

fn print_scripts(catalog: &DirectoryCatalog, env: &str) {
    let scripts = catalog.all_scripts();
    println!("Available scripts ({} in environment '{env}'):", scripts.len());
    for script in scripts.iter() {
        match &script.description {
            Some(description) => println!("  - {:<30} {}", script.qualified_name(), description),
            None => println!("  - {}", script.qualified_name()),
        }
    }
}

/// Print each script's commands and the placeholders they need.
fn print_dry_run(parsed: &[(Script, Vec<Command>)]) {
    println!("shtask dry-run");
    for (script, commands) in parsed.iter() {
        println!();
        println!("{} ({}):", script.qualified_name(), script.path.display());
        for (index, command) in commands.iter().enumerate() {
            match command.line_number() {
                Some(line) => println!("  {:>3}. [line {line}] {command}", index + 1),
                None => println!("  {:>3}. {command}", index + 1),
            }
            let names = match command {
                Command::Process(c) | Command::Deferred(c) => placeholder_names(&c.shell_command),
                Command::Template(c) => placeholder_names(&c.template.destination),
                Command::Wait(_) | Command::Bash(_) => Vec::new(),
            };
            if !names.is_empty() {
                println!("       needs: {}", names.join(", "));
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
