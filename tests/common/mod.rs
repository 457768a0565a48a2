#![allow(dead_code)]

use shtask::command::Command;
use shtask::environment::Environment;
use shtask::errors::Result;
use shtask::exec::ProcessExecutor;
use shtask::script::{DirectoryCatalog, Parser, Script};
use shtask_test_utils::recording_logger::RecordingLogger;

pub use shtask_test_utils::builders;
pub use shtask_test_utils::{init_tracing, with_timeout};

/// Parse `script` with a catalog containing only `catalog_scripts`.
pub fn parse(script: &Script, catalog_scripts: Vec<Script>) -> Result<Vec<Command>> {
    let catalog = DirectoryCatalog::from_scripts(catalog_scripts);
    Parser::new(&catalog).parse(script)
}

/// Parse and execute `script`, returning the result and every logged event.
pub async fn run_script(script: &Script, environment: Environment) -> (Result<()>, RecordingLogger) {
    let commands = parse(script, vec![script.clone()]).expect("script should parse");
    run_commands(script, &commands, environment).await
}

pub async fn run_commands(
    script: &Script,
    commands: &[Command],
    environment: Environment,
) -> (Result<()>, RecordingLogger) {
    let mut executor = ProcessExecutor::new(environment, RecordingLogger::new());
    let result = with_timeout(executor.execute(script, commands)).await;
    (result, executor.into_logger())
}
