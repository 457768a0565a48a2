// tests/script_parser.rs

mod common;
use crate::common::builders::ScriptBuilder;
use crate::common::parse;

use std::error::Error;
use std::fs;

use shtask::command::{Command, ProcessCommand};
use shtask::errors::ShtaskError;
use shtask::script::bash::BASH_MARKER;
use shtask::script::parser::logical_lines;
use tempfile::tempdir;

type TestResult = Result<(), Box<dyn Error>>;

fn process(command: &Command) -> &ProcessCommand {
    match command {
        Command::Process(p) | Command::Deferred(p) => p,
        other => panic!("expected a process command, got {:?}", other),
    }
}

#[test]
fn comments_and_blank_lines_are_skipped() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("build")
        .lines(&["#!/usr/bin/env bash", "# description: Build it", "", "echo one", "   ", "  # indented comment", "echo two"])
        .write(dir.path())?;

    let commands = parse(&script, vec![])?;

    assert_eq!(commands.len(), 2);
    assert_eq!(process(&commands[0]).shell_command, "echo one");
    assert_eq!(process(&commands[0]).line_number, 4);
    assert_eq!(process(&commands[1]).shell_command, "echo two");
    assert_eq!(process(&commands[1]).line_number, 7);
    assert_eq!(script.description.as_deref(), Some("Build it"));
    Ok(())
}

#[test]
fn continuation_lines_join_the_previous_command() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("build")
        .lines(&["docker run", "   --rm", "   -it image", "echo done"])
        .write(dir.path())?;

    let commands = parse(&script, vec![])?;

    assert_eq!(commands.len(), 2);
    assert_eq!(process(&commands[0]).shell_command, "docker run --rm -it image");
    assert_eq!(process(&commands[0]).line_number, 1);
    assert_eq!(process(&commands[1]).line_number, 4);
    Ok(())
}

#[test]
fn continuation_applies_before_modifiers_are_read() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("build")
        .lines(&["D: sleep 1", "   && echo later"])
        .write(dir.path())?;

    let commands = parse(&script, vec![])?;

    assert!(matches!(&commands[0], Command::Deferred(p) if p.shell_command == "sleep 1 && echo later"));
    Ok(())
}

#[test]
fn logical_lines_keep_first_line_number() {
    let lines = logical_lines("a\n   b\n\nc\n   d\n   e");
    let texts: Vec<_> = lines.iter().map(|l| (l.number, l.text.as_str())).collect();
    assert_eq!(texts, vec![(1, "a b"), (4, "c d e")]);
}

#[test]
fn modifiers_combine_in_any_order() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("mods")
        .lines(&["I: echo ignored", "TTY: vim", "D: sleep 1", "D: I: false", "I: TTY: D: echo all", "echo plain"])
        .write(dir.path())?;

    let commands = parse(&script, vec![])?;
    assert_eq!(commands.len(), 6);

    let p = process(&commands[0]);
    assert!(p.ignore_error && !p.tty);
    assert_eq!(p.shell_command, "echo ignored");

    let p = process(&commands[1]);
    assert!(p.tty && !p.ignore_error);
    assert_eq!(p.shell_command, "vim");

    assert!(matches!(&commands[2], Command::Deferred(p) if !p.ignore_error));
    assert!(matches!(&commands[3], Command::Deferred(p) if p.ignore_error && p.shell_command == "false"));
    assert!(matches!(&commands[4], Command::Deferred(p) if p.ignore_error && p.tty && p.shell_command == "echo all"));

    let p = process(&commands[5]);
    assert!(!p.ignore_error && !p.tty);
    assert_eq!(p.working_directory, script.working_directory);
    Ok(())
}

#[test]
fn wait_and_template_lines() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("tpl")
        .lines(&["TEMPLATE: templates/app.tpl:out/app-__ENV__.conf", "WAIT:"])
        .write(dir.path())?;

    let commands = parse(&script, vec![])?;

    match &commands[0] {
        Command::Template(t) => {
            assert_eq!(t.template.source, dir.path().join("templates/app.tpl"));
            assert_eq!(t.template.destination, "out/app-__ENV__.conf");
            assert_eq!(t.template.working_directory, script.working_directory);
            assert_eq!(t.line_number, 1);
        }
        other => panic!("expected template, got {:?}", other),
    }
    assert!(matches!(&commands[1], Command::Wait(w) if w.line_number == 2));
    Ok(())
}

#[test]
fn template_without_destination_is_malformed() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("tpl")
        .lines(&["echo ok", "TEMPLATE: only-source"])
        .write(dir.path())?;

    match parse(&script, vec![]) {
        Err(ShtaskError::MalformedTemplate { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected MalformedTemplate, got {:?}", other),
    }
    Ok(())
}

#[test]
fn include_splices_commands_in_place() -> TestResult {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("parts"))?;
    fs::write(dir.path().join("parts/common.sh"), "echo included-1\n\necho included-2\n")?;

    let script = ScriptBuilder::new("main")
        .lines(&["echo before", "INCLUDE: parts/common.sh", "echo after"])
        .write(dir.path())?;

    let commands = parse(&script, vec![])?;
    let texts: Vec<_> = commands.iter().map(|c| process(c).shell_command.as_str()).collect();

    assert_eq!(texts, vec!["echo before", "echo included-1", "echo included-2", "echo after"]);
    // Line numbers refer to the included file.
    assert_eq!(process(&commands[2]).line_number, 3);
    assert_eq!(process(&commands[1]).working_directory, script.working_directory);
    Ok(())
}

#[test]
fn include_accepts_absolute_paths() -> TestResult {
    let dir = tempdir()?;
    let other = tempdir()?;
    let include = other.path().join("inc.sh");
    fs::write(&include, "echo absolute\n")?;

    let script = ScriptBuilder::new("main")
        .line(&format!("INCLUDE: {}", include.display()))
        .write(dir.path())?;

    let commands = parse(&script, vec![])?;
    assert_eq!(process(&commands[0]).shell_command, "echo absolute");
    Ok(())
}

#[test]
fn missing_include_names_reference_and_script() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("main")
        .line("INCLUDE: nope.sh")
        .write(dir.path())?;

    match parse(&script, vec![]) {
        Err(err @ ShtaskError::IncludeNotFound { .. }) => {
            let message = err.to_string();
            assert!(message.contains("nope.sh"));
            assert!(message.contains("main.sh"));
        }
        other => panic!("expected IncludeNotFound, got {:?}", other),
    }
    Ok(())
}

#[test]
fn include_cycle_is_detected() -> TestResult {
    let dir = tempdir()?;
    fs::write(dir.path().join("a.inc"), "echo a\nINCLUDE: b.inc\n")?;
    fs::write(dir.path().join("b.inc"), "echo b\nINCLUDE: a.inc\n")?;
    let script = ScriptBuilder::new("main")
        .line("INCLUDE: a.inc")
        .write(dir.path())?;

    assert!(matches!(
        parse(&script, vec![]),
        Err(ShtaskError::IncludeCycle(_))
    ));
    Ok(())
}

#[test]
fn action_splices_another_catalog_script() -> TestResult {
    let dir = tempdir()?;
    let sub_dir = tempdir()?;
    let sub = ScriptBuilder::new("cache-clear")
        .namespace("app")
        .lines(&["echo clearing", "D: echo deferred"])
        .write(sub_dir.path())?;
    let main = ScriptBuilder::new("deploy")
        .lines(&["echo start", "ACTION: app:cache-clear", "echo end"])
        .write(dir.path())?;

    let commands = parse(&main, vec![main.clone(), sub.clone()])?;

    assert_eq!(commands.len(), 4);
    assert_eq!(process(&commands[1]).shell_command, "echo clearing");
    assert_eq!(process(&commands[1]).working_directory, sub.working_directory);
    assert!(commands[2].is_deferred());
    assert_eq!(process(&commands[3]).shell_command, "echo end");
    Ok(())
}

#[test]
fn unknown_action_is_a_parse_error() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("main")
        .line("ACTION: missing")
        .write(dir.path())?;

    match parse(&script, vec![script.clone()]) {
        Err(ShtaskError::ActionNotFound { action, script: path }) => {
            assert_eq!(action, "missing");
            assert_eq!(path, script.path);
        }
        other => panic!("expected ActionNotFound, got {:?}", other),
    }
    Ok(())
}

#[test]
fn recursive_action_is_a_cycle() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("loop")
        .line("ACTION: loop")
        .write(dir.path())?;

    assert!(matches!(
        parse(&script, vec![script.clone()]),
        Err(ShtaskError::IncludeCycle(_))
    ));
    Ok(())
}

#[test]
fn bash_marked_script_yields_single_bash_command() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("native")
        .lines(&["#!/usr/bin/env bash", &format!("# {BASH_MARKER}"), "set -euo pipefail", "echo hi", "D: not-a-modifier-here"])
        .executable()
        .write(dir.path())?;

    let commands = parse(&script, vec![])?;

    assert_eq!(commands.len(), 1);
    match &commands[0] {
        Command::Bash(bash) => {
            assert_eq!(bash.script, script);
            assert!(bash.warning.is_none());
        }
        other => panic!("expected bash command, got {:?}", other),
    }
    Ok(())
}

#[test]
fn bash_script_without_strict_mode_gets_a_warning() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("native")
        .lines(&["#!/usr/bin/env bash", &format!("# {BASH_MARKER}"), "echo hi"])
        .executable()
        .write(dir.path())?;

    let commands = parse(&script, vec![])?;
    assert!(matches!(&commands[0], Command::Bash(b) if b.warning.as_deref().is_some_and(|w| w.contains("set -euo pipefail"))));
    Ok(())
}

#[cfg(unix)]
#[test]
fn bash_script_must_be_executable() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("native")
        .lines(&[&format!("# {BASH_MARKER}"), "echo hi"])
        .write(dir.path())?;

    assert!(matches!(
        parse(&script, vec![]),
        Err(ShtaskError::UnsupportedScript { .. })
    ));
    Ok(())
}

#[test]
fn strict_mode_must_be_the_first_statement() -> TestResult {
    let dir = tempdir()?;
    let script = ScriptBuilder::new("late")
        .lines(&[
            "#!/usr/bin/env bash",
            &format!("# {BASH_MARKER}"),
            "",
            "echo too early",
            "set -euo pipefail",
        ])
        .executable()
        .write(dir.path())?;

    let commands = parse(&script, vec![])?;
    assert!(matches!(&commands[0], Command::Bash(b) if b.warning.is_some()));
    Ok(())
}

#[cfg(unix)]
#[test]
fn bash_script_directory_must_be_writable() -> TestResult {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir()?;
    let locked = dir.path().join("locked");
    fs::create_dir(&locked)?;
    let script = ScriptBuilder::new("native")
        .lines(&[&format!("# {BASH_MARKER}"), "set -euo pipefail", "echo hi"])
        .executable()
        .write(&locked)?;
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555))?;

    // Privileged users can write regardless of the mode bits.
    let writable = fs::write(locked.join("check"), "").is_ok();
    let result = parse(&script, vec![]);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

    if writable {
        assert!(result.is_ok());
    } else {
        match result {
            Err(ShtaskError::UnsupportedScript { reason, .. }) => {
                assert!(reason.contains("writable"))
            }
            other => panic!("expected UnsupportedScript, got {:?}", other),
        }
    }
    Ok(())
}
