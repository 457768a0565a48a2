// tests/placeholder_render.rs

use std::error::Error;
use std::sync::Arc;

use proptest::prelude::*;
use shtask::environment::{ProcessValueProvider, ValueMap};
use shtask::errors::ShtaskError;
use shtask::placeholder::{placeholder_names, render, render_bytes};

type TestResult = Result<(), Box<dyn Error>>;

fn values(pairs: &[(&str, &str)]) -> ValueMap {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

#[test]
fn text_without_placeholders_is_unchanged() -> TestResult {
    assert_eq!(render("foo", &ValueMap::new())?, "foo");
    assert_eq!(render("", &ValueMap::new())?, "");
    Ok(())
}

#[test]
fn placeholder_is_replaced_everywhere() -> TestResult {
    let v = values(&[("HOST", "example.org")]);
    assert_eq!(
        render("ping __HOST__ && curl __HOST__/health", &v)?,
        "ping example.org && curl example.org/health"
    );
    Ok(())
}

#[test]
fn keys_match_case_insensitively() -> TestResult {
    let v = values(&[("bAr", "baz")]);
    assert_eq!(render("__BAR__", &v)?, "baz");
    Ok(())
}

#[test]
fn adjacent_placeholders_resolve_independently() -> TestResult {
    let v = values(&[("A", "1"), ("B", "2")]);
    assert_eq!(render("__A____B__", &v)?, "12");

    let v = values(&[("HOST", "h"), ("PATH", "/p")]);
    assert_eq!(render("__HOST____PATH__", &v)?, "h/p");
    Ok(())
}

#[test]
fn names_may_contain_underscores_and_dashes() -> TestResult {
    let v = values(&[("DB_HOST-1", "db1")]);
    assert_eq!(render("mysql -h __DB_HOST-1__", &v)?, "mysql -h db1");
    Ok(())
}

#[test]
fn escaped_placeholder_stays_literal() -> TestResult {
    let v = values(&[("A", "x")]);
    assert_eq!(render("__A__(sic!)", &v)?, "__A__");
    assert_eq!(render("__A__ and __A__(sic!)", &v)?, "x and __A__");
    Ok(())
}

#[test]
fn escaped_placeholder_needs_no_value() -> TestResult {
    assert_eq!(render("echo __UNSET__(sic!)", &ValueMap::new())?, "echo __UNSET__");
    Ok(())
}

#[test]
fn missing_value_names_the_token() {
    let v = values(&[("A", "1")]);
    match render("echo __A__ __MISSING__", &v) {
        Err(ShtaskError::MissingRequiredParameter(name)) => assert_eq!(name, "MISSING"),
        other => panic!("expected MissingRequiredParameter, got {:?}", other),
    }
}

#[test]
fn lowercase_tokens_are_not_placeholders() -> TestResult {
    assert_eq!(render("__lower__", &ValueMap::new())?, "__lower__");
    Ok(())
}

#[test]
fn dynamic_value_is_used_in_rendering() -> TestResult {
    let mut v = ValueMap::new();
    v.insert("GREETING", Arc::new(ProcessValueProvider::new("echo '  hello  '")));
    assert_eq!(render("say __GREETING__", &v)?, "say hello");
    Ok(())
}

#[test]
fn failing_dynamic_value_fails_rendering() {
    let mut v = ValueMap::new();
    v.insert("BROKEN", Arc::new(ProcessValueProvider::new("exit 4")));
    match render("__BROKEN__", &v) {
        Err(ShtaskError::ProcessExecution { exit_code, .. }) => assert_eq!(exit_code, 4),
        other => panic!("expected ProcessExecution, got {:?}", other),
    }
}

#[test]
fn placeholder_names_lists_live_tokens_once() {
    assert_eq!(
        placeholder_names("__A__ __B__ __A__ __C__(sic!)"),
        vec!["A".to_string(), "B".to_string()]
    );
}

#[test]
fn bytes_outside_placeholders_are_kept() -> TestResult {
    let v = values(&[("A", "x")]);
    assert_eq!(render_bytes(b"\xff__A__\x00\xe9", &v)?, b"\xffx\x00\xe9");
    Ok(())
}

proptest! {
    #[test]
    fn bytes_without_placeholders_render_verbatim(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let bytes: Vec<u8> = bytes.into_iter().map(|b| if b == b'_' { b'-' } else { b }).collect();
        prop_assert_eq!(render_bytes(&bytes, &ValueMap::new()).unwrap(), bytes);
    }

    #[test]
    fn text_without_double_underscores_renders_verbatim(text in "[a-zA-Z0-9 ./:-]{0,64}") {
        prop_assert_eq!(render(&text, &ValueMap::new()).unwrap(), text);
    }

    #[test]
    fn single_placeholder_is_substituted(
        name in "[A-Z][A-Z0-9]{0,8}",
        value in "[a-z0-9 ]{0,16}",
        prefix in "[a-z ]{0,8}",
        suffix in "[a-z ]{0,8}",
    ) {
        let v = values(&[(name.as_str(), value.as_str())]);
        let text = format!("{prefix}__{name}__{suffix}");
        prop_assert_eq!(render(&text, &v).unwrap(), format!("{prefix}{value}{suffix}"));
    }

    #[test]
    fn unresolved_placeholder_is_reported(name in "[A-Z][A-Z0-9]{0,8}") {
        let text = format!("echo __{name}__");
        match render(&text, &ValueMap::new()) {
            Err(ShtaskError::MissingRequiredParameter(missing)) => prop_assert_eq!(missing, name),
            other => prop_assert!(false, "expected MissingRequiredParameter, got {:?}", other),
        }
    }
}
