// src/placeholder.rs

//! `__NAME__` placeholder substitution.
//!
//! A live placeholder is `__NAME__` with `NAME` in `[A-Z0-9_-]+`. Appending
//! the escape marker `(sic!)` keeps the placeholder literal: the marker is
//! stripped and the token is emitted unchanged.
//!
//! Matching is lazy and non-overlapping from left to right, so
//! `__HOST____PATH__` yields two placeholders.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::bytes::{Captures, Regex};

use crate::environment::ValueMap;
use crate::errors::{Result, ShtaskError};

/// Escape marker suffix for literal placeholders.
pub const ESCAPE_MARKER: &str = "(sic!)";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"__([A-Z0-9_-]+?)__(\(sic!\))?").expect("placeholder pattern is valid")
});

/// Replace every live placeholder in `text` with its value from `values`.
///
/// Each distinct name is resolved exactly once, so a dynamic value used
/// several times in the same text runs its command once.
pub fn render(text: &str, values: &ValueMap) -> Result<String> {
    let rendered = render_bytes(text.as_bytes(), values)?;
    Ok(String::from_utf8(rendered).map_err(anyhow::Error::from)?)
}

/// Byte-level [`render`]. Bytes outside placeholders are copied unchanged,
/// whatever their encoding.
pub fn render_bytes(content: &[u8], values: &ValueMap) -> Result<Vec<u8>> {
    let mut resolved: HashMap<&[u8], String> = HashMap::new();

    for caps in PLACEHOLDER.captures_iter(content) {
        if caps.get(2).is_some() {
            continue;
        }
        let Some(name) = caps.get(1).map(|m| m.as_bytes()) else {
            continue;
        };
        if resolved.contains_key(name) {
            continue;
        }
        let name_str = String::from_utf8_lossy(name);
        let provider = values
            .get(&name_str)
            .ok_or_else(|| ShtaskError::MissingRequiredParameter(name_str.to_string()))?;
        resolved.insert(name, provider.value()?);
    }

    let rendered = PLACEHOLDER.replace_all(content, |caps: &Captures<'_>| {
        let name = &caps[1];
        if caps.get(2).is_some() {
            [&b"__"[..], name, &b"__"[..]].concat()
        } else {
            resolved
                .get(name)
                .map(|v| v.as_bytes().to_vec())
                .unwrap_or_default()
        }
    });

    Ok(match rendered {
        Cow::Borrowed(bytes) => bytes.to_vec(),
        Cow::Owned(bytes) => bytes,
    })
}

/// Names of all live placeholders in `text`, in order of first appearance.
pub fn placeholder_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(text.as_bytes()) {
        if caps.get(2).is_some() {
            continue;
        }
        let name = String::from_utf8_lossy(&caps[1]).into_owned();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
