// src/unit/tokens.rs

//! Parsing helpers for the textual unit fields: word lists (`depends`,
//! `after`, `salvages`, `environ`, `flags`) and `imports` statements.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{JobId, NAMESPACE_SEPARATOR};
use crate::unit::model::Import;

static WORD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,]+").expect("static regex"));

static IMPORT_STMT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^from\s+(\S+)\s+import\s+(\S+)(?:\s+as\s+(\S+))?$").expect("static regex")
});

/// Split a whitespace and/or comma separated list.
///
/// Order is preserved and repeated words are dropped (first occurrence wins),
/// so `"a, b a\nc"` yields `["a", "b", "c"]`.
pub fn split_word_list(text: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in WORD_SEPARATOR.split(text.trim()) {
        if word.is_empty() || words.iter().any(|w| w == word) {
            continue;
        }
        words.push(word.to_string());
    }
    words
}

/// Qualify a possibly-partial id with `namespace`.
///
/// Ids that already contain `::` are returned unchanged.
pub fn qualify_id(namespace: Option<&str>, id: &str) -> JobId {
    match namespace {
        Some(ns) if !id.contains(NAMESPACE_SEPARATOR) => {
            format!("{ns}{NAMESPACE_SEPARATOR}{id}")
        }
        _ => id.to_string(),
    }
}

/// Whether `s` can be used as an alias inside a requirement expression.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse an `imports` block, one statement per line.
///
/// ```text
/// from <namespace> import <partial-id>
/// from <namespace> import <partial-id> as <alias>
/// ```
pub fn parse_imports(text: &str) -> Result<Vec<Import>, String> {
    let mut imports = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let caps = IMPORT_STMT.captures(line).ok_or_else(|| {
            format!("unable to parse imports statement {line:?}: expected \"from NS import ID [as ALIAS]\"")
        })?;

        let namespace = &caps[1];
        let partial_id = &caps[2];

        if namespace.contains(NAMESPACE_SEPARATOR) {
            return Err(format!(
                "unable to parse imports statement {line:?}: expected a namespace, \
                 not a fully qualified job id"
            ));
        }
        if partial_id.contains(NAMESPACE_SEPARATOR) {
            return Err(format!(
                "unable to parse imports statement {line:?}: expected a partial job id, \
                 not a fully qualified job id"
            ));
        }

        let alias = caps
            .get(3)
            .map(|m| m.as_str())
            .unwrap_or(partial_id)
            .to_string();

        if !is_identifier(&alias) {
            return Err(format!(
                "unable to parse imports statement {line:?}: {alias:?} is not a valid \
                 identifier (use \"as ALIAS\")"
            ));
        }

        imports.push(Import {
            namespace: namespace.to_string(),
            partial_id: partial_id.to_string(),
            alias,
        });
    }

    Ok(imports)
}
