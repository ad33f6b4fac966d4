// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostics for `tokenq.toml`.
//!
//! Figment extraction failures become miette reports that point at the
//! offending line. Unknown keys are matched against every section of
//! [`SCHEMA`], so a setting written under the wrong table is sent to the
//! table that owns it. Stage references that `queue.stages` does not list
//! get their own diagnostic from validation.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::fmt::{self, Write as _};

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

use crate::model::SCHEMA;

/// Source name under which inline TOML is registered.
pub const INLINE_SOURCE: &str = "<inline>";

/// Jaro-Winkler score needed to suggest a key of the same section.
const SAME_TABLE_SCORE: f64 = 0.75;

/// Stricter score for sending a key to a different section.
const OTHER_TABLE_SCORE: f64 = 0.88;

/// A setting that exists, possibly in another section than where it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySuggestion {
    pub section: &'static str,
    pub key: &'static str,
}

impl fmt::Display for KeySuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.key)
    }
}

/// A configuration problem.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key that its table does not accept.
    #[error("unknown key `{key}`")]
    #[diagnostic(
        code(tokenq::config::unknown_key),
        help("{}", unknown_key_help(section.as_deref(), suggestion.as_ref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted path as written, e.g. `server.prot`.
        key: String,
        /// Table the key was found in; `None` at the top level.
        section: Option<String>,
        suggestion: Option<KeySuggestion>,
        valid_keys: String,
        #[label("not a tokenq setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A top-level table other than `[server]`, `[storage]`, `[queue]` or `[tokens]`.
    #[error("unknown section `[{name}]`")]
    #[diagnostic(
        code(tokenq::config::unknown_section),
        help("{}", unknown_section_help(suggestion.as_deref()))
    )]
    UnknownSection {
        name: String,
        suggestion: Option<&'static str>,
        #[label("not a tokenq section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong TOML type.
    #[error("`{key}` expects {expected}, found {found}")]
    #[diagnostic(
        code(tokenq::config::invalid_type),
        help("{}", invalid_type_help(key))
    )]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A queue setting that names a stage missing from `queue.stages`.
    #[error("{setting} names stage `{stage}`, which is not in queue.stages")]
    #[diagnostic(
        code(tokenq::config::unknown_stage),
        help("{}", unknown_stage_help(stage, suggestion.as_deref(), stages))
    )]
    UnknownStage {
        setting: String,
        stage: String,
        suggestion: Option<String>,
        /// Configured stages, comma separated.
        stages: String,
    },

    /// A value that deserialized but breaks a semantic rule.
    #[error("validation error: {message}")]
    #[diagnostic(code(tokenq::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(tokenq::config::other))]
    Other(String),
}

impl ConfigError {
    /// `setting` refers to `stage`, which is not one of `stages`.
    pub fn unknown_stage(setting: impl Into<String>, stage: &str, stages: &[String]) -> Self {
        let suggestion = stages
            .iter()
            .map(|s| (s, strsim::jaro_winkler(stage, s)))
            .filter(|&(_, score)| score >= SAME_TABLE_SCORE)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, _)| s.clone());
        Self::UnknownStage {
            setting: setting.into(),
            stage: stage.to_string(),
            suggestion,
            stages: stages.join(", "),
        }
    }
}

fn unknown_key_help(
    section: Option<&str>,
    suggestion: Option<&KeySuggestion>,
    valid_keys: &str,
) -> String {
    match (suggestion, section) {
        (Some(s), Some(current)) if s.section == current => {
            format!("did you mean `{}`? [{current}] accepts: {valid_keys}", s.key)
        }
        (Some(s), _) => format!("`{}` is a [{}] setting; move it under that table", s.key, s.section),
        (None, Some(current)) => format!("[{current}] accepts: {valid_keys}"),
        (None, None) => format!("top-level entries must be sections: {valid_keys}"),
    }
}

fn unknown_section_help(suggestion: Option<&str>) -> String {
    let sections = SCHEMA
        .iter()
        .map(|(name, _)| format!("[{name}]"))
        .collect::<Vec<_>>()
        .join(", ");
    match suggestion {
        Some(name) => format!("did you mean `[{name}]`? tokenq reads {sections}"),
        None => format!("tokenq reads {sections}"),
    }
}

fn invalid_type_help(key: &str) -> String {
    let hint = match key {
        "server.port" => "a port number from 0 to 65535, e.g. `port = 8032`",
        "storage.wal_mode" => "`true` or `false`, without quotes",
        "storage.busy_timeout_ms" => "milliseconds as an integer, e.g. `busy_timeout_ms = 5000`",
        "queue.stages" => "an array of stage names, e.g. `stages = [\"reception\", \"nursing\"]`",
        k if k.starts_with("queue.counters") => {
            "one array of counter ids per stage under [queue.counters], e.g. `reception = [\"Counter1\"]`"
        }
        k if k.starts_with("tokens.") => "the first number of the day, e.g. `walkin_start = 2001`",
        _ => "a value of the type shown above",
    };
    format!("write {hint}")
}

fn unknown_stage_help(stage: &str, suggestion: Option<&str>, stages: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? queue.stages lists: {stages}"),
        None if stages.is_empty() => format!("add `{stage}` to queue.stages"),
        None => format!("add `{stage}` to queue.stages, or use one of: {stages}"),
    }
}

/// Where `unknown`, found in `section` (`None` at the top level), most
/// likely belongs.
///
/// An exact key of another section wins. Otherwise the closest key of the
/// same section is preferred over a closer match elsewhere.
pub fn suggest_key(section: Option<&str>, unknown: &str) -> Option<KeySuggestion> {
    let others = || SCHEMA.iter().filter(move |(name, _)| Some(*name) != section);

    let moved = others().find_map(|&(name, keys)| {
        keys.iter()
            .find(|&&k| k == unknown)
            .map(|&key| KeySuggestion { section: name, key })
    });
    if moved.is_some() {
        return moved;
    }

    let same_table = SCHEMA
        .iter()
        .find(|(name, _)| Some(*name) == section)
        .and_then(|&(name, keys)| {
            closest(unknown, keys, SAME_TABLE_SCORE).map(|(key, _)| KeySuggestion { section: name, key })
        });
    if same_table.is_some() {
        return same_table;
    }

    others()
        .filter_map(|&(name, keys)| {
            closest(unknown, keys, OTHER_TABLE_SCORE).map(|(key, score)| (KeySuggestion { section: name, key }, score))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(suggestion, _)| suggestion)
}

/// Closest known section name to `unknown`.
pub fn suggest_section(unknown: &str) -> Option<&'static str> {
    let names: Vec<&'static str> = SCHEMA.iter().map(|&(name, _)| name).collect();
    closest(unknown, &names, SAME_TABLE_SCORE).map(|(name, _)| name)
}

fn closest(
    unknown: &str,
    candidates: &[&'static str],
    threshold: f64,
) -> Option<(&'static str, f64)> {
    candidates
        .iter()
        .map(|&c| (c, strsim::jaro_winkler(unknown, c)))
        .filter(|&(_, score)| score >= threshold)
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Convert every error inside a `figment::Error` into a [`ConfigError`].
///
/// `sources` holds `(name, content)` pairs of the TOML files that were
/// merged; they are used to attach source spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter().map(|error| convert(&error, sources)).collect()
}

fn convert(error: &figment::Error, sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    let source = source_of(error, sources);
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            // The path names the enclosing table; drop the field if figment appended it.
            let table = match error.path.split_last() {
                Some((last, rest)) if last == field => rest,
                _ => error.path.as_slice(),
            };
            let valid_keys = expected.join(", ");
            match table.first() {
                Some(section) => {
                    let (span, src) = locate(source, find_key_offset, table, field);
                    ConfigError::UnknownKey {
                        key: format!("{}.{field}", table.join(".")),
                        section: Some(section.clone()),
                        suggestion: suggest_key(Some(section.as_str()), field),
                        valid_keys,
                        span,
                        src,
                    }
                }
                None => match suggest_key(None, field) {
                    Some(suggestion) => {
                        let (span, src) = locate(source, find_key_offset, &[], field);
                        ConfigError::UnknownKey {
                            key: field.clone(),
                            section: None,
                            suggestion: Some(suggestion),
                            valid_keys,
                            span,
                            src,
                        }
                    }
                    None => {
                        let (span, src) =
                            locate(source, |content, _, name| find_table_offset(content, name), &[], field);
                        ConfigError::UnknownSection {
                            name: field.clone(),
                            suggestion: suggest_section(field),
                            span,
                            src,
                        }
                    }
                },
            }
        }
        Kind::InvalidType(actual, expected) => {
            let (span, src) = match error.path.split_last() {
                Some((field, table)) => locate(source, find_key_offset, table, field),
                None => (None, None),
            };
            ConfigError::InvalidType {
                key: error.path.join("."),
                found: actual.to_string(),
                expected: expected.clone(),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// The TOML source an error came from, if it was one of `sources`.
fn source_of<'a>(error: &figment::Error, sources: &'a [(String, String)]) -> Option<&'a (String, String)> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });
    match file {
        Some(path) => sources.iter().find(|(name, _)| *name == path),
        None => sources.iter().find(|(name, _)| name == INLINE_SOURCE),
    }
}

fn locate(
    source: Option<&(String, String)>,
    find: impl Fn(&str, &[String], &str) -> Option<usize>,
    table: &[String],
    name: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some((path, content)) = source else {
        return (None, None);
    };
    match find(content.as_str(), table, name) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), name.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Dotted name of the table a `[header]` line opens, if the line is one.
fn table_header(line: &str) -> Option<String> {
    let body = line.split('#').next()?.trim();
    if body.starts_with("[[") {
        return None;
    }
    let inner = body.strip_prefix('[')?.strip_suffix(']')?;
    Some(
        inner
            .split('.')
            .map(|part| part.trim().trim_matches('"'))
            .collect::<Vec<_>>()
            .join("."),
    )
}

/// Byte offset of `key = ...` inside the table at `table` (the top level when empty).
pub fn find_key_offset(content: &str, table: &[String], key: &str) -> Option<usize> {
    let wanted = table.join(".");
    let mut current = String::new();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(header) = table_header(trimmed) {
            current = header;
        } else if current == wanted
            && trimmed
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='))
        {
            return Some(offset + line.len() - trimmed.len());
        }
        offset += line.len();
    }
    None
}

/// Byte offset of the name in the first `[name]` or `[name.*]` header.
pub fn find_table_offset(content: &str, name: &str) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let opens = table_header(trimmed)
            .is_some_and(|header| header.split('.').next() == Some(name));
        if opens {
            let in_line = trimmed.find(name).unwrap_or(0);
            return Some(offset + line.len() - trimmed.len() + in_line);
        }
        offset += line.len();
    }
    None
}

/// Render `errors` as one report headed by a problem count.
pub fn render_report(handler: &GraphicalReportHandler, errors: &[ConfigError]) -> String {
    let mut out = String::new();
    let noun = if errors.len() == 1 { "problem" } else { "problems" };
    let _ = writeln!(out, "tokenq: {} configuration {noun}\n", errors.len());
    for error in errors {
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut out, diagnostic).is_err() {
            let _ = writeln!(out, "Error: {error}");
        }
    }
    out
}

/// Print `errors` to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    eprint!("{}", render_report(&GraphicalReportHandler::new(), errors));
}
