// SPDX-FileCopyrightText: 2026 Tokenq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the tokenq configuration system.

use std::io::Write;

use tokenq_config::diagnostic::{suggest_key, ConfigError, KeySuggestion};
use tokenq_config::model::TokenqConfig;
use tokenq_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_tokenq_config() {
    let toml = r#"
[server]
host = "127.0.0.1"
port = 9100
log_level = "debug"

[storage]
database_path = "/tmp/queue.db"
wal_mode = false
busy_timeout_ms = 2500

[queue]
default_dept = "opd"
entry_stage = "reception"
handoff_stage = "nursing"
stages = ["reception", "nursing"]

[queue.counters]
reception = ["Counter1", "Counter2"]
nursing = ["Nurse1"]

[tokens]
appointment_start = 101
walkin_start = 501
lab_start = 901
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.storage.database_path, "/tmp/queue.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.busy_timeout_ms, 2500);
    assert_eq!(config.queue.default_dept, "opd");
    assert_eq!(config.queue.stages, vec!["reception", "nursing"]);
    assert_eq!(
        config.queue.counters.get("reception").map(Vec::len),
        Some(2)
    );
    assert_eq!(config.tokens.appointment_start, 101);
    assert_eq!(config.tokens.walkin_start, 501);
    assert_eq!(config.tokens.lab_start, 901);
}

/// Unknown field in [server] section produces an UnknownField error.
#[test]
fn unknown_field_in_server_produces_error() {
    let toml = r#"
[server]
prot = 8032
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("prot"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8032);
    assert_eq!(config.server.log_level, "info");
    assert!(config.storage.wal_mode);
    assert_eq!(config.storage.busy_timeout_ms, 5000);
    assert_eq!(config.queue.default_dept, "welfare");
    assert_eq!(config.queue.entry_stage, "reception");
    assert_eq!(config.queue.handoff_stage, "nursing");
    assert_eq!(config.queue.stages, vec!["reception", "nursing", "lab"]);
    assert_eq!(
        config.queue.counters.get("reception").cloned().unwrap_or_default(),
        vec!["Counter1", "Counter2", "Counter3", "Counter4"]
    );
    assert_eq!(config.tokens.appointment_start, 1001);
    assert_eq!(config.tokens.walkin_start, 2001);
    assert_eq!(config.tokens.lab_start, 3001);
}

/// A dotted override (what TOKENQ_SERVER_PORT maps to) beats the TOML value.
#[test]
fn dotted_override_beats_toml() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let toml_content = r#"
[server]
port = 9000
"#;

    let config: TokenqConfig = Figment::new()
        .merge(Serialized::defaults(TokenqConfig::default()))
        .merge(Toml::string(toml_content))
        .merge(("server.port", 9555))
        .extract()
        .expect("should merge env override");

    assert_eq!(config.server.port, 9555);
}

/// `storage.database_path` keeps its underscore when overridden by key.
#[test]
fn override_reaches_underscored_key() {
    use figment::{providers::Serialized, Figment};

    let config: TokenqConfig = Figment::new()
        .merge(Serialized::defaults(TokenqConfig::default()))
        .merge(("storage.database_path", "/var/lib/tokenq/q.db"))
        .extract()
        .expect("should set database_path via dot notation");

    assert_eq!(config.storage.database_path, "/var/lib/tokenq/q.db");
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: TokenqConfig = Figment::new()
        .merge(Serialized::defaults(TokenqConfig::default()))
        .merge(Toml::file("/nonexistent/path/tokenq.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.server.port, 8032);
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[logging]
level = "debug"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("logging"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unknown key "prot" in [server] produces suggestion "did you mean `port`?"
#[test]
fn diagnostic_error_includes_unknown_key() {
    let toml = r#"
[server]
prot = 8032
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    assert!(!errors.is_empty(), "should have at least one error");

    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, span, .. } if {
            key == "server.prot"
                && *suggestion == Some(KeySuggestion { section: "server", key: "port" })
                && valid_keys.contains("host")
                && valid_keys.contains("log_level")
                && span.is_some()
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'prot' with suggestion 'port', got: {errors:?}"
    );
}

/// A key written under the wrong table points at the table that owns it.
#[test]
fn diagnostic_moves_key_to_owning_section() {
    let toml = r#"
[server]
port = 8032
busy_timeout_ms = 100
"#;

    let errors = load_and_validate_str(toml).expect_err("misplaced key should fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { key, suggestion, .. } if key == "server.busy_timeout_ms" => *suggestion,
        _ => None,
    });
    assert_eq!(
        suggestion,
        Some(KeySuggestion { section: "storage", key: "busy_timeout_ms" })
    );
}

/// A misspelled section header is reported as a section, not a key.
#[test]
fn diagnostic_unknown_section_suggests_header() {
    let toml = "[sever]\nport = 8032\n";

    let errors = load_and_validate_str(toml).expect_err("unknown section should fail");
    assert!(
        errors.iter().any(|e| matches!(e,
            ConfigError::UnknownSection { name, suggestion: Some("server"), span: Some(span), .. }
                if name == "sever" && span.offset() == 1
        )),
        "got: {errors:?}"
    );
}

#[test]
fn diagnostic_no_suggestion_for_distant_typo() {
    assert!(suggest_key(Some("tokens"), "qqqqqq").is_none());
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[tokens]
walkin_start = "two thousand"
"#;

    let err = load_config_from_str(toml).expect_err("should reject invalid type");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("invalid type") || err_str.contains("walkin_start"),
        "error should mention type mismatch, got: {err_str}"
    );
}

/// A wrong value type names the dotted key and points at the line.
#[test]
fn diagnostic_invalid_type_points_at_value_key() {
    let toml = "[tokens]\nwalkin_start = \"two thousand\"\n";

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    let found = errors.iter().find_map(|e| match e {
        ConfigError::InvalidType { key, span, .. } => Some((key.clone(), *span)),
        _ => None,
    });
    let (key, span) = found.expect("InvalidType error");
    assert_eq!(key, "tokens.walkin_start");
    assert_eq!(span.map(|s| s.offset()), Some("[tokens]\n".len()));
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "server.prot".to_string(),
        section: Some("server".to_string()),
        suggestion: Some(KeySuggestion { section: "server", key: "port" }),
        valid_keys: "host, port, log_level".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `port`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("prot"), "rendered report should mention the key");
}

/// load_and_validate_str runs semantic validation after deserializing.
#[test]
fn validation_rejects_unlisted_handoff_stage() {
    let toml = r#"
[queue]
handoff_stage = "pharmacy"
"#;

    let errors = load_and_validate_str(toml).expect_err("unlisted stage should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownStage { setting, stage, .. }
            if setting == "queue.handoff_stage" && stage == "pharmacy")
    }));
}

#[test]
fn load_and_validate_valid_toml() {
    let toml = r#"
[queue]
default_dept = "dental"
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.queue.default_dept, "dental");
}

/// An explicit --config file is read and validated.
#[test]
fn load_and_validate_explicit_path() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[server]\nport = 8100\n\n[tokens]\nlab_start = 7001").expect("write");

    let config = load_and_validate_path(file.path()).expect("file config should validate");
    assert_eq!(config.server.port, 8100);
    assert_eq!(config.tokens.lab_start, 7001);
}

#[test]
fn explicit_path_reports_unknown_keys() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[storage]\nwal = true").expect("write");

    let errors = load_and_validate_path(file.path()).expect_err("unknown key should fail");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "storage.wal")));
}
