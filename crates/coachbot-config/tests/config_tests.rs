// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Coachbot configuration system.

use coachbot_config::diagnostic::ConfigError;
use coachbot_config::model::{CoachConfig, SlackMode, TopicMode, DEFAULT_TOPICS};
use coachbot_config::{load_and_validate_str, load_config_from_str};
use coachbot_core::JobScope;

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_coach_config() {
    let toml = r#"
[logging]
level = "debug"

[state]
dir = "/var/lib/coachbot"
dedupe_enabled = false

[schedule]
timezone = "Europe/Berlin"

[topics]
mode = "curated"
curriculum_file = "/etc/coachbot/curriculum.toml"
poll_size = 2

[slack]
mode = "bot"
bot_token = "xoxb-123"
signing_secret = "shh"
app_token = "xapp-1"
channel_id = "C_DEFAULT"

[server]
bind_address = "0.0.0.0"
port = 3000

[generator]
model = "claude-haiku"
max_tokens = 600
temperature = 0.2

[[jobs]]
name = "postgres"
channel = "C_VIEW"
title_prefix = "Postgres Coach"
topics = ["indexes", "vacuum"]

[[jobs]]
name = "data_engineering"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.state.dir, "/var/lib/coachbot");
    assert!(!config.state.dedupe_enabled);
    assert_eq!(config.schedule.timezone, "Europe/Berlin");
    assert_eq!(config.topics.mode, TopicMode::Curated);
    assert_eq!(config.topics.poll_size, 2);
    assert_eq!(config.slack.mode, SlackMode::Bot);
    assert_eq!(config.slack.bot_token.as_deref(), Some("xoxb-123"));
    assert_eq!(config.slack.app_token.as_deref(), Some("xapp-1"));
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.generator.model, "claude-haiku");
    assert_eq!(config.generator.max_tokens, 600);
    assert!(config.generator.api_key.is_none());
    assert_eq!(config.jobs.len(), 2);

    let postgres = config.job("postgres").expect("postgres job");
    assert_eq!(postgres.topics, vec!["indexes", "vacuum"]);
    assert_eq!(
        postgres.scope(&config.slack),
        JobScope::for_channel("postgres", "C_VIEW")
    );

    // A job without a channel inherits slack.channel_id.
    let de = config.job("data_engineering").expect("de job");
    assert_eq!(de.title_prefix, "Daily Postgres Coach");
    assert_eq!(
        de.scope(&config.slack),
        JobScope::for_channel("data_engineering", "C_DEFAULT")
    );
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.state.dir, "/state");
    assert!(config.state.fallback_dir.ends_with("coachbot-state"));
    assert!(config.state.dedupe_enabled);
    assert_eq!(config.schedule.timezone, "UTC");
    assert_eq!(config.topics.mode, TopicMode::Rotation);
    assert_eq!(config.topics.defaults.len(), DEFAULT_TOPICS.len());
    assert_eq!(config.topics.poll_size, 3);
    assert_eq!(config.topics.curriculum_file, "/app/curriculum.yml");
    assert_eq!(config.slack.mode, SlackMode::Webhook);
    assert!(config.slack.app_token.is_none());
    assert_eq!(config.generator.max_tokens, 450);
    assert!((config.generator.temperature - 0.4).abs() < f32::EPSILON);
    assert!(config.slack.webhook_url.is_none());
    assert_eq!(config.slack.api_base_url, "https://slack.com/api");
    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert!(config.jobs.is_empty());
}

/// Unknown field in [slack] section produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_field_suggests_correction() {
    let toml = r#"
[slack]
webhok_url = "https://hooks.example.com"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "webhok_url"
                && suggestion.as_deref() == Some("webhook_url")
                && valid_keys.contains("signing_secret")
        })
    });
    assert!(found, "expected UnknownKey for webhok_url, got: {errors:?}");
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telemetry]
enabled = true
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("telemetry"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// A job without a name is a missing-key error.
#[test]
fn job_without_name_is_rejected() {
    let toml = r#"
[[jobs]]
channel = "C1"
"#;

    let errors = load_and_validate_str(toml).expect_err("name is required");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::MissingKey { key } if key == "name")),
        "got: {errors:?}"
    );
}

/// Invalid enum value for topics.mode produces an error.
#[test]
fn invalid_topic_mode_is_rejected() {
    let toml = r#"
[topics]
mode = "shuffle"
"#;

    assert!(load_config_from_str(toml).is_err());
}

/// Invalid type (string where number expected) produces a clear message.
#[test]
fn invalid_type_message() {
    let toml = r#"
[server]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors.iter().any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))),
        "got: {errors:?}"
    );
}

/// Validation runs after a successful parse.
#[test]
fn validation_catches_duplicate_jobs() {
    let toml = r#"
[[jobs]]
name = "postgres"

[[jobs]]
name = "postgres"
"#;

    let errors = load_and_validate_str(toml).expect_err("duplicate job should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("duplicate job name"))
    }));
}

/// Dot-notation overrides reach nested keys, as env vars do.
#[test]
fn dotted_override_sets_nested_key() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: CoachConfig = Figment::new()
        .merge(Serialized::defaults(CoachConfig::default()))
        .merge(Toml::string("[state]\ndir = \"/from-toml\"\n"))
        .merge(("state.dir", "/from-env"))
        .merge(("slack.signing_secret", "env-secret"))
        .extract()
        .expect("should merge overrides");

    assert_eq!(config.state.dir, "/from-env");
    assert_eq!(config.slack.signing_secret.as_deref(), Some("env-secret"));
}

/// The effective configuration can be printed back as TOML and reloaded.
#[test]
fn config_renders_as_toml() {
    let original = load_config_from_str(
        r#"
[[jobs]]
name = "postgres"
channel = "C1"
"#,
    )
    .unwrap();

    let rendered = original.to_toml_string().expect("should render");
    assert!(rendered.contains("[state]"));
    assert!(rendered.contains("[[jobs]]"));

    let reloaded = load_config_from_str(&rendered).expect("rendered TOML should reload");
    assert_eq!(reloaded.jobs[0].channel.as_deref(), Some("C1"));
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "dri".to_string(),
        suggestion: Some("dir".to_string()),
        valid_keys: "dir, fallback_dir, dedupe_enabled".to_string(),
        span: None,
        src: None,
    };

    let help = error.help().expect("should have help text").to_string();
    assert!(help.contains("did you mean `dir`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("dri"));
}
