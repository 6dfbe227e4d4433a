//! Unit tests for config module
//!
//! Tests configuration types, defaults, and TOML parsing.
//! No filesystem dependencies - all in-memory.

use std::time::Duration;

use crate::{
    ClientError,
    config::{Config, LogFormat, LogLevel},
    services::umms::{BusKind, ProtocolVersion},
};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, LogLevel::Info);
    assert_eq!(config.session.bus, BusKind::System);
    assert_eq!(config.session.protocol, ProtocolVersion::Extended);
    assert!(config.session.request_on_start);
    assert_eq!(config.session.default_uri, "file:///root/720p.m4v");
    assert_eq!(config.session.record_location, "/tmp/record.ts");
}

#[test]
fn config_serialize_toml() {
    let config = Config::default();

    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("[general]"));
    assert!(toml_str.contains("[session]"));
    assert!(toml_str.contains("protocol = \"extended\""));
}

#[test]
fn config_deserialize_toml() {
    let toml_str = r#"
        [general]
        log_level = "debug"
        log_format = "json"

        [session]
        bus = "session"
        protocol = "legacy"
        unattended_budget_secs = 12.5
        request_on_start = false
    "#;

    let config = Config::from_toml(toml_str).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.general.log_format, LogFormat::Json);
    assert_eq!(config.session.bus, BusKind::Session);
    assert_eq!(config.session.protocol, ProtocolVersion::Legacy);
    assert!(!config.session.request_on_start);
    assert_eq!(
        config.session.unattended_budget().unwrap(),
        Duration::from_millis(12_500)
    );
    assert_eq!(config.session.default_uri, "file:///root/720p.m4v");
}

#[test]
fn config_empty_toml() {
    let config = Config::from_toml("").unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn config_serialize_roundtrip() {
    let original = Config::default();

    let toml_str = toml::to_string(&original).unwrap();
    let deserialized = Config::from_toml(&toml_str).unwrap();

    assert_eq!(original, deserialized);
}

#[test]
fn config_invalid_toml() {
    let invalid_toml = r#"
        [session
        protocol = "extended"
    "#;

    let result = Config::from_toml(invalid_toml);

    assert!(matches!(result, Err(ClientError::TomlParse { .. })));
}

#[test]
fn config_unknown_protocol_is_rejected() {
    let result = Config::from_toml("[session]\nprotocol = \"v4\"\n");

    assert!(matches!(result, Err(ClientError::TomlParse { .. })));
}

#[test]
fn negative_budget_is_a_config_error() {
    let config = Config::from_toml("[session]\nunattended_budget_secs = -1.0\n").unwrap();

    assert!(matches!(
        config.session.unattended_budget(),
        Err(ClientError::Config(_))
    ));
}

#[test]
fn log_format_names() {
    assert_eq!(LogFormat::from_name("JSON"), Some(LogFormat::Json));
    assert_eq!(LogFormat::from_name("pretty"), Some(LogFormat::Pretty));
    assert_eq!(LogFormat::from_name("fancy"), None);
}
