//! End-to-end tests for prototype-adapters: configuration files driving
//! the engine.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use prototype_adapters::{ConfigLoader, builder_from_config, decode, to_json};
use prototype_core::prelude::*;

fn event_type() -> Type {
    TypeBuilder::structure("Event")
        .tagged_field("Title", &Type::string(), r#"json:"title""#)
        .tagged_field("At", &Type::time(), r#"json:"at""#)
        .build()
        .unwrap()
}

#[test]
fn options_file_drives_decoding() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prototype.toml");
    fs::write(&path, "tag_key = \"json\"\ntime_format = \"unix-millis\"\n").unwrap();

    let config = ConfigLoader::new().without_env().load_file(&path).unwrap();
    let opts = builder_from_config(&config).unwrap().build();

    let event = decode(
        &event_type(),
        &json!({"title": "launch", "at": 1_700_000_000_123i64}),
        &opts,
    )
    .unwrap();
    assert_eq!(event.field_by_name("Title"), Some(&Value::string("launch")));
    let at = event.field_by_name("At").and_then(Value::as_time).copied().unwrap();
    assert_eq!(at.timestamp_millis(), 1_700_000_000_123);

    assert_eq!(
        to_json(&event).unwrap(),
        json!({"Title": "launch", "At": "2023-11-14T22:13:20.123Z"})
    );
}

#[test]
fn layout_codec_parses_text_times() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prototype.toml");
    fs::write(&path, "tag_key = \"json\"\ntime_format = \"%Y-%m-%d\"\n").unwrap();
    let opts = prototype_adapters::load_options(&path).unwrap();

    let event = decode(&event_type(), &json!({"at": "2024-01-02"}), &opts).unwrap();
    let at = event.field_by_name("At").and_then(Value::as_time).copied().unwrap();
    assert_eq!(at.timestamp(), 1_704_153_600);

    let text = clone_as_with(&Type::string(), &Value::time(at), &opts).unwrap();
    assert_eq!(text, Value::string("2024-01-02"));
}

#[test]
fn invalid_layout_in_config_fails_to_build() {
    let config = ConfigLoader::new()
        .without_env()
        .load_str("time_format = \"%Y-%\"")
        .unwrap();
    assert!(builder_from_config(&config).is_err());
}
