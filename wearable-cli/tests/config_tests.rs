#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
use wearable_cli::config::{CONFIG_KEYS, ConfigManager, WearableConfig, format_sections};
use wearable_core::ReadingMode;

#[test]
fn defaults_match_push_sender_deployment() {
    let config = WearableConfig::default();
    assert_eq!(config.server.listen_addr, "0.0.0.0:50051");
    assert_eq!(config.notifier.endpoint_uri(), "http://push-sender:51126");
    assert_eq!(config.notifier.target_id, "some_uuid");
    assert_eq!(config.notifier.message, "Something is going wrong!");
    assert_eq!(config.notifier.request_timeout(), None);
    assert_eq!(config.telemetry.reading_mode, ReadingMode::Independent);
    assert_eq!(config.telemetry.alert_cooldown(), None);
    assert_eq!(config.telemetry.seed, None);
}

#[test]
fn bare_host_port_gets_http_scheme() {
    let mut config = WearableConfig::default();
    config.notifier.endpoint = "push-sender:51126".to_string();
    assert_eq!(config.notifier.endpoint_uri(), "http://push-sender:51126");
}

#[test]
fn missing_file_loads_defaults() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let manager = ConfigManager::load_with_path(temp_dir.path().join("absent.toml"))
        .expect("load default config");
    assert_eq!(manager.get("notifier.target_id").as_deref(), Some("some_uuid"));
}

#[test]
fn partial_user_file_merges_over_defaults() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[notifier]\ntarget_id = \"patient-9\"\nrequest_timeout_ms = 1500\n\n[telemetry]\nreading_mode = \"shared\"\n",
    )
    .expect("write config");

    let manager = ConfigManager::load_with_path(&path).expect("load config");
    let config = manager.config();
    assert_eq!(config.notifier.target_id, "patient-9");
    assert_eq!(config.notifier.endpoint, "http://push-sender:51126");
    assert_eq!(
        config.notifier.request_timeout(),
        Some(std::time::Duration::from_millis(1500))
    );
    assert_eq!(config.telemetry.reading_mode, ReadingMode::Shared);
}

#[test]
fn invalid_file_is_reported() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[telemetry]\nreading_mode = \"sometimes\"\n").expect("write config");

    let err = ConfigManager::load_with_path(&path).err().expect("invalid mode rejected");
    assert!(err.to_string().contains("invalid config"));
}

#[test]
fn settings_persist_across_reload() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let config_path = temp_dir.path().join("wearable").join("config.toml");

    let mut manager = ConfigManager::load_with_path(&config_path).expect("load default config");
    manager
        .set("notifier.endpoint", "127.0.0.1:6000")
        .expect("set endpoint");
    manager
        .set("telemetry.alert_cooldown_ms", "2000")
        .expect("set cooldown");
    manager.set("telemetry.seed", "42").expect("set seed");
    manager.save().expect("save config");

    let mut reloaded = ConfigManager::load_with_path(&config_path).expect("reload config");
    assert_eq!(reloaded.get("notifier.endpoint").as_deref(), Some("127.0.0.1:6000"));
    assert_eq!(reloaded.get("telemetry.alert_cooldown_ms").as_deref(), Some("2000"));
    assert_eq!(reloaded.config().telemetry.seed, Some(42));

    reloaded.set("telemetry.seed", "none").expect("clear seed");
    assert_eq!(reloaded.get("telemetry.seed").as_deref(), Some("none"));
}

#[test]
fn rejects_bad_values_and_keys() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let mut manager =
        ConfigManager::load_with_path(temp_dir.path().join("config.toml")).expect("load");

    assert!(manager.set("telemetry.reading_mode", "sometimes").is_err());
    assert!(manager.set("notifier.request_timeout_ms", "-5").is_err());
    assert!(manager.set("notifier.target_id", "  ").is_err());
    assert!(manager.set("telemetry.batch_size", "10").is_err());
    assert!(manager.get("telemetry.batch_size").is_none());
}

#[test]
fn listing_covers_every_key() {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let manager =
        ConfigManager::load_with_path(temp_dir.path().join("config.toml")).expect("load");
    let lines = format_sections(&manager);

    assert_eq!(lines[0], "[server]");
    assert!(lines.contains(&"[notifier]".to_string()));
    assert!(lines.contains(&"reading_mode=independent".to_string()));
    for key in CONFIG_KEYS {
        let field = key.split_once('.').unwrap().1;
        assert!(lines.iter().any(|line| line.starts_with(&format!("{field}="))));
    }
}
