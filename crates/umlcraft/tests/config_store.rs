//! Tests for persisting provider settings on disk

use std::fs;

use umlcraft::{load, save, ConfigStore, FileConfigStore, Provider, ProviderConfig, SETTINGS_KEY};

fn gemini_config() -> ProviderConfig {
    ProviderConfig::default()
        .set_provider(Provider::Gemini)
        .with_api_key("AIza-secret-1234")
        .with_temperature(0.2)
        .unwrap()
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConfigStore::new(dir.path().join("settings.json"));

    save(&store, &gemini_config());
    assert_eq!(load(&store), gemini_config());

    // A fresh handle on the same file sees the same record
    let reopened = FileConfigStore::new(store.path());
    assert_eq!(load(&reopened), gemini_config());
}

#[test]
fn test_record_is_stored_as_camel_case_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let store = FileConfigStore::new(&path);
    save(&store, &gemini_config());

    let file: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let record = &file[SETTINGS_KEY];
    assert_eq!(record["provider"], "gemini");
    assert_eq!(record["apiKey"], "AIza-secret-1234");
    assert_eq!(record["model"], "gemini-2.0-flash");
    assert_eq!(record["temperature"], 0.2);
    assert!(record.get("customEndpoint").is_none());
}

#[test]
fn test_corrupt_file_loads_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ this is not json").unwrap();

    let store = FileConfigStore::new(&path);
    assert!(store.get(SETTINGS_KEY).is_err());
    assert_eq!(load(&store), ProviderConfig::default());
}

#[test]
fn test_save_replaces_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "[1, 2").unwrap();

    let store = FileConfigStore::new(&path);
    save(&store, &gemini_config());
    assert_eq!(load(&store), gemini_config());
}

#[test]
fn test_record_with_unknown_model_loads_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{"aiSettings":{"provider":"custom","apiKey":"k","model":"gpt-4o","temperature":0.5}}"#,
    )
    .unwrap();

    assert_eq!(load(&FileConfigStore::new(&path)), ProviderConfig::default());
}

#[test]
fn test_other_keys_survive_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

    let store = FileConfigStore::new(&path);
    save(&store, &ProviderConfig::default().with_api_key("k"));
    assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
    assert_eq!(load(&store).api_key(), "k");
}

#[test]
fn test_custom_endpoint_persists() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileConfigStore::new(dir.path().join("deep").join("er").join("settings.json"));
    let config = ProviderConfig::default()
        .set_provider(Provider::Custom)
        .with_api_key("k")
        .with_custom_endpoint(Some("http://localhost:11434/v1".to_string()));

    save(&store, &config);
    let loaded = load(&store);
    assert_eq!(loaded.custom_endpoint(), Some("http://localhost:11434/v1"));
    assert_eq!(loaded.model(), "custom-model");
}
