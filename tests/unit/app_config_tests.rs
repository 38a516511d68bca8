/*!
 * Unit tests for configuration loading and validation.
 */

use transq::app_config::{Config, TranslationProvider};

#[test]
fn test_fromFileOrDefault_withMissingFile_shouldCreateDefaultConfig() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::from_file_or_default(&path).expect("Failed to create default config");

    assert!(path.exists());
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    assert_eq!(config.translation.batch_size, 8);
}

#[test]
fn test_fromFile_shouldRoundTripSavedConfig() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.source_language = "zh".to_string();
    config.target_languages = vec!["en".to_string(), "fr".to_string(), "ru".to_string()];
    config.translation.model = "claude-3-haiku-20240307".to_string();
    config.save_to_file(&path).expect("Failed to save config");

    let loaded = Config::from_file(&path).expect("Failed to load config");
    assert_eq!(loaded.target_languages.len(), 3);
    assert_eq!(loaded.translation.model, "claude-3-haiku-20240307");
}

#[test]
fn test_fromFile_withPartialJson_shouldFillDefaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.json");

    std::fs::write(
        &path,
        r#"{
            "source_language": "zh",
            "target_languages": ["en"],
            "translation": { "provider": "ollama" }
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).expect("Failed to load partial config");
    assert_eq!(config.database_path, "transq.db");
    assert_eq!(config.translation.batch_size, 8);
    assert_eq!(config.monitor.interval_secs, 30);
    assert_eq!(config.queue.max_attempts, 3);
}

#[test]
fn test_fromFile_withInvalidJson_shouldFail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ broken").unwrap();

    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_fromFile_withInvalidSemantics_shouldFailValidation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf.json");

    // Source language listed among targets
    std::fs::write(
        &path,
        r#"{
            "source_language": "zh",
            "target_languages": ["zh", "en"],
            "translation": { "provider": "ollama" }
        }"#,
    )
    .unwrap();

    assert!(Config::from_file(&path).is_err());
}
