/*!
 * Unit tests for the durable translation cache.
 */

use transq::translation::TranslationCache;

#[test]
fn test_cache_storeLookup_shouldRoundTrip() {
    let cache = TranslationCache::in_memory();

    cache.store("en", "什么是细胞", "what is a cell");

    assert_eq!(
        cache.lookup("en", "什么是细胞"),
        Some("what is a cell".to_string())
    );
    assert_eq!(cache.lookup("fr", "什么是细胞"), None);
}

#[test]
fn test_cache_saveAndReload_shouldSurviveRuns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("translation_cache.json");

    {
        let cache = TranslationCache::load(&path);
        cache.store("en", "什么是细胞", "what is a cell");
        cache.store("en", "什么是线粒体", "what is a mitochondrion");
        cache.save().expect("Failed to save cache");
    }

    // A later run pays no translation cost for cached texts
    let cache = TranslationCache::load(&path);
    assert_eq!(cache.len(), 2);
    assert_eq!(
        cache.lookup("en", "什么是细胞"),
        Some("what is a cell".to_string())
    );
}

#[test]
fn test_cache_corruptFile_shouldDegradeToEmptyAndRecover() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("translation_cache.json");
    std::fs::write(&path, "]]]] definitely not json").unwrap();

    let cache = TranslationCache::load(&path);
    assert!(cache.is_empty());

    // The degraded cache keeps working and the next save repairs the file
    cache.store("en", "text", "translation");
    cache.save().expect("Failed to save over corrupt file");

    let reloaded = TranslationCache::load(&path);
    assert_eq!(reloaded.lookup("en", "text"), Some("translation".to_string()));
}

#[test]
fn test_cache_saveWithoutWrites_shouldProduceLoadableFile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("translation_cache.json");

    let cache = TranslationCache::load(&path);
    cache.save().expect("Failed to save empty cache");

    let reloaded = TranslationCache::load(&path);
    assert!(reloaded.is_empty());
}
