/*!
 * Translation caching functionality.
 *
 * This module provides a durable cache of translations keyed by
 * `(language, normalized source text)` to avoid redundant backend calls
 * across runs. The cache file is loaded wholesale at startup and rewritten
 * wholesale at run end; a corrupt or missing file degrades to an empty
 * cache and never aborts the run.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};
use parking_lot::RwLock;

use crate::language_utils::normalize_text;

/// Durable translation cache
pub struct TranslationCache {
    /// File backing the cache, if any
    path: Option<PathBuf>,

    /// Internal cache storage, keyed "language:text"
    entries: Arc<RwLock<HashMap<String, String>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,
}

impl TranslationCache {
    /// Build the cache key for a language and source text
    fn key(language: &str, text: &str) -> String {
        format!("{}:{}", language, normalize_text(text))
    }

    /// Create an empty cache with no backing file (for testing)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
        }
    }

    /// Load the cache from a file
    ///
    /// A missing file starts an empty cache; an unreadable or corrupt file
    /// is logged and treated as empty. Load failure is never fatal.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(map) => {
                    debug!("Loaded {} cached translations from {:?}", map.len(), path);
                    map
                }
                Err(e) => {
                    warn!(
                        "Translation cache {:?} is corrupt ({}), starting with empty cache",
                        path, e
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(
                    "Failed to read translation cache {:?} ({}), starting with empty cache",
                    path, e
                );
                HashMap::new()
            }
        };

        Self {
            path: Some(path),
            entries: Arc::new(RwLock::new(entries)),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
        }
    }

    /// Get a translation from the cache
    pub fn lookup(&self, language: &str, text: &str) -> Option<String> {
        let key = Self::key(language, text);
        let entries = self.entries.read();

        match entries.get(&key) {
            Some(translation) => {
                let mut hits = self.hits.write();
                *hits += 1;
                Some(translation.clone())
            }
            None => {
                let mut misses = self.misses.write();
                *misses += 1;
                None
            }
        }
    }

    /// Store a translation in the cache
    ///
    /// Idempotent on repeated identical writes. Entries are treated as
    /// immutable once written; a differing rewrite wins but is logged.
    pub fn store(&self, language: &str, text: &str, translation: &str) {
        let key = Self::key(language, text);
        let mut entries = self.entries.write();

        if let Some(existing) = entries.get(&key) {
            if existing != translation {
                warn!("Overwriting cache entry for '{}'", key);
            }
        }

        entries.insert(key, translation.to_string());
    }

    /// Rewrite the backing file with the full cache contents
    ///
    /// Writes through a temporary file and renames it into place so a
    /// crash mid-write cannot truncate the previous cache. A cache with no
    /// backing file is a no-op.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let entries = self.entries.read();
        let content =
            serde_json::to_string_pretty(&*entries).context("Failed to serialize cache")?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write cache file: {:?}", tmp_path))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to replace cache file: {:?}", path))?;

        debug!("Saved {} cached translations to {:?}", entries.len(), path);
        Ok(())
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Clone for TranslationCache {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            entries: self.entries.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_afterStore_shouldRoundTrip() {
        let cache = TranslationCache::in_memory();

        cache.store("en", "什么是细胞", "what is a cell");
        let result = cache.lookup("en", "什么是细胞");

        assert_eq!(result, Some("what is a cell".to_string()));
    }

    #[test]
    fn test_lookup_missingEntry_shouldReturnNone() {
        let cache = TranslationCache::in_memory();
        assert_eq!(cache.lookup("en", "unseen"), None);

        let (hits, misses, _) = cache.stats();
        assert_eq!(hits, 0);
        assert_eq!(misses, 1);
    }

    #[test]
    fn test_lookup_shouldNormalizeWhitespace() {
        let cache = TranslationCache::in_memory();

        cache.store("en", "什么是  细胞", "what is a cell");
        assert_eq!(
            cache.lookup("en", " 什么是 细胞 "),
            Some("what is a cell".to_string())
        );
    }

    #[test]
    fn test_store_repeatedIdenticalWrites_shouldBeIdempotent() {
        let cache = TranslationCache::in_memory();

        cache.store("en", "text", "translation");
        cache.store("en", "text", "translation");

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_shouldBeLanguageScoped() {
        let cache = TranslationCache::in_memory();

        cache.store("en", "text", "english");
        cache.store("fr", "text", "french");

        assert_eq!(cache.lookup("en", "text"), Some("english".to_string()));
        assert_eq!(cache.lookup("fr", "text"), Some("french".to_string()));
    }

    #[test]
    fn test_load_withMissingFile_shouldStartEmpty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranslationCache::load(dir.path().join("missing.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_withCorruptFile_shouldDegradeToEmpty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "{ not valid json").unwrap();

        let cache = TranslationCache::load(&path);
        assert!(cache.is_empty());

        // The engine continues working against the degraded cache
        cache.store("en", "text", "translation");
        assert_eq!(cache.lookup("en", "text"), Some("translation".to_string()));
    }

    #[test]
    fn test_save_thenLoad_shouldPersistEntries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let cache = TranslationCache::load(&path);
        cache.store("en", "什么是细胞", "what is a cell");
        cache.store("fr", "什么是细胞", "qu'est-ce qu'une cellule");
        cache.save().unwrap();

        let reloaded = TranslationCache::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.lookup("en", "什么是细胞"),
            Some("what is a cell".to_string())
        );
    }
}
