use anyhow::{Context, Result, anyhow};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO 639-1)
    pub source_language: String,

    /// Target language codes (ISO 639-1)
    pub target_languages: Vec<String>,

    /// Path to the SQLite queue database
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Queue processing config
    #[serde(default)]
    pub queue: QueueConfig,

    /// Progress monitor config
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Ollama (local LLM server)
    #[default]
    Ollama,
    // @provider: Anthropic
    Anthropic,
    // @provider: Local dictionary substitution
    Dictionary,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::Anthropic => "Anthropic",
            Self::Dictionary => "Dictionary",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Dictionary => "dictionary".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "anthropic" => Ok(Self::Anthropic),
            "dictionary" => Ok(Self::Dictionary),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Translation backend configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Provider to translate with
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Number of texts per translation request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-batch timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Max HTTP retry attempts per request
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds for exponential backoff
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Rate limit (requests per minute)
    #[serde(default)]
    pub rate_limit: Option<u32>,

    /// Path of the dictionary file (dictionary provider only)
    #[serde(default = "default_dictionary_path")]
    pub dictionary_path: String,

    /// Path of the durable translation cache file
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Number of prior request/response exchanges carried between batches
    #[serde(default = "default_context_window")]
    pub context_window: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            model: default_model(),
            api_key: String::new(),
            endpoint: String::new(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            rate_limit: None,
            dictionary_path: default_dictionary_path(),
            cache_path: default_cache_path(),
            context_window: default_context_window(),
        }
    }
}

impl TranslationConfig {
    /// Batch size clamped to the supported range
    ///
    /// Larger batches make response line parsing ambiguous; the usable
    /// range is 1 to 10 texts per request.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, 10)
    }

    /// Endpoint with a provider-appropriate fallback
    pub fn get_endpoint(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }
        match self.provider {
            TranslationProvider::Ollama => "http://localhost:11434".to_string(),
            TranslationProvider::Anthropic => String::new(),
            TranslationProvider::Dictionary => String::new(),
        }
    }
}

/// Queue processing configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueueConfig {
    /// Attempts after which a task is abandoned
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,

    /// Re-select completed rows whose text still carries source-script characters
    #[serde(default = "default_true")]
    pub reprocess_mixed_script: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            reprocess_mixed_script: true,
        }
    }
}

/// Progress monitor configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Seconds between snapshots
    #[serde(default = "default_monitor_interval_secs")]
    pub interval_secs: u64,

    /// Append-only snapshot log (one JSON object per line)
    #[serde(default = "default_progress_log_path")]
    pub log_path: String,

    /// Overwritten latest-snapshot record
    #[serde(default = "default_progress_latest_path")]
    pub latest_path: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_monitor_interval_secs(),
            log_path: default_progress_log_path(),
            latest_path: default_progress_latest_path(),
        }
    }
}

/// Log level setting
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to a log crate level filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_database_path() -> String {
    "transq.db".to_string()
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_batch_size() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_dictionary_path() -> String {
    "dictionary.json".to_string()
}

fn default_cache_path() -> String {
    "translation_cache.json".to_string()
}

fn default_context_window() -> usize {
    3
}

fn default_max_attempts() -> i64 {
    3
}

fn default_true() -> bool {
    true
}

fn default_monitor_interval_secs() -> u64 {
    30
}

fn default_progress_log_path() -> String {
    "progress_log.jsonl".to_string()
}

fn default_progress_latest_path() -> String {
    "progress_latest.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: "zh".to_string(),
            target_languages: vec!["en".to_string()],
            database_path: default_database_path(),
            translation: TranslationConfig::default(),
            queue: QueueConfig::default(),
            monitor: MonitorConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, creating a default one if it does not exist
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Config::default();
            config.save_to_file(&path)?;
            Ok(config)
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.source_language.is_empty() {
            return Err(anyhow!("Source language must not be empty"));
        }

        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language is required"));
        }

        if self
            .target_languages
            .iter()
            .any(|l| l == &self.source_language)
        {
            return Err(anyhow!(
                "Target languages must not include the source language: {}",
                self.source_language
            ));
        }

        if self.translation.batch_size == 0 {
            return Err(anyhow!("Batch size must be at least 1"));
        }

        if self.translation.provider == TranslationProvider::Anthropic
            && self.translation.api_key.is_empty()
        {
            return Err(anyhow!("Anthropic provider requires an API key"));
        }

        Ok(())
    }
}
