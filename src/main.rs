// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

use crate::app_config::{Config, TranslationProvider};
use app_controller::Controller;

mod app_config;
mod app_controller;
mod errors;
mod language_utils;
mod monitor;
mod providers;
mod queue;
mod translation;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    Anthropic,
    Dictionary,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::Dictionary => TranslationProvider::Dictionary,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process pending queue tasks for the target languages
    Process {
        /// Languages to process (defaults to all configured targets)
        #[arg(value_name = "LANGUAGE")]
        languages: Vec<String>,

        /// Verify the backend connection before processing
        #[arg(long)]
        check: bool,
    },

    /// Run the progress monitor until interrupted
    Monitor {
        /// Seconds between snapshots
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Fan a source-language query out to all target languages
    Enqueue {
        /// Subject the query belongs to
        subject_id: String,

        /// Tool that issued the query
        tool: String,

        /// Source-language query text
        query: String,

        /// Ordering hint, higher first
        #[arg(short, long, default_value_t = 0)]
        priority: i64,
    },

    /// Print queue and coverage statistics
    Stats,
}

/// transq - Translation Queue Processing Engine
///
/// Maintains a persistent, multi-language queue of translation tasks and
/// drives them to completion using an external translation backend.
#[derive(Parser, Debug)]
#[command(name = "transq")]
#[command(version = "1.0.0")]
#[command(about = "Persistent multi-language translation queue")]
#[command(long_about = "transq drives a durable queue of translation tasks to completion.

EXAMPLES:
    transq enqueue bio-001 search \"什么是细胞\"   # Fan a query out to all target languages
    transq process                              # Work every configured target language
    transq process en fr                        # Work specific languages only
    transq process --check                      # Verify the backend before processing
    transq monitor                              # Observe progress every 30 seconds
    transq stats                                # One-shot queue statistics

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    ollama     - Local Ollama server (default: llama3.2:3b)
    anthropic  - Anthropic Claude API (requires API key)
    dictionary - Local dictionary substitution (no network)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");

            let mut stderr = std::io::stderr();
            let _ = match record.level() {
                Level::Error => {
                    writeln!(stderr, "\x1B[1;31m{} ERROR {}\x1B[0m", now, record.args())
                }
                Level::Warn => {
                    writeln!(stderr, "\x1B[1;33m{} WARN  {}\x1B[0m", now, record.args())
                }
                Level::Info => writeln!(stderr, "{} INFO  {}", now, record.args()),
                Level::Debug | Level::Trace => {
                    writeln!(
                        stderr,
                        "\x1B[2m{} {} {}\x1B[0m",
                        now,
                        record.level(),
                        record.args()
                    )
                }
            };
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // The logger may not be installed yet when config loading fails
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let options = CommandLineOptions::parse();

    let mut config = Config::from_file_or_default(&options.config_path)?;

    // CLI overrides win over the config file
    if let Some(provider) = options.provider {
        config.translation.provider = provider.into();
    }
    if let Some(model) = options.model {
        config.translation.model = model;
    }
    if let Some(level) = options.log_level {
        config.log_level = level.into();
    }

    CustomLogger::init(config.log_level.to_level_filter())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    let controller = Controller::with_config(config)?;

    match options.command {
        Commands::Process { languages, check } => {
            let languages = if languages.is_empty() {
                None
            } else {
                Some(languages)
            };
            controller.run_process(languages, check).await
        }
        Commands::Monitor { interval } => controller.run_monitor(interval).await,
        Commands::Enqueue {
            subject_id,
            tool,
            query,
            priority,
        } => controller.run_enqueue(&subject_id, &tool, &query, priority).await,
        Commands::Stats => controller.run_stats().await,
    }
}
