//! Logging Configuration and Initialization
//!
//! Centralized tracing setup for the sqlload binaries. Console output is
//! always written to stderr: in query mode stdout carries result rows and
//! must stay machine-readable.
//!
//! - Text or JSON log format
//! - Configurable level plus extra filter directives
//! - Optional non-blocking log file next to the console output
//! - Environment-based overrides
//!
//! # Example
//!
//! ```no_run
//! use sqlload_common::logging::{init_logging, LogConfig, LogLevel};
//! use tracing::info;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::builder().level(LogLevel::Debug).build();
//!     let _guard = init_logging(&config)?;
//!
//!     info!("Application started");
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter applied unless `LOG_FILTER` says otherwise.
///
/// sqlx logs every statement at info level, which would drown the load
/// progress in script mode.
pub const DEFAULT_FILTER_DIRECTIVES: &str = "sqlx=warn";

/// Minimum severity of events that reach the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const ALL: [LogLevel; 5] = [Self::Trace, Self::Debug, Self::Info, Self::Warn, Self::Error];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Accepts whatever `tracing` accepts for a level name, case-insensitively.
impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let level: Level = s
            .trim()
            .parse()
            .map_err(|_| anyhow!("LOG_LEVEL must be one of trace, debug, info, warn, error; got '{}'", s))?;
        Self::ALL
            .into_iter()
            .find(|candidate| Level::from(*candidate) == level)
            .ok_or_else(|| anyhow!("unsupported log level '{}'", s))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Shape of each emitted event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("text") {
            Ok(Self::Text)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(anyhow!("LOG_FORMAT must be text or json; got '{}'", s))
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: LogLevel,

    /// Log format (text or JSON)
    pub format: LogFormat,

    /// Additional filter directives (e.g., "sqlx=debug,sqlload_ingest=trace")
    pub filter_directives: Option<String>,

    /// Also write events to this file (no ANSI colors)
    pub log_file: Option<PathBuf>,

    /// Whether to include target module names in logs
    pub include_targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
            filter_directives: Some(DEFAULT_FILTER_DIRECTIVES.to_string()),
            log_file: None,
            include_targets: false,
        }
    }
}

impl LogConfig {
    /// Create a builder for fluent configuration
    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }

    /// Apply environment overrides on top of `self`.
    ///
    /// Environment variables:
    /// - `LOG_LEVEL`: trace, debug, info, warn, error
    /// - `LOG_FORMAT`: text, json
    /// - `LOG_FILTER`: additional filter directives
    /// - `LOG_FILE`: path of a log file to write in addition to stderr
    /// - `LOG_INCLUDE_TARGETS`: include module targets (true/false)
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.level = level.parse()?;
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.format = format.parse()?;
        }

        if let Ok(filter) = std::env::var("LOG_FILTER") {
            self.filter_directives = Some(filter);
        }

        if let Ok(path) = std::env::var("LOG_FILE") {
            self.log_file = Some(PathBuf::from(path));
        }

        if let Ok(val) = std::env::var("LOG_INCLUDE_TARGETS") {
            self.include_targets = val.parse().unwrap_or(false);
        }

        Ok(self)
    }
}

/// Builder for LogConfig
#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn filter_directives(mut self, filter: impl Into<String>) -> Self {
        self.config.filter_directives = Some(filter.into());
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_file = Some(path.into());
        self
    }

    pub fn include_targets(mut self, include: bool) -> Self {
        self.config.include_targets = include;
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}

/// Keeps the background log file writer alive; drop it last.
#[must_use = "dropping the guard stops the log file writer"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global tracing subscriber.
///
/// Must be called once, at startup.
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard> {
    let filter = build_filter(config)?;

    let (file_writer, file_guard) = match config.log_file.as_deref() {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            (Some(writer), Some(guard))
        },
        None => (None, None),
    };

    match config.format {
        LogFormat::Text => {
            let console = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.include_targets);
            let file = file_writer.map(|writer| {
                fmt::layer()
                    .with_writer(writer)
                    .with_target(config.include_targets)
                    .with_ansi(false)
            });

            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file)
                .try_init()?;
        },
        LogFormat::Json => {
            let console = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(config.include_targets);
            let file = file_writer.map(|writer| {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(config.include_targets)
                    .with_ansi(false)
            });

            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(file)
                .try_init()?;
        },
    }

    Ok(LoggingGuard { _file: file_guard })
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter> {
    let mut filter =
        EnvFilter::from_default_env().add_directive(Level::from(config.level).into());

    if let Some(ref directives) = config.filter_directives {
        for directive in directives.split(',').filter(|d| !d.trim().is_empty()) {
            filter = filter.add_directive(
                directive
                    .trim()
                    .parse()
                    .with_context(|| format!("Failed to parse filter directive '{}'", directive))?,
            );
        }
    }

    Ok(filter)
}

fn file_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Log file path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    std::fs::create_dir_all(&dir).context("Failed to create log directory")?;
    Ok(tracing_appender::rolling::never(dir, file_name))
}
