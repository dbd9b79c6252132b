//! Log level and format resolution.
//!
//! The level is resolved from, lowest to highest precedence:
//! 1. the default (`info`),
//! 2. `RUST_LOG`,
//! 3. `DW_LOG`,
//! 4. `--log-level` (or `DW_LOG_LEVEL`),
//! 5. `-v` / `-q`, which shift whatever level the steps above produced.
//!
//! A `RUST_LOG` directive is handed to the subscriber verbatim only when it is
//! the winning source, so per-target selections like `filter.step=debug`
//! still work. Any explicit level replaces it.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format '{other}' (expected human or jsonl)")),
        }
    }
}

/// Minimum level, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Off,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    /// Move `by` steps towards `trace` (negative) or `off` (positive).
    fn shift(self, by: i32) -> LogLevel {
        let idx = (self as i32 + by).clamp(0, Self::ALL.len() as i32 - 1);
        Self::ALL[idx as usize]
    }

    /// Most verbose level named anywhere in a `RUST_LOG` directive.
    fn from_directive(directive: &str) -> Option<LogLevel> {
        let lower = directive.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| lower.contains(level.as_str()))
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warning" => Ok(LogLevel::Warn),
            "quiet" | "none" => Ok(LogLevel::Off),
            other => Self::ALL
                .into_iter()
                .find(|l| l.as_str() == other)
                .ok_or_else(|| format!("unknown log level '{other}'")),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

/// Where the resolved level came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSource {
    Default,
    RustLog,
    DwLog,
    Cli,
    Verbosity,
}

/// Logging options taken from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFlags {
    pub level: Option<LogLevel>,
    pub format: Option<LogFormat>,
    pub verbose: u8,
    pub quiet: u8,
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    pub source: LevelSource,
    /// The raw `RUST_LOG` directive, if set.
    pub directive: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            source: LevelSource::Default,
            directive: None,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment and CLI flags.
    pub fn from_env(flags: LogFlags) -> Self {
        Self::resolve(|key| std::env::var(key).ok(), flags)
    }

    /// Resolve using `lookup` for environment variables.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>, flags: LogFlags) -> Self {
        let mut config = LogConfig::default();

        if let Some(directive) = lookup("RUST_LOG").filter(|d| !d.trim().is_empty()) {
            if let Some(level) = LogLevel::from_directive(&directive) {
                config.level = level;
            }
            config.source = LevelSource::RustLog;
            config.directive = Some(directive);
        }
        if let Some(level) = lookup("DW_LOG").and_then(|v| v.parse().ok()) {
            config.level = level;
            config.source = LevelSource::DwLog;
        }
        if let Some(level) = flags.level {
            config.level = level;
            config.source = LevelSource::Cli;
        }
        if flags.verbose > 0 || flags.quiet > 0 {
            config.level = config
                .level
                .shift(flags.quiet as i32 - flags.verbose as i32);
            config.source = LevelSource::Verbosity;
        }

        config.format = flags
            .format
            .or_else(|| lookup("DW_LOG_FORMAT").and_then(|v| v.parse().ok()))
            .unwrap_or_default();
        config
    }

    /// The subscriber filter for this configuration.
    pub fn env_filter(&self) -> EnvFilter {
        if self.source == LevelSource::RustLog {
            if let Some(filter) = self
                .directive
                .as_deref()
                .and_then(|d| EnvFilter::try_new(d).ok())
            {
                return filter;
            }
        }
        EnvFilter::default().add_directive(LevelFilter::from(self.level).into())
    }
}
