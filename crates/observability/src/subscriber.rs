//! Tracing subscriber initialization.
//!
//! `RUST_LOG` wins over the configured filter when it is set.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, e.g. `info,pizzapos_orders=debug`.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl LogConfig {
    /// Reads `POS_LOG_FORMAT` and `POS_LOG_FILTER`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unknown formats and blank filters fall back to the defaults; there is
    /// no subscriber yet to report them to.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            format: lookup("POS_LOG_FORMAT")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(defaults.format),
            filter: lookup("POS_LOG_FILTER")
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .unwrap_or(defaults.filter),
        }
    }

    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }
}

/// Install the global subscriber. Returns `false` when one was already set.
pub fn init_with(config: &LogConfig) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(false);

    let installed = match config.format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    }
    .is_ok();

    if installed {
        tracing::debug!(format = ?config.format, filter = %config.filter, "logging initialised");
    }
    installed
}
