// src/logging.rs

//! `tracing` subscriber setup.
//!
//! `--log-level` wins over `STACKGUARD_LOG`, which takes `EnvFilter`
//! directives (`debug`, `stackguard=trace,warn`). Everything goes to stderr;
//! stdout is reserved for `status` and `services` output.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "STACKGUARD_LOG";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(cli_level, std::env::var(LOG_ENV_VAR).ok()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<String>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.as_directive());
    }
    // An unparsable variable falls back to info rather than failing startup.
    env.and_then(|directives| EnvFilter::try_new(directives.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn cli_level_overrides_environment() {
        let filter = build_filter(Some(LogLevel::Warn), Some("trace".to_string()));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn environment_directives_are_used_without_flag() {
        let filter = build_filter(None, Some(" debug ".to_string()));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn defaults_to_info() {
        assert_eq!(build_filter(None, None).max_level_hint(), Some(LevelFilter::INFO));
        let garbage = build_filter(None, Some("stackguard=loud".to_string()));
        assert_eq!(garbage.max_level_hint(), Some(LevelFilter::INFO));
    }
}
