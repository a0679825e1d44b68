//! Command-line and environment configuration.

use std::time::Duration;

use clap::Args;

use crate::retry::RetryPolicy;

/// Database settings.
#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Conflict retry settings.
#[derive(Debug, Clone, Args)]
pub struct RetryConfig {
    /// Attempts per operation when a concurrent write collides (including the first)
    #[arg(long, env = "RETRY_MAX_ATTEMPTS", default_value_t = 3_u32, global = true)]
    pub retry_attempts: u32,

    /// Delay before the first retry, doubled on each further attempt
    #[arg(
        long,
        env = "RETRY_INITIAL_DELAY_MS",
        default_value_t = 20_u64,
        global = true
    )]
    pub retry_initial_delay_ms: u64,
}

impl RetryConfig {
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts.max(1),
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            ..RetryPolicy::default()
        }
    }
}
