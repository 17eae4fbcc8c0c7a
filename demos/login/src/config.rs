//! Command line configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use form_dispatch::{ConcurrencyPolicy, IntentLogConfig, IntentLogger, IntentLoggerConfig};

/// Login form driven from the command line
#[derive(Parser, Debug, Clone)]
#[command(name = "login")]
#[command(about = "Login form demonstrating form-dispatch effects and validation")]
pub struct Args {
    /// Login endpoint receiving the credentials as JSON
    #[arg(long, short, default_value = "http://localhost:8080/api/login")]
    pub endpoint: String,

    /// Email to fill in
    #[arg(long)]
    pub email: Option<String>,

    /// Password to fill in
    #[arg(long)]
    pub password: Option<String>,

    /// Replay intents from a JSON-lines file ("-" for stdin) instead of --email/--password
    #[arg(long, value_name = "FILE")]
    pub intents: Option<PathBuf>,

    /// Give up on a submission after this many seconds
    #[arg(long, default_value = "10")]
    pub timeout_secs: u64,

    /// Log every intent through the intent logger
    #[arg(long)]
    pub log_intents: bool,

    /// Comma-separated glob patterns of intent kinds to log
    #[arg(long, value_name = "PATTERNS")]
    pub log_include: Option<String>,

    /// Comma-separated glob patterns of intent kinds not to log
    #[arg(long, value_name = "PATTERNS")]
    pub log_exclude: Option<String>,

    /// Concurrency policy for submissions: parallel, latest-wins or serial-queue
    #[arg(long, default_value = "latest-wins")]
    pub policy: ConcurrencyPolicy,

    /// Route to navigate to after a successful login
    #[arg(long, default_value = "/")]
    pub success_route: String,
}

impl Args {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            policy: self.policy,
            timeout: Duration::from_secs(self.timeout_secs),
            log_intents: self.log_intents,
            log_filter: IntentLoggerConfig::new(self.log_include.as_deref(), self.log_exclude.as_deref()),
        }
    }

    /// How long to wait for an outcome; one second past the request timeout
    /// so the transport reports first
    pub fn outcome_limit(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.saturating_add(1))
    }
}

/// Everything `build_store` needs, fixed at startup
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub policy: ConcurrencyPolicy,
    pub timeout: Duration,
    pub log_intents: bool,
    pub log_filter: IntentLoggerConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            policy: ConcurrencyPolicy::LatestWins,
            timeout: Duration::from_secs(10),
            log_intents: false,
            log_filter: IntentLoggerConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn intent_logger(&self) -> IntentLogger {
        IntentLogger::with_log(IntentLogConfig::new(100, self.log_filter.clone())).active(self.log_intents)
    }
}
