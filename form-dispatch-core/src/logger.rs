//! Intent logging with pattern-based filtering and in-memory storage
//!
//! [`IntentLogger`] is a middleware stage that writes every dispatched intent
//! to `tracing` and, optionally, to a shared ring buffer ([`IntentLog`]) the
//! application can read back, e.g. to show recent activity.
//!
//! # Example
//!
//! ```ignore
//! use form_dispatch::logger::{IntentLogConfig, IntentLogger, IntentLoggerConfig};
//!
//! // Everything except keystrokes, tracing only
//! let logger = IntentLogger::new(IntentLoggerConfig::new(None, Some("FieldChange")));
//!
//! // With in-memory storage
//! let logger = IntentLogger::with_log(IntentLogConfig::default()).active(args.log_intents);
//! let log = logger.log().expect("storage enabled");
//!
//! // ... after building the store with `logger` ...
//! for entry in log.lock().recent(10) {
//!     println!("{}: {}", entry.elapsed_display(), entry.summary);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::error::DispatchError;
use crate::intent::IntentSummary;
use crate::middleware::{Middleware, Next};

/// Include/exclude filter over intent kinds.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// # Examples
///
/// - `Submit*` matches SubmitDidSucceed and SubmitDidFail
/// - `Form*` matches FormSubmit and FormReset
/// - `*Did*` matches every outcome intent
#[derive(Debug, Clone, Default)]
pub struct IntentLoggerConfig {
    /// If non-empty, only log intents matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude intents matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

fn split_patterns(patterns: Option<&str>) -> Vec<String> {
    patterns
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl IntentLoggerConfig {
    /// Create a config from comma-separated pattern strings
    ///
    /// # Example
    /// ```
    /// use form_dispatch_core::logger::IntentLoggerConfig;
    ///
    /// let config = IntentLoggerConfig::new(Some("Form*,Submit*"), Some("SubmitDidFail"));
    /// assert!(config.should_log("FormSubmit"));
    /// assert!(config.should_log("SubmitDidSucceed"));
    /// assert!(!config.should_log("SubmitDidFail"));
    /// assert!(!config.should_log("FieldChange"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include_patterns: split_patterns(include),
            exclude_patterns: split_patterns(exclude),
        }
    }

    /// Create a config with specific pattern vectors
    pub fn with_patterns(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include_patterns: include,
            exclude_patterns: exclude,
        }
    }

    /// Check if an intent kind passes the include/exclude patterns
    pub fn should_log(&self, kind: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| glob_match(p, kind))
        {
            return false;
        }

        !self.exclude_patterns.iter().any(|p| glob_match(p, kind))
    }
}

/// An entry in the intent log
#[derive(Debug, Clone)]
pub struct IntentLogEntry {
    /// Intent kind
    pub kind: &'static str,
    /// Summary from [`IntentSummary::summary`]
    pub summary: String,
    pub timestamp: Instant,
    /// Sequence number for ordering
    pub sequence: u64,
    /// Whether the intent changed state; `None` while in flight or if the dispatch aborted
    pub state_changed: Option<bool>,
}

impl IntentLogEntry {
    pub fn new(kind: &'static str, summary: String, sequence: u64) -> Self {
        Self {
            kind,
            summary,
            timestamp: Instant::now(),
            sequence,
            state_changed: None,
        }
    }

    /// Time since this intent was logged
    pub fn elapsed(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }

    /// Format the elapsed time for display (e.g., "2.3s", "150ms")
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

/// Configuration for the intent log ring buffer
#[derive(Debug, Clone)]
pub struct IntentLogConfig {
    /// Maximum number of entries to keep
    pub capacity: usize,
    pub filter: IntentLoggerConfig,
}

impl Default for IntentLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: IntentLoggerConfig::default(),
        }
    }
}

impl IntentLogConfig {
    pub fn new(capacity: usize, filter: IntentLoggerConfig) -> Self {
        Self { capacity, filter }
    }
}

/// In-memory ring buffer of recent intents
///
/// Older entries are discarded once capacity is reached.
#[derive(Debug, Clone)]
pub struct IntentLog {
    entries: VecDeque<IntentLogEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl Default for IntentLog {
    fn default() -> Self {
        Self::with_capacity(IntentLogConfig::default().capacity)
    }
}

impl IntentLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_sequence: 0,
        }
    }

    /// Append an entry and return its sequence number
    pub fn push<I: IntentSummary>(&mut self, intent: &I) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        if self.capacity > 0 {
            self.entries
                .push_back(IntentLogEntry::new(intent.kind(), intent.summary(), sequence));
        }
        sequence
    }

    /// Record the reducer outcome for the entry with `sequence`
    pub fn set_state_changed(&mut self, sequence: u64, changed: bool) {
        if let Some(entry) = self.entries.iter_mut().rev().find(|e| e.sequence == sequence) {
            entry.state_changed = Some(changed);
        }
    }

    /// All entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &IntentLogEntry> {
        self.entries.iter()
    }

    /// The most recent `count` entries, newest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &IntentLogEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Intent log shared between the logger stage and its readers
pub type SharedIntentLog = Arc<Mutex<IntentLog>>;

/// Middleware that logs intents with configurable pattern filtering.
///
/// Supports two modes:
/// - **Tracing only** (default): logs via `tracing::info!()`
/// - **With storage**: also stores entries in a [`SharedIntentLog`]
#[derive(Debug, Clone)]
pub struct IntentLogger {
    config: IntentLoggerConfig,
    log: Option<SharedIntentLog>,
    /// When false the stage only forwards
    active: bool,
}

impl IntentLogger {
    /// Tracing only, no in-memory storage
    pub fn new(config: IntentLoggerConfig) -> Self {
        Self {
            config,
            log: None,
            active: true,
        }
    }

    /// Tracing plus in-memory storage
    pub fn with_log(config: IntentLogConfig) -> Self {
        Self {
            log: Some(Arc::new(Mutex::new(IntentLog::with_capacity(config.capacity)))),
            config: config.filter,
            active: true,
        }
    }

    /// No filtering, tracing only
    pub fn log_all() -> Self {
        Self::new(IntentLoggerConfig::default())
    }

    /// Set whether the stage logs at all.
    ///
    /// ```ignore
    /// let logger = IntentLogger::log_all().active(args.log_intents);
    /// ```
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Handle to the stored log (if storage is enabled)
    pub fn log(&self) -> Option<SharedIntentLog> {
        self.log.clone()
    }

    pub fn config(&self) -> &IntentLoggerConfig {
        &self.config
    }
}

impl<S, I> Middleware<S, I> for IntentLogger
where
    S: Clone,
    I: IntentSummary,
{
    fn name(&self) -> &'static str {
        "intent-logger"
    }

    fn intercept(&mut self, intent: I, next: &mut Next<'_, S, I>) -> Result<bool, DispatchError> {
        let kind = intent.kind();
        if !self.active || !self.config.should_log(kind) {
            return next.run(intent);
        }

        let summary = intent.summary();
        let sequence = self.log.as_ref().map(|log| log.lock().push(&intent));

        let result = next.run(intent);

        match &result {
            Ok(changed) => {
                tracing::info!(intent = %kind, changed = *changed, "{summary}");
                if let (Some(log), Some(sequence)) = (&self.log, sequence) {
                    log.lock().set_state_changed(sequence, *changed);
                }
            }
            Err(error) => {
                tracing::info!(intent = %kind, %error, "{summary} (aborted)");
            }
        }
        result
    }
}

/// Simple glob pattern matching supporting `*` and `?`.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('*') => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(&c) if c == '?' || c == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                // backtrack: let the last star swallow one more character
                Some((star_pi, star_ti)) => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    star = Some((star_pi, star_ti + 1));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&c| c == '*')
}
