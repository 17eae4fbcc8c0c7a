//! Intent trait for type-safe state mutations

use std::fmt::Debug;

/// Marker trait for intents that can be dispatched to the store
///
/// Intents represent requests to change state or to trigger an effect. They should be:
/// - Clone: Intents may be logged, fanned out, or handed to effect routines
/// - Debug: For debugging and logging
/// - Send + 'static: For dispatch from effect tasks
///
/// Use `#[derive(Intent)]` from `form-dispatch-macros` to auto-implement this trait.
/// The derive fills [`Intent::KINDS`] with every variant name, which the effect
/// coordinator uses to reject triggers outside the vocabulary.
pub trait Intent: Clone + Debug + Send + 'static {
    /// Version of the intent vocabulary
    const VERSION: u32 = 1;

    /// Every kind this type can produce. Empty means "not declared".
    const KINDS: &'static [&'static str] = &[];

    /// Get the intent kind for logging, filtering and trigger matching
    fn kind(&self) -> &'static str;

    /// Whether `kind` belongs to the declared vocabulary.
    ///
    /// Types that don't declare [`Intent::KINDS`] accept every kind.
    fn knows_kind(kind: &str) -> bool {
        Self::KINDS.is_empty() || Self::KINDS.contains(&kind)
    }
}

/// Short, log-friendly description of an intent
///
/// The default uses `Debug`. Override it to hide secrets or shorten large
/// payloads before they reach the intent log.
pub trait IntentSummary: Intent {
    fn summary(&self) -> String {
        format!("{:?}", self)
    }
}
