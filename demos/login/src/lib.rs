//! Login form built on form-dispatch
//!
//! Wiring, in dispatch order:
//! 1. Rendering layer (here: CLI input or a JSON-lines replay) dispatches intents
//! 2. `EffectCoordinator` starts the submit routine for `FormSubmit`
//! 3. `IntentLogger` logs what reaches it, outcomes included
//! 4. Reducer updates `AppState`; listeners render and navigate

pub mod api;
pub mod config;
pub mod effect;
pub mod intent;
pub mod reducer;
pub mod render;
pub mod state;

use std::sync::Arc;

use form_dispatch::{ConfigError, IntentLogger, Store, StoreBuilder, Transport, Validator};

use crate::config::StoreConfig;
use crate::intent::LoginIntent;
use crate::state::AppState;

pub type LoginStore = Store<AppState, LoginIntent>;

/// Store builder with the effects and logger stages installed.
///
/// Further middleware added to the builder runs after the logger.
pub fn store_builder(
    config: &StoreConfig,
    transport: Arc<dyn Transport>,
    logger: IntentLogger,
) -> Result<StoreBuilder<AppState, LoginIntent>, ConfigError> {
    let validator = Arc::new(Validator::login());
    let effects = effect::coordinator(transport, config.policy, config.timeout)?;

    let initial = AppState::new(&validator);
    Ok(Store::builder(initial, move |state: &mut AppState, intent: LoginIntent| {
        reducer::reducer(&validator, state, intent)
    })
    .middleware(effects)
    .middleware(logger))
}

pub fn build_store(config: &StoreConfig, transport: Arc<dyn Transport>) -> Result<LoginStore, ConfigError> {
    Ok(store_builder(config, transport, config.intent_logger())?.build())
}
