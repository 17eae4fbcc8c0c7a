//! Submit effect
//!
//! `FormSubmit` starts the routine once the reducer moved the form to
//! `Submitting`. The routine reads the committed values, calls the transport
//! and dispatches `SubmitDidSucceed`; any error is recovered into
//! `SubmitDidFail` by the coordinator.

use std::sync::Arc;
use std::time::Duration;

use form_dispatch::{
    ConcurrencyPolicy, ConfigError, EffectContext, EffectCoordinator, EffectError, Transport, Trigger,
};

use crate::intent::LoginIntent;
use crate::state::AppState;

pub type LoginContext = EffectContext<AppState, LoginIntent>;

/// One submission attempt
pub async fn submit(transport: &dyn Transport, ctx: &LoginContext, timeout: Duration) -> Result<(), EffectError> {
    let values = ctx.state().login.values().clone();

    let session = tokio::time::timeout(timeout, transport.submit_credentials(values))
        .await
        .map_err(|_| EffectError::msg(format!("request timed out after {}s", timeout.as_secs())))??;

    tracing::info!(user = ?session.user, "login accepted");
    ctx.dispatch(LoginIntent::SubmitDidSucceed(session));
    Ok(())
}

/// Effect coordinator for the login screen
pub fn coordinator(
    transport: Arc<dyn Transport>,
    policy: ConcurrencyPolicy,
    timeout: Duration,
) -> Result<EffectCoordinator<AppState, LoginIntent>, ConfigError> {
    let on_submit = Trigger::new(
        "FormSubmit",
        move |_intent: LoginIntent, ctx: LoginContext| {
            let transport = Arc::clone(&transport);
            async move { submit(transport.as_ref(), &ctx, timeout).await }
        },
        |error| LoginIntent::SubmitDidFail(error.to_string()),
    )
    .policy(policy)
    .only_if_changed();

    EffectCoordinator::new()
        .effect(on_submit)?
        .cancel_on("FormReset", "FormSubmit")
}
