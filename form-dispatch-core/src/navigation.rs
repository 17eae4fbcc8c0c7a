//! Navigation collaborator
//!
//! The core never navigates. A listener built with [`on_success`] informs a
//! [`Navigator`] whenever a form settles successfully.

use std::sync::Arc;

use crate::form::{FormState, SubmissionStatus};
use crate::store::StoreHandle;

/// Receives route changes, e.g. a router or a window history
pub trait Navigator: Send {
    fn navigate(&mut self, route: &str);
}

impl<F> Navigator for F
where
    F: FnMut(&str) + Send,
{
    fn navigate(&mut self, route: &str) {
        self(route)
    }
}

/// Listener that calls `navigator` on every transition into
/// [`SubmissionStatus::Succeeded`] of the form picked by `select`.
///
/// ```ignore
/// store.subscribe(navigation::on_success(
///     |state: &AppState| &state.login,
///     LogNavigator,
///     "/home",
/// ));
/// ```
pub fn on_success<S, I, N>(
    select: fn(&S) -> &FormState,
    mut navigator: N,
    route: impl Into<String>,
) -> impl FnMut(&Arc<S>, &StoreHandle<S, I>) + Send + 'static
where
    S: 'static,
    I: 'static,
    N: Navigator + 'static,
{
    let route = route.into();
    let mut succeeded = false;
    move |state: &Arc<S>, _: &StoreHandle<S, I>| {
        let now = *select(state).status() == SubmissionStatus::Succeeded;
        if now && !succeeded {
            tracing::info!(route = %route, "navigating after successful submission");
            navigator.navigate(&route);
        }
        succeeded = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use crate::validation::Validator;
    use crate::Intent;
    use parking_lot::Mutex;

    #[derive(Clone, Debug)]
    struct TestState {
        form: FormState,
        clicks: u32,
    }

    #[derive(Clone, Debug)]
    enum TestIntent {
        Fill,
        Submit,
        Succeed,
        Reset,
        Click,
    }

    impl Intent for TestIntent {
        fn kind(&self) -> &'static str {
            match self {
                TestIntent::Fill => "Fill",
                TestIntent::Submit => "Submit",
                TestIntent::Succeed => "Succeed",
                TestIntent::Reset => "Reset",
                TestIntent::Click => "Click",
            }
        }
    }

    #[test]
    fn test_navigates_once_per_success() {
        let validator = Validator::login();
        let initial = TestState {
            form: FormState::new(&validator),
            clicks: 0,
        };
        let mut store = Store::new(initial, move |state: &mut TestState, intent: TestIntent| match intent {
            TestIntent::Fill => {
                state.form.change_field(&validator, "email", "a@b.com")
                    | state.form.change_field(&validator, "password", "secret1")
            }
            TestIntent::Submit => state.form.begin_submit(),
            TestIntent::Succeed => state.form.settle_success(),
            TestIntent::Reset => state.form.reset(),
            TestIntent::Click => {
                state.clicks += 1;
                true
            }
        });

        let routes = Arc::new(Mutex::new(Vec::new()));
        let seen = routes.clone();
        store.subscribe(on_success(
            |state: &TestState| &state.form,
            move |route: &str| seen.lock().push(route.to_string()),
            "/home",
        ));

        for intent in [
            TestIntent::Fill,
            TestIntent::Submit,
            TestIntent::Succeed,
            TestIntent::Click,
            TestIntent::Reset,
            TestIntent::Submit,
            TestIntent::Succeed,
        ] {
            store.dispatch(intent).unwrap();
        }

        assert_eq!(*routes.lock(), vec!["/home", "/home"]);
    }
}
