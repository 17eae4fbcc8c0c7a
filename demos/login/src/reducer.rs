//! Reducer - (state, intent) -> changed
//!
//! Pure: validation is recomputed inside `FormState`, async work lives in
//! the submit effect.

use form_dispatch::Validator;

use crate::intent::LoginIntent;
use crate::state::AppState;

/// Returns `true` if the state changed
pub fn reducer(validator: &Validator, state: &mut AppState, intent: LoginIntent) -> bool {
    match intent {
        LoginIntent::FieldChange { field, value } => {
            state.login.change_field(validator, &field, value)
        }

        // Rejected while invalid or already submitting
        LoginIntent::FormSubmit => state.login.begin_submit(),

        LoginIntent::FormReset => state.login.reset(),

        LoginIntent::SubmitDidSucceed(session) => {
            if state.login.settle_success() {
                state.session = Some(session);
                true
            } else {
                false
            }
        }

        LoginIntent::SubmitDidFail(detail) => state.login.settle_failure(detail),

        LoginIntent::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_dispatch::{Session, SubmissionStatus};

    fn filled(validator: &Validator) -> AppState {
        let mut state = AppState::new(validator);
        reducer(validator, &mut state, LoginIntent::field("email", "a@b.com"));
        reducer(validator, &mut state, LoginIntent::field("password", "secret1"));
        state
    }

    #[test]
    fn test_submit_valid_form() {
        let validator = Validator::login();
        let mut state = filled(&validator);

        assert!(state.login.errors().is_empty());
        assert!(reducer(&validator, &mut state, LoginIntent::FormSubmit));
        assert_eq!(state.login.status(), &SubmissionStatus::Submitting);

        // second submit is a no-op
        assert!(!reducer(&validator, &mut state, LoginIntent::FormSubmit));
    }

    #[test]
    fn test_success_stores_session() {
        let validator = Validator::login();
        let mut state = filled(&validator);
        reducer(&validator, &mut state, LoginIntent::FormSubmit);

        let session = Session::new("t").with_user("ada");
        assert!(reducer(
            &validator,
            &mut state,
            LoginIntent::SubmitDidSucceed(session.clone())
        ));
        assert_eq!(state.login.status(), &SubmissionStatus::Succeeded);
        assert_eq!(state.session, Some(session));
    }

    #[test]
    fn test_late_outcome_is_ignored() {
        let validator = Validator::login();
        let mut state = filled(&validator);

        assert!(!reducer(
            &validator,
            &mut state,
            LoginIntent::SubmitDidSucceed(Session::new("t"))
        ));
        assert!(state.session.is_none());
    }

    #[test]
    fn test_failure_and_edit() {
        let validator = Validator::login();
        let mut state = filled(&validator);
        reducer(&validator, &mut state, LoginIntent::FormSubmit);

        assert!(reducer(
            &validator,
            &mut state,
            LoginIntent::SubmitDidFail("invalid credentials".into())
        ));
        assert_eq!(state.login.failure(), Some("invalid credentials"));

        assert!(reducer(&validator, &mut state, LoginIntent::field("password", "secret2")));
        assert_eq!(state.login.status(), &SubmissionStatus::Idle);
        assert_eq!(state.login.failure(), None);
    }

    #[test]
    fn test_unknown_is_inert() {
        let validator = Validator::login();
        let mut state = filled(&validator);
        let before = state.clone();

        assert!(!reducer(&validator, &mut state, LoginIntent::Unknown));
        assert_eq!(state.login, before.login);
    }
}
