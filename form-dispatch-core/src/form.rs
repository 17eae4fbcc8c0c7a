//! Submission state machine
//!
//! ```text
//!            begin_submit (valid)         settle_success
//!   Idle ───────────────────────► Submitting ─────────► Succeeded
//!    ▲  ▲                             │                     │
//!    │  │ change_field / reset        │ settle_failure      │ change_field / reset
//!    │  └──────────── Failed(detail) ◄┘                     │
//!    └──────────────────────────────────────────────────────┘
//! ```
//!
//! Values change only through [`FormState::change_field`], which also
//! recomputes the error map. Every transition method returns whether the
//! state changed so reducers can report it directly.

use serde::{Deserialize, Serialize};

use crate::validation::{ErrorMap, FieldValues, Validator};

/// Lifecycle of one submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed(String),
}

impl SubmissionStatus {
    /// Succeeded or failed
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// Field values, their derived errors and the submission status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormState {
    values: FieldValues,
    errors: ErrorMap,
    status: SubmissionStatus,
}

impl FormState {
    /// Empty form; errors already reflect the empty values
    pub fn new(validator: &Validator) -> Self {
        Self::with_values(validator, FieldValues::new())
    }

    pub fn with_values(validator: &Validator, values: FieldValues) -> Self {
        let errors = validator.validate(&values);
        Self {
            values,
            errors,
            status: SubmissionStatus::Idle,
        }
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    /// Detail of the last failed submission
    pub fn failure(&self) -> Option<&str> {
        match &self.status {
            SubmissionStatus::Failed(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_submitting(&self) -> bool {
        self.status == SubmissionStatus::Submitting
    }

    /// Whether the submit control should be enabled
    pub fn can_submit(&self) -> bool {
        self.is_valid() && self.status == SubmissionStatus::Idle
    }

    /// Set a field value. A settled form goes back to idle.
    pub fn change_field(&mut self, validator: &Validator, field: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        let mut changed = false;

        if self.values.get(field) != Some(&value) {
            self.values.insert(field.to_string(), value);
            self.errors = validator.validate(&self.values);
            changed = true;
        }
        if self.status.is_settled() {
            self.status = SubmissionStatus::Idle;
            changed = true;
        }
        changed
    }

    /// Idle and valid → submitting. A settled form needs an edit or reset first.
    pub fn begin_submit(&mut self) -> bool {
        match self.status {
            SubmissionStatus::Idle if self.is_valid() => {
                self.status = SubmissionStatus::Submitting;
                true
            }
            SubmissionStatus::Submitting => {
                tracing::debug!("submission already in flight");
                false
            }
            _ => {
                tracing::debug!(errors = self.errors.len(), status = ?self.status, "submit rejected");
                false
            }
        }
    }

    /// Submitting → succeeded
    pub fn settle_success(&mut self) -> bool {
        self.settle(SubmissionStatus::Succeeded)
    }

    /// Submitting → failed
    pub fn settle_failure(&mut self, detail: impl Into<String>) -> bool {
        self.settle(SubmissionStatus::Failed(detail.into()))
    }

    fn settle(&mut self, outcome: SubmissionStatus) -> bool {
        if !self.is_submitting() {
            tracing::debug!(status = ?self.status, "ignoring outcome outside a submission");
            return false;
        }
        self.status = outcome;
        true
    }

    /// Back to idle, keeping the values
    pub fn reset(&mut self) -> bool {
        if self.status == SubmissionStatus::Idle {
            return false;
        }
        self.status = SubmissionStatus::Idle;
        true
    }

    /// Back to an empty, idle form
    pub fn clear(&mut self, validator: &Validator) -> bool {
        let cleared = Self::new(validator);
        if *self == cleared {
            return false;
        }
        *self = cleared;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(validator: &Validator, email: &str, password: &str) -> FormState {
        let mut form = FormState::new(validator);
        form.change_field(validator, "email", email);
        form.change_field(validator, "password", password);
        form
    }

    #[test]
    fn test_new_form_has_derived_errors() {
        let validator = Validator::login();
        let form = FormState::new(&validator);
        assert_eq!(form.error("email"), Some("Required"));
        assert_eq!(form.status(), &SubmissionStatus::Idle);
        assert!(!form.can_submit());
    }

    #[test]
    fn test_valid_form_submits() {
        let validator = Validator::login();
        let mut form = filled(&validator, "a@b.com", "secret1");

        assert!(form.errors().is_empty());
        assert!(form.begin_submit());
        assert!(form.is_submitting());
        assert!(!form.can_submit());
    }

    #[test]
    fn test_invalid_form_rejects_submit() {
        let validator = Validator::login();

        let mut form = filled(&validator, "", "secret1");
        assert_eq!(form.error("email"), Some("Required"));
        assert!(!form.begin_submit());
        assert_eq!(form.status(), &SubmissionStatus::Idle);

        let mut form = filled(&validator, "a@b.com", "abc");
        assert_eq!(
            form.error("password"),
            Some("Must be more than 5 characters and less than 101")
        );
        assert!(!form.begin_submit());
        assert_eq!(form.status(), &SubmissionStatus::Idle);
    }

    #[test]
    fn test_second_submit_is_ignored() {
        let validator = Validator::login();
        let mut form = filled(&validator, "a@b.com", "secret1");
        assert!(form.begin_submit());
        let before = form.clone();
        assert!(!form.begin_submit());
        assert_eq!(form, before);
    }

    #[test]
    fn test_failure_then_edit_returns_to_idle() {
        let validator = Validator::login();
        let mut form = filled(&validator, "a@b.com", "secret1");
        form.begin_submit();

        assert!(form.settle_failure("invalid credentials"));
        assert_eq!(form.failure(), Some("invalid credentials"));

        assert!(form.change_field(&validator, "password", "secret2"));
        assert_eq!(form.status(), &SubmissionStatus::Idle);
        assert_eq!(form.failure(), None);
    }

    #[test]
    fn test_failed_form_needs_reset_or_edit_before_retry() {
        let validator = Validator::login();
        let mut form = filled(&validator, "a@b.com", "secret1");
        form.begin_submit();
        form.settle_failure("timeout");

        assert!(!form.can_submit());
        assert!(!form.begin_submit());
        assert_eq!(form.failure(), Some("timeout"));

        assert!(form.reset());
        assert!(form.can_submit());
        assert!(form.begin_submit());
        form.settle_failure("timeout");

        form.change_field(&validator, "password", "secret2");
        assert!(form.begin_submit());
        assert!(form.is_submitting());
    }

    #[test]
    fn test_outcomes_outside_submission_are_ignored() {
        let validator = Validator::login();
        let mut form = filled(&validator, "a@b.com", "secret1");
        assert!(!form.settle_success());
        assert!(!form.settle_failure("late"));
        assert_eq!(form.status(), &SubmissionStatus::Idle);

        form.begin_submit();
        assert!(form.settle_success());
        assert!(!form.settle_failure("late"));
        assert_eq!(form.status(), &SubmissionStatus::Succeeded);
        // a settled form needs an edit or reset first
        assert!(!form.begin_submit());
    }

    #[test]
    fn test_reset_keeps_values() {
        let validator = Validator::login();
        let mut form = filled(&validator, "a@b.com", "secret1");
        assert!(!form.reset());

        form.begin_submit();
        form.settle_success();
        assert!(form.reset());
        assert_eq!(form.status(), &SubmissionStatus::Idle);
        assert_eq!(form.value("email"), "a@b.com");

        assert!(form.clear(&validator));
        assert_eq!(form.value("email"), "");
        assert!(!form.clear(&validator));
    }

    #[test]
    fn test_same_value_is_no_change() {
        let validator = Validator::login();
        let mut form = filled(&validator, "a@b.com", "secret1");
        assert!(!form.change_field(&validator, "email", "a@b.com"));
    }

    #[test]
    fn test_status_json() {
        assert_eq!(
            serde_json::to_string(&SubmissionStatus::Failed("nope".into())).unwrap(),
            r#"{"state":"Failed","detail":"nope"}"#
        );
        assert_eq!(
            serde_json::to_string(&SubmissionStatus::Idle).unwrap(),
            r#"{"state":"Idle"}"#
        );
    }
}
