//! Text stand-in for the rendering layer
//!
//! Errors show only for fields that have been edited; the submit control is
//! disabled whenever the form cannot be submitted.

use std::fmt::Write;

use form_dispatch::SubmissionStatus;

use crate::state::AppState;

const FIELDS: [(&str, &str); 2] = [("email", "Email"), ("password", "Password")];

pub fn render(state: &AppState) -> String {
    let form = &state.login;
    let mut out = String::from("── Login to Reanix ──\n");

    for (field, label) in FIELDS {
        let value = form.value(field);
        let shown = if field == "password" {
            "•".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        let _ = write!(out, "{label:<9} [{shown}]");
        if form.values().contains_key(field) {
            if let Some(error) = form.error(field) {
                let _ = write!(out, "  ! {error}");
            }
        }
        out.push('\n');
    }

    let label = if form.is_submitting() {
        "Logging in..."
    } else {
        "Login"
    };
    let _ = writeln!(
        out,
        "< {label} >{}",
        if form.can_submit() { "" } else { " (disabled)" }
    );

    match form.status() {
        SubmissionStatus::Failed(detail) => {
            let _ = writeln!(out, "Login failed: {detail}");
        }
        SubmissionStatus::Succeeded => {
            let who = state
                .session
                .as_ref()
                .and_then(|s| s.user.as_deref())
                .unwrap_or("you");
            let _ = writeln!(out, "Welcome, {who}!");
        }
        SubmissionStatus::Idle | SubmissionStatus::Submitting => {}
    }

    out.push_str("Create a new account: /signup\n");
    out
}
