//! Validation engine
//!
//! A [`Validator`] maps the current field values to an [`ErrorMap`]. It holds
//! no state between calls, so it can run on every keystroke.
//!
//! ```ignore
//! let validator = Validator::new()
//!     .field("email", [Rule::required(), Rule::email()])
//!     .field("password", [Rule::required(), Rule::length_between(6, 100)]);
//!
//! let errors = validator.validate(&values);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::ConfigError;

/// Field name → raw value
pub type FieldValues = BTreeMap<String, String>;

/// Field name → error message. Valid fields have no entry.
pub type ErrorMap = BTreeMap<String, String>;

pub const REQUIRED: &str = "Required";
pub const INVALID_EMAIL: &str = "Invalid email";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#,
    )
    .expect("email pattern compiles")
});

#[derive(Debug, Clone)]
enum Check {
    Required,
    Email,
    Length { min: usize, max: usize },
    Pattern(Regex),
}

/// One check on a single field
///
/// Only [`Rule::required`] looks at empty values; every other rule accepts
/// an empty or missing field.
#[derive(Debug, Clone)]
pub struct Rule {
    check: Check,
    message: Option<String>,
}

impl Rule {
    fn of(check: Check) -> Self {
        Self {
            check,
            message: None,
        }
    }

    /// Field must be present and non-empty
    pub fn required() -> Self {
        Self::of(Check::Required)
    }

    /// Field must be a syntactically valid email address
    pub fn email() -> Self {
        Self::of(Check::Email)
    }

    /// Field must have between `min` and `max` characters, inclusive
    pub fn length_between(min: usize, max: usize) -> Self {
        Self::of(Check::Length { min, max })
    }

    /// Field must match `pattern`
    pub fn pattern(pattern: &str, message: impl Into<String>) -> Result<Self, ConfigError> {
        let re = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::of(Check::Pattern(re)).with_message(message))
    }

    /// Replace the default message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn default_message(&self) -> String {
        match &self.check {
            Check::Required => REQUIRED.to_string(),
            Check::Email => INVALID_EMAIL.to_string(),
            Check::Length { min: 0, max } => {
                format!("Must be less than {} characters", max.saturating_add(1))
            }
            Check::Length { min, max } => format!(
                "Must be more than {} characters and less than {}",
                min - 1,
                max.saturating_add(1)
            ),
            Check::Pattern(re) => format!("Must match {}", re.as_str()),
        }
    }

    /// Error message for `value`, if it violates the rule
    pub fn check(&self, value: Option<&str>) -> Option<String> {
        let value = value.unwrap_or_default();
        let ok = match &self.check {
            Check::Required => !value.is_empty(),
            _ if value.is_empty() => true,
            Check::Email => EMAIL_RE.is_match(value),
            Check::Length { min, max } => (*min..=*max).contains(&value.chars().count()),
            Check::Pattern(re) => re.is_match(value),
        };
        if ok {
            None
        } else {
            Some(self.message.clone().unwrap_or_else(|| self.default_message()))
        }
    }
}

type FormCheck = Arc<dyn Fn(&FieldValues) -> bool + Send + Sync>;

struct CrossField {
    field: String,
    message: String,
    check: FormCheck,
}

/// Rule set for a whole form
#[derive(Clone, Default)]
pub struct Validator {
    fields: Vec<(String, Vec<Rule>)>,
    cross: Vec<Arc<CrossField>>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("fields", &self.fields)
            .field("cross_field_checks", &self.cross.len())
            .finish()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for the login form: email and password
    pub fn login() -> Self {
        Self::new()
            .field("email", [Rule::required(), Rule::email()])
            .field("password", [Rule::required(), Rule::length_between(6, 100)])
    }

    /// Add rules for `name`, evaluated in order; the first failure wins
    pub fn field(mut self, name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Self {
        let name = name.into();
        let rules = rules.into_iter();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => existing.extend(rules),
            None => self.fields.push((name, rules.collect())),
        }
        self
    }

    /// Form-level check reported on `field` when it passed its own rules
    pub fn cross_field<F>(mut self, field: impl Into<String>, message: impl Into<String>, check: F) -> Self
    where
        F: Fn(&FieldValues) -> bool + Send + Sync + 'static,
    {
        self.cross.push(Arc::new(CrossField {
            field: field.into(),
            message: message.into(),
            check: Arc::new(check),
        }));
        self
    }

    /// Names of the fields with rules, in registration order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Error for a single field, ignoring form-level checks
    pub fn validate_field(&self, name: &str, values: &FieldValues) -> Option<String> {
        let value = values.get(name).map(String::as_str);
        self.fields
            .iter()
            .filter(|(field, _)| field == name)
            .flat_map(|(_, rules)| rules)
            .find_map(|rule| rule.check(value))
    }

    pub fn validate(&self, values: &FieldValues) -> ErrorMap {
        let mut errors = ErrorMap::new();
        for (name, _) in &self.fields {
            if let Some(message) = self.validate_field(name, values) {
                errors.insert(name.clone(), message);
            }
        }
        for cross in &self.cross {
            if !errors.contains_key(&cross.field) && !(cross.check)(values) {
                errors.insert(cross.field.clone(), cross.message.clone());
            }
        }
        errors
    }

    pub fn is_valid(&self, values: &FieldValues) -> bool {
        self.validate(values).is_empty()
    }
}
