use std::sync::LazyLock;

use regex::Regex;

use crate::error::ApiError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").unwrap());

/// French national numbers only: +33 or 0 prefix, then nine digits.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\+33|0)[1-9]\d{8}$").unwrap());

/// Accumulates field-level messages so a single response can report
/// everything wrong with a request, not just the first failure.
#[derive(Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `message` when a field is absent or blank.
    pub fn required(&mut self, value: Option<&str>, message: &str) -> &mut Self {
        if value.map(str::trim).is_none_or(str::is_empty) {
            self.errors.push(message.to_string());
        }
        self
    }

    pub fn name(&mut self, value: &str) -> &mut Self {
        let len = value.trim().chars().count();
        if !(2..=50).contains(&len) {
            self.errors
                .push("Name must be between 2 and 50 characters".to_string());
        }
        self
    }

    pub fn email(&mut self, value: &str) -> &mut Self {
        if !EMAIL_RE.is_match(value.trim()) {
            self.errors.push("Please enter a valid email".to_string());
        }
        self
    }

    pub fn phone(&mut self, value: &str) -> &mut Self {
        if !PHONE_RE.is_match(value.trim()) {
            self.errors
                .push("Please enter a valid French phone number".to_string());
        }
        self
    }

    pub fn password(&mut self, value: &str) -> &mut Self {
        if value.chars().count() < 6 {
            self.errors
                .push("Password must be at least 6 characters".to_string());
        }
        self
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// Emails are stored lowercased so uniqueness checks are case-insensitive.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}
