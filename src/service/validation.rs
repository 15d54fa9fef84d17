//! Field validators. Errors are collected per field and returned together.

use crate::error::{AppError, FieldErrors};
use chrono::Datelike;
use regex::Regex;
use std::sync::OnceLock;

pub const USERNAME_MAX: usize = 150;
pub const EMAIL_MAX: usize = 254;
pub const PERSON_NAME_MAX: usize = 150;
pub const NAME_MAX: usize = 256;
pub const SLUG_MAX: usize = 50;
pub const CODE_MAX: usize = 40;
pub const SCORE_MIN: i64 = 1;
pub const SCORE_MAX: i64 = 10;
pub const YEAR_MIN: i64 = 1;

/// Username that would collide with the `/users/me/` route.
pub const RESERVED_USERNAME: &str = "me";

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w@+\-.]+$").expect("static regex"))
}

fn slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("static regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("static regex"))
}

/// Current calendar year (UTC); the upper bound for a title's year.
pub fn current_year() -> i64 {
    chrono::Utc::now().year() as i64
}

#[derive(Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    /// Record "required" for a missing value and pass present values through.
    pub fn required<'a, T>(&mut self, field: &str, value: Option<&'a T>) -> Option<&'a T> {
        if value.is_none() {
            self.add(field, REQUIRED);
        }
        value
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> bool {
        if value.chars().count() > max {
            self.add(field, format!("Ensure this field has no more than {} characters.", max));
            return false;
        }
        true
    }

    pub fn not_blank(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.add(field, BLANK);
            return false;
        }
        true
    }

    pub fn username(&mut self, field: &str, value: &str) {
        if !self.not_blank(field, value) || !self.max_len(field, value, USERNAME_MAX) {
            return;
        }
        if !username_re().is_match(value) {
            self.add(
                field,
                "Username may contain only letters, digits and the characters .@+-_",
            );
        }
        if value == RESERVED_USERNAME {
            self.add(field, format!("Using '{}' as a username is not allowed.", RESERVED_USERNAME));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !self.not_blank(field, value) || !self.max_len(field, value, EMAIL_MAX) {
            return;
        }
        if !email_re().is_match(value) {
            self.add(field, "Enter a valid email address.");
        }
    }

    pub fn name(&mut self, field: &str, value: &str, max: usize) {
        if self.not_blank(field, value) {
            self.max_len(field, value, max);
        }
    }

    pub fn slug(&mut self, field: &str, value: &str) {
        if !self.not_blank(field, value) || !self.max_len(field, value, SLUG_MAX) {
            return;
        }
        if !slug_re().is_match(value) {
            self.add(
                field,
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }
    }

    pub fn score(&mut self, field: &str, value: i64) {
        if value < SCORE_MIN {
            self.add(field, format!("Score must be at least {}.", SCORE_MIN));
        } else if value > SCORE_MAX {
            self.add(field, format!("Score must be at most {}.", SCORE_MAX));
        }
    }

    pub fn year(&mut self, field: &str, value: i64, current_year: i64) {
        if value < YEAR_MIN {
            self.add(field, format!("Year must be at least {}.", YEAR_MIN));
        } else if value > current_year {
            self.add(field, "Titles from the future cannot be added.");
        }
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }

    pub fn finish(self) -> Result<(), AppError> {
        self.errors.into_result()
    }
}
