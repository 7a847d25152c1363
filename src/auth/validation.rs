//! Form validation for signup and login, plus the password strength meter

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub const MIN_NAME_LENGTH: usize = 2;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 120;
pub const MAX_EMAIL_LENGTH: usize = 254;

/// First rule a form broke
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all required fields")]
    MissingFields,

    #[error("Name must be at least {MIN_NAME_LENGTH} characters")]
    NameTooShort,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Please enter your date of birth (YYYY-MM-DD)")]
    InvalidDateOfBirth,

    #[error("You must be at least {MIN_AGE} years old to register")]
    TooYoung,

    #[error("Please check your date of birth")]
    ImplausibleAge,

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    #[error("Password must contain an upper-case letter, a lower-case letter and a digit")]
    PasswordTooWeak,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("You must accept the terms of use")]
    TermsNotAccepted,
}

/// Raw signup form as typed by the user
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub date_of_birth: String,
    pub password: String,
    pub confirm_password: String,
    pub accepted_terms: bool,
    pub medical_id: Option<String>,
}

/// Signup form after validation
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub password: String,
    pub medical_id: Option<String>,
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .expect("email regex is valid")
    })
}

/// Address syntax check; requires a dotted domain
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH && email_regex().is_match(email)
}

/// Whole years between `birth` and `today`
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Length plus lower/upper/digit composition
pub fn check_password_rules(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(ValidationError::PasswordTooWeak);
    }
    Ok(())
}

impl SignupForm {
    /// Validate against `today`; rules are checked in form order
    pub fn validate(&self, today: NaiveDate) -> Result<ValidSignup, ValidationError> {
        let name = self.name.trim();
        let email = self.email.trim();

        if name.is_empty()
            || email.is_empty()
            || self.password.is_empty()
            || self.date_of_birth.trim().is_empty()
        {
            return Err(ValidationError::MissingFields);
        }
        if name.chars().count() < MIN_NAME_LENGTH {
            return Err(ValidationError::NameTooShort);
        }
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }

        let date_of_birth = NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDateOfBirth)?;
        let age = age_on(date_of_birth, today);
        if age < MIN_AGE {
            return Err(ValidationError::TooYoung);
        }
        if age > MAX_AGE {
            return Err(ValidationError::ImplausibleAge);
        }

        check_password_rules(&self.password)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if !self.accepted_terms {
            return Err(ValidationError::TermsNotAccepted);
        }

        Ok(ValidSignup {
            name: name.to_string(),
            email: email.to_string(),
            date_of_birth,
            password: self.password.clone(),
            medical_id: self
                .medical_id
                .as_ref()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        })
    }
}

/// Login form: both fields present, email well formed
pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if !is_valid_email(email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Strength meter
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthLevel {
    Weak,
    Medium,
    Good,
    Strong,
}

impl StrengthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weak => "Weak",
            Self::Medium => "Medium",
            Self::Good => "Good",
            Self::Strong => "Strong",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordStrength {
    /// 0-100 in steps of 25
    pub score: u8,
    pub level: StrengthLevel,
    pub missing: Vec<&'static str>,
}

impl PasswordStrength {
    pub fn evaluate(password: &str) -> Self {
        let checks: [(bool, &'static str); 4] = [
            (
                password.chars().count() >= MIN_PASSWORD_LENGTH,
                "8 characters minimum",
            ),
            (password.chars().any(|c| c.is_ascii_lowercase()), "lower-case letter"),
            (password.chars().any(|c| c.is_ascii_uppercase()), "upper-case letter"),
            (password.chars().any(|c| c.is_ascii_digit()), "digit"),
        ];

        let score = checks.iter().filter(|(ok, _)| *ok).count() as u8 * 25;
        let missing = checks
            .iter()
            .filter(|(ok, _)| !*ok)
            .map(|(_, label)| *label)
            .collect();
        let level = match score {
            0..=49 => StrengthLevel::Weak,
            50..=74 => StrengthLevel::Medium,
            75..=99 => StrengthLevel::Good,
            _ => StrengthLevel::Strong,
        };

        Self {
            score,
            level,
            missing,
        }
    }

    /// One-line summary ("Missing: digit" or the level name)
    pub fn describe(&self) -> String {
        if self.missing.is_empty() {
            self.level.as_str().to_string()
        } else {
            format!("Missing: {}", self.missing.join(", "))
        }
    }
}
