use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::RegisterRequest;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]{3,50}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    email.len() <= 100 && EMAIL_RE.is_match(email)
}

/// Password policy: at least 8 chars with upper, lower and digit.
/// Returns one entry per failing rule so the client can list them all.
pub fn password_failures(password: &str) -> Vec<String> {
    let mut failures = Vec::new();
    if password.len() < 8 {
        failures.push("password must be at least 8 characters".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        failures.push("password must contain an uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        failures.push("password must contain a lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        failures.push("password must contain a digit".to_string());
    }
    failures
}

/// Full registration policy; empty result means the request is acceptable.
pub fn registration_failures(req: &RegisterRequest) -> Vec<String> {
    let mut failures = Vec::new();
    if !is_valid_username(&req.username) {
        failures
            .push("username must be 3-50 characters, letters, digits or underscore".to_string());
    }
    if !is_valid_email(&req.email) {
        failures.push("email must be a valid address of at most 100 characters".to_string());
    }
    failures.extend(password_failures(&req.password));
    if req.password != req.confirm_password {
        failures.push("password confirmation does not match".to_string());
    }
    failures
}
