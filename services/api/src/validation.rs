//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Fail with `message` when any field is blank after trimming
pub fn require_non_blank(fields: &[&str], message: &str) -> ApiResult<()> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ApiError::BadRequest(message.to_string()));
    }
    Ok(())
}

/// Parse a path identifier, failing BadRequest with `message`
pub fn parse_id(raw: &str, message: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(message.to_string()))
}

/// Validate username
///
/// Expects the already lower-cased form.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-z0-9_.]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(
            "Username can only contain letters, numbers, dots and underscores".to_string(),
        );
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.chars().count() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Longest full name, video title or playlist name the store accepts
pub const MAX_NAME_LENGTH: usize = 255;

/// Fail when `value` has more than `max` characters
pub fn validate_max_length(label: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{} must be at most {} characters long", label, max));
    }
    Ok(())
}

/// Collect every failed check into a single validation error
pub fn collect(checks: impl IntoIterator<Item = Result<(), String>>) -> ApiResult<()> {
    let errors: Vec<String> = checks.into_iter().filter_map(Result::err).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation {
            message: "Validation failed".to_string(),
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_rejected_after_trimming() {
        assert!(require_non_blank(&["a", "b"], "All fields are required").is_ok());

        let err = require_non_blank(&["a", "   "], "All fields are required").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "All fields are required"));
    }

    #[test]
    fn ids_must_be_uuids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "Invalid video ID").unwrap(), id);

        let err = parse_id("64b7f0c2e4b0a1a2b3c4d5e6", "Invalid video ID").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "Invalid video ID"));
    }

    #[test]
    fn usernames() {
        assert!(validate_username("john_doe.42").is_ok());
        assert!(validate_username("jd").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("john doe").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("someone@example.com").is_ok());
        assert!(validate_email("someone@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn passwords() {
        assert!(validate_password("correct horse").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn length_limit_counts_characters() {
        let ascii = "a".repeat(MAX_NAME_LENGTH);
        let accented = "é".repeat(MAX_NAME_LENGTH);
        assert!(validate_max_length("Title", &ascii, MAX_NAME_LENGTH).is_ok());
        assert!(validate_max_length("Title", &accented, MAX_NAME_LENGTH).is_ok());

        let err = validate_max_length("Title", &"a".repeat(300), MAX_NAME_LENGTH).unwrap_err();
        assert_eq!(err, "Title must be at most 255 characters long");
    }

    #[test]
    fn collect_reports_every_failure() {
        let err = collect([
            validate_username("x"),
            validate_email("bad"),
            validate_password("longenough"),
        ])
        .unwrap_err();

        match err {
            ApiError::Validation { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
