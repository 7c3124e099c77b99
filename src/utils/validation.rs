// Field-level checks shared by the user and recipe validators.

use super::FieldErrors;

pub const MAX_CHAR_LENGTH: usize = 255;
pub const MIN_PASSWORD_LENGTH: usize = 5;

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";

/// Loose structural check: one `@`, non-empty local part, dotted domain, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Lower-cases the domain part and leaves the local part alone
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Trimmed, non-blank, bounded text. Records an error and returns None on failure.
pub fn check_char_field(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    required: bool,
    allow_blank: bool,
) -> Option<String> {
    let Some(value) = value else {
        if required {
            errors.add(field, REQUIRED);
        }
        return None;
    };

    let value = value.trim();
    if value.is_empty() && !allow_blank {
        errors.add(field, BLANK);
        return None;
    }
    if value.chars().count() > MAX_CHAR_LENGTH {
        errors.add(
            field,
            format!("Ensure this field has no more than {} characters.", MAX_CHAR_LENGTH),
        );
        return None;
    }
    Some(value.to_string())
}

pub fn check_email(errors: &mut FieldErrors, value: Option<&str>, required: bool) -> Option<String> {
    let email = check_char_field(errors, "email", value, required, false)?;
    if !is_valid_email(&email) {
        errors.add("email", INVALID_EMAIL);
        return None;
    }
    Some(email)
}

/// Account passwords are trimmed before the length check; credential checks use the raw value
pub fn check_password(errors: &mut FieldErrors, value: Option<&str>, required: bool) -> Option<String> {
    let Some(password) = value.map(str::trim) else {
        if required {
            errors.add("password", REQUIRED);
        }
        return None;
    };

    if password.is_empty() {
        errors.add("password", BLANK);
        return None;
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("Ensure this field has at least {} characters.", MIN_PASSWORD_LENGTH),
        );
        return None;
    }
    Some(password.to_string())
}
