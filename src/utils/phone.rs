//! Phone number checks for call origination.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    #[error("Phone number is empty")]
    Empty,
    #[error("Phone number must start with '+' and a country code: {0}")]
    MissingCountryCode(String),
    #[error("Phone number contains invalid characters: {0}")]
    InvalidCharacters(String),
    #[error("Phone number must have 8 to 15 digits: {0}")]
    InvalidLength(String),
}

/// Strip the separators people commonly type (spaces, dashes, dots, parentheses).
pub fn normalize_phone_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect()
}

/// Validate an E.164 number after normalization and return the normalized form.
pub fn validate_phone_number(raw: &str) -> Result<String, PhoneNumberError> {
    let normalized = normalize_phone_number(raw.trim());
    if normalized.is_empty() {
        return Err(PhoneNumberError::Empty);
    }
    let Some(digits) = normalized.strip_prefix('+') else {
        return Err(PhoneNumberError::MissingCountryCode(raw.to_string()));
    };
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PhoneNumberError::InvalidCharacters(raw.to_string()));
    }
    if !(8..=15).contains(&digits.len()) || digits.starts_with('0') {
        return Err(PhoneNumberError::InvalidLength(raw.to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_numbers() {
        assert_eq!(validate_phone_number("+573104983987").unwrap(), "+573104983987");
        assert_eq!(
            validate_phone_number(" +1 (520) 223-9830 ").unwrap(),
            "+15202239830"
        );
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(validate_phone_number("  "), Err(PhoneNumberError::Empty));
        assert!(matches!(
            validate_phone_number("5202239830"),
            Err(PhoneNumberError::MissingCountryCode(_))
        ));
        assert!(matches!(
            validate_phone_number("+1520abc9830"),
            Err(PhoneNumberError::InvalidCharacters(_))
        ));
        assert!(matches!(
            validate_phone_number("+123"),
            Err(PhoneNumberError::InvalidLength(_))
        ));
    }
}
