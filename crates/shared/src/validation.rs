//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Minimum number of digits in a phone number.
const MIN_PHONE_DIGITS: usize = 7;

/// Maximum number of digits in a phone number (E.164).
const MAX_PHONE_DIGITS: usize = 15;

lazy_static! {
    /// Digits with optional leading `+` and spaces, dashes or parentheses.
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9\s\-()]+$").unwrap();

    /// Apartment numbers such as `12`, `4A`, `7-3` or `B 12`.
    static ref APARTMENT_REGEX: Regex = Regex::new(r"^[\p{L}0-9][\p{L}0-9 \-/]{0,9}$").unwrap();
}

/// Validates a phone number.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if PHONE_REGEX.is_match(phone) && (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number must contain 7 to 15 digits".into());
        Err(err)
    }
}

/// Validates an apartment number.
pub fn validate_apartment_number(apartment: &str) -> Result<(), ValidationError> {
    if APARTMENT_REGEX.is_match(apartment.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("apartment_format");
        err.message = Some("Apartment number must be 1-10 letters, digits or separators".into());
        Err(err)
    }
}

/// Normalizes an email address for lookups and unique keys.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns `None` for blank optional strings, the trimmed value otherwise.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0521234567").is_ok());
        assert!(validate_phone("+972-52-123-4567").is_ok());
        assert!(validate_phone("(03) 555 1234").is_ok());
    }

    #[test]
    fn test_validate_phone_rejects_letters() {
        assert!(validate_phone("052-CALL-ME").is_err());
    }

    #[test]
    fn test_validate_phone_digit_bounds() {
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_validate_phone_error_message() {
        let err = validate_phone("abc").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Phone number must contain 7 to 15 digits"
        );
    }

    #[test]
    fn test_validate_apartment_number() {
        assert!(validate_apartment_number("12").is_ok());
        assert!(validate_apartment_number("4A").is_ok());
        assert!(validate_apartment_number("7-3").is_ok());
        assert!(validate_apartment_number("ב 5").is_ok());
    }

    #[test]
    fn test_validate_apartment_number_rejects_invalid() {
        assert!(validate_apartment_number("").is_err());
        assert!(validate_apartment_number("-12").is_err());
        assert!(validate_apartment_number("12345678901").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Dana@Example.COM "), "dana@example.com");
    }

    #[test]
    fn test_normalize_email_is_idempotent() {
        use fake::{faker::internet::en::SafeEmail, Fake};

        for _ in 0..20 {
            let email: String = SafeEmail().fake();
            let once = normalize_email(&format!(" {} ", email.to_uppercase()));
            assert_eq!(once, email.to_lowercase());
            assert_eq!(normalize_email(&once), once);
        }
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" 052 ")), Some("052".to_string()));
    }
}
