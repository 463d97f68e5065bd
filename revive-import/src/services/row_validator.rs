//! Field rules for a single candidate row
//!
//! All rules run independently; every violation is reported, in rule order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::LeadFields;

/// Structural email shape: `local@domain.tld`, no whitespace or extra `@`.
///
/// Not RFC 5322 validation.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

pub const FIRST_NAME_REQUIRED: &str = "First name is required";
pub const LAST_NAME_REQUIRED: &str = "Last name is required";
pub const EMAIL_REQUIRED: &str = "Email is required";
pub const EMAIL_INVALID: &str = "Invalid email format";

/// Validate one row, returning its errors (empty when valid)
pub fn validate(fields: &LeadFields) -> Vec<String> {
    let mut errors = Vec::new();

    if fields.first_name.trim().is_empty() {
        errors.push(FIRST_NAME_REQUIRED.to_string());
    }

    if fields.last_name.trim().is_empty() {
        errors.push(LAST_NAME_REQUIRED.to_string());
    }

    let email = fields.email.trim();
    if email.is_empty() {
        errors.push(EMAIL_REQUIRED.to_string());
    } else if !is_valid_email(email) {
        errors.push(EMAIL_INVALID.to_string());
    }

    errors
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(first: &str, last: &str, email: &str) -> LeadFields {
        LeadFields {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_row() {
        assert!(validate(&fields("John", "Doe", "john@example.com")).is_empty());
    }

    #[test]
    fn test_errors_collected_in_rule_order() {
        assert_eq!(
            validate(&fields("", "Doe", "bad-email")),
            vec![FIRST_NAME_REQUIRED, EMAIL_INVALID]
        );
        assert_eq!(
            validate(&fields("  ", " ", "")),
            vec![FIRST_NAME_REQUIRED, LAST_NAME_REQUIRED, EMAIL_REQUIRED]
        );
    }

    #[test]
    fn test_missing_email_is_not_also_invalid() {
        assert_eq!(validate(&fields("John", "Doe", "   ")), vec![EMAIL_REQUIRED]);
    }

    #[test]
    fn test_email_shape() {
        for ok in ["a@b.co", "john.doe+tag@mail.example.org", "x@y.z", "ünï@cödé.de"] {
            assert!(is_valid_email(ok), "{} should pass", ok);
        }
        for bad in ["plain", "a@b", "@b.com", "a@.com", "a@b.", "a b@c.com", "a@b@c.com", "a@b .com"] {
            assert!(!is_valid_email(bad), "{} should fail", bad);
        }
    }
}
