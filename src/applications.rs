//! Shared application-intake logic.
//!
//! Validates the contact details of a rental application before the profile
//! is stored: e-mail shape plus placeholder-pattern rejection, and French
//! phone normalization to E.164.

use crate::db_storage::TenantStorage;
use crate::errors::AppError;
use crate::models::ApplicationRequest;
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use sqlx::PgPool;
use uuid::Uuid;

/// Validate email address
///
/// Checks for:
/// - Basic email format (contains @ and .)
/// - Fake/placeholder patterns (repeated digits like 9999, 1111)
/// - Minimum length requirements
/// - Valid domain structure
pub fn is_valid_email(email: &str) -> bool {
    // Basic checks
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    // Detect fake patterns (repeated digits)
    let fake_patterns = [
        "999999",    // Common fake: 0699999999@gmail.com
        "111111",    // Common fake: 1111111111@
        "000000",    // Common fake: 000000@
        "123456789", // Sequential fake
    ];

    for pattern in &fake_patterns {
        if email.contains(pattern) {
            tracing::warn!(
                "Invalid email detected (fake pattern '{}'): {}",
                pattern,
                email
            );
            return false;
        }
    }

    // RFC 5322 simplified email regex
    // Matches: local@domain.tld
    let email_regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    if !email_regex.is_match(email) {
        tracing::warn!("Invalid email format: {}", email);
        return false;
    }

    true
}

/// Validate and normalize a French phone number
///
/// Uses the phonenumber library (port of Google's libphonenumber) to:
/// - Parse the number with the French region (FR)
/// - Validate it is a valid French number
/// - Return the normalized E.164 format (+33612345678)
///
/// Returns: (is_valid, normalized_phone_or_error_msg)
pub fn validate_fr_phone(raw: &str) -> (bool, String) {
    // Skip empty or very short strings
    if raw.trim().is_empty() || raw.len() < 8 {
        return (false, "Phone too short".to_string());
    }

    // Parse with French country code
    match phonenumber::parse(Some(CountryId::FR), raw) {
        Ok(number) => {
            if phonenumber::is_valid(&number) {
                // Format to E.164 (+33612345678)
                let formatted = number.format().mode(Mode::E164).to_string();
                tracing::debug!("Valid FR phone: {} -> {}", raw, formatted);
                (true, formatted)
            } else {
                tracing::warn!("Invalid FR phone number: {}", raw);
                (false, "Invalid French phone number".to_string())
            }
        }
        Err(e) => {
            tracing::warn!("Failed to parse FR phone '{}': {:?}", raw, e);
            (false, format!("Parse error: {:?}", e))
        }
    }
}

/// Validate an application payload and store the new tenant profile.
///
/// The e-mail must pass shape and fake-pattern checks; the phone, when
/// provided, must be a valid French number and is stored normalized.
pub async fn submit_application(
    pool: &PgPool,
    req: &ApplicationRequest,
) -> Result<Uuid, AppError> {
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "first_name and last_name are required".to_string(),
        ));
    }

    if !is_valid_email(&req.email) {
        return Err(AppError::BadRequest(format!(
            "Invalid email address: {}",
            req.email
        )));
    }

    let normalized_phone = match req.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(phone) => {
            let (valid, normalized) = validate_fr_phone(phone);
            if !valid {
                return Err(AppError::BadRequest(format!(
                    "Invalid phone number: {}",
                    phone
                )));
            }
            Some(normalized)
        }
        None => None,
    };

    let storage = TenantStorage::new(pool.clone());
    storage
        .insert_application(req, normalized_phone.as_deref())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user@example.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
        assert!(is_valid_email("user_name@example-domain.com"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@examplecom"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email(""));
        // Placeholder patterns
        assert!(!is_valid_email("0699999999@gmail.com"));
        assert!(!is_valid_email("test123456789@example.com"));
    }

    #[test]
    fn test_valid_french_phones() {
        let (valid, normalized) = validate_fr_phone("0612345678");
        assert!(valid);
        assert_eq!(normalized, "+33612345678");

        let (valid, normalized) = validate_fr_phone("+33 6 12 34 56 78");
        assert!(valid);
        assert_eq!(normalized, "+33612345678");

        let (valid, normalized) = validate_fr_phone("06 12 34 56 78");
        assert!(valid);
        assert_eq!(normalized, "+33612345678");
    }

    #[test]
    fn test_invalid_phones() {
        let (valid, _) = validate_fr_phone("1234");
        assert!(!valid);

        let (valid, _) = validate_fr_phone("");
        assert!(!valid);

        let (valid, _) = validate_fr_phone("   ");
        assert!(!valid);
    }
}
