//! Recipient validation and address construction

use crate::error::ValidationError;

/// Check that a raw recipient is a syntactically numeric identifier.
///
/// Valid iff the string parses as a base-10 float. Signed, fractional and
/// special forms pass; the loose contract is observable behavior and must
/// not be tightened.
pub fn validate_recipient(raw: &str) -> Result<&str, ValidationError> {
    if raw.parse::<f64>().is_ok() {
        Ok(raw)
    } else {
        Err(ValidationError::NonNumericRecipient)
    }
}

/// Fully qualify a numeric recipient for the messaging network
pub fn recipient_address(number: &str, domain: &str) -> String {
    format!("{}@{}", number, domain)
}
