//! Form validation errors.
//!
//! Returned before any write is attempted; the caller surfaces them inline.

use thiserror::Error;

/// A rejected form submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more required fields are empty. Carries the form's message.
    #[error("{0}")]
    Required(&'static str),

    /// Numeric input must be strictly positive.
    #[error("Quantity must be a positive number.")]
    NonPositiveQuantity,

    /// Numeric input must not be negative.
    #[error("{0} must not be negative.")]
    Negative(&'static str),

    /// Attempt to use more stock than is available.
    #[error("You cannot use more than the available quantity of {available}.")]
    InsufficientStock { available: u32 },

    /// The email address is not well formed.
    #[error("Please enter a valid email.")]
    InvalidEmail,

    /// The status change is not an allowed transition.
    #[error("cannot move task from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// A date range ends before it starts.
    #[error("The end date must not be before the start date.")]
    InvertedRange,
}

/// Trim and require a non-empty value.
pub(crate) fn require(value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(message))
    } else {
        Ok(())
    }
}

/// Minimal shape check used by the login and add-user forms.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;
    let domain_ok = domain
        .split_once('.')
        .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty());
    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}
