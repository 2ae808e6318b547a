//! Phone number type for mobile-money payments.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneNumberError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains a non-digit character.
    #[error("phone number must contain only digits (optionally prefixed with +)")]
    NonDigit,
    /// The number is not in the expected MSISDN format.
    #[error("phone number must be a Kenyan MSISDN in the form 2547XXXXXXXX or 2541XXXXXXXX")]
    BadFormat,
}

/// A payer's phone number in international MSISDN format.
///
/// The M-Pesa Daraja API requires `2547XXXXXXXX` (or `2541XXXXXXXX` for
/// landline-range Safaricom numbers). Common local spellings are normalized
/// on parse:
///
/// - `+2547...` - leading `+` stripped
/// - `07...` / `01...` - local prefix rewritten to `254`
///
/// ## Examples
///
/// ```
/// use duka_core::PhoneNumber;
///
/// assert_eq!(PhoneNumber::parse("0712345678").unwrap().as_str(), "254712345678");
/// assert_eq!(PhoneNumber::parse("+254712345678").unwrap().as_str(), "254712345678");
/// assert!(PhoneNumber::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalize a `PhoneNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains non-digit
    /// characters, or does not normalize to a 12-digit `254`-prefixed
    /// MSISDN.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        let digits = s.strip_prefix('+').unwrap_or(s);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneNumberError::NonDigit);
        }

        // Normalize the local 07XX/01XX spelling to international form.
        let normalized = if let Some(rest) = digits.strip_prefix('0') {
            format!("254{rest}")
        } else {
            digits.to_owned()
        };

        let valid = normalized.len() == 12
            && normalized.starts_with("254")
            && matches!(normalized.as_bytes().get(3), Some(b'7' | b'1'));
        if !valid {
            return Err(PhoneNumberError::BadFormat);
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized MSISDN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PhoneNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
