//! Human-readable return codes (`RTN-XXXXXX`).
//!
//! Codes are printed on return labels and read out over the phone, so they use
//! upper-case ASCII letters and digits only. Generation lives in the storefront
//! (it needs a random source); this type only knows the format.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a [`ReturnCode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReturnCodeError {
    /// Missing the `RTN-` prefix.
    #[error("return code must start with {prefix}")]
    MissingPrefix {
        /// Expected prefix.
        prefix: &'static str,
    },
    /// Suffix has the wrong length or contains characters outside `[A-Z0-9]`.
    #[error("return code suffix must be {len} characters of A-Z or 0-9")]
    InvalidSuffix {
        /// Expected suffix length.
        len: usize,
    },
}

/// A return code such as `RTN-7KQ2ZP`.
///
/// Uniqueness is not checked anywhere: with 36^6 possible suffixes collisions
/// are possible but rare at expected volume.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReturnCode(String);

impl ReturnCode {
    /// Prefix shared by every code.
    pub const PREFIX: &'static str = "RTN-";
    /// Number of random characters after the prefix.
    pub const SUFFIX_LEN: usize = 6;
    /// Characters a suffix may contain.
    pub const ALPHABET: &'static [u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Build a code from a suffix.
    ///
    /// # Errors
    ///
    /// Returns [`ReturnCodeError::InvalidSuffix`] if the suffix is not exactly
    /// six characters of `[A-Z0-9]`.
    pub fn from_suffix(suffix: &str) -> Result<Self, ReturnCodeError> {
        if suffix.len() != Self::SUFFIX_LEN
            || !suffix
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(ReturnCodeError::InvalidSuffix {
                len: Self::SUFFIX_LEN,
            });
        }
        Ok(Self(format!("{}{suffix}", Self::PREFIX)))
    }

    /// Parse a full code such as `RTN-7KQ2ZP`.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix or suffix is malformed.
    pub fn parse(s: &str) -> Result<Self, ReturnCodeError> {
        let suffix = s
            .strip_prefix(Self::PREFIX)
            .ok_or(ReturnCodeError::MissingPrefix {
                prefix: Self::PREFIX,
            })?;
        Self::from_suffix(suffix)
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReturnCode {
    type Error = ReturnCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReturnCode> for String {
    fn from(code: ReturnCode) -> Self {
        code.0
    }
}
