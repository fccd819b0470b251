//! Product code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ProductCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductCodeError {
    /// The input is empty or only whitespace.
    #[error("code cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("code must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace after trimming.
    #[error("code cannot contain whitespace")]
    ContainsWhitespace,
}

/// A product's catalog code (SKU).
///
/// Codes are unique across the catalog; the storage layer enforces that.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed
/// - Length: 1-64 characters
/// - No inner whitespace
///
/// ## Examples
///
/// ```
/// use mercado_core::ProductCode;
///
/// assert_eq!(ProductCode::parse("  ABC-123 ").unwrap().as_str(), "ABC-123");
/// assert!(ProductCode::parse("").is_err());
/// assert!(ProductCode::parse("AB 12").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ProductCode(String);

impl ProductCode {
    /// Maximum length of a product code.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `ProductCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than 64
    /// characters, or contains whitespace.
    pub fn parse(s: &str) -> Result<Self, ProductCodeError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ProductCodeError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(ProductCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(ProductCodeError::ContainsWhitespace);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProductCode {
    type Err = ProductCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductCode {
    type Error = ProductCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProductCode> for String {
    fn from(code: ProductCode) -> Self {
        code.0
    }
}

impl AsRef<str> for ProductCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
