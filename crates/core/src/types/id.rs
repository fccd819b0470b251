//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing product and cart IDs.

/// Errors that can occur when parsing an ID from a path segment.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input is not an integer.
    #[error("'{0}' is not a valid id")]
    NotANumber(String),
    /// The input is zero or negative.
    #[error("id must be a positive integer, got {0}")]
    NotPositive(i32),
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `FromStr` accepting positive integers only
/// - `From<i32>` and `Into<i32>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use mercado_core::define_id;
/// define_id!(WishlistId);
///
/// let id: WishlistId = "7".parse().unwrap();
/// assert_eq!(id.as_i32(), 7);
/// assert!("0".parse::<WishlistId>().is_err());
/// assert!("abc".parse::<WishlistId>().is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }

            /// The ID following this one, or `None` at the end of the range.
            #[must_use]
            pub const fn next(&self) -> Option<Self> {
                match self.0.checked_add(1) {
                    Some(id) => Some(Self(id)),
                    None => None,
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                let id = s
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| $crate::types::id::IdError::NotANumber(s.to_owned()))?;
                if id <= 0 {
                    return Err($crate::types::id::IdError::NotPositive(id));
                }
                Ok(Self(id))
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(ProductId);
define_id!(CartId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_id() {
        assert_eq!("42".parse::<ProductId>(), Ok(ProductId::new(42)));
        assert_eq!(" 3 ".parse::<CartId>(), Ok(CartId::new(3)));
    }

    #[test]
    fn test_parse_rejects_garbage_and_non_positive() {
        assert_eq!(
            "abc".parse::<ProductId>(),
            Err(IdError::NotANumber("abc".to_string()))
        );
        assert_eq!("-1".parse::<CartId>(), Err(IdError::NotPositive(-1)));
        assert_eq!("0".parse::<CartId>(), Err(IdError::NotPositive(0)));
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProductId::new(9);
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
        let back: ProductId = serde_json::from_str("9").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_next_stops_at_range_end() {
        assert_eq!(ProductId::new(1).next(), Some(ProductId::new(2)));
        assert_eq!(CartId::new(i32::MAX).next(), None);
    }
}
