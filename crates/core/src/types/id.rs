//! Newtype IDs for type-safe entity references.
//!
//! WooCommerce identifies every resource with a positive integer. Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing IDs
//! from different entity types (an order id where a line item id is expected).

use thiserror::Error;

/// Error returned when a string is not a valid WooCommerce resource id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input is empty or contains something other than ASCII digits.
    #[error("not a numeric id: {0:?}")]
    NotNumeric(String),
    /// Zero is never assigned by WooCommerce.
    #[error("id must be greater than zero")]
    Zero,
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `u64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_u64()`, `parse()`
/// - `From<u64>`, `Into<u64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use osun_core::define_id;
/// define_id!(CouponId);
/// define_id!(ShippingZoneId);
///
/// let coupon = CouponId::new(1);
/// let zone: ShippingZoneId = "42".parse().unwrap();
///
/// // These are different types, so this won't compile:
/// // let _: CouponId = zone;
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
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create a new ID from a u64 value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the underlying u64 value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            /// Parse an ID from a path segment or header value.
            ///
            /// Only plain ASCII digits are accepted (no sign, no whitespace) and
            /// zero is rejected.
            ///
            /// # Errors
            ///
            /// Returns [`IdError`]($crate::types::id::IdError) when the input is
            /// not a positive integer.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err($crate::types::id::IdError::NotNumeric(s.to_owned()));
                }
                let id = s
                    .parse::<u64>()
                    .map_err(|_| $crate::types::id::IdError::NotNumeric(s.to_owned()))?;
                if id == 0 {
                    return Err($crate::types::id::IdError::Zero);
                }
                Ok(Self(id))
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
                Self::parse(s)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// WooCommerce resource IDs
define_id!(OrderId);
define_id!(LineItemId);
define_id!(CustomerId);
define_id!(RefundId);
define_id!(ProductId);
