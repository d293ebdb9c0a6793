//! Strongly-typed identifiers used across the domain.
//!
//! Every identifier wraps a positive `i64`. Aggregate and entity ids are
//! produced by an [`IdGenerator`](crate::snowflake::IdGenerator); member and
//! product ids arrive from other services.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a member (customer account).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(i64);

/// Identifier of an order aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

/// Identifier of a line item inside an order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderItemId(i64);

/// Identifier of a payment recorded against an order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(i64);

/// Identifier of a catalog product.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

/// Identifier of a product option (size, colour, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductOptionId(i64);

macro_rules! impl_i64_newtype {
    ($t:ident, $name:literal) => {
        impl $t {
            /// Wrap a raw value, rejecting zero and negative numbers.
            pub fn try_new(value: i64) -> Result<Self, DomainError> {
                if value <= 0 {
                    return Err(DomainError::invalid_id(format!(
                        "{} must be positive, got {}",
                        $name, value
                    )));
                }
                Ok(Self(value))
            }

            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl TryFrom<i64> for $t {
            type Error = DomainError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::try_new(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Self::try_new(raw)
            }
        }
    };
}

impl_i64_newtype!(MemberId, "MemberId");
impl_i64_newtype!(OrderId, "OrderId");
impl_i64_newtype!(OrderItemId, "OrderItemId");
impl_i64_newtype!(PaymentId, "PaymentId");
impl_i64_newtype!(ProductId, "ProductId");
impl_i64_newtype!(ProductOptionId, "ProductOptionId");
