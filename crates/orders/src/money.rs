use serde::{Deserialize, Serialize};

use commerce_core::{DomainError, DomainResult, ValueObject};

use crate::values::Quantity;

/// Non-negative amount in the smallest currency unit.
///
/// KRW has no minor unit, so one unit is one won. All arithmetic is checked:
/// overflow and results below zero are validation errors, never wrap-around.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("money overflow"))
    }

    pub fn checked_sub(self, other: Money) -> DomainResult<Money> {
        self.0.checked_sub(other.0).map(Money).ok_or_else(|| {
            DomainError::validation(format!("money cannot be negative ({self} - {other})"))
        })
    }

    pub fn times(self, quantity: Quantity) -> DomainResult<Money> {
        self.0
            .checked_mul(u64::from(quantity.value()))
            .map(Money)
            .ok_or_else(|| DomainError::validation("money overflow"))
    }

    /// Checked sum of an iterator of amounts.
    pub fn sum<I: IntoIterator<Item = Money>>(amounts: I) -> DomainResult<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} KRW", self.0)
    }
}

impl From<u64> for Money {
    fn from(value: u64) -> Self {
        Money(value)
    }
}
