use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use commerce_core::{DomainError, DomainResult, OrderId, ProductOptionId, ValueObject};

/// Units of one order line, 1..=999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 999;

    pub fn new(value: u32) -> DomainResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::validation(format!(
                "quantity must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl ValueObject for Quantity {}

impl TryFrom<u32> for Quantity {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Human-facing order number: `ORD-<yyyyMMdd>-<order id>`.
///
/// Embedding the Snowflake order id keeps numbers unique without a separate
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    const PREFIX: &'static str = "ORD-";

    pub fn generate(ordered_at: DateTime<Utc>, order_id: OrderId) -> Self {
        Self(format!(
            "{}{}-{}",
            Self::PREFIX,
            ordered_at.format("%Y%m%d"),
            order_id
        ))
    }

    pub fn parse(value: &str) -> DomainResult<Self> {
        let invalid = || DomainError::validation(format!("invalid order number: {value:?}"));

        let rest = value.strip_prefix(Self::PREFIX).ok_or_else(invalid)?;
        let (date, id) = rest.split_once('-').ok_or_else(invalid)?;

        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if chrono::NaiveDate::parse_from_str(date, "%Y%m%d").is_err() {
            return Err(invalid());
        }
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        OrderId::from_str(id).map_err(|_| invalid())?;

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for OrderNumber {}

impl TryFrom<String> for OrderNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.0
    }
}

impl FromStr for OrderNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim())
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of the option chosen for an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: ProductOptionId,
    pub name: String,
}

impl ValueObject for ProductOption {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    VirtualAccount,
    MobilePayment,
}

impl PaymentMethod {
    /// Whether payment is confirmed while the order is being placed.
    ///
    /// Virtual-account payments settle later, when the deposit arrives.
    pub fn is_synchronous(&self) -> bool {
        !matches!(self, PaymentMethod::VirtualAccount)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::VirtualAccount => "VIRTUAL_ACCOUNT",
            PaymentMethod::MobilePayment => "MOBILE_PAYMENT",
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREDIT_CARD" => Ok(PaymentMethod::CreditCard),
            "BANK_TRANSFER" => Ok(PaymentMethod::BankTransfer),
            "VIRTUAL_ACCOUNT" => Ok(PaymentMethod::VirtualAccount),
            "MOBILE_PAYMENT" => Ok(PaymentMethod::MobilePayment),
            other => Err(DomainError::validation(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}
