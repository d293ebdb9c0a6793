use serde::{Deserialize, Serialize};

use commerce_core::{DomainError, DomainResult, ValueObject};

/// Delivery destination of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    recipient_name: String,
    phone_number: String,
    address_code: String,
    address: String,
    address_detail: String,
    delivery_request: Option<String>,
}

impl ShippingAddress {
    pub fn new(
        recipient_name: impl Into<String>,
        phone_number: impl Into<String>,
        address_code: impl Into<String>,
        address: impl Into<String>,
        address_detail: impl Into<String>,
        delivery_request: Option<String>,
    ) -> DomainResult<Self> {
        let address = Self {
            recipient_name: recipient_name.into().trim().to_string(),
            phone_number: phone_number.into().trim().to_string(),
            address_code: address_code.into().trim().to_string(),
            address: address.into().trim().to_string(),
            address_detail: address_detail.into().trim().to_string(),
            delivery_request: delivery_request
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
        };
        address.validate()?;
        Ok(address)
    }

    fn validate(&self) -> DomainResult<()> {
        require(&self.recipient_name, "recipient name")?;
        require(&self.phone_number, "phone number")?;
        require(&self.address_code, "zip code")?;
        require(&self.address, "address")?;

        // Mobile numbers: 010-1234-5678, 01012345678, 011-123-4567 ...
        let digits: String = self
            .phone_number
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        let well_formed = digits.starts_with("01")
            && (10..=11).contains(&digits.len())
            && self
                .phone_number
                .chars()
                .all(|c| c.is_ascii_digit() || c == '-' || c == ' ');
        if !well_formed {
            return Err(DomainError::validation(format!(
                "invalid phone number: {}",
                self.phone_number
            )));
        }

        if self.address_code.len() != 5 || !self.address_code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "invalid zip code: {}",
                self.address_code
            )));
        }

        Ok(())
    }

    pub fn recipient_name(&self) -> &str {
        &self.recipient_name
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn address_code(&self) -> &str {
        &self.address_code
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn address_detail(&self) -> &str {
        &self.address_detail
    }

    pub fn delivery_request(&self) -> Option<&str> {
        self.delivery_request.as_deref()
    }

    /// `[zip] address detail`, omitting an empty detail.
    pub fn full_address(&self) -> String {
        if self.address_detail.is_empty() {
            format!("[{}] {}", self.address_code, self.address)
        } else {
            format!(
                "[{}] {} {}",
                self.address_code, self.address, self.address_detail
            )
        }
    }
}

impl ValueObject for ShippingAddress {}

fn require(value: &str, field: &str) -> DomainResult<()> {
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}
