use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use commerce_core::{AggregateRoot, DomainError, DomainResult, ProductId, ProductOptionId};

/// Product sale status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    OnSale,
    SoldOut,
    Suspended,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: ProductOptionId,
    pub name: String,
    /// Price in the smallest currency unit.
    pub price: u64,
    /// Per-unit discount, never above `price`.
    pub discount_price: u64,
    pub available: bool,
}

/// Aggregate root: Product.
///
/// Stock is tracked at product level; `version` is the optimistic-lock stamp
/// compared by the repository on every save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    price: u64,
    discount_price: u64,
    options: Vec<ProductOption>,
    stock: u32,
    status: ProductStatus,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a new, not-yet-persisted product.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: u64,
        stock: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            price,
            discount_price: 0,
            options: Vec::new(),
            stock,
            status: if stock == 0 {
                ProductStatus::SoldOut
            } else {
                ProductStatus::OnSale
            },
            version: 0,
            updated_at: now,
        })
    }

    pub fn with_discount(mut self, discount_price: u64) -> DomainResult<Self> {
        if discount_price > self.price {
            return Err(DomainError::validation(
                "discount per unit cannot exceed unit price",
            ));
        }
        self.discount_price = discount_price;
        Ok(self)
    }

    pub fn with_option(mut self, option: ProductOption) -> DomainResult<Self> {
        if option.discount_price > option.price {
            return Err(DomainError::validation(
                "option discount per unit cannot exceed option price",
            ));
        }
        if self.options.iter().any(|o| o.id == option.id) {
            return Err(DomainError::conflict(format!(
                "option {} already exists on product {}",
                option.id, self.id
            )));
        }
        self.options.push(option);
        Ok(self)
    }

    pub fn product_id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn discount_price(&self) -> u64 {
        self.discount_price
    }

    pub fn options(&self) -> &[ProductOption] {
        &self.options
    }

    pub fn option(&self, option_id: ProductOptionId) -> Option<&ProductOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `quantity` units can currently be sold.
    pub fn is_available(&self, quantity: u32) -> bool {
        self.status == ProductStatus::OnSale && self.stock >= quantity
    }

    pub fn increase_stock(&mut self, quantity: u32, now: DateTime<Utc>) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("stock increase must be positive"));
        }
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("stock overflow"))?;
        if self.status == ProductStatus::SoldOut {
            self.status = ProductStatus::OnSale;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn decrease_stock(&mut self, quantity: u32, now: DateTime<Utc>) -> DomainResult<()> {
        if quantity == 0 {
            return Err(DomainError::validation("stock decrease must be positive"));
        }
        if quantity > self.stock {
            return Err(DomainError::invariant(format!(
                "insufficient stock: requested {quantity}, available {}",
                self.stock
            )));
        }
        self.stock -= quantity;
        if self.stock == 0 && self.status == ProductStatus::OnSale {
            self.status = ProductStatus::SoldOut;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn suspend(&mut self, now: DateTime<Utc>) {
        self.status = ProductStatus::Suspended;
        self.updated_at = now;
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        self.status = if self.stock == 0 {
            ProductStatus::SoldOut
        } else {
            ProductStatus::OnSale
        };
        self.updated_at = now;
    }

    /// Version stamp assigned by the repository after a successful save.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
