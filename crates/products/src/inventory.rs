//! Single-attempt stock adjustment.
//!
//! The service loads the product, applies the change in memory and saves it
//! with the version it was loaded at. Losing a version race surfaces as
//! [`InventoryError::StockConflict`], the only error worth retrying.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use commerce_core::{DomainError, ProductId};

use crate::product::Product;
use crate::repository::{ProductRepository, ProductRepositoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockOperationType {
    Increase,
    Decrease,
}

/// Command to adjust one product's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInventoryUpdateCommand {
    product_id: ProductId,
    operation: StockOperationType,
    quantity: u32,
}

impl ProductInventoryUpdateCommand {
    pub fn new(
        product_id: ProductId,
        operation: StockOperationType,
        quantity: u32,
    ) -> Result<Self, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::Validation(DomainError::validation(
                "stock adjustment quantity must be positive",
            )));
        }
        Ok(Self {
            product_id,
            operation,
            quantity,
        })
    }

    pub fn increase(product_id: ProductId, quantity: u32) -> Result<Self, InventoryError> {
        Self::new(product_id, StockOperationType::Increase, quantity)
    }

    pub fn decrease(product_id: ProductId, quantity: u32) -> Result<Self, InventoryError> {
        Self::new(product_id, StockOperationType::Decrease, quantity)
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn operation(&self) -> StockOperationType {
        self.operation
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("stock conflict on product {product_id}: {message}")]
    StockConflict {
        product_id: ProductId,
        message: String,
    },

    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    #[error(transparent)]
    Validation(DomainError),

    #[error("product repository failure: {0}")]
    Repository(String),
}

impl InventoryError {
    pub fn code(&self) -> &'static str {
        match self {
            InventoryError::ProductNotFound(_) => "product_not_found",
            InventoryError::StockConflict { .. } => "stock_conflict",
            InventoryError::InsufficientStock { .. } => "insufficient_stock",
            InventoryError::Validation(_) => "validation_error",
            InventoryError::Repository(_) => "repository_error",
        }
    }

    /// Only optimistic-lock conflicts are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::StockConflict { .. })
    }
}

impl From<DomainError> for InventoryError {
    fn from(value: DomainError) -> Self {
        InventoryError::Validation(value)
    }
}

/// Input port: apply one stock adjustment, once.
pub trait ProductInventoryUpdateUseCase: Send + Sync {
    fn update_stock(&self, cmd: &ProductInventoryUpdateCommand) -> Result<Product, InventoryError>;
}

impl<U> ProductInventoryUpdateUseCase for std::sync::Arc<U>
where
    U: ProductInventoryUpdateUseCase + ?Sized,
{
    fn update_stock(&self, cmd: &ProductInventoryUpdateCommand) -> Result<Product, InventoryError> {
        (**self).update_stock(cmd)
    }
}

#[derive(Debug)]
pub struct ProductInventoryUpdateService<R> {
    repository: R,
}

impl<R: ProductRepository> ProductInventoryUpdateService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

impl<R: ProductRepository> ProductInventoryUpdateUseCase for ProductInventoryUpdateService<R> {
    fn update_stock(&self, cmd: &ProductInventoryUpdateCommand) -> Result<Product, InventoryError> {
        let product_id = cmd.product_id();
        let mut product = self
            .repository
            .find_by_id(product_id)
            .map_err(repository_error)?
            .ok_or(InventoryError::ProductNotFound(product_id))?;

        let now = Utc::now();
        match cmd.operation() {
            StockOperationType::Increase => product.increase_stock(cmd.quantity(), now)?,
            StockOperationType::Decrease => {
                if product.stock() < cmd.quantity() {
                    return Err(InventoryError::InsufficientStock {
                        product_id,
                        requested: cmd.quantity(),
                        available: product.stock(),
                    });
                }
                product.decrease_stock(cmd.quantity(), now)?;
            }
        }

        match self.repository.save(&product) {
            Ok(saved) => {
                tracing::debug!(
                    product_id = %product_id,
                    operation = ?cmd.operation(),
                    quantity = cmd.quantity(),
                    stock = saved.stock(),
                    version = commerce_core::AggregateRoot::version(&saved),
                    "stock updated"
                );
                Ok(saved)
            }
            Err(ProductRepositoryError::VersionConflict {
                expected, actual, ..
            }) => {
                tracing::warn!(
                    product_id = %product_id,
                    quantity = cmd.quantity(),
                    expected_version = expected,
                    actual_version = actual,
                    "stock update lost an optimistic-lock race"
                );
                Err(InventoryError::StockConflict {
                    product_id,
                    message: format!(
                        "product changed concurrently (expected version {expected}, found {actual})"
                    ),
                })
            }
            Err(other) => Err(repository_error(other)),
        }
    }
}

fn repository_error(err: ProductRepositoryError) -> InventoryError {
    InventoryError::Repository(err.to_string())
}
