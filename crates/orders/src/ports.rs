//! Output ports of the order module.
//!
//! All ports are synchronous and `Send + Sync`; adapters live in
//! `commerce-infra`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use commerce_core::{MemberId, OrderId, ProductId, ProductOptionId};

use crate::events::DomainEvent;
use crate::money::Money;
use crate::order::Order;
use crate::values::{OrderNumber, Quantity};

/// Read-only product projection served by the product service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub discount_price: Money,
    pub stock_quantity: u32,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOptionInfo {
    pub id: ProductOptionId,
    pub name: String,
    pub price: Money,
    pub discount_price: Money,
    pub stock_quantity: u32,
    pub available: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ProductServiceError {
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("option {option_id} of product {product_id} not found")]
    OptionNotFound {
        product_id: ProductId,
        option_id: ProductOptionId,
    },

    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    #[error("product service unavailable: {0}")]
    Unavailable(String),
}

/// Stock coordination with the product service.
pub trait ProductService: Send + Sync {
    fn check_availability(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<bool, ProductServiceError>;

    fn reserve_stock(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), ProductServiceError>;

    /// Compensating action for [`reserve_stock`](Self::reserve_stock).
    fn release_stock(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), ProductServiceError>;

    fn get_product_info(&self, product_id: ProductId) -> Result<ProductInfo, ProductServiceError>;

    fn get_product_option_info(
        &self,
        product_id: ProductId,
        option_id: ProductOptionId,
    ) -> Result<ProductOptionInfo, ProductServiceError>;
}

impl<S> ProductService for Arc<S>
where
    S: ProductService + ?Sized,
{
    fn check_availability(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<bool, ProductServiceError> {
        (**self).check_availability(product_id, quantity)
    }

    fn reserve_stock(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), ProductServiceError> {
        (**self).reserve_stock(product_id, quantity)
    }

    fn release_stock(
        &self,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<(), ProductServiceError> {
        (**self).release_stock(product_id, quantity)
    }

    fn get_product_info(&self, product_id: ProductId) -> Result<ProductInfo, ProductServiceError> {
        (**self).get_product_info(product_id)
    }

    fn get_product_option_info(
        &self,
        product_id: ProductId,
        option_id: ProductOptionId,
    ) -> Result<ProductOptionInfo, ProductServiceError> {
        (**self).get_product_option_info(product_id, option_id)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Optimistic-lock failure: the stored order moved on since it was loaded.
    #[error("version conflict on order {order_id}: expected {expected}, found {actual}")]
    Conflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    #[error("order storage failure: {0}")]
    Storage(String),
}

/// Order persistence.
///
/// `save` compares `order.version()` with the stored version (0 = new order)
/// and returns the stored copy with the bumped version. Deleted orders are
/// hidden from every query.
pub trait OrderRepository: Send + Sync {
    fn save(&self, order: &Order) -> Result<Order, RepositoryError>;

    fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError>;

    fn find_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError>;

    fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Order>, RepositoryError>;

    /// Orders placed in `[start, end)`.
    fn find_by_ordered_at_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError>;

    fn exists_by_id(&self, order_id: OrderId) -> Result<bool, RepositoryError>;

    /// Soft delete.
    fn delete_by_id(&self, order_id: OrderId) -> Result<(), RepositoryError>;
}

impl<R> OrderRepository for Arc<R>
where
    R: OrderRepository + ?Sized,
{
    fn save(&self, order: &Order) -> Result<Order, RepositoryError> {
        (**self).save(order)
    }

    fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        (**self).find_by_id(order_id)
    }

    fn find_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        (**self).find_by_order_number(order_number)
    }

    fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Order>, RepositoryError> {
        (**self).find_by_member_id(member_id)
    }

    fn find_by_ordered_at_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        (**self).find_by_ordered_at_between(start, end)
    }

    fn exists_by_id(&self, order_id: OrderId) -> Result<bool, RepositoryError> {
        (**self).exists_by_id(order_id)
    }

    fn delete_by_id(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        (**self).delete_by_id(order_id)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("event publication failed: {0}")]
pub struct PublishError(pub String);

pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &DomainEvent) -> Result<(), PublishError>;
}

impl<P> EventPublisher for Arc<P>
where
    P: EventPublisher + ?Sized,
{
    fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        (**self).publish(event)
    }
}
