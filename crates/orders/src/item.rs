use serde::{Deserialize, Serialize};

use commerce_core::{DomainError, DomainResult, Entity, OrderItemId, ProductId};

use crate::money::Money;
use crate::status::OrderItemStatus;
use crate::values::{ProductOption, Quantity};

/// Product data frozen into an order line at placement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub product_id: ProductId,
    pub product_name: String,
    pub option: Option<ProductOption>,
    pub unit_price: Money,
    /// Discount per unit, never above `unit_price`.
    pub unit_discount: Money,
    pub quantity: Quantity,
}

/// Entity: one line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    id: OrderItemId,
    product_id: ProductId,
    product_name: String,
    option: Option<ProductOption>,
    unit_price: Money,
    unit_discount: Money,
    quantity: Quantity,
    total_price: Money,
    status: OrderItemStatus,
}

impl OrderItem {
    pub fn new(id: OrderItemId, snapshot: ItemSnapshot) -> DomainResult<Self> {
        if snapshot.product_name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if snapshot.unit_discount > snapshot.unit_price {
            return Err(DomainError::validation(format!(
                "discount per unit ({}) cannot exceed unit price ({})",
                snapshot.unit_discount, snapshot.unit_price
            )));
        }

        let total_price = snapshot
            .unit_price
            .checked_sub(snapshot.unit_discount)?
            .times(snapshot.quantity)?;

        Ok(Self {
            id,
            product_id: snapshot.product_id,
            product_name: snapshot.product_name,
            option: snapshot.option,
            unit_price: snapshot.unit_price,
            unit_discount: snapshot.unit_discount,
            quantity: snapshot.quantity,
            total_price,
            status: OrderItemStatus::Pending,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn option(&self) -> Option<&ProductOption> {
        self.option.as_ref()
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn unit_discount(&self) -> Money {
        self.unit_discount
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// (unit price - unit discount) x quantity.
    pub fn total_price(&self) -> Money {
        self.total_price
    }

    /// unit price x quantity.
    pub fn original_amount(&self) -> DomainResult<Money> {
        self.unit_price.times(self.quantity)
    }

    /// unit discount x quantity.
    pub fn discount_amount(&self) -> DomainResult<Money> {
        self.unit_discount.times(self.quantity)
    }

    pub fn status(&self) -> OrderItemStatus {
        self.status
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OrderItemStatus::Cancelled
    }

    pub(crate) fn confirm_payment(&mut self) -> DomainResult<()> {
        self.advance(OrderItemStatus::Pending, OrderItemStatus::Confirmed)
    }

    pub(crate) fn start_preparing(&mut self) -> DomainResult<()> {
        self.advance(OrderItemStatus::Confirmed, OrderItemStatus::Preparing)
    }

    pub(crate) fn start_shipping(&mut self) -> DomainResult<()> {
        self.advance(OrderItemStatus::Preparing, OrderItemStatus::Shipping)
    }

    pub(crate) fn complete_delivery(&mut self) -> DomainResult<()> {
        self.advance(OrderItemStatus::Shipping, OrderItemStatus::Delivered)
    }

    pub(crate) fn refund(&mut self) -> DomainResult<()> {
        self.advance(OrderItemStatus::Delivered, OrderItemStatus::Refunded)
    }

    pub(crate) fn cancel(&mut self) -> DomainResult<()> {
        if !self.status.is_cancellable() {
            return Err(DomainError::invariant(format!(
                "order item {} cannot be cancelled in status {}",
                self.id, self.status
            )));
        }
        self.status = OrderItemStatus::Cancelled;
        Ok(())
    }

    fn advance(&mut self, from: OrderItemStatus, to: OrderItemStatus) -> DomainResult<()> {
        if self.status != from {
            return Err(DomainError::invariant(format!(
                "order item {} cannot move to {to} from {}",
                self.id, self.status
            )));
        }
        self.status = to;
        Ok(())
    }
}

impl Entity for OrderItem {
    type Id = OrderItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
