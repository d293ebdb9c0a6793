//! Input/output shapes of the order use cases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use commerce_core::{DomainError, DomainResult, Entity, MemberId, ProductId, ProductOptionId};

use crate::item::OrderItem;
use crate::order::Order;
use crate::shipping::ShippingAddress;
use crate::status::{OrderItemStatus, OrderStatus};
use crate::values::{PaymentMethod, Quantity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub recipient_name: String,
    pub phone_number: String,
    pub address_code: String,
    pub address: String,
    #[serde(default)]
    pub address_detail: String,
    #[serde(default)]
    pub delivery_request: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemCommand {
    pub product_id: i64,
    #[serde(default)]
    pub product_option_id: Option<i64>,
    pub quantity: u32,
}

/// Command: place an order for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderCommand {
    pub member_id: i64,
    pub shipping_info: ShippingInfo,
    pub order_items: Vec<OrderItemCommand>,
    pub payment_method: PaymentMethod,
}

/// A command line after shape validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub option_id: Option<ProductOptionId>,
    pub quantity: Quantity,
}

/// [`PlaceOrderCommand`] with every field parsed into its domain type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPlaceOrder {
    pub member_id: MemberId,
    pub shipping_address: ShippingAddress,
    pub lines: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
}

impl PlaceOrderCommand {
    /// Check the command shape before any side effect takes place.
    pub fn validate(&self) -> DomainResult<ValidatedPlaceOrder> {
        let member_id = MemberId::try_new(self.member_id)?;

        if self.order_items.is_empty() {
            return Err(DomainError::validation("order must have at least one item"));
        }

        let lines = self
            .order_items
            .iter()
            .map(|line| -> DomainResult<OrderLine> {
                Ok(OrderLine {
                    product_id: ProductId::try_new(line.product_id)?,
                    option_id: line.product_option_id.map(ProductOptionId::try_new).transpose()?,
                    quantity: Quantity::new(line.quantity)?,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        let info = &self.shipping_info;
        let shipping_address = ShippingAddress::new(
            info.recipient_name.as_str(),
            info.phone_number.as_str(),
            info.address_code.as_str(),
            info.address.as_str(),
            info.address_detail.as_str(),
            info.delivery_request.clone(),
        )?;

        Ok(ValidatedPlaceOrder {
            member_id,
            shipping_address,
            lines,
            payment_method: self.payment_method,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddressResult {
    pub recipient_name: String,
    pub phone_number: String,
    pub full_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemResult {
    pub order_item_id: i64,
    pub product_id: i64,
    pub product_option_id: Option<i64>,
    pub product_name: String,
    pub unit_price: u64,
    pub unit_discount: u64,
    pub quantity: u32,
    pub subtotal: u64,
    pub status: OrderItemStatus,
}

/// Result of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: i64,
    pub order_number: String,
    pub member_id: i64,
    pub original_amount: u64,
    pub discount_amount: u64,
    pub total_amount: u64,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddressResult,
    pub order_items: Vec<OrderItemResult>,
    pub ordered_at: DateTime<Utc>,
}

impl From<&OrderItem> for OrderItemResult {
    fn from(item: &OrderItem) -> Self {
        Self {
            order_item_id: item.id().value(),
            product_id: item.product_id().value(),
            product_option_id: item.option().map(|o| o.id.value()),
            product_name: item.product_name().to_string(),
            unit_price: item.unit_price().amount(),
            unit_discount: item.unit_discount().amount(),
            quantity: item.quantity().value(),
            subtotal: item.total_price().amount(),
            status: item.status(),
        }
    }
}

impl From<&Order> for OrderResult {
    fn from(order: &Order) -> Self {
        let address = order.shipping_address();
        Self {
            order_id: order.order_id().value(),
            order_number: order.order_number().to_string(),
            member_id: order.member_id().value(),
            original_amount: order.original_amount().amount(),
            discount_amount: order.discount_amount().amount(),
            total_amount: order.total_amount().amount(),
            status: order.status(),
            shipping_address: ShippingAddressResult {
                recipient_name: address.recipient_name().to_string(),
                phone_number: address.phone_number().to_string(),
                full_address: address.full_address(),
            },
            order_items: order.items().iter().map(OrderItemResult::from).collect(),
            ordered_at: order.ordered_at(),
        }
    }
}
