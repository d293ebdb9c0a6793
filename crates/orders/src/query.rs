use commerce_core::{DomainError, MemberId, OrderId};

use crate::error::OrderError;
use crate::order::Order;
use crate::ports::OrderRepository;
use crate::values::OrderNumber;

pub trait GetOrderUseCase: Send + Sync {
    fn get_order(&self, order_id: OrderId) -> Result<Order, OrderError>;

    /// Newest first.
    fn get_member_orders(&self, member_id: MemberId) -> Result<Vec<Order>, OrderError>;

    fn get_order_by_number(&self, order_number: &str) -> Result<Order, OrderError>;
}

#[derive(Debug)]
pub struct GetOrderService<R> {
    orders: R,
}

impl<R> GetOrderService<R> {
    pub fn new(orders: R) -> Self {
        Self { orders }
    }
}

impl<R: OrderRepository> GetOrderUseCase for GetOrderService<R> {
    fn get_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .find_by_id(order_id)?
            .ok_or_else(|| DomainError::not_found(format!("order {order_id}")).into())
    }

    fn get_member_orders(&self, member_id: MemberId) -> Result<Vec<Order>, OrderError> {
        let mut orders = self.orders.find_by_member_id(member_id)?;
        orders.sort_by(|a, b| {
            b.ordered_at()
                .cmp(&a.ordered_at())
                .then_with(|| b.order_id().cmp(&a.order_id()))
        });
        Ok(orders)
    }

    fn get_order_by_number(&self, order_number: &str) -> Result<Order, OrderError> {
        let number = OrderNumber::parse(order_number)?;
        self.orders
            .find_by_order_number(&number)?
            .ok_or_else(|| DomainError::not_found(format!("order {number}")).into())
    }
}
