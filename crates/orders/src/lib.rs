//! Orders module: the `Order` aggregate and the placement, cancellation and
//! query use cases built on top of it.
//!
//! The crate only talks to the outside world through the ports in [`ports`];
//! in-memory and catalog-backed adapters live in `commerce-infra`.

pub mod cancel;
pub mod command;
pub mod compensation;
pub mod error;
pub mod events;
pub mod item;
pub mod money;
pub mod order;
pub mod payment;
pub mod place;
pub mod ports;
pub mod query;
pub mod refund;
pub mod shipping;
pub mod status;
pub mod values;

#[cfg(test)]
mod test_support;

pub use cancel::{CancelOrderService, CancelOrderUseCase, CancellationOutcome};
pub use command::{
    OrderItemCommand, OrderItemResult, OrderLine, OrderResult, PlaceOrderCommand,
    ShippingAddressResult, ShippingInfo, ValidatedPlaceOrder,
};
pub use compensation::{ReleaseFailure, StockLine};
pub use error::OrderError;
pub use events::{
    DomainEvent, ORDER_AGGREGATE_TYPE, OrderCancelled, OrderCreated, OrderEvent,
    OrderItemCancelled, OrderItemRefunded, OrderPaid, OrderRefundRequested,
};
pub use item::{ItemSnapshot, OrderItem};
pub use money::Money;
pub use order::Order;
pub use payment::OrderPayment;
pub use place::{PlaceOrderService, PlaceOrderUseCase};
pub use ports::{
    EventPublisher, OrderRepository, ProductInfo, ProductOptionInfo, ProductService,
    ProductServiceError, PublishError, RepositoryError,
};
pub use query::{GetOrderService, GetOrderUseCase};
pub use refund::{OrderRefund, RefundStatus};
pub use shipping::ShippingAddress;
pub use status::{OrderItemStatus, OrderStatus, PaymentStatus, StatusChange};
pub use values::{OrderNumber, PaymentMethod, ProductOption, Quantity};
