//! `commerce-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the order and
//! product modules: errors, typed identifiers, the Snowflake id generator and
//! the aggregate/entity/value-object vocabulary.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod snowflake;
pub mod value_object;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{MemberId, OrderId, OrderItemId, PaymentId, ProductId, ProductOptionId};
pub use snowflake::{
    Clock, IdGenerationError, IdGenerator, SnowflakeIdGenerator, SnowflakeParts, SystemClock,
};
pub use value_object::ValueObject;
