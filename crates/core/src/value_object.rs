//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects (`Money`, `Quantity`, `ShippingAddress`, ...) have no
/// identity: two instances with the same attributes are the same value. They
/// are immutable; "changing" one means constructing a new value through its
/// validating constructor, so an invalid value can never exist.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
