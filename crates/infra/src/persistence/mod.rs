//! In-memory persistence adapters for the order and product ports.

pub mod orders;
pub mod products;

pub use orders::InMemoryOrderRepository;
pub use products::InMemoryProductRepository;
