//! Products module: catalog product aggregate and stock management.
//!
//! Stock changes go through [`ProductInventoryUpdateService`], which performs a
//! single optimistic-locked attempt, and [`ProductInventoryFacade`], which
//! retries that attempt for as long as it keeps losing version races.

pub mod facade;
pub mod inventory;
pub mod product;
pub mod repository;

pub use facade::{
    Backoff, ExponentialBackoff, FixedBackoff, InterruptHandle, InventoryRetryError, NoBackoff,
    ProductInventoryFacade,
};
pub use inventory::{
    InventoryError, ProductInventoryUpdateCommand, ProductInventoryUpdateService,
    ProductInventoryUpdateUseCase, StockOperationType,
};
pub use product::{Product, ProductOption, ProductStatus};
pub use repository::{ProductRepository, ProductRepositoryError};
