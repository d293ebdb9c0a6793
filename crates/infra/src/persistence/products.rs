use std::collections::HashMap;
use std::sync::RwLock;

use commerce_core::{AggregateRoot, ExpectedVersion, ProductId};
use commerce_products::{Product, ProductRepository, ProductRepositoryError};

/// In-memory product table. `save` is a compare-and-swap on the version
/// stamp, which gives the inventory service real optimistic locking under
/// concurrent threads.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    rows: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a batch of new products.
    pub fn seed(
        &self,
        products: impl IntoIterator<Item = Product>,
    ) -> Result<(), ProductRepositoryError> {
        for product in products {
            self.save(&product)?;
        }
        Ok(())
    }
}

impl ProductRepository for InMemoryProductRepository {
    fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, ProductRepositoryError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| ProductRepositoryError::Storage("lock poisoned".to_string()))?;
        Ok(rows.get(&id).cloned())
    }

    fn save(&self, product: &Product) -> Result<Product, ProductRepositoryError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| ProductRepositoryError::Storage("lock poisoned".to_string()))?;

        let product_id = product.product_id();
        let current = rows.get(&product_id).map(|p| p.version()).unwrap_or(0);
        if !ExpectedVersion::Exact(product.version()).matches(current) {
            return Err(ProductRepositoryError::VersionConflict {
                product_id,
                expected: product.version(),
                actual: current,
            });
        }

        let stored = product.clone().with_version(current + 1);
        rows.insert(product_id, stored.clone());
        Ok(stored)
    }
}
