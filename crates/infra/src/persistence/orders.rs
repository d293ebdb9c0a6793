use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use commerce_core::{AggregateRoot, ExpectedVersion, MemberId, OrderId};
use commerce_orders::{Order, OrderNumber, OrderRepository, RepositoryError};

#[derive(Debug, Clone)]
struct OrderRow {
    order: Order,
    deleted: bool,
}

/// In-memory order table with optimistic locking and soft delete.
///
/// Intended for tests/dev. Lookups are linear scans.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    rows: RwLock<HashMap<OrderId, OrderRow>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Storage("lock poisoned".to_string())
    }

    /// Clones of the non-deleted orders matching `keep`, oldest first.
    fn select(&self, keep: impl Fn(&Order) -> bool) -> Result<Vec<Order>, RepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        let mut found: Vec<Order> = rows
            .values()
            .filter(|r| !r.deleted && keep(&r.order))
            .map(|r| r.order.clone())
            .collect();
        found.sort_by_key(|o| (o.ordered_at(), o.order_id()));
        Ok(found)
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn save(&self, order: &Order) -> Result<Order, RepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        let order_id = order.order_id();

        let current = match rows.get(&order_id) {
            Some(row) if row.deleted => {
                return Err(RepositoryError::Storage(format!(
                    "order {order_id} has been deleted"
                )));
            }
            Some(row) => row.order.version(),
            None => 0,
        };
        if !ExpectedVersion::Exact(order.version()).matches(current) {
            return Err(RepositoryError::Conflict {
                order_id,
                expected: order.version(),
                actual: current,
            });
        }

        let mut stored = order.clone().with_version(current + 1);
        stored.take_events();
        rows.insert(
            order_id,
            OrderRow {
                order: stored.clone(),
                deleted: false,
            },
        );
        tracing::debug!(order_id = %order_id, version = current + 1, "order saved");
        Ok(stored)
    }

    fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows
            .get(&order_id)
            .filter(|r| !r.deleted)
            .map(|r| r.order.clone()))
    }

    fn find_by_order_number(
        &self,
        order_number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .select(|o| o.order_number() == order_number)?
            .into_iter()
            .next())
    }

    fn find_by_member_id(&self, member_id: MemberId) -> Result<Vec<Order>, RepositoryError> {
        self.select(|o| o.member_id() == member_id)
    }

    fn find_by_ordered_at_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.select(|o| o.ordered_at() >= start && o.ordered_at() < end)
    }

    fn exists_by_id(&self, order_id: OrderId) -> Result<bool, RepositoryError> {
        let rows = self.rows.read().map_err(|_| Self::poisoned())?;
        Ok(rows.get(&order_id).is_some_and(|r| !r.deleted))
    }

    fn delete_by_id(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().map_err(|_| Self::poisoned())?;
        if let Some(row) = rows.get_mut(&order_id) {
            row.deleted = true;
            tracing::debug!(order_id = %order_id, "order soft-deleted");
        }
        Ok(())
    }
}
