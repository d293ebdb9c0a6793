use chrono::{DateTime, Utc};

/// A domain event payload.
///
/// Events are immutable facts created at the moment of a state transition.
/// Implementors are typically enums with one variant per transition so
/// consumers can match exhaustively.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "order.created").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the transition happened (business time).
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Identifier of the aggregate the event belongs to.
    fn aggregate_id(&self) -> i64;
}
