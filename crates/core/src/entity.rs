//! Entities owned by an aggregate (order items, payments).

/// Entity with an identity that survives state changes.
///
/// Entities live inside an aggregate and are only reachable through its root.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}

/// Locate an entity by identity within an aggregate's child collection.
pub fn find_by_id<'a, E: Entity>(entities: &'a [E], id: &E::Id) -> Option<&'a E> {
    entities.iter().find(|e| e.id() == id)
}

/// Mutable variant of [`find_by_id`].
pub fn find_by_id_mut<'a, E: Entity>(entities: &'a mut [E], id: &E::Id) -> Option<&'a mut E> {
    entities.iter_mut().find(|e| e.id() == id)
}
