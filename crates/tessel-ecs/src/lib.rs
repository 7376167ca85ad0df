//! Tessel ECS -- sparse-set component storage.
//!
//! Entities are plain `(id, store)` handles. Components of each Rust type live
//! in their own [`ComponentPool`](pool::ComponentPool): a dense array of
//! `(owner, value)` records plus an index from entity id to array position.
//! Adding, fetching and removing a component are O(1); iterating a type walks
//! one contiguous slice.
//!
//! # Quick Start
//!
//! ```
//! use tessel_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut store = Store::new();
//! let entity = store.new_entity();
//! store.add_component(entity, Position { x: 0.0, y: 0.0 }).unwrap();
//! store.add_component(entity, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
//!
//! let dx = store.get_component::<Velocity>(entity).unwrap().dx;
//! for (_owner, pos) in store.all_components_mut::<Position>() {
//!     pos.x += dx;
//! }
//!
//! assert_eq!(store.get_component::<Position>(entity), Ok(&Position { x: 1.0, y: 0.0 }));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod pool;
pub mod registry;
pub mod store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The handle is the null sentinel or its entity has been removed.
    #[error("entity {entity} is not live (null handle or already removed)")]
    EntityNotLive { entity: entity::Entity },

    /// The handle was issued by a different store.
    #[error("entity {entity} belongs to another store (this store is {store})")]
    ForeignStore {
        entity: entity::Entity,
        store: entity::StoreId,
    },

    /// The entity is live but has no component of the requested type.
    #[error("entity {entity} has no '{component}' component")]
    ComponentNotFound {
        entity: entity::Entity,
        component: &'static str,
    },
}

impl EcsError {
    pub(crate) fn component_not_found<T: 'static>(entity: entity::Entity) -> Self {
        EcsError::ComponentNotFound {
            entity,
            component: std::any::type_name::<T>(),
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentInfo, ComponentTypeId};
    pub use crate::entity::{Entity, EntityRegistry, StoreId};
    pub use crate::pool::{
        ComponentPool, ComponentsMut, ConfigError, ErasedPool, PoolConfig, MAX_POOL_FACTOR,
    };
    pub use crate::registry::PoolRegistry;
    pub use crate::store::Store;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::prelude::*;

    // -- test component types -----------------------------------------------

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        num: i32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    // -- identity -----------------------------------------------------------

    #[test]
    fn entity_ids_unique_and_never_zero() {
        let mut store = Store::new();
        let entities: Vec<Entity> = (0..10).map(|_| store.new_entity()).collect();
        for (i, a) in entities.iter().enumerate() {
            assert_ne!(a.id(), 0);
            for (j, b) in entities.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b);
                }
            }
        }
    }

    // -- add / get / remove -------------------------------------------------

    #[test]
    fn two_types_on_one_entity() {
        let mut store = Store::new();
        let e = store.new_entity();
        store.add_component(e, Position { num: 10 }).unwrap();
        store.add_component(e, Health(21)).unwrap();

        assert_eq!(store.get_component::<Position>(e).unwrap().num, 10);
        assert_eq!(store.get_component::<Health>(e).unwrap().0, 21);

        store.remove_component::<Position>(e).unwrap();
        store.remove_component::<Health>(e).unwrap();

        assert!(store.get_component::<Position>(e).is_err());
        assert!(store.get_component::<Health>(e).is_err());
        assert!(store.is_alive(e));
    }

    #[test]
    fn many_entities_add_get_remove() {
        let mut store = Store::new();
        let entities: Vec<Entity> = (0..5).map(|_| store.new_entity()).collect();
        for (n, &e) in entities.iter().enumerate() {
            store.add_component(e, Position { num: n as i32 }).unwrap();
        }
        for (n, &e) in entities.iter().enumerate() {
            assert_eq!(store.get_component::<Position>(e).unwrap().num, n as i32);
        }
        for &e in &entities {
            store.remove_component::<Position>(e).unwrap();
        }
        for &e in &entities {
            assert!(store.get_component::<Position>(e).is_err());
        }
        assert!(store.all_components::<Position>().is_empty());
    }

    #[test]
    fn overwrite_keeps_single_record() {
        let mut store = Store::new();
        let e = store.new_entity();
        store.add_component(e, Health(1)).unwrap();
        store.add_component(e, Health(2)).unwrap();
        let all = store.all_components::<Health>();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].entity(), e);
        assert_eq!(all[0].value(), &Health(2));
    }

    // -- scenarios ----------------------------------------------------------

    #[test]
    fn remove_middle_entity_leaves_the_rest() {
        let mut store = Store::new();
        let entities: Vec<Entity> = (0..5).map(|_| store.new_entity()).collect();
        for (i, &e) in entities.iter().enumerate() {
            store.add_component(e, Position { num: i as i32 }).unwrap();
        }

        store.remove_entity(entities[2]).unwrap();

        let all = store.all_components::<Position>();
        assert_eq!(all.len(), 4);
        let nums: HashSet<i32> = all.iter().map(|c| c.value().num).collect();
        assert_eq!(nums, HashSet::from([0, 1, 3, 4]));
        for c in all {
            assert_ne!(c.entity(), entities[2]);
        }
        assert!(store.get_component::<Position>(entities[2]).is_err());
    }

    #[test]
    fn grow_then_shrink_keeps_survivor() {
        let mut store = Store::new();
        let entities: Vec<Entity> = (0..1000).map(|_| store.new_entity()).collect();
        for (i, &e) in entities.iter().enumerate() {
            store.add_component(e, Position { num: i as i32 }).unwrap();
        }
        for &e in &entities[..999] {
            store.remove_component::<Position>(e).unwrap();
        }

        let pool = store.pool::<Position>().unwrap();
        assert_eq!(pool.len(), 1);
        assert!(pool.capacity() < 1000);
        pool.assert_consistent();

        let late = store.new_entity();
        store.add_component(late, Position { num: -1 }).unwrap();
        assert_eq!(store.get_component::<Position>(entities[999]).unwrap().num, 999);
        assert_eq!(store.get_component::<Position>(late).unwrap().num, -1);
        assert_eq!(store.all_components::<Position>().len(), 2);
    }

    #[test]
    fn entity_removal_cascades_only_to_held_types() {
        let mut store = Store::new();
        let doomed = store.new_entity();
        let bystander = store.new_entity();

        store.add_component(doomed, Position { num: 1 }).unwrap();
        store.add_component(doomed, Health(5)).unwrap();
        store
            .add_component(bystander, Velocity { dx: 1.0, dy: 2.0 })
            .unwrap();
        store.add_component(bystander, Position { num: 2 }).unwrap();

        store.remove_entity(doomed).unwrap();

        assert!(matches!(
            store.get_component::<Position>(doomed),
            Err(EcsError::EntityNotLive { .. })
        ));
        assert!(matches!(
            store.get_component::<Health>(doomed),
            Err(EcsError::EntityNotLive { .. })
        ));
        assert!(store.all_components::<Health>().is_empty());
        assert_eq!(store.pool::<Velocity>().unwrap().len(), 1);
        assert_eq!(
            store.get_component::<Velocity>(bystander),
            Ok(&Velocity { dx: 1.0, dy: 2.0 })
        );
        assert_eq!(store.get_component::<Position>(bystander), Ok(&Position { num: 2 }));
    }

    #[test]
    fn dense_iteration_matches_holders_under_churn() {
        let mut store = Store::new();
        let entities: Vec<Entity> = (0..200).map(|_| store.new_entity()).collect();
        for (i, &e) in entities.iter().enumerate() {
            store.add_component(e, Position { num: i as i32 }).unwrap();
        }
        // Remove every third entity, then re-add to a few survivors.
        for &e in entities.iter().step_by(3) {
            store.remove_entity(e).unwrap();
        }
        for &e in entities.iter().skip(1).step_by(7) {
            if store.is_alive(e) {
                store.add_component(e, Position { num: -7 }).unwrap();
            }
        }

        let expected: HashSet<Entity> = entities
            .iter()
            .copied()
            .filter(|&e| store.is_alive(e))
            .collect();
        let owners: Vec<Entity> = store
            .all_components::<Position>()
            .iter()
            .map(Component::entity)
            .collect();
        let unique: HashSet<Entity> = owners.iter().copied().collect();
        assert_eq!(owners.len(), unique.len(), "no duplicates");
        assert_eq!(unique, expected);
        store.pool::<Position>().unwrap().assert_consistent();
    }

    #[test]
    fn error_messages_name_the_component() {
        let mut store = Store::new();
        let e = store.new_entity();
        let err = store.get_component::<Health>(e).unwrap_err();
        assert!(err.to_string().contains("Health"), "{err}");
    }
}
