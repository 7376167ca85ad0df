//! The [`Store`] is the unit of consistency: it owns the entity registry and
//! every component pool, and all entities that interact must come from it.

use crate::component::{Component, ComponentTypeId};
use crate::entity::{Entity, EntityRegistry, StoreId};
use crate::pool::{ComponentPool, ComponentsMut, PoolConfig};
use crate::registry::PoolRegistry;
use crate::EcsError;

/// Entities plus one sparse-set pool per component type.
///
/// Every operation other than [`new_entity`](Self::new_entity) requires a
/// live handle minted by this store. Dead handles fail with
/// [`EcsError::EntityNotLive`], handles from another store with
/// [`EcsError::ForeignStore`].
///
/// Not internally synchronized. References handed out borrow the store, so
/// they cannot be held across a mutation.
pub struct Store {
    id: StoreId,
    entities: EntityRegistry,
    pools: PoolRegistry,
    config: PoolConfig,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("entity_count", &self.entities.live_count())
            .field("component_types", &self.pools.len())
            .finish()
    }
}

impl Store {
    /// Create an empty store with the default [`PoolConfig`].
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty store whose pools use `config`.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`PoolConfig::validate`].
    pub fn with_config(config: PoolConfig) -> Self {
        if let Err(reason) = config.validate() {
            panic!("invalid pool config: {reason}");
        }
        let id = StoreId::generate();
        Self {
            id,
            entities: EntityRegistry::new(id),
            pools: PoolRegistry::new(config),
            config,
        }
    }

    /// This store's token, carried by every handle it issues.
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// The pool allocation policy.
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Create a new live entity with no components.
    pub fn new_entity(&mut self) -> Entity {
        self.entities.issue()
    }

    /// Whether `entity` belongs to this store and has not been removed.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_live(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Remove `entity` and every component attached to it.
    ///
    /// The handle is dead afterwards and stays dead. Every registered pool is
    /// swept, since the store does not track which pools an entity uses.
    pub fn remove_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.check_live(entity)?;
        self.entities.retire(entity);

        let mut swept = 0usize;
        for pool in self.pools.erased_pools_mut() {
            if pool.remove_entity(entity) {
                swept += 1;
            }
        }
        tracing::debug!(%entity, components = swept, "removed entity");
        Ok(())
    }

    // -- component access ---------------------------------------------------

    /// Attach `value` to `entity`, overwriting any existing `T` in place.
    pub fn add_component<T: Send + 'static>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<(), EcsError> {
        self.check_live(entity)?;
        self.pools.pool_mut::<T>().add(entity, value);
        Ok(())
    }

    /// Shared access to `entity`'s `T`.
    pub fn get_component<T: Send + 'static>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.check_live(entity)?;
        self.pools
            .pool::<T>()
            .and_then(|pool| pool.get(entity))
            .ok_or_else(|| EcsError::component_not_found::<T>(entity))
    }

    /// Mutable access to `entity`'s `T`. Writes go straight into the pool.
    pub fn get_component_mut<T: Send + 'static>(
        &mut self,
        entity: Entity,
    ) -> Result<&mut T, EcsError> {
        self.check_live(entity)?;
        self.pools
            .existing_pool_mut::<T>()
            .and_then(|pool| pool.get_mut(entity))
            .ok_or_else(|| EcsError::component_not_found::<T>(entity))
    }

    /// Whether `entity` is live here and has a `T`.
    pub fn has_component<T: Send + 'static>(&self, entity: Entity) -> bool {
        self.is_alive(entity)
            && self
                .pools
                .pool::<T>()
                .is_some_and(|pool| pool.contains(entity))
    }

    /// Detach `entity`'s `T`.
    pub fn remove_component<T: Send + 'static>(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.take_component::<T>(entity).map(drop)
    }

    /// Detach `entity`'s `T` and return it.
    pub fn take_component<T: Send + 'static>(&mut self, entity: Entity) -> Result<T, EcsError> {
        self.check_live(entity)?;
        self.pools
            .existing_pool_mut::<T>()
            .and_then(|pool| pool.take(entity))
            .ok_or_else(|| EcsError::component_not_found::<T>(entity))
    }

    /// Every live `T`, densely packed, in physical order.
    ///
    /// A type that was never used yields an empty slice.
    pub fn all_components<T: Send + 'static>(&self) -> &[Component<T>] {
        self.pools
            .pool::<T>()
            .map(ComponentPool::as_slice)
            .unwrap_or(&[])
    }

    /// Mutable view of every live `T`, for systems doing bulk updates.
    pub fn all_components_mut<T: Send + 'static>(&mut self) -> ComponentsMut<'_, T> {
        self.pools.pool_mut::<T>().view_mut()
    }

    /// Direct access to the pool for `T`, if the type has been used.
    pub fn pool<T: Send + 'static>(&self) -> Option<&ComponentPool<T>> {
        self.pools.pool::<T>()
    }

    /// Slot assigned to `T`, if the type has been used.
    pub fn component_type_id<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.pools.lookup::<T>()
    }

    /// Number of distinct component types seen.
    pub fn component_type_count(&self) -> usize {
        self.pools.len()
    }

    /// The pool registry, read-only.
    pub fn pools(&self) -> &PoolRegistry {
        &self.pools
    }

    fn check_live(&self, entity: Entity) -> Result<(), EcsError> {
        if !entity.is_null() && entity.store() != self.id {
            return Err(EcsError::ForeignStore {
                entity,
                store: self.id,
            });
        }
        if !self.entities.is_live(entity) {
            return Err(EcsError::EntityNotLive { entity });
        }
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
