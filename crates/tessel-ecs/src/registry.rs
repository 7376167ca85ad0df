//! Component type slots and the pools behind them.
//!
//! The [`PoolRegistry`] hands each Rust component type a [`ComponentTypeId`]
//! the first time the type is referenced against a store and creates that
//! type's [`ComponentPool`] at the same moment. Slots are permanent: nothing is
//! ever unregistered, merged or compacted.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use crate::component::{ComponentInfo, ComponentTypeId};
use crate::pool::{ComponentPool, ErasedPool, PoolConfig};

/// Maps component types to slots and owns one pool per slot.
pub struct PoolRegistry {
    /// TypeId -> slot, for dedup.
    by_type: HashMap<TypeId, ComponentTypeId>,
    /// Indexed by `ComponentTypeId.0`.
    infos: Vec<ComponentInfo>,
    /// Indexed by `ComponentTypeId.0`.
    pools: Vec<Box<dyn ErasedPool>>,
    /// Applied to every pool created here.
    config: PoolConfig,
}

impl PoolRegistry {
    /// Create an empty registry whose pools use `config`.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            by_type: HashMap::new(),
            infos: Vec::new(),
            pools: Vec::new(),
            config,
        }
    }

    /// Slot for `T`, assigning one and creating its pool on first reference.
    pub fn slot_for<T: Send + 'static>(&mut self) -> ComponentTypeId {
        if let Some(&existing) = self.by_type.get(&TypeId::of::<T>()) {
            return existing;
        }

        let slot = u32::try_from(self.infos.len())
            .unwrap_or_else(|_| panic!("component slot space exhausted"));
        let id = ComponentTypeId(slot);
        let info = ComponentInfo::of::<T>(id);
        tracing::debug!(slot, component = info.name, "created component pool");

        self.by_type.insert(info.type_id, id);
        self.infos.push(info);
        self.pools
            .push(Box::new(ComponentPool::<T>::with_config(self.config)));
        id
    }

    /// Slot for `T` if it has ever been referenced.
    pub fn lookup<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// The pool for `T`, without creating it.
    pub fn pool<T: Send + 'static>(&self) -> Option<&ComponentPool<T>> {
        let id = self.lookup::<T>()?;
        Some(downcast_ref(self.pools[id.index()].as_ref()))
    }

    /// The pool for `T`, creating it on first reference.
    pub fn pool_mut<T: Send + 'static>(&mut self) -> &mut ComponentPool<T> {
        let id = self.slot_for::<T>();
        downcast_mut(self.pools[id.index()].as_mut())
    }

    /// The pool for `T` if it exists, without creating it.
    pub fn existing_pool_mut<T: Send + 'static>(&mut self) -> Option<&mut ComponentPool<T>> {
        let id = self.lookup::<T>()?;
        Some(downcast_mut(self.pools[id.index()].as_mut()))
    }

    /// Every pool, type-erased, in slot order.
    pub fn erased_pools_mut(&mut self) -> impl Iterator<Item = &mut dyn ErasedPool> + '_ {
        self.pools.iter_mut().map(|p| p.as_mut())
    }

    /// Every pool, type-erased, in slot order.
    pub fn erased_pools(&self) -> impl Iterator<Item = &dyn ErasedPool> + '_ {
        self.pools.iter().map(|p| p.as_ref())
    }

    /// Metadata for a slot.
    pub fn info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.index())
    }

    /// Number of slots assigned.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether no component type has been referenced yet.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Type names of every slot, in slot order.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.infos.iter().map(|info| info.name).collect()
    }
}

impl fmt::Debug for PoolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("types", &self.type_names())
            .field("config", &self.config)
            .finish()
    }
}

// A slot is only ever filled with `ComponentPool<T>` for the `T` whose
// `TypeId` keyed it, so these downcasts cannot fail.

fn downcast_ref<T: Send + 'static>(pool: &dyn ErasedPool) -> &ComponentPool<T> {
    pool.as_any()
        .downcast_ref::<ComponentPool<T>>()
        .expect("pool slot holds a different component type")
}

fn downcast_mut<T: Send + 'static>(pool: &mut dyn ErasedPool) -> &mut ComponentPool<T> {
    pool.as_any_mut()
        .downcast_mut::<ComponentPool<T>>()
        .expect("pool slot holds a different component type")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
