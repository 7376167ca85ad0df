//! Sparse-set component pools.
//!
//! A [`ComponentPool<T>`] keeps every `T` of one store in a dense
//! `Vec<Component<T>>` and maps entity ids to positions in that vector. Adds
//! append, removes swap the last record into the hole, so the dense array never
//! has gaps and every operation is O(1) amortized.
//!
//! The backing allocation is managed explicitly rather than left to `Vec`'s
//! own policy: it grows by [`PoolConfig::growth_factor`] when full and is
//! reallocated to a tighter size once it becomes mostly empty (see
//! [`PoolConfig`]).
//!
//! Physical order is not stable. Any remove may relocate the last record, so
//! index positions observed before a mutation mean nothing after it.

use std::any::Any;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::entity::Entity;

// ---------------------------------------------------------------------------
// PoolConfig
// ---------------------------------------------------------------------------

/// Allocation policy shared by every pool of a store.
///
/// With the defaults a full pool doubles, and a pool whose length times 3
/// drops below its capacity is reallocated to twice its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Capacity multiplier applied to the old length when a full pool grows.
    pub growth_factor: usize,
    /// Shrink once `len * shrink_threshold < capacity`.
    pub shrink_threshold: usize,
    /// Capacity after a shrink is `len * shrink_factor`.
    pub shrink_factor: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            growth_factor: 2,
            shrink_threshold: 3,
            shrink_factor: 2,
        }
    }
}

/// Upper bound on every [`PoolConfig`] factor.
pub const MAX_POOL_FACTOR: usize = 16;

/// A [`PoolConfig`] value outside its accepted range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("growth_factor must be between 2 and {max}, got {0}", max = MAX_POOL_FACTOR)]
    GrowthFactor(usize),

    #[error("shrink_factor must be between 1 and {max}, got {0}", max = MAX_POOL_FACTOR)]
    ShrinkFactor(usize),

    /// The threshold must sit strictly above the shrink factor.
    #[error(
        "shrink_threshold ({threshold}) must exceed shrink_factor ({factor}) and be at most {max}",
        max = MAX_POOL_FACTOR
    )]
    ShrinkThreshold { threshold: usize, factor: usize },
}

impl PoolConfig {
    /// Check the policy is usable.
    ///
    /// A threshold at or below the shrink factor would reallocate on nearly
    /// every removal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=MAX_POOL_FACTOR).contains(&self.growth_factor) {
            return Err(ConfigError::GrowthFactor(self.growth_factor));
        }
        if !(1..=MAX_POOL_FACTOR).contains(&self.shrink_factor) {
            return Err(ConfigError::ShrinkFactor(self.shrink_factor));
        }
        if self.shrink_threshold <= self.shrink_factor || self.shrink_threshold > MAX_POOL_FACTOR {
            return Err(ConfigError::ShrinkThreshold {
                threshold: self.shrink_threshold,
                factor: self.shrink_factor,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ComponentPool<T>
// ---------------------------------------------------------------------------

/// Dense storage for all components of type `T` in one store.
///
/// Keyed by entity id. The pool trusts its caller to only hand it handles from
/// a single store; [`Store`](crate::store::Store) guarantees that, along with
/// liveness.
#[derive(Debug, Clone)]
pub struct ComponentPool<T> {
    /// The dense backing array. Order carries no meaning.
    records: Vec<Component<T>>,
    /// Entity id -> position in `records`.
    index: HashMap<u32, usize>,
    config: PoolConfig,
}

impl<T> ComponentPool<T> {
    /// Create an empty pool with the default [`PoolConfig`].
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Create an empty pool with the given allocation policy.
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            config,
        }
    }

    /// The allocation policy in effect.
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// Number of components stored.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the pool holds no components.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Allocated record capacity of the backing array.
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Attach `value` to `entity`.
    ///
    /// If the entity already has a `T` here, the record is overwritten in
    /// place and the old value returned; nothing moves. Otherwise the record is
    /// appended, growing the backing array first if it is full.
    pub fn add(&mut self, entity: Entity, value: T) -> Option<T> {
        if let Some(&row) = self.index.get(&entity.id()) {
            debug_assert_eq!(self.records[row].entity(), entity);
            return Some(self.records[row].replace(value));
        }

        let row = self.records.len();
        if row == self.records.capacity() {
            self.grow(row + 1);
        }
        self.records.push(Component::new(entity, value));
        self.index.insert(entity.id(), row);

        debug_assert_eq!(self.index.len(), self.records.len());
        None
    }

    /// Shared access to `entity`'s component.
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.get_record(entity).map(Component::value)
    }

    /// Mutable access to `entity`'s component. The borrow ends before the
    /// pool can be structurally mutated again.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let row = *self.index.get(&entity.id())?;
        Some(self.records[row].value_mut())
    }

    /// The full record (owner + value) for `entity`.
    pub fn get_record(&self, entity: Entity) -> Option<&Component<T>> {
        let row = *self.index.get(&entity.id())?;
        Some(&self.records[row])
    }

    /// Whether `entity` has a component in this pool.
    pub fn contains(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity.id())
    }

    /// Detach `entity`'s component. Returns `false` if there was none.
    pub fn remove(&mut self, entity: Entity) -> bool {
        self.take(entity).is_some()
    }

    /// Detach `entity`'s component and hand the value back.
    ///
    /// Swap-remove: the last record moves into the vacated row and its index
    /// entry is re-pointed there. May shrink the backing allocation.
    pub fn take(&mut self, entity: Entity) -> Option<T> {
        let row = self.index.remove(&entity.id())?;
        let removed = self.records.swap_remove(row);
        debug_assert_eq!(removed.entity().id(), entity.id());

        // `row` now holds what used to be the last record, unless the removed
        // record was itself the last one.
        if let Some(moved) = self.records.get(row) {
            self.index.insert(moved.entity().id(), row);
        }

        self.shrink_if_sparse();
        debug_assert_eq!(self.index.len(), self.records.len());
        Some(removed.into_value())
    }

    /// Drop every component in the pool.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
        self.shrink_if_sparse();
    }

    /// The dense backing array, in physical order.
    pub fn as_slice(&self) -> &[Component<T>] {
        &self.records
    }

    /// Mutable view of the dense array.
    ///
    /// Values can be written; records cannot be reordered or re-owned.
    pub fn view_mut(&mut self) -> ComponentsMut<'_, T> {
        ComponentsMut {
            records: &mut self.records,
        }
    }

    /// Iterate `(owner, &value)` in physical order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.records.iter().map(|c| (c.entity(), c.value()))
    }

    /// Iterate `(owner, &mut value)` in physical order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.records.iter_mut().map(|c| (c.entity(), c.value_mut()))
    }

    /// Owners of every stored component, in physical order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.records.iter().map(Component::entity)
    }

    /// Panic unless the index map and the backing array agree.
    ///
    /// O(n). Used by tests and debug tooling; the hot paths only check the
    /// rows they touched.
    pub fn assert_consistent(&self) {
        assert_eq!(
            self.index.len(),
            self.records.len(),
            "index map has {} entries for {} records",
            self.index.len(),
            self.records.len()
        );
        for (&id, &row) in &self.index {
            let owner = self
                .records
                .get(row)
                .unwrap_or_else(|| panic!("entity {id} indexed at row {row} past the end"))
                .entity();
            assert_eq!(owner.id(), id, "row {row} is owned by {owner}, index says {id}");
        }
    }

    /// Reserve room for at least `required` records.
    ///
    /// Falls back to exactly `required` if the configured target cannot be
    /// allocated, so a pool built from an unchecked config still works.
    fn grow(&mut self, required: usize) {
        let len = self.records.len();
        let old_capacity = self.records.capacity();
        let target = len
            .max(1)
            .saturating_mul(self.config.growth_factor)
            .max(required);
        if self.records.try_reserve_exact(target - len).is_err() {
            self.records.reserve_exact(required - len);
        }
        tracing::trace!(
            component = std::any::type_name::<T>(),
            old_capacity,
            new_capacity = self.records.capacity(),
            "pool grew"
        );
    }

    fn shrink_if_sparse(&mut self) {
        let len = self.records.len();
        let old_capacity = self.records.capacity();
        if len.saturating_mul(self.config.shrink_threshold) < old_capacity {
            let target = len
                .saturating_mul(self.config.shrink_factor)
                .min(old_capacity);
            self.records.shrink_to(target);
            self.index.shrink_to(target);
            tracing::trace!(
                component = std::any::type_name::<T>(),
                old_capacity,
                new_capacity = self.records.capacity(),
                "pool shrank"
            );
        }
    }
}

impl<T> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ComponentsMut
// ---------------------------------------------------------------------------

/// Mutable view over a pool's dense array.
///
/// Hands out `&mut T` only, never `&mut Component<T>`, so callers can rewrite
/// values but cannot move records between rows behind the index map's back.
/// Positional access is for callers that snapshot indices or walk backwards.
#[derive(Debug)]
pub struct ComponentsMut<'a, T> {
    records: &'a mut [Component<T>],
}

impl<'a, T> ComponentsMut<'a, T> {
    /// Number of records in view.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the view is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read-only access to the underlying records.
    pub fn as_slice(&self) -> &[Component<T>] {
        self.records
    }

    /// Record at physical position `row`.
    pub fn get(&self, row: usize) -> Option<&Component<T>> {
        self.records.get(row)
    }

    /// Owner and mutable value at physical position `row`.
    pub fn get_mut(&mut self, row: usize) -> Option<(Entity, &mut T)> {
        self.records
            .get_mut(row)
            .map(|c| (c.entity(), c.value_mut()))
    }

    /// Iterate `(owner, &value)`.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.records.iter().map(|c| (c.entity(), c.value()))
    }

    /// Iterate `(owner, &mut value)`.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.records.iter_mut().map(|c| (c.entity(), c.value_mut()))
    }

    /// Iterate values only.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.records.iter_mut().map(Component::value_mut)
    }
}

impl<'a, T> IntoIterator for ComponentsMut<'a, T> {
    type Item = (Entity, &'a mut T);
    type IntoIter = std::iter::Map<
        std::slice::IterMut<'a, Component<T>>,
        fn(&'a mut Component<T>) -> (Entity, &'a mut T),
    >;

    fn into_iter(self) -> Self::IntoIter {
        fn split<T>(c: &mut Component<T>) -> (Entity, &mut T) {
            (c.entity(), c.value_mut())
        }
        self.records
            .iter_mut()
            .map(split::<T> as fn(&'a mut Component<T>) -> (Entity, &'a mut T))
    }
}

// ---------------------------------------------------------------------------
// ErasedPool
// ---------------------------------------------------------------------------

/// The type-erased face of a [`ComponentPool`].
///
/// The store keeps pools of unrelated component types side by side and only
/// needs this much from them to cascade an entity removal; typed access goes
/// back through [`as_any`](Self::as_any) downcasts.
pub trait ErasedPool: Any + Send {
    /// Remove `entity`'s component if present.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    /// Number of components stored.
    fn len(&self) -> usize;

    /// Whether the pool holds no components.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rust type name of the stored component.
    fn component_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + 'static> ErasedPool for ComponentPool<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity)
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
