//! Entity handles and the per-store entity registry.
//!
//! An [`Entity`] is a `(id, store)` pair. Ids are issued by an
//! [`EntityRegistry`] from a monotonically increasing counter starting at 1;
//! the value `0` is reserved as the null sentinel. Ids are never recycled, so
//! a handle that outlives its entity can always be told apart from a newer
//! one instead of silently aliasing its data.

use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// StoreId
// ---------------------------------------------------------------------------

/// Token identifying the [`Store`](crate::store::Store) that minted a handle.
///
/// Drawn at random when a store is constructed. There is no process-wide
/// counter; two stores colliding would require equal 64-bit draws.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl StoreId {
    /// Token carried by [`Entity::NULL`]. Never drawn for a real store.
    pub const NULL: StoreId = StoreId(0);

    /// Draw a fresh, non-null token.
    pub fn generate() -> Self {
        loop {
            let raw: u64 = rand::random();
            if raw != 0 {
                return Self(raw);
            }
        }
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreId({:016x})", self.0)
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Opaque entity handle.
///
/// Only valid against the store whose [`StoreId`] it carries. Handles are
/// `Copy`; copying one does not extend the entity's life.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    id: u32,
    store: StoreId,
}

impl Entity {
    /// The unbound sentinel handle. Every store rejects it.
    pub const NULL: Entity = Entity {
        id: 0,
        store: StoreId::NULL,
    };

    #[inline]
    pub(crate) fn new(id: u32, store: StoreId) -> Self {
        Self { id, store }
    }

    /// The per-store numeric id. Never `0` for an issued handle.
    #[inline]
    pub fn id(self) -> u32 {
        self.id
    }

    /// The store this handle belongs to.
    #[inline]
    pub fn store(self) -> StoreId {
        self.store
    }

    /// Whether this is the [`NULL`](Self::NULL) sentinel (or any handle with
    /// the reserved id).
    #[inline]
    pub fn is_null(self) -> bool {
        self.id == 0
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}@{})", self.id, self.store)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.store)
    }
}

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// Issues entity ids for one store and tracks which of them are alive.
///
/// Ids come from a counter, so the only per-entity memory is the live set.
/// Retiring an id drops it from the set; the counter never moves back.
#[derive(Debug)]
pub struct EntityRegistry {
    store: StoreId,
    /// Highest id issued so far. `0` until the first issue.
    last_id: u32,
    live: HashSet<u32>,
}

impl EntityRegistry {
    /// Create a registry that stamps `store` into every handle it issues.
    pub fn new(store: StoreId) -> Self {
        Self {
            store,
            last_id: 0,
            live: HashSet::new(),
        }
    }

    /// The store token stamped into issued handles.
    pub fn store(&self) -> StoreId {
        self.store
    }

    /// Issue the next entity id.
    ///
    /// # Panics
    ///
    /// Panics if the 32-bit id space of this store is exhausted.
    pub fn issue(&mut self) -> Entity {
        let id = self
            .last_id
            .checked_add(1)
            .unwrap_or_else(|| panic!("entity id space exhausted for store {}", self.store));
        self.last_id = id;
        self.live.insert(id);
        Entity::new(id, self.store)
    }

    /// Whether `entity` was issued by this registry and has not been retired.
    pub fn is_live(&self, entity: Entity) -> bool {
        entity.store == self.store && self.live.contains(&entity.id)
    }

    /// Move `entity` from Live to Dead.
    ///
    /// Returns `false` if it was not live here (foreign, sentinel, unknown,
    /// or already retired).
    pub fn retire(&mut self, entity: Entity) -> bool {
        if entity.store != self.store || !self.live.remove(&entity.id) {
            return false;
        }
        let len = self.live.len();
        if len * 4 < self.live.capacity() {
            self.live.shrink_to(len * 2);
        }
        true
    }

    /// Number of live entities.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of ids issued so far, dead ones included.
    pub fn issued_count(&self) -> usize {
        self.last_id as usize
    }

    /// Heap slots currently reserved for the live set.
    pub fn live_capacity(&self) -> usize {
        self.live.capacity()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
