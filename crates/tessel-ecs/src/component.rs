//! Component records and component type metadata.
//!
//! Any `'static` value can be a component. Inside a pool each value is
//! wrapped in a [`Component`] record that also remembers which entity owns it,
//! so a system iterating the dense array can tell whose data it is touching.

use std::any::TypeId;
use std::fmt;

use crate::entity::Entity;

// ---------------------------------------------------------------------------
// Component<T>
// ---------------------------------------------------------------------------

/// A component value bundled with the entity it is attached to.
///
/// This is the element type of a pool's dense backing array, and what
/// [`Store::all_components`](crate::store::Store::all_components) yields.
#[derive(Debug, Clone, PartialEq)]
pub struct Component<T> {
    owner: Entity,
    value: T,
}

impl<T> Component<T> {
    #[inline]
    pub(crate) fn new(owner: Entity, value: T) -> Self {
        Self { owner, value }
    }

    /// The entity this component is attached to.
    #[inline]
    pub fn entity(&self) -> Entity {
        self.owner
    }

    /// Shared access to the value.
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Mutable access to the value. Writes land in the pool directly.
    #[inline]
    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    /// Unwrap the value, discarding the owner.
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }

    #[inline]
    pub(crate) fn replace(&mut self, value: T) -> T {
        std::mem::replace(&mut self.value, value)
    }
}

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Pool slot assigned to a component type within one store.
///
/// Slots are handed out as `0, 1, 2, ...` in first-seen order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub(crate) u32);

impl ComponentTypeId {
    /// The slot as an index into the store's pool list.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata recorded when a component type gets its slot.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// Slot assigned at first reference.
    pub id: ComponentTypeId,
    /// `std::any::type_name::<T>()`, for logs and error messages.
    pub name: &'static str,
    /// Rust `TypeId` the slot was keyed on.
    pub type_id: TypeId,
}

impl ComponentInfo {
    pub(crate) fn of<T: 'static>(id: ComponentTypeId) -> Self {
        Self {
            id,
            name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
