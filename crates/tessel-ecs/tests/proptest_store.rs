//! Property tests for store operations.
//!
//! Random sequences of entity and component operations are checked against a
//! simple model of which entities are alive and which components they hold.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use tessel_ecs::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Pos {
    x: i32,
}

#[derive(Debug, Clone, PartialEq)]
struct Tag(u8);

#[derive(Debug, Clone)]
enum StoreOp {
    Spawn,
    AddPos(usize, i32),
    AddTag(usize, u8),
    RemovePos(usize),
    RemoveEntity(usize),
    TouchPos(usize),
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        2 => Just(StoreOp::Spawn),
        3 => (0..64usize, any::<i32>()).prop_map(|(i, x)| StoreOp::AddPos(i, x)),
        2 => (0..64usize, any::<u8>()).prop_map(|(i, t)| StoreOp::AddTag(i, t)),
        2 => (0..64usize).prop_map(StoreOp::RemovePos),
        1 => (0..64usize).prop_map(StoreOp::RemoveEntity),
        1 => (0..64usize).prop_map(StoreOp::TouchPos),
    ]
}

#[derive(Default)]
struct Model {
    spawned: Vec<Entity>,
    dead: HashSet<Entity>,
    pos: HashMap<Entity, i32>,
    tag: HashMap<Entity, u8>,
}

impl Model {
    fn pick(&self, i: usize) -> Option<Entity> {
        if self.spawned.is_empty() {
            None
        } else {
            Some(self.spawned[i % self.spawned.len()])
        }
    }

    fn alive(&self, e: Entity) -> bool {
        !self.dead.contains(&e)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn store_matches_model(ops in prop::collection::vec(store_op_strategy(), 1..120)) {
        let mut store = Store::new();
        let mut model = Model::default();

        for op in ops {
            match op {
                StoreOp::Spawn => {
                    let e = store.new_entity();
                    prop_assert!(!model.spawned.contains(&e));
                    prop_assert_ne!(e.id(), 0);
                    model.spawned.push(e);
                }
                StoreOp::AddPos(i, x) => {
                    let Some(e) = model.pick(i) else { continue };
                    let result = store.add_component(e, Pos { x });
                    if model.alive(e) {
                        prop_assert!(result.is_ok());
                        model.pos.insert(e, x);
                    } else {
                        prop_assert_eq!(result, Err(EcsError::EntityNotLive { entity: e }));
                    }
                }
                StoreOp::AddTag(i, t) => {
                    let Some(e) = model.pick(i) else { continue };
                    let result = store.add_component(e, Tag(t));
                    prop_assert_eq!(result.is_ok(), model.alive(e));
                    if model.alive(e) {
                        model.tag.insert(e, t);
                    }
                }
                StoreOp::RemovePos(i) => {
                    let Some(e) = model.pick(i) else { continue };
                    let result = store.remove_component::<Pos>(e);
                    if !model.alive(e) {
                        let is_not_live = matches!(result, Err(EcsError::EntityNotLive { .. }));
                        prop_assert!(is_not_live);
                    } else if model.pos.remove(&e).is_some() {
                        prop_assert!(result.is_ok());
                    } else {
                        let is_not_found = matches!(result, Err(EcsError::ComponentNotFound { .. }));
                        prop_assert!(is_not_found);
                    }
                }
                StoreOp::RemoveEntity(i) => {
                    let Some(e) = model.pick(i) else { continue };
                    let result = store.remove_entity(e);
                    prop_assert_eq!(result.is_ok(), model.alive(e));
                    model.dead.insert(e);
                    model.pos.remove(&e);
                    model.tag.remove(&e);
                }
                StoreOp::TouchPos(i) => {
                    let Some(e) = model.pick(i) else { continue };
                    if let Ok(pos) = store.get_component_mut::<Pos>(e) {
                        pos.x = pos.x.wrapping_add(1);
                        let tracked = model.pos.get_mut(&e);
                        prop_assert!(tracked.is_some());
                        if let Some(x) = tracked {
                            *x = x.wrapping_add(1);
                        }
                    }
                }
            }

            // Liveness agrees.
            prop_assert_eq!(store.entity_count(), model.spawned.len() - model.dead.len());
            for &e in &model.spawned {
                prop_assert_eq!(store.is_alive(e), model.alive(e));
            }

            // Dense arrays hold exactly the modelled components.
            let pos_view: HashMap<Entity, i32> = store
                .all_components::<Pos>()
                .iter()
                .map(|c| (c.entity(), c.value().x))
                .collect();
            prop_assert_eq!(pos_view.len(), store.all_components::<Pos>().len());
            prop_assert_eq!(&pos_view, &model.pos);

            let tag_view: HashMap<Entity, u8> = store
                .all_components::<Tag>()
                .iter()
                .map(|c| (c.entity(), c.value().0))
                .collect();
            prop_assert_eq!(&tag_view, &model.tag);

            // Point lookups agree with the dense arrays.
            for (&e, &x) in &model.pos {
                prop_assert_eq!(store.get_component::<Pos>(e).map(|p| p.x), Ok(x));
            }
            for &e in &model.dead {
                let rejected = matches!(
                    store.get_component::<Pos>(e),
                    Err(EcsError::EntityNotLive { .. })
                );
                prop_assert!(rejected);
            }
        }

        if let Some(pool) = store.pool::<Pos>() {
            pool.assert_consistent();
        }
        if let Some(pool) = store.pool::<Tag>() {
            pool.assert_consistent();
        }
    }

    /// Handles from one store are never accepted by another, whatever the ids.
    #[test]
    fn foreign_handles_always_rejected(spawn_a in 1..20usize, spawn_b in 1..20usize) {
        let mut a = Store::new();
        let mut b = Store::new();
        let ea: Vec<Entity> = (0..spawn_a).map(|_| a.new_entity()).collect();
        for _ in 0..spawn_b {
            b.new_entity();
        }
        for &e in &ea {
            let rejected = matches!(
                b.add_component(e, Tag(1)),
                Err(EcsError::ForeignStore { .. })
            );
            prop_assert!(rejected);
            prop_assert!(!b.is_alive(e));
        }
        prop_assert!(b.all_components::<Tag>().is_empty());
        prop_assert_eq!(a.entity_count(), spawn_a);
    }
}
