//! Particle fountain driven by the tick loop.
//!
//! Spawns particles with random velocities, integrates them under gravity,
//! and expires them when their lifetime runs out. Dead particles are removed
//! with `remove_entity`, so every component pool shrinks as the fountain
//! winds down.
//!
//! Run with: `RUST_LOG=debug cargo run --example particles`

use rand::Rng;
use tessel_engine::prelude::*;
use tracing_subscriber::EnvFilter;

const GRAVITY: f64 = -9.81;
const SPAWN_TICKS: u64 = 120;
const TOTAL_TICKS: u64 = 300;

#[derive(Debug, Clone, PartialEq)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Velocity {
    dx: f64,
    dy: f64,
}

/// Seconds left before the particle expires.
#[derive(Debug, Clone, PartialEq)]
struct Lifetime(f64);

/// Emits a burst of particles every tick for the first `SPAWN_TICKS` ticks.
struct Emitter {
    per_tick: usize,
    ticks: u64,
    emitted: usize,
}

impl Emitter {
    fn emit(&mut self, store: &mut Store) -> Result<(), EcsError> {
        let mut rng = rand::thread_rng();
        for _ in 0..self.per_tick {
            let e = store.new_entity();
            store.add_component(e, Position { x: 0.0, y: 0.0 })?;
            store.add_component(
                e,
                Velocity {
                    dx: rng.gen_range(-2.0..2.0),
                    dy: rng.gen_range(5.0..10.0),
                },
            )?;
            store.add_component(e, Lifetime(rng.gen_range(0.5..2.0)))?;
            self.emitted += 1;
        }
        Ok(())
    }
}

impl System for Emitter {
    fn init(&mut self, store: &mut Store) {
        if let Err(err) = self.emit(store) {
            tracing::error!(%err, "initial burst failed");
        }
    }

    fn update(&mut self, store: &mut Store, _dt: f64) {
        self.ticks += 1;
        if self.ticks > SPAWN_TICKS {
            return;
        }
        if let Err(err) = self.emit(store) {
            tracing::error!(%err, "emit failed");
        }
    }

    fn teardown(&mut self, store: &mut Store) {
        tracing::info!(
            emitted = self.emitted,
            still_alive = store.entity_count(),
            "emitter stopped"
        );
    }
}

fn gravity(store: &mut Store, dt: f64) {
    for (_, vel) in store.all_components_mut::<Velocity>() {
        vel.dy += GRAVITY * dt;
    }
}

fn movement(store: &mut Store, dt: f64) {
    let velocities: Vec<(Entity, Velocity)> = store
        .all_components::<Velocity>()
        .iter()
        .map(|c| (c.entity(), c.value().clone()))
        .collect();
    for (entity, vel) in velocities {
        if let Ok(pos) = store.get_component_mut::<Position>(entity) {
            pos.x += vel.dx * dt;
            pos.y += vel.dy * dt;
        }
    }
}

fn expire(store: &mut Store, dt: f64) {
    let mut expired = Vec::new();
    for (entity, life) in store.all_components_mut::<Lifetime>() {
        life.0 -= dt;
        if life.0 <= 0.0 {
            expired.push(entity);
        }
    }
    for entity in expired {
        if let Err(err) = store.remove_entity(entity) {
            tracing::warn!(%err, "failed to expire particle");
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = TickConfig::from_json(r#"{ "fixed_dt": 0.016666666666666666 }"#)?;
    let store = Store::with_config(PoolConfig::default());
    let mut tick_loop = TickLoop::new(store, config);

    tick_loop.add_system(
        "emitter",
        Emitter {
            per_tick: 8,
            ticks: 0,
            emitted: 0,
        },
    );
    tick_loop.add_system("gravity", gravity);
    tick_loop.add_system_after("movement", &["gravity"], movement);
    tick_loop.add_system_after("expire", &["movement"], expire);

    for _ in 0..TOTAL_TICKS / 60 {
        tick_loop.run_ticks(60)?;
        let store = tick_loop.store();
        tracing::info!(
            tick = tick_loop.tick_count(),
            sim_time = tick_loop.sim_time(),
            alive = store.entity_count(),
            positions = store.all_components::<Position>().len(),
            "progress"
        );
    }

    let diag = tick_loop.last_diagnostics();
    for (name, elapsed) in &diag.system_times {
        tracing::debug!(system = %name, ?elapsed, "last tick timing");
    }

    let store = tick_loop.shutdown();
    let highest = store
        .all_components::<Position>()
        .iter()
        .map(|c| c.value().y)
        .fold(f64::NEG_INFINITY, f64::max);
    println!(
        "{} particles left after {} ticks (highest y = {:.2})",
        store.entity_count(),
        TOTAL_TICKS,
        highest
    );
    Ok(())
}
