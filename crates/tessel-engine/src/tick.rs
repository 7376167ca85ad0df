//! Fixed-timestep tick loop driving systems over a [`Store`].
//!
//! The [`TickLoop`] owns a store and an ordered list of systems. Its life has
//! three phases:
//!
//! 1. **Init** -- every system's [`System::init`] runs once, in registration
//!    order. Happens on the first [`tick`](TickLoop::tick) unless
//!    [`init`](TickLoop::init) was called explicitly.
//! 2. **Running** -- each tick runs every [`System::update`] with the fixed
//!    time step, in registration order, then advances the tick counter.
//! 3. **Torn down** -- [`teardown`](TickLoop::teardown) runs every
//!    [`System::teardown`] once, in registration order. Further ticks are
//!    refused.
//!
//! # Example
//!
//! ```
//! use tessel_engine::tick::{TickConfig, TickLoop};
//! use tessel_ecs::prelude::*;
//!
//! let store = Store::new();
//! let config = TickConfig { fixed_dt: 1.0 / 60.0 };
//! let mut tick_loop = TickLoop::new(store, config);
//!
//! tick_loop.add_system("physics", |_store: &mut Store, _dt: f64| {
//!     // physics logic here
//! });
//!
//! tick_loop.run_ticks(10).unwrap();
//! assert_eq!(tick_loop.tick_count(), 10);
//!
//! let _store = tick_loop.shutdown();
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tessel_ecs::store::Store;

use crate::EngineError;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
///
/// The `fixed_dt` is the duration in seconds of each simulation tick. A value
/// of `1.0 / 60.0` gives 60 ticks per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz (1/60 second per tick).
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
        }
    }
}

impl TickConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: TickConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that `fixed_dt` is positive and finite.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.fixed_dt > 0.0 && self.fixed_dt.is_finite() {
            Ok(())
        } else {
            Err(EngineError::InvalidConfig(format!(
                "fixed_dt must be positive and finite, got {}",
                self.fixed_dt
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system (in order of execution).
    pub system_times: Vec<(String, Duration)>,
    /// Total time for the tick.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// An update routine run by the [`TickLoop`].
///
/// Every hook gets mutable access to the loop's store. Only
/// [`update`](Self::update) is required.
pub trait System {
    /// Called once before the first update.
    fn init(&mut self, _store: &mut Store) {}

    /// Called once per tick with the fixed time step in seconds.
    fn update(&mut self, store: &mut Store, dt: f64);

    /// Called once when the loop is torn down.
    fn teardown(&mut self, _store: &mut Store) {}
}

/// Plain closures are update-only systems.
impl<F> System for F
where
    F: FnMut(&mut Store, f64),
{
    fn update(&mut self, store: &mut Store, dt: f64) {
        self(store, dt)
    }
}

// ---------------------------------------------------------------------------
// RegisteredSystem
// ---------------------------------------------------------------------------

/// A named system in the loop.
///
/// The `after` field lists the names of systems that must execute before
/// this one.
struct RegisteredSystem {
    /// Human-readable name (e.g., `"physics"`, `"movement"`).
    name: String,
    system: Box<dyn System>,
    after: Vec<String>,
}

impl std::fmt::Debug for RegisteredSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredSystem")
            .field("name", &self.name)
            .field("after", &self.after)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// LoopPhase
// ---------------------------------------------------------------------------

/// Where a [`TickLoop`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Systems registered, `init` not yet run.
    Created,
    /// `init` has run; ticks are accepted.
    Running,
    /// `teardown` has run; ticks are refused.
    TornDown,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// The fixed-timestep tick loop.
///
/// Systems run in the order they were registered, every tick. Simulation time
/// is `tick_count * fixed_dt`, computed rather than accumulated.
#[derive(Debug)]
pub struct TickLoop {
    /// The store all systems operate on.
    store: Store,
    /// Ordered list of systems to run each tick.
    systems: Vec<RegisteredSystem>,
    /// Number of ticks executed so far.
    tick_counter: u64,
    /// Fixed time step in seconds per tick.
    fixed_dt: f64,
    phase: LoopPhase,
    /// Diagnostics from the last tick.
    last_diagnostics: TickDiagnostics,
}

impl TickLoop {
    /// Create a new tick loop over `store`.
    ///
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn new(store: Store, config: TickConfig) -> Self {
        assert!(
            config.validate().is_ok(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        Self {
            store,
            systems: Vec::new(),
            tick_counter: 0,
            fixed_dt: config.fixed_dt,
            phase: LoopPhase::Created,
            last_diagnostics: TickDiagnostics::default(),
        }
    }

    /// Register a system to be run each tick.
    ///
    /// Systems run in registration order. A system added after
    /// [`init`](Self::init) is initialized on the spot.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered, or if the
    /// loop has been torn down.
    pub fn add_system<S: System + 'static>(&mut self, name: &str, system: S) {
        self.add_system_after(name, &[], system);
    }

    /// Register a system that must run after the named systems.
    ///
    /// Since execution follows registration order, every name in `after`
    /// must already be registered.
    ///
    /// # Panics
    ///
    /// - If any system in `after` is not already registered.
    /// - If a system with this name already exists.
    /// - If the loop has been torn down.
    pub fn add_system_after<S: System + 'static>(&mut self, name: &str, after: &[&str], system: S) {
        assert!(
            self.phase != LoopPhase::TornDown,
            "cannot add system '{name}' after teardown"
        );
        for dep in after {
            assert!(
                self.systems.iter().any(|s| s.name == *dep),
                "system '{name}' declares dependency on '{dep}', but '{dep}' is not registered"
            );
        }
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );

        let mut registered = RegisteredSystem {
            name: name.to_owned(),
            system: Box::new(system),
            after: after.iter().map(|s| s.to_string()).collect(),
        };
        if self.phase == LoopPhase::Running {
            tracing::debug!(system = name, "initializing late-registered system");
            registered.system.init(&mut self.store);
        }
        self.systems.push(registered);
    }

    /// Run every system's `init`, once. Later calls do nothing.
    pub fn init(&mut self) {
        if self.phase != LoopPhase::Created {
            return;
        }
        tracing::info!(systems = self.systems.len(), "initializing systems");
        for registered in &mut self.systems {
            registered.system.init(&mut self.store);
        }
        self.phase = LoopPhase::Running;
    }

    /// Execute one simulation tick.
    ///
    /// Runs [`init`](Self::init) first if it has not run yet, then every
    /// system's `update` in registration order, then advances the counter.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        match self.phase {
            LoopPhase::TornDown => {
                tracing::warn!(tick = self.tick_counter, "tick refused after teardown");
                return Err(EngineError::TornDown {
                    tick: self.tick_counter,
                });
            }
            LoopPhase::Created => self.init(),
            LoopPhase::Running => {}
        }

        let tick_start = Instant::now();
        let mut system_times = Vec::with_capacity(self.systems.len());

        for registered in &mut self.systems {
            let sys_start = Instant::now();
            registered.system.update(&mut self.store, self.fixed_dt);
            let elapsed = sys_start.elapsed();
            tracing::debug!(system = %registered.name, ?elapsed, "system updated");
            system_times.push((registered.name.clone(), elapsed));
        }

        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
        };
        Ok(())
    }

    /// Run `count` ticks in sequence, stopping at the first refusal.
    pub fn run_ticks(&mut self, count: u64) -> Result<(), EngineError> {
        for _ in 0..count {
            self.tick()?;
        }
        Ok(())
    }

    /// Run every system's `teardown`, once, in registration order.
    ///
    /// Later calls do nothing. Ticks are refused afterwards.
    pub fn teardown(&mut self) {
        if self.phase == LoopPhase::TornDown {
            return;
        }
        tracing::info!(
            systems = self.systems.len(),
            ticks = self.tick_counter,
            "tearing down systems"
        );
        for registered in &mut self.systems {
            registered.system.teardown(&mut self.store);
        }
        self.phase = LoopPhase::TornDown;
    }

    /// Tear down (if not already) and hand the store back.
    pub fn shutdown(mut self) -> Store {
        self.teardown();
        self.store
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The current simulation time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid floating-point drift from
    /// repeated addition.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    /// The fixed time step in seconds per tick.
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Read-only access to the store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable access to the store, for setup and inspection between ticks.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// The number of registered systems.
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    /// The systems `name` was declared to run after, or `None` if no such
    /// system is registered.
    pub fn system_dependencies(&self, name: &str) -> Option<Vec<&str>> {
        self.systems
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.after.iter().map(String::as_str).collect())
    }

    /// Diagnostics from the last tick (timing per system).
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
