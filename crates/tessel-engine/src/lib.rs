//! Tessel Engine -- fixed-timestep system driver for a [`tessel_ecs`] store.
//!
//! This crate owns a [`Store`](tessel_ecs::store::Store) and runs a list of
//! systems against it: each system is initialized once, updated once per
//! tick with the fixed time step, and torn down once at the end.
//!
//! # Quick Start
//!
//! ```
//! use tessel_engine::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Score(u32);
//!
//! let mut store = Store::new();
//! let player = store.new_entity();
//! store.add_component(player, Score(0)).unwrap();
//!
//! let mut tick_loop = TickLoop::new(store, TickConfig::default());
//! tick_loop.add_system("scoring", |store: &mut Store, _dt: f64| {
//!     for (_, score) in store.all_components_mut::<Score>() {
//!         score.0 += 1;
//!     }
//! });
//!
//! tick_loop.run_ticks(100).unwrap();
//! assert_eq!(tick_loop.tick_count(), 100);
//!
//! let store = tick_loop.shutdown();
//! assert_eq!(store.get_component::<Score>(player), Ok(&Score(100)));
//! ```

#![deny(unsafe_code)]

pub mod tick;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the tick loop and its configuration.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A config value is out of range.
    #[error("invalid tick config: {0}")]
    InvalidConfig(String),

    /// A config document could not be parsed.
    #[error("failed to parse tick config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The loop was torn down; no further ticks run.
    #[error("tick loop was torn down after {tick} ticks")]
    TornDown {
        /// Ticks completed before teardown.
        tick: u64,
    },
}

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use tessel_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the ECS prelude.
    pub use tessel_ecs::prelude::*;

    // Engine-specific exports.
    pub use crate::tick::{LoopPhase, System, TickConfig, TickDiagnostics, TickLoop};
    pub use crate::EngineError;
}
