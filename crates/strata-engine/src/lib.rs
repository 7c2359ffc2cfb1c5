//! Strata Engine -- the fixed-timestep driver around the simulation core.
//!
//! This crate schedules the `strata-sim` world: a tick loop with a
//! bounded catch-up accumulator, frequency-based system dispatch, and a
//! scripted replay harness for determinism verification. The engine
//! consumes only an abstract [`Clock`](tick::Clock); rendering, input,
//! and transport live with external collaborators that submit
//! [`InteractionRequest`](strata_sim::pipeline::InteractionRequest)s
//! and read [`WorldSnapshot`](strata_sim::snapshot::WorldSnapshot)s.
//!
//! # Quick Start
//!
//! ```
//! use strata_engine::prelude::*;
//!
//! let world = World::new(7);
//! let mut tick_loop = TickLoop::new(world, ManualClock::new(), TickConfig::default());
//!
//! // Run three simulated ticks directly.
//! for _ in 0..3 {
//!     tick_loop.tick();
//! }
//! assert_eq!(tick_loop.world().tick(), 3);
//! ```

#![deny(unsafe_code)]

pub mod replay;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the simulation core for convenience.
pub use strata_sim;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use strata_sim::prelude::*;

    pub use crate::replay::{run_script, ScriptedRequest, TickRecord};
    pub use crate::tick::{Clock, ManualClock, SystemClock, TickConfig, TickLoop};
}
