//! Fixed-timestep tick scheduler with bounded catch-up.
//!
//! The [`TickLoop`] drives a [`World`] forward on a fixed interval. An
//! accumulator tracks elapsed wall-clock time from an abstract
//! [`Clock`]; whenever a full interval has accumulated the loop runs
//! one tick, up to a bounded number of catch-up ticks per pump so a
//! long stall cannot snowball.
//!
//! One tick is: read-only system phase (systems inspect the view and
//! queue commands) -> interaction phase -> command-buffer flush, the
//! last two inside [`World::step`]. Systems are dispatched in
//! registration order; each declares a frequency and runs on tick `t`
//! iff `t % every == 0`. Given identical initial state and identical
//! per-tick requests, the loop is fully deterministic -- time only
//! decides *when* ticks run, never what they compute.

use std::time::{Duration, Instant};

use tracing::trace;

use strata_sim::world::{SystemFn, TickReport, World};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Abstract microsecond clock. The scheduler is the only consumer of
/// wall-clock time in the engine; tests substitute a manual clock.
pub trait Clock {
    /// Monotonic microseconds since an arbitrary origin.
    fn now_us(&mut self) -> u64;
}

/// Monotonic wall clock backed by [`Instant`].
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_us(&mut self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}

/// Hand-cranked clock for deterministic scheduler tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `us` microseconds.
    pub fn advance(&mut self, us: u64) {
        self.now += us;
    }
}

impl Clock for ManualClock {
    fn now_us(&mut self) -> u64 {
        self.now
    }
}

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Scheduler timing parameters.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Microseconds of simulation time per tick.
    pub tick_interval_us: u64,
    /// Maximum ticks run per pump when catching up after a stall.
    pub max_catchup_ticks: u32,
    /// Safety margin subtracted from the between-tick sleep.
    pub sleep_margin_us: u64,
}

impl Default for TickConfig {
    /// 600 ms ticks, at most 3 catch-up ticks, 5 ms sleep margin.
    fn default() -> Self {
        Self {
            tick_interval_us: 600_000,
            max_catchup_ticks: 3,
            sleep_margin_us: 5_000,
        }
    }
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// A named system with its dispatch frequency.
struct RegisteredSystem {
    name: String,
    /// Runs on tick `t` iff `t % every == 0`.
    every: u64,
    func: SystemFn,
}

/// The fixed-timestep driver around a [`World`].
pub struct TickLoop<C: Clock> {
    world: World,
    clock: C,
    config: TickConfig,
    systems: Vec<RegisteredSystem>,
    /// Leftover microseconds not yet consumed by ticks.
    accumulated_us: u64,
    /// Wall clock at the last pump.
    last_time_us: u64,
}

impl<C: Clock> TickLoop<C> {
    /// Wrap a world with a clock and timing config.
    ///
    /// # Panics
    ///
    /// Panics if the tick interval is zero.
    pub fn new(world: World, mut clock: C, config: TickConfig) -> Self {
        assert!(config.tick_interval_us > 0, "tick interval must be positive");
        let last_time_us = clock.now_us();
        Self {
            world,
            clock,
            config,
            systems: Vec::new(),
            accumulated_us: 0,
            last_time_us,
        }
    }

    /// Register a system that runs every `every` ticks. Registration
    /// order is dispatch order.
    ///
    /// # Panics
    ///
    /// Panics on a zero frequency or a duplicate system name.
    pub fn add_system(&mut self, name: &str, every: u64, func: SystemFn) {
        assert!(every >= 1, "system frequency must be at least 1");
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );
        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            every,
            func,
        });
    }

    // -- accessors ----------------------------------------------------------

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for setup: loading manifests, authoring
    /// tables, submitting requests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// The names of registered systems, in dispatch order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    // -- driving ------------------------------------------------------------

    /// Run exactly one tick, ignoring the clock.
    pub fn tick(&mut self) -> TickReport {
        let t = self.world.tick();
        for system in &self.systems {
            if t % system.every == 0 {
                trace!(system = %system.name, tick = t, "dispatch");
                self.world.dispatch_system(system.func);
            }
        }
        self.world.step()
    }

    /// Consume elapsed wall-clock time and run the ticks it covers,
    /// bounded by the catch-up limit. Returns the reports of the ticks
    /// that ran (often none).
    pub fn pump(&mut self) -> Vec<TickReport> {
        let now = self.clock.now_us();
        self.accumulated_us += now.saturating_sub(self.last_time_us);
        self.last_time_us = now;

        let mut reports = Vec::new();
        while self.accumulated_us >= self.config.tick_interval_us
            && (reports.len() as u32) < self.config.max_catchup_ticks
        {
            reports.push(self.tick());
            self.accumulated_us -= self.config.tick_interval_us;
        }
        reports
    }

    /// Microseconds to sleep before the next tick is due, minus the
    /// safety margin. Zero when a tick is already overdue.
    pub fn sleep_budget_us(&self) -> u64 {
        if self.accumulated_us >= self.config.tick_interval_us {
            return 0;
        }
        let remaining = self.config.tick_interval_us - self.accumulated_us;
        remaining.saturating_sub(self.config.sleep_margin_us)
    }

    /// Drive the loop in real time until `total_ticks` have run,
    /// sleeping between pumps. Demo/driver convenience; tests use
    /// [`pump`](Self::pump) with a [`ManualClock`].
    pub fn run_for(&mut self, total_ticks: u64) -> Vec<TickReport> {
        let mut reports = Vec::new();
        while (reports.len() as u64) < total_ticks {
            reports.extend(self.pump());
            if (reports.len() as u64) >= total_ticks {
                break;
            }
            let budget = self.sleep_budget_us();
            if budget > 0 {
                std::thread::sleep(Duration::from_micros(budget));
            } else {
                std::thread::sleep(Duration::from_millis(1));
            }
        }
        reports.truncate(total_ticks as usize);
        reports
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
