//! Scripted replay and determinism verification.
//!
//! A replay script is a request stream keyed by tick number. Running it
//! produces one [`TickRecord`] per tick: the result codes, the flush
//! counters, and a BLAKE3 digest of the post-flush world. Two runs over
//! equal initial worlds and equal scripts must produce equal record
//! sequences -- that comparison is the engine's replay guarantee, and
//! the determinism test suite exercises it.

use serde::{Deserialize, Serialize};

use strata_sim::pipeline::{InteractResult, InteractionRequest};
use strata_sim::world::World;

// ---------------------------------------------------------------------------
// Script / record types
// ---------------------------------------------------------------------------

/// One scheduled request: submit `request` at the start of `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedRequest {
    pub tick: u64,
    pub request: InteractionRequest,
}

/// What one replayed tick produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRecord {
    pub tick: u64,
    /// Result codes in submission order.
    pub results: Vec<InteractResult>,
    pub applied: u32,
    pub rejected: u32,
    pub dropped: u32,
    /// BLAKE3 digest of the world after this tick's flush.
    pub digest: String,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Run `ticks` ticks against `world`, submitting each scripted request
/// at its tick, and record every tick's outcome.
///
/// The script need not be sorted; each tick submits its matching
/// requests in script order. Requests scheduled past the horizon never
/// run.
pub fn run_script(world: &mut World, script: &[ScriptedRequest], ticks: u64) -> Vec<TickRecord> {
    let mut records = Vec::with_capacity(ticks as usize);
    for _ in 0..ticks {
        let t = world.tick();
        for scripted in script.iter().filter(|s| s.tick == t) {
            world.submit(scripted.request);
        }
        let report = world.step();
        records.push(TickRecord {
            tick: report.tick,
            results: report.results.iter().map(|(_, result)| *result).collect(),
            applied: report.applied,
            rejected: report.rejected,
            dropped: report.dropped,
            digest: world.digest(),
        });
    }
    records
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
