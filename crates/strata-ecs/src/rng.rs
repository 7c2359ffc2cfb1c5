//! Deterministic SplitMix32 PRNG.
//!
//! A 32-bit splittable generator: the state advances by the golden-ratio
//! constant and the output is three xor-shift/multiply rounds over the
//! advanced state. The same seed produces the same sequence on every
//! platform and build, which is the foundation of the replay guarantee.
//!
//! Interaction rolls never share a generator. Each roll seeds a fresh
//! [`SplitMix32`] from `(world seed, tick, actor, target)` via
//! [`SplitMix32::for_roll`], so a roll is a pure function of those four
//! inputs regardless of how many other rolls happened this tick.
//!
//! `d100` uses `state % 100`, which is slightly biased. That bias is the
//! contract -- callers needing unbiased draws must redraw -- and a
//! distribution test pins it to within tolerance.

use rand::{Error, RngCore, SeedableRng};

use crate::entity::EntityId;

/// Golden-ratio increment (2^32 / phi).
const GOLDEN: u32 = 0x9E37_79B9;
/// First mixing multiplier.
const MIX_1: u32 = 0x21F0_AAAD;
/// Second mixing multiplier.
const MIX_2: u32 = 0x735A_2D97;

/// Odd multiplier applied to the actor id when deriving a roll seed.
const ROLL_ACTOR_MUL: u32 = 0x9E37_79B1;
/// Odd multiplier applied to the target id when deriving a roll seed.
const ROLL_TARGET_MUL: u32 = 0x85EB_CA77;

// ---------------------------------------------------------------------------
// SplitMix32
// ---------------------------------------------------------------------------

/// Seedable 32-bit SplitMix generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitMix32 {
    state: u32,
}

impl SplitMix32 {
    /// Create a generator with the given seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Reset the state to `seed`.
    pub fn reseed(&mut self, seed: u32) {
        self.state = seed;
    }

    /// Seed a fresh generator for one interaction roll.
    ///
    /// The seed mixes the world seed, the (folded) tick number, and the
    /// actor/target ids scaled by fixed odd multipliers, so distinct
    /// pairs interacting on the same tick draw independent rolls.
    pub fn for_roll(world_seed: u32, tick: u64, actor: EntityId, target: EntityId) -> Self {
        let tick_folded = (tick as u32) ^ ((tick >> 32) as u32);
        let seed = world_seed
            ^ tick_folded
            ^ actor.raw().wrapping_mul(ROLL_ACTOR_MUL)
            ^ target.raw().wrapping_mul(ROLL_TARGET_MUL);
        Self::new(seed)
    }

    /// Next pseudo-random `u32`; advances the state.
    pub fn next_value(&mut self) -> u32 {
        let mut z = self.state.wrapping_add(GOLDEN);
        self.state = z;
        z ^= z >> 16;
        z = z.wrapping_mul(MIX_1);
        z ^= z >> 15;
        z = z.wrapping_mul(MIX_2);
        z ^= z >> 15;
        z
    }

    /// A value in `[0, max_exclusive)` via modulo. `range(0) == 0`.
    pub fn range(&mut self, max_exclusive: u32) -> u32 {
        if max_exclusive == 0 {
            return 0;
        }
        self.next_value() % max_exclusive
    }

    /// A d100 roll in `0..=99`.
    pub fn d100(&mut self) -> i32 {
        self.range(100) as i32
    }
}

// ---------------------------------------------------------------------------
// rand integration
// ---------------------------------------------------------------------------

impl RngCore for SplitMix32 {
    fn next_u32(&mut self) -> u32 {
        self.next_value()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_value() as u64;
        let hi = self.next_value() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = self.next_value().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SplitMix32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
