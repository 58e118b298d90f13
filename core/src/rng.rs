//! Deterministic random number generation.
//!
//! RULE: Nothing in the generator may call any platform RNG.
//! All randomness flows through DrawRng instances derived
//! from the single master seed of the run.
//!
//! Each generated column gets its own RNG stream, seeded deterministically
//! from (master_seed XOR slot_index). This means:
//!   - Adding a new column never changes existing columns' values.
//!   - Each column's stream is fully reproducible in isolation.

use rand::SeedableRng;
use rand_distr::Distribution;
use rand_pcg::Pcg64Mcg;

/// A deterministic RNG for a single drawn column.
pub struct DrawRng {
    inner: Pcg64Mcg,
}

impl DrawRng {
    /// Create a column RNG from the master seed and a stable
    /// slot index. The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a u64 in [0, n), without modulo bias.
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::Rng;
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }

    /// Draw one value from any `rand_distr` distribution.
    pub fn sample<D: Distribution<f64>>(&mut self, dist: &D) -> f64 {
        dist.sample(&mut self.inner)
    }

    /// Pick one element uniformly, with replacement.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }
}

/// All column RNGs for a single run, indexed by stable slot.
pub struct DrawBank {
    master_seed: u64,
}

impl DrawBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_slot(&self, slot: DrawSlot) -> DrawRng {
        DrawRng::new(self.master_seed, slot as u64)
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries; only append.
/// Reordering changes every column's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum DrawSlot {
    Fico = 0,
    Ltv = 1,
    BaseRate = 2,
    Balance = 3,
    State = 4,
    Term = 5,
}
