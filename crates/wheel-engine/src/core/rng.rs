//! Seedable random source for per-round variation.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::api::config::StrengthRange;

/// Deterministic generator handed to scene construction.
/// The same seed always produces the same sequence of draws.
#[derive(Debug, Clone)]
pub struct RoundRng {
    seed: u64,
    rng: Pcg32,
}

impl RoundRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw an arm strength uniformly from the inclusive range.
    pub fn arm_strength(&mut self, range: StrengthRange) -> f32 {
        if range.min >= range.max {
            return range.min;
        }
        self.rng.random_range(range.min..=range.max)
    }
}
