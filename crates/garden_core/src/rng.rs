//! Random number source abstraction for procedural placement.
//!
//! Placement rolls density gates, jitter, rotation, scale and prefab choice
//! through the `GardenRng` trait so tests can inject a seeded or scripted
//! source and get reproducible forests.
//!
//! # Example
//!
//! ```ignore
//! use garden_core::rng::{GardenRng, StdRandom};
//!
//! let mut rng = StdRandom::from_seed(42);
//! let gate = rng.next_int_range(0, 10); // 0..10
//! let yaw = rng.next_float_range(0.0, 360.0);
//! let pick = rng.next_index(3); // 0..3
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random source used by the forest placer.
///
/// Ranges are half-open: `[min, max)`.
pub trait GardenRng {
    /// Returns a random integer in [min, max). Returns `min` when the range is empty.
    fn next_int_range(&mut self, min: i32, max: i32) -> i32;

    /// Returns a random float in [0.0, 1.0).
    fn next_float(&mut self) -> f32;

    /// Returns a random float in [min, max).
    fn next_float_range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_float()
    }

    /// Returns a random index in [0, len). Returns 0 when `len` is 0.
    fn next_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_float() * len as f32) as usize).min(len - 1)
    }
}

/// Default source backed by `rand::rngs::StdRng`.
#[derive(Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Create a deterministic source from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a source seeded from system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl GardenRng for StdRandom {
    fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    fn next_float(&mut self) -> f32 {
        self.rng.gen()
    }
}
