//! Injectable randomness
//!
//! Every random decision in the simulation (lane, art variant, spacing,
//! spawn damping, door trigger) goes through `RandomSource`, so a session
//! seeded with the same value replays identically and tests can force
//! outcomes.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Source of uniform draws in `[0, 1)`
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`
    fn unit(&mut self) -> f32;

    /// Uniform index in `0..len` (`len` must be non-zero)
    fn index(&mut self, len: usize) -> usize {
        let i = (self.unit() * len as f32) as usize;
        i.min(len.saturating_sub(1))
    }

    /// True with probability `p`
    fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }
}

/// Seeded PCG generator used by live sessions
#[derive(Debug, Clone)]
pub struct SimRng {
    seed: u64,
    rng: Pcg32,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SimRng {
    fn unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    fn index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Always returns the same draw; `FixedRandom(0.0)` makes every chance succeed
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f32);

impl RandomSource for FixedRandom {
    fn unit(&mut self) -> f32 {
        self.0
    }
}

/// Replays queued draws, then falls back to a fixed value
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    queue: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = f32>, fallback: f32) -> Self {
        Self {
            queue: draws.into_iter().collect(),
            fallback,
        }
    }

    /// Draws not yet consumed
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn unit(&mut self) -> f32 {
        self.queue.pop_front().unwrap_or(self.fallback)
    }
}
