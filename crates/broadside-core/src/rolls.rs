//! Random roll sources for combat.
//!
//! Critical hits and evasion are decided by uniform rolls in `[0, 1)`. The
//! source is injected into the damage calculator so that a fixed seed (or a
//! fixed script of rolls) reproduces every outcome.

use std::collections::VecDeque;
use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Supplier of uniform rolls in `[0, 1)`.
///
/// A roll *succeeds* against a chance `p` when `roll < p`.
pub trait RollSource: Send + Sync + fmt::Debug {
    /// Next roll in `[0, 1)`.
    fn roll(&mut self) -> f64;
}

/// Deterministic rolls from a seeded `ChaCha8` stream.
#[derive(Debug, Clone)]
pub struct SeededRolls {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededRolls {
    /// Creates a stream from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this stream started from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RollSource for SeededRolls {
    fn roll(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of rolls, then repeats a fallback value.
///
/// Useful for forcing specific outcomes: `0.0` succeeds against any non-zero
/// chance, `0.999` fails against anything below it.
#[derive(Debug, Clone)]
pub struct ScriptedRolls {
    script: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRolls {
    /// Replays `rolls` in order, then returns `0.999` forever.
    #[must_use]
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            script: rolls.into_iter().collect(),
            fallback: 0.999,
        }
    }

    /// Always returns `value`.
    #[must_use]
    pub fn always(value: f64) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: value,
        }
    }

    /// Replaces the value returned once the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, value: f64) -> Self {
        self.fallback = value;
        self
    }

    /// Rolls left in the script.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RollSource for ScriptedRolls {
    fn roll(&mut self) -> f64 {
        self.script.pop_front().unwrap_or(self.fallback)
    }
}
