//! Per-module key reservoirs.
//!
//! A reservoir is the integer range `[min, max)` shuffled with a fixed seed.
//! Keys are popped from the end. Because the shuffle depends only on the
//! range and the seed, a module that creates the same entities in the same
//! order receives the same keys on every run.
//!
//! ```
//! use kgraph_store::KeyReservoir;
//!
//! let mut a = KeyReservoir::with_seed(100, 105, 1750);
//! let mut b = KeyReservoir::with_seed(100, 105, 1750);
//! assert_eq!(a.pop().unwrap(), b.pop().unwrap());
//! ```

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::ReservoirConfig;
use crate::error::{Result, StoreError};

/// Deterministically shuffled supply of numeric keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyReservoir {
    min: u32,
    max: u32,
    seed: u64,
    keys: Vec<u32>,
}

impl KeyReservoir {
    /// Seed used when none is given.
    pub const DEFAULT_SEED: u64 = 1750;

    /// Creates a reservoir over `[min, max)` shuffled with [`Self::DEFAULT_SEED`].
    #[must_use]
    pub fn new(min: u32, max: u32) -> Self {
        Self::with_seed(min, max, Self::DEFAULT_SEED)
    }

    /// Creates a reservoir over `[min, max)` shuffled with `seed`.
    #[must_use]
    pub fn with_seed(min: u32, max: u32, seed: u64) -> Self {
        let mut keys: Vec<u32> = (min..max).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        keys.shuffle(&mut rng);
        Self {
            min,
            max,
            seed,
            keys,
        }
    }

    /// Removes and returns the next key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReservoirExhausted`] once every key was handed out.
    pub fn pop(&mut self) -> Result<u32> {
        self.keys.pop().ok_or(StoreError::ReservoirExhausted {
            min: self.min,
            max: self.max,
        })
    }

    /// Fails unless at least `count` keys are left.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReservoirExhausted`] if fewer keys remain.
    pub fn ensure(&self, count: usize) -> Result<()> {
        if self.keys.len() < count {
            return Err(StoreError::ReservoirExhausted {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Puts back keys handed out by [`Self::pop`], given in the order they
    /// were popped. The next pop returns `popped[0]` again.
    pub(crate) fn restore(&mut self, popped: &[u32]) {
        self.keys.extend(popped.iter().rev());
    }

    /// Number of keys still available.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }

    /// The keys still available, in shuffled order (the last one pops first).
    #[must_use]
    pub fn keys(&self) -> &[u32] {
        &self.keys
    }

    /// The `(min, max)` bounds of the range.
    #[must_use]
    pub fn range(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    /// The shuffle seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for KeyReservoir {
    fn default() -> Self {
        Self::from(&ReservoirConfig::default())
    }
}

impl From<&ReservoirConfig> for KeyReservoir {
    fn from(config: &ReservoirConfig) -> Self {
        Self::with_seed(config.min, config.max, config.seed)
    }
}
