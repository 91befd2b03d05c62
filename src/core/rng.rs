//! Deterministic random source for the reference draw engine.
//!
//! - Same seed produces the same draws
//! - State capture and restore for checkpointing an engine mid-session
//!
//! ```
//! use dice_query::core::DrawRng;
//!
//! let mut a = DrawRng::new(7);
//! let mut b = DrawRng::new(7);
//! assert_eq!(a.pick(52), b.pick(52));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seeded ChaCha8 generator used to pick and shuffle cards.
#[derive(Clone, Debug)]
pub struct DrawRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl DrawRng {
    /// Create a new generator with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed this generator was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Pick an index in `0..len`. `len` must be non-zero.
    pub fn pick(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Capture the current state.
    #[must_use]
    pub fn state(&self) -> DrawRngState {
        DrawRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a captured state.
    #[must_use]
    pub fn from_state(state: &DrawRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Serializable generator state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRngState {
    /// Original seed
    pub seed: u64,
    /// ChaCha8 word position
    pub word_pos: u128,
}
