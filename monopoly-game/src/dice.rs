//! Two six-sided dice backed by a seeded, replayable RNG stream.

use std::collections::VecDeque;

use hmac::{Hmac, Mac};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::constants::{DICE_STREAM_TAG, DIE_FACES};

/// Errors raised when constructing a roll by hand.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("die face {value} is outside 1..=6")]
    FaceOutOfRange { value: u8 },
}

/// Face values of one throw of both dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceRoll {
    pub first: u8,
    pub second: u8,
}

impl DiceRoll {
    /// Build a roll from two face values.
    ///
    /// # Errors
    ///
    /// Returns [`DiceError::FaceOutOfRange`] if either face is not in `1..=6`.
    pub fn new(first: u8, second: u8) -> Result<Self, DiceError> {
        for value in [first, second] {
            if !(1..=DIE_FACES).contains(&value) {
                return Err(DiceError::FaceOutOfRange { value });
            }
        }
        Ok(Self { first, second })
    }

    /// Sum of both faces.
    #[must_use]
    pub const fn total(self) -> u8 {
        self.first + self.second
    }

    #[must_use]
    pub const fn is_double(self) -> bool {
        self.first == self.second
    }
}

impl Default for DiceRoll {
    fn default() -> Self {
        Self {
            first: 1,
            second: 1,
        }
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.first, self.second)
    }
}

/// Dice source for a single game.
///
/// Rolls come from a ChaCha20 stream derived from the game seed. Scripted
/// rolls, when queued, are consumed first so tests and replays can force an
/// exact sequence without touching the stream.
#[derive(Debug, Clone)]
pub struct Dice {
    seed: u64,
    rng: ChaCha20Rng,
    draws: u64,
    scripted: VecDeque<DiceRoll>,
}

impl Dice {
    /// Dice whose rolls are fully determined by `seed`.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, DICE_STREAM_TAG)),
            draws: 0,
            scripted: VecDeque::new(),
        }
    }

    /// Seeded dice that first replay `rolls` in order.
    #[must_use]
    pub fn with_script(seed: u64, rolls: impl IntoIterator<Item = DiceRoll>) -> Self {
        let mut dice = Self::from_seed(seed);
        dice.scripted.extend(rolls);
        dice
    }

    /// Queue one more forced roll behind any already scripted.
    pub fn push_script(&mut self, roll: DiceRoll) {
        self.scripted.push_back(roll);
    }

    /// Throw both dice.
    pub fn roll(&mut self) -> DiceRoll {
        if let Some(roll) = self.scripted.pop_front() {
            return roll;
        }
        self.draws = self.draws.saturating_add(2);
        DiceRoll {
            first: self.rng.gen_range(1..=DIE_FACES),
            second: self.rng.gen_range(1..=DIE_FACES),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of die draws taken from the RNG stream (scripted rolls excluded).
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    #[must_use]
    pub fn scripted_remaining(&self) -> usize {
        self.scripted.len()
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::from_seed(0)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
