//! The board's single deterministic random stream.
//!
//! Every random decision made during a frame draws from one [`BoardRng`] in a
//! fixed order, so a seed and an action sequence fully determine a game.

#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 128 samples of a normal distribution with mean 0.5 and deviation 1/6,
/// sorted ascending and clamped into `(0, 1]`.
const NORMAL_DISTRIBUTION_TABLE: [f32; 128] = [
    0.05145, 0.09663, 0.11174, 0.12142, 0.13605, 0.17105, 0.17258, 0.21530, //
    0.23635, 0.23639, 0.23904, 0.24757, 0.24980, 0.24990, 0.25790, 0.26612, //
    0.26901, 0.27228, 0.27448, 0.27559, 0.28557, 0.30922, 0.30927, 0.31713, //
    0.32236, 0.33123, 0.34497, 0.34826, 0.35015, 0.35721, 0.36043, 0.36845, //
    0.37570, 0.37651, 0.37730, 0.38103, 0.38347, 0.38358, 0.38484, 0.38530, //
    0.38532, 0.38780, 0.39186, 0.39258, 0.40487, 0.40520, 0.40527, 0.40847, //
    0.40848, 0.41209, 0.42415, 0.42703, 0.42871, 0.43386, 0.43608, 0.44135, //
    0.45615, 0.45931, 0.46713, 0.46910, 0.47121, 0.47193, 0.47625, 0.47652, //
    0.48158, 0.48515, 0.48932, 0.49506, 0.49913, 0.50990, 0.51050, 0.51157, //
    0.51221, 0.51680, 0.51992, 0.52243, 0.53382, 0.53642, 0.54355, 0.55121, //
    0.55626, 0.56045, 0.56506, 0.56605, 0.56606, 0.57277, 0.57465, 0.57908, //
    0.58343, 0.58985, 0.59067, 0.61786, 0.61924, 0.62512, 0.62933, 0.63372, //
    0.65184, 0.65558, 0.65710, 0.65928, 0.66245, 0.66927, 0.67744, 0.68314, //
    0.68956, 0.69014, 0.69789, 0.71099, 0.71988, 0.73045, 0.74423, 0.74634, //
    0.76216, 0.76461, 0.77973, 0.78143, 0.78193, 0.78853, 0.82277, 0.82796, //
    0.84038, 0.84198, 0.84552, 0.84775, 0.85794, 0.88356, 0.89753, 1.00000, //
];

/// Seeded random source owned by a board.
#[derive(Debug, Clone)]
pub struct BoardRng {
    seed: u64,
    rng: ChaCha8Rng,
}

impl BoardRng {
    /// A stream seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The seed this stream started from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// A uniformly distributed 32-bit value.
    pub fn urand(&mut self) -> u32 {
        self.rng.r#gen()
    }

    /// A uniformly distributed value in `[0, 1)`.
    pub fn frand(&mut self) -> f32 {
        self.rng.gen_range(0.0..1.0)
    }

    /// A sample from the normal lookup table, in `(0, 1]`.
    pub fn normal(&mut self) -> f32 {
        let index = self.urand() as usize % NORMAL_DISTRIBUTION_TABLE.len();
        NORMAL_DISTRIBUTION_TABLE[index]
    }
}
