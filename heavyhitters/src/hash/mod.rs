// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Universal hash families used to address sketch rows.
//!
//! Every family maps a 32-bit item into `[0, width)` given a per-row seed pair `(a, b)`.
//! Seeds are drawn once, at sketch construction, from a caller supplied [`rand::Rng`];
//! [`Prng`] reproduces the multiply-with-carry generator the sketches were tuned against.
//!
//! # Usage
//!
//! ```rust
//! # use heavyhitters::hash::HashFamily;
//! # use heavyhitters::hash::Prng;
//! # use heavyhitters::hash::mbits;
//! let family = HashFamily::MultiplyShift;
//! let mut rng = Prng::default();
//! let width = 128;
//! let m = mbits(width);
//! let a = family.seed_a(&mut rng);
//! let b = family.seed_b(m, &mut rng);
//! assert!(family.hash(width, m, 42, a, b) < width);
//! ```

mod prng;
pub use self::prng::Prng;

use rand::Rng;

/// Mersenne prime `2^61 - 1` used by the Carter-Wegman families.
pub const MOD_P: u64 = (1 << 61) - 1;

const WORD_BITS: u32 = u32::BITS;

/// Returns `floor(log2(width))`, the number of output bits of a width.
///
/// # Panics
///
/// Panics if `width` is 0.
pub fn mbits(width: u32) -> u32 {
    assert!(width > 0, "width must be positive");
    width.ilog2()
}

/// A family of universal hash functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashFamily {
    /// `((a*x + b) mod 2^32) >> (32 - M)`.
    #[default]
    MultiplyShift,
    /// Multiply-shift without the additive term.
    MultiplyShift2,
    /// `((a*x + b) mod P) mod width`.
    CarterWegman,
    /// Carter-Wegman with `& (width - 1)` as the final reduction.
    CarterWegmanPow2,
    /// Carter-Wegman without the additive term.
    CarterWegman2,
    /// Carter-Wegman without the additive term, masked to a power-of-two width.
    CarterWegman2Pow2,
}

impl HashFamily {
    /// Width multiplier the sketches apply for this family.
    pub const fn constant(self) -> u32 {
        match self {
            HashFamily::MultiplyShift | HashFamily::CarterWegman | HashFamily::CarterWegmanPow2 => 1,
            HashFamily::MultiplyShift2
            | HashFamily::CarterWegman2
            | HashFamily::CarterWegman2Pow2 => 2,
        }
    }

    /// Whether the table width must be a power of two.
    pub const fn requires_pow2(self) -> bool {
        !matches!(self, HashFamily::CarterWegman | HashFamily::CarterWegman2)
    }

    /// The sign family matching the arithmetic of this family.
    pub const fn sign_family(self) -> SignFamily {
        match self {
            HashFamily::MultiplyShift | HashFamily::MultiplyShift2 => SignFamily::MultiplyShift,
            _ => SignFamily::CarterWegman,
        }
    }

    /// Draws the multiplier of a row.
    pub fn seed_a<R: Rng + ?Sized>(self, rng: &mut R) -> u64 {
        match self {
            HashFamily::MultiplyShift | HashFamily::MultiplyShift2 => odd_multiplier(rng),
            _ => rng.random_range(1..MOD_P),
        }
    }

    /// Draws the additive term of a row whose width has `m_bits` output bits.
    pub fn seed_b<R: Rng + ?Sized>(self, m_bits: u32, rng: &mut R) -> u64 {
        match self {
            HashFamily::MultiplyShift => rng.random_range(0..1u64 << (WORD_BITS - m_bits)),
            HashFamily::CarterWegman | HashFamily::CarterWegmanPow2 => rng.random_range(0..MOD_P),
            HashFamily::MultiplyShift2
            | HashFamily::CarterWegman2
            | HashFamily::CarterWegman2Pow2 => 0,
        }
    }

    /// Hashes `x` into `[0, width)`.
    ///
    /// `m_bits` must be [`mbits`]`(width)`; `(a, b)` must come from [`seed_a`](Self::seed_a) and
    /// [`seed_b`](Self::seed_b) of the same family.
    #[inline]
    pub fn hash(self, width: u32, m_bits: u32, x: u32, a: u64, b: u64) -> u32 {
        debug_assert!(width > 0);
        debug_assert!(!self.requires_pow2() || width.is_power_of_two());
        match self {
            HashFamily::MultiplyShift => {
                debug_assert!(a & 1 == 1 && a <= u32::MAX as u64);
                debug_assert!(b < 1u64 << (WORD_BITS - m_bits));
                multiply_shift(x, a, b, m_bits)
            }
            HashFamily::MultiplyShift2 => {
                debug_assert!(a & 1 == 1 && a <= u32::MAX as u64);
                multiply_shift(x, a, 0, m_bits)
            }
            HashFamily::CarterWegman => (mod_p(a, x, b) % width as u64) as u32,
            HashFamily::CarterWegmanPow2 => (mod_p(a, x, b) & (width as u64 - 1)) as u32,
            HashFamily::CarterWegman2 => (mod_p(a, x, 0) % width as u64) as u32,
            HashFamily::CarterWegman2Pow2 => (mod_p(a, x, 0) & (width as u64 - 1)) as u32,
        }
    }
}

/// A pairwise independent family of `{+1, -1}` valued functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignFamily {
    /// Top bit of `(a*x + b) mod 2^32`.
    #[default]
    MultiplyShift,
    /// Bit 31 of `(a*x + b) mod P`.
    CarterWegman,
}

impl SignFamily {
    /// Draws the multiplier of a row.
    pub fn seed_a<R: Rng + ?Sized>(self, rng: &mut R) -> u64 {
        match self {
            SignFamily::MultiplyShift => odd_multiplier(rng),
            SignFamily::CarterWegman => rng.random_range(1..MOD_P),
        }
    }

    /// Draws the additive term of a row.
    pub fn seed_b<R: Rng + ?Sized>(self, rng: &mut R) -> u64 {
        match self {
            SignFamily::MultiplyShift => rng.random_range(0..1u64 << (WORD_BITS - 1)),
            SignFamily::CarterWegman => rng.random_range(0..MOD_P),
        }
    }

    /// Returns `+1` or `-1` for `x`.
    #[inline]
    pub fn sign(self, x: u32, a: u64, b: u64) -> i64 {
        let bit = match self {
            SignFamily::MultiplyShift => (a as u32).wrapping_mul(x).wrapping_add(b as u32) >> 31,
            SignFamily::CarterWegman => ((mod_p(a, x, b) >> 31) & 1) as u32,
        };
        if bit == 1 { 1 } else { -1 }
    }
}

fn odd_multiplier<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    (rng.random::<u32>() | 1) as u64
}

#[inline]
fn multiply_shift(x: u32, a: u64, b: u64, m_bits: u32) -> u32 {
    if m_bits == 0 {
        return 0;
    }
    (a as u32).wrapping_mul(x).wrapping_add(b as u32) >> (WORD_BITS - m_bits)
}

/// `(a*x + b) mod P` with `P = 2^61 - 1`.
#[inline]
fn mod_p(a: u64, x: u32, b: u64) -> u64 {
    debug_assert!(a > 0 && a < MOD_P);
    debug_assert!(b < MOD_P);
    let r = a as u128 * x as u128 + b as u128;
    let folded = (r as u64 & MOD_P) + (r >> 61) as u64;
    if folded >= MOD_P { folded - MOD_P } else { folded }
}
