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

use rand::RngCore;
use rand::SeedableRng;

const DEFAULT_STATE: (u32, u32) = (1234, 5678);
const UNIT: f64 = 2.328306437080797e-10;

/// Two-word multiply-with-carry generator.
///
/// Cheap and reproducible: the same state always yields the same seeds, so sketches built from
/// a [`Prng`] with a fixed state are identical across runs.
///
/// # Examples
///
/// ```
/// # use heavyhitters::hash::Prng;
/// let mut a = Prng::new(7, 11);
/// let mut b = Prng::new(7, 11);
/// assert_eq!(a.uniform(), b.uniform());
/// assert!((0.0..1.0).contains(&a.uniform()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prng {
    i1: u32,
    i2: u32,
}

impl Default for Prng {
    fn default() -> Self {
        Self::new(DEFAULT_STATE.0, DEFAULT_STATE.1)
    }
}

impl Prng {
    /// Creates a generator from two state words.
    ///
    /// A zero word never leaves zero, so it is replaced by its default value.
    pub fn new(i1: u32, i2: u32) -> Self {
        Prng {
            i1: if i1 == 0 { DEFAULT_STATE.0 } else { i1 },
            i2: if i2 == 0 { DEFAULT_STATE.1 } else { i2 },
        }
    }

    /// Returns the current state words.
    pub fn state(&self) -> (u32, u32) {
        (self.i1, self.i2)
    }

    /// Returns a uniform sample in `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.step() as f64 * UNIT
    }

    fn step(&mut self) -> u32 {
        self.i1 = 36969 * (self.i1 & 0xFFFF) + (self.i1 >> 16);
        self.i2 = 18000 * (self.i2 & 0xFFFF) + (self.i2 >> 16);
        (self.i1 << 16) ^ (self.i2 & 0xFFFF)
    }
}

impl RngCore for Prng {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.step() as u64;
        let hi = self.step() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for Prng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        let i1 = u32::from_le_bytes([seed[0], seed[1], seed[2], seed[3]]);
        let i2 = u32::from_le_bytes([seed[4], seed[5], seed[6], seed[7]]);
        Prng::new(i1, i2)
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_first_steps_from_default_state() {
        let mut rng = Prng::default();
        // i1 = 36969 * 1234, i2 = 18000 * 5678
        let i1 = 36969u32 * 1234;
        let i2 = 18000u32 * 5678;
        assert_eq!(rng.next_u32(), (i1 << 16) ^ (i2 & 0xFFFF));
        assert_eq!(rng.state(), (i1, i2));
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = Prng::new(42, 4242);
        let mut sum = 0.0;
        for _ in 0..100_000 {
            let u = rng.uniform();
            assert!((0.0..1.0).contains(&u));
            sum += u;
        }
        let mean = sum / 100_000.0;
        assert!((mean - 0.5).abs() < 0.01, "mean {mean}");
    }

    #[test]
    fn test_zero_state_is_replaced() {
        assert_eq!(Prng::new(0, 0), Prng::default());
        assert_ne!(Prng::seed_from_u64(0).state().0, 0);
    }

    #[test]
    fn test_drives_rand_api() {
        let mut rng = Prng::from_seed([1, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(rng.state(), (1, 2));
        for _ in 0..1000 {
            let v = rng.random_range(10..20u64);
            assert!((10..20).contains(&v));
        }
    }
}
