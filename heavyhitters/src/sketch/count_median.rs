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

use rand::Rng;
use tracing::debug;

use super::FrequencySketch;
use super::MAX_DEPTH;
use super::SketchKind;
use super::draw_seeds;
use super::fix_size;
use crate::common::median_wirth;
use crate::error::Error;
use crate::hash::HashFamily;
use crate::hash::SignFamily;
use crate::hash::mbits;

/// Count-Median sketch over `u32` items.
///
/// Every row adds `delta * s(x)` where `s` is a per-row `{+1, -1}` function, so collisions
/// cancel in expectation. Estimates are the lower median over rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMedian {
    hash: HashFamily,
    sign: SignFamily,
    width: u32,
    depth: u32,
    m_bits: u32,
    seeds: Vec<(u64, u64)>,
    sign_seeds: Vec<(u64, u64)>,
    counts: Vec<i64>,
}

impl CountMedian {
    /// Smallest accepted branching factor.
    pub const MIN_BRANCHING: u32 = 3;

    /// `width = ceil(b / epsilon^2) * c` and
    /// `depth = ceil(2 ln(1 / delta) / ln(b^2 / (4 (b - 1))))`.
    pub fn dimensions(
        hash: HashFamily,
        branching: u32,
        epsilon: f64,
        delta: f64,
    ) -> Result<(u32, u32), Error> {
        fix_size(
            hash,
            branching,
            Self::MIN_BRANCHING,
            epsilon,
            delta,
            |b, epsilon| b / (epsilon * epsilon),
            |b, delta| 2.0 * (1.0 / delta).ln() / (b * b / (4.0 * (b - 1.0))).ln(),
        )
    }

    /// The sign family used to decorrelate collisions.
    pub fn sign_family(&self) -> SignFamily {
        self.sign
    }

    #[cfg(test)]
    pub(crate) fn counters(&self) -> &[i64] {
        &self.counts
    }

    #[inline]
    fn cell(&self, item: u32, row: usize) -> (usize, i64) {
        let (a, b) = self.seeds[row];
        let bucket = self.hash.hash(self.width, self.m_bits, item, a, b);
        debug_assert!(bucket < self.width, "bucket {bucket} out of range");
        let (sa, sb) = self.sign_seeds[row];
        let sign = self.sign.sign(item, sa, sb);
        debug_assert!(sign == 1 || sign == -1);
        (row * self.width as usize + bucket as usize, sign)
    }

    fn median_estimate(&self, item: u32) -> i64 {
        let mut scratch = [0i64; MAX_DEPTH as usize];
        let rows = &mut scratch[..self.depth as usize];
        for (row, slot) in rows.iter_mut().enumerate() {
            *slot = self.row_estimate(item, row);
        }
        median_wirth(rows)
    }
}

impl FrequencySketch for CountMedian {
    const KIND: SketchKind = SketchKind::CountMedian;

    fn new<R: Rng + ?Sized>(
        hash: HashFamily,
        branching: u32,
        epsilon: f64,
        delta: f64,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let (width, depth) = Self::dimensions(hash, branching, epsilon, delta)?;
        let m_bits = mbits(width);
        let sign = hash.sign_family();
        let seeds = draw_seeds(hash, m_bits, depth, rng);
        let sign_seeds = (0..depth)
            .map(|_| {
                let a = sign.seed_a(rng);
                let b = sign.seed_b(rng);
                (a, b)
            })
            .collect();
        let sketch = CountMedian {
            hash,
            sign,
            width,
            depth,
            m_bits,
            seeds,
            sign_seeds,
            counts: vec![0; width as usize * depth as usize],
        };
        debug!(
            width,
            depth,
            bytes = sketch.space_usage(),
            "created count-median sketch"
        );
        Ok(sketch)
    }

    fn update(&mut self, item: u32, delta: i64) {
        for row in 0..self.depth as usize {
            let (index, sign) = self.cell(item, row);
            self.counts[index] += delta * sign;
        }
    }

    fn point(&self, item: u32) -> i64 {
        self.median_estimate(item)
    }

    fn row_estimate(&self, item: u32, row: usize) -> i64 {
        let (index, sign) = self.cell(item, row);
        self.counts[index] * sign
    }

    fn above_threshold(&self, item: u32, threshold: f64) -> bool {
        self.median_estimate(item) as f64 >= threshold
    }

    fn heavy_hitter_threshold(threshold: f64, epsilon: f64, l1: i64) -> f64 {
        threshold - epsilon * l1 as f64
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn depth(&self) -> u32 {
        self.depth
    }

    fn space_usage(&self) -> usize {
        size_of::<Self>()
            + self.counts.len() * size_of::<i64>()
            + (self.seeds.len() + self.sign_seeds.len()) * size_of::<(u64, u64)>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Prng;

    #[test]
    fn test_lone_item_is_exact() {
        for hash in [HashFamily::MultiplyShift, HashFamily::CarterWegman] {
            let mut rng = Prng::default();
            let mut sketch = CountMedian::new(hash, 4, 0.1, 0.1, &mut rng).unwrap();
            sketch.update(12, 100);
            assert_eq!(sketch.point(12), 100);
            sketch.update(12, -250);
            assert_eq!(sketch.point(12), -150);
        }
    }

    #[test]
    fn test_sign_family_follows_hash() {
        let mut rng = Prng::default();
        let sketch = CountMedian::new(HashFamily::CarterWegmanPow2, 3, 0.2, 0.2, &mut rng).unwrap();
        assert_eq!(sketch.sign_family(), SignFamily::CarterWegman);
    }

    #[test]
    fn test_heavy_hitter_threshold_is_lowered() {
        assert_eq!(CountMedian::heavy_hitter_threshold(100.0, 0.25, 200), 50.0);
    }
}
