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
use super::SketchKind;
use super::draw_seeds;
use super::fix_size;
use crate::error::Error;
use crate::hash::HashFamily;
use crate::hash::mbits;

/// Count-Min sketch over `u32` items.
///
/// Estimates are the minimum over rows, so for streams without negative updates
/// `point(x) >= count(x)` always holds and `point(x) <= count(x) + epsilon * N` holds with
/// probability at least `1 - delta`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMin {
    hash: HashFamily,
    width: u32,
    depth: u32,
    m_bits: u32,
    seeds: Vec<(u64, u64)>,
    counts: Vec<i64>,
}

impl CountMin {
    /// Smallest accepted branching factor.
    pub const MIN_BRANCHING: u32 = 2;

    /// `width = ceil(b / epsilon) * c` and `depth = ceil(log2(1 / delta) / log2(b))`.
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
            |b, epsilon| b / epsilon,
            |b, delta| (1.0 / delta).log2() / b.log2(),
        )
    }

    #[inline]
    fn bucket(&self, item: u32, row: usize) -> usize {
        let (a, b) = self.seeds[row];
        let bucket = self.hash.hash(self.width, self.m_bits, item, a, b);
        debug_assert!(bucket < self.width, "bucket {bucket} out of range");
        row * self.width as usize + bucket as usize
    }
}

impl FrequencySketch for CountMin {
    const KIND: SketchKind = SketchKind::CountMin;

    fn new<R: Rng + ?Sized>(
        hash: HashFamily,
        branching: u32,
        epsilon: f64,
        delta: f64,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let (width, depth) = Self::dimensions(hash, branching, epsilon, delta)?;
        let m_bits = mbits(width);
        let sketch = CountMin {
            hash,
            width,
            depth,
            m_bits,
            seeds: draw_seeds(hash, m_bits, depth, rng),
            counts: vec![0; width as usize * depth as usize],
        };
        debug!(
            width,
            depth,
            bytes = sketch.space_usage(),
            "created count-min sketch"
        );
        Ok(sketch)
    }

    fn update(&mut self, item: u32, delta: i64) {
        for row in 0..self.depth as usize {
            let index = self.bucket(item, row);
            self.counts[index] += delta;
        }
    }

    fn point(&self, item: u32) -> i64 {
        (0..self.depth as usize)
            .map(|row| self.counts[self.bucket(item, row)])
            .min()
            .unwrap_or(0)
    }

    fn row_estimate(&self, item: u32, row: usize) -> i64 {
        self.counts[self.bucket(item, row)]
    }

    fn above_threshold(&self, item: u32, threshold: f64) -> bool {
        (0..self.depth as usize).all(|row| self.counts[self.bucket(item, row)] as f64 >= threshold)
    }

    fn heavy_hitter_threshold(threshold: f64, _epsilon: f64, _l1: i64) -> f64 {
        threshold
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
            + self.seeds.len() * size_of::<(u64, u64)>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Prng;

    #[test]
    fn test_lone_item_is_exact() {
        let mut rng = Prng::default();
        let mut sketch = CountMin::new(HashFamily::CarterWegman, 2, 0.1, 0.1, &mut rng).unwrap();
        sketch.update(12, 100);
        sketch.update(12, -30);
        assert_eq!(sketch.point(12), 70);
        for row in 0..sketch.depth() as usize {
            assert_eq!(sketch.row_estimate(12, row), 70);
        }
    }

    #[test]
    fn test_above_threshold_agrees_with_point() {
        let mut rng = Prng::new(3, 5);
        let mut sketch = CountMin::new(HashFamily::MultiplyShift, 2, 0.05, 0.1, &mut rng).unwrap();
        for item in 0..500u32 {
            sketch.update(item, (item % 17) as i64);
        }
        for item in 0..500u32 {
            let point = sketch.point(item) as f64;
            assert!(sketch.above_threshold(item, point));
            assert!(!sketch.above_threshold(item, point + 1.0));
        }
    }

    #[test]
    fn test_range_sum_covers_points() {
        let mut rng = Prng::default();
        let mut sketch = CountMin::new(HashFamily::MultiplyShift, 2, 0.01, 0.1, &mut rng).unwrap();
        for item in 10..20u32 {
            sketch.update(item, 2);
        }
        assert!(sketch.range_sum(10, 19) >= 20);
        assert_eq!(sketch.range_sum(5, 5), sketch.point(5));
    }
}
