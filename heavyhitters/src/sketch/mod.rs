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

//! Frequency sketches over a 32-bit item universe.
//!
//! Both sketches keep `depth` rows of `width` signed counters, each row addressed by its own
//! member of a [`HashFamily`]. [`CountMin`] answers with the minimum over rows and never
//! underestimates a non-negative stream. [`CountMedian`] multiplies every update by a per-row
//! sign and answers with the median over rows, which tolerates negative updates.
//!
//! # Usage
//!
//! ```rust
//! # use heavyhitters::hash::HashFamily;
//! # use heavyhitters::hash::Prng;
//! # use heavyhitters::sketch::CountMin;
//! # use heavyhitters::sketch::FrequencySketch;
//! let mut rng = Prng::default();
//! let mut sketch = CountMin::new(HashFamily::MultiplyShift, 2, 0.01, 0.05, &mut rng).unwrap();
//! sketch.update(7, 3);
//! sketch.update(9, 1);
//! assert!(sketch.point(7) >= 3);
//! assert!(sketch.above_threshold(7, 3.0));
//! ```

mod count_median;
pub use self::count_median::CountMedian;

mod count_min;
pub use self::count_min::CountMin;

use rand::Rng;

use crate::error::Error;
use crate::hash::HashFamily;

/// Upper bound on the number of rows of a sketch.
pub const MAX_DEPTH: u32 = 255;
/// Upper bound on the number of counters of a sketch.
pub const MAX_TABLE_ENTRIES: u64 = 1 << 30;

/// The sketch backing the levels of a heavy hitter tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SketchKind {
    /// Minimum over rows, see [`CountMin`].
    #[default]
    CountMin,
    /// Median over signed rows, see [`CountMedian`].
    CountMedian,
}

impl SketchKind {
    /// Smallest branching factor the depth formula of this sketch accepts.
    pub const fn min_branching(self) -> u32 {
        match self {
            SketchKind::CountMin => CountMin::MIN_BRANCHING,
            SketchKind::CountMedian => CountMedian::MIN_BRANCHING,
        }
    }

    /// Returns `(width, depth)` for the given accuracy.
    pub fn dimensions(
        self,
        hash: HashFamily,
        branching: u32,
        epsilon: f64,
        delta: f64,
    ) -> Result<(u32, u32), Error> {
        match self {
            SketchKind::CountMin => CountMin::dimensions(hash, branching, epsilon, delta),
            SketchKind::CountMedian => CountMedian::dimensions(hash, branching, epsilon, delta),
        }
    }
}

/// Operations shared by the frequency sketches.
pub trait FrequencySketch: Sized {
    /// Which sketch this is.
    const KIND: SketchKind;

    /// Creates a zeroed sketch with error `epsilon` and failure probability `delta`, drawing
    /// its row seeds from `rng`.
    fn new<R: Rng + ?Sized>(
        hash: HashFamily,
        branching: u32,
        epsilon: f64,
        delta: f64,
        rng: &mut R,
    ) -> Result<Self, Error>;

    /// Adds `delta` to the count of `item`.
    fn update(&mut self, item: u32, delta: i64);

    /// Estimates the count of `item`.
    fn point(&self, item: u32) -> i64;

    /// Estimate of `item` from a single row.
    fn row_estimate(&self, item: u32, row: usize) -> i64;

    /// Whether the estimate of `item` reaches `threshold`.
    fn above_threshold(&self, item: u32, threshold: f64) -> bool;

    /// Sum of the estimates of every item in `[lo, hi]`.
    ///
    /// Linear in the length of the range.
    fn range_sum(&self, lo: u32, hi: u32) -> i64 {
        (lo..=hi).map(|item| self.point(item)).sum()
    }

    /// The threshold an inner trie level must be tested against so that no prefix reaching
    /// `threshold` is pruned, given the total mass `l1` of the stream. Leaves still use
    /// `threshold`.
    fn heavy_hitter_threshold(threshold: f64, epsilon: f64, l1: i64) -> f64;

    /// Counters per row.
    fn width(&self) -> u32;

    /// Number of rows.
    fn depth(&self) -> u32;

    /// Approximate heap footprint in bytes.
    fn space_usage(&self) -> usize;
}

/// Validates the accuracy parameters and turns the raw formulas into table dimensions.
fn fix_size(
    hash: HashFamily,
    branching: u32,
    min_branching: u32,
    epsilon: f64,
    delta: f64,
    width: impl FnOnce(f64, f64) -> f64,
    depth: impl FnOnce(f64, f64) -> f64,
) -> Result<(u32, u32), Error> {
    if branching < min_branching {
        return Err(Error::invalid_argument(format!(
            "branching factor must be at least {min_branching}"
        ))
        .with_context("branching", branching));
    }
    if !(epsilon.is_finite() && epsilon > 0.0) {
        return Err(Error::out_of_range("epsilon", "(0, inf)", epsilon));
    }
    if !(delta > 0.0 && delta < 1.0) {
        return Err(Error::out_of_range("delta", "(0, 1)", delta));
    }

    let b = branching as f64;
    let w = width(b, epsilon).ceil() * hash.constant() as f64;
    let d = depth(b, delta).ceil().max(1.0);
    if w > MAX_TABLE_ENTRIES as f64 {
        return Err(Error::invalid_argument("sketch width overflows").with_context("width", w));
    }
    let mut w = (w as u32).max(1);
    if hash.requires_pow2() {
        w = w.next_power_of_two();
    }
    if d > MAX_DEPTH as f64 {
        return Err(Error::invalid_argument("sketch depth overflows").with_context("depth", d));
    }
    let d = d as u32;
    if w as u64 * d as u64 > MAX_TABLE_ENTRIES {
        return Err(Error::invalid_argument("sketch table overflows")
            .with_context("width", w)
            .with_context("depth", d));
    }
    Ok((w, d))
}

/// Draws one `(a, b)` pair per row.
fn draw_seeds<R: Rng + ?Sized>(
    hash: HashFamily,
    m_bits: u32,
    depth: u32,
    rng: &mut R,
) -> Vec<(u64, u64)> {
    (0..depth)
        .map(|_| {
            let a = hash.seed_a(rng);
            let b = hash.seed_b(m_bits, rng);
            (a, b)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_min_dimensions() {
        // ceil(3 / 0.25) = 12, ceil(log2(20) / log2(3)) = 3
        let dims = SketchKind::CountMin.dimensions(HashFamily::MultiplyShift, 3, 0.25, 0.05);
        assert_eq!(dims.unwrap(), (16, 3));
        let dims = SketchKind::CountMin.dimensions(HashFamily::CarterWegman2, 3, 0.25, 0.05);
        assert_eq!(dims.unwrap(), (24, 3));
    }

    #[test]
    fn test_count_median_dimensions() {
        // ceil(8 / 0.0016) = 5000 rounded to 8192, ceil(2 ln(10) / ln(64 / 28)) = 6
        let dims = SketchKind::CountMedian.dimensions(HashFamily::MultiplyShift, 8, 0.04, 0.1);
        assert_eq!(dims.unwrap(), (8192, 6));
    }

    #[test]
    fn test_invalid_dimensions() {
        let kind = SketchKind::CountMin;
        let hash = HashFamily::MultiplyShift;
        assert!(kind.dimensions(hash, 1, 0.01, 0.05).is_err());
        assert!(kind.dimensions(hash, 2, 0.0, 0.05).is_err());
        assert!(kind.dimensions(hash, 2, 0.01, 1.0).is_err());
        assert!(kind.dimensions(hash, 2, 1e-12, 0.05).is_err());
        assert!(SketchKind::CountMedian.dimensions(hash, 2, 0.01, 0.05).is_err());
    }
}
