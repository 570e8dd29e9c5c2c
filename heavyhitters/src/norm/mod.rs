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

//! L2 norm estimation over a Count-Median sketch.
//!
//! Each row of the sketch keeps the running sum of its squared counters, so the norm is
//! available in `O(depth)` at any point of the stream.
//!
//! # Usage
//!
//! ```rust
//! # use heavyhitters::hash::HashFamily;
//! # use heavyhitters::hash::Prng;
//! # use heavyhitters::norm::L2Norm;
//! let mut rng = Prng::default();
//! let mut norm = L2Norm::new(HashFamily::MultiplyShift, 4, 0.1, 0.1, &mut rng).unwrap();
//! norm.update(12, 100);
//! assert_eq!(norm.norm(), 100.0);
//! ```

use rand::Rng;
use tracing::debug;

use crate::common::median_wirth;
use crate::error::Error;
use crate::hash::HashFamily;
use crate::sketch::CountMedian;
use crate::sketch::FrequencySketch;
use crate::sketch::MAX_DEPTH;

/// Streaming estimate of `sqrt(sum of squared counts)`.
#[derive(Debug, Clone)]
pub struct L2Norm {
    sketch: CountMedian,
    sums: Vec<i128>,
}

impl L2Norm {
    /// Creates an estimator backed by a Count-Median sketch with the given accuracy.
    pub fn new<R: Rng + ?Sized>(
        hash: HashFamily,
        branching: u32,
        epsilon: f64,
        delta: f64,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let sketch = CountMedian::new(hash, branching, epsilon, delta, rng)?;
        let sums = vec![0; sketch.depth() as usize];
        debug!(
            width = sketch.width(),
            depth = sketch.depth(),
            "created l2 norm estimator"
        );
        Ok(L2Norm { sketch, sums })
    }

    /// The sketch holding the signed counters.
    pub fn sketch(&self) -> &CountMedian {
        &self.sketch
    }

    /// Adds `delta` to the count of `item`.
    pub fn update(&mut self, item: u32, delta: i64) {
        for (row, sum) in self.sums.iter_mut().enumerate() {
            let old = self.sketch.row_estimate(item, row) as i128;
            let new = old + delta as i128;
            *sum += new * new - old * old;
        }
        self.sketch.update(item, delta);
    }

    /// Returns the median over rows of the square root of the row sums.
    pub fn norm(&self) -> f64 {
        let mut scratch = [0f64; MAX_DEPTH as usize];
        let rows = &mut scratch[..self.sums.len()];
        for (slot, &sum) in rows.iter_mut().zip(&self.sums) {
            *slot = (sum as f64).sqrt();
        }
        median_wirth(rows)
    }
}
