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
use tracing::trace;

use super::Params;
use crate::error::Error;
use crate::hash::HashFamily;
use crate::sketch::CountMin;

const MOD31: u64 = (1 << 31) - 1;

/// `((a*x + b) >> 31) + (a*x + b)` reduced to 31 bits.
#[inline]
fn hash31(a: u64, b: u64, x: u64) -> u64 {
    let r = a.wrapping_mul(x).wrapping_add(b);
    ((r >> 31).wrapping_add(r)) & MOD31
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Level {
    Exact(Vec<i64>),
    Sketch {
        seeds: Vec<(u64, u64)>,
        counts: Vec<i64>,
    },
}

/// Hierarchical Count-Min after Cormode and Muthukrishnan.
///
/// Level 0 counts items, every level above counts items shifted right by one more bit. Upper
/// levels small enough to fit in a sketch are counted exactly. Queries descend depth first from
/// the root.
#[derive(Debug, Clone)]
pub struct HierarchicalCountMin {
    universe: u64,
    phi: f64,
    width: u32,
    depth: u32,
    levels: Vec<Level>,
    total: i64,
    result: Vec<u32>,
}

impl HierarchicalCountMin {
    const GRANULARITY: u32 = 1;

    pub(crate) fn new<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> Result<Self, Error> {
        let bits = params.bits();
        let levels = bits.div_ceil(Self::GRANULARITY);
        let delta =
            params.delta * params.phi / (2.0 * Self::GRANULARITY as f64 * levels as f64);
        // Rows are reduced modulo the width, so the width is never rounded.
        let (width, depth) =
            CountMin::dimensions(HashFamily::CarterWegman, params.branching, params.epsilon, delta)?;
        let width = width * params.hash.constant();

        let cells = width as u64 * depth as u64;
        let exact_from = (0..levels)
            .filter(|&j| 1u64 << (Self::GRANULARITY * j) <= cells)
            .max()
            .map_or(levels, |j| levels - j);

        let levels = (0..levels)
            .map(|i| {
                if i >= exact_from {
                    Level::Exact(vec![0; 1 << (bits - Self::GRANULARITY * i)])
                } else {
                    let seeds = (0..depth)
                        .map(|_| {
                            let a = rng.random::<u32>() as u64 & MOD31;
                            let b = rng.random::<u32>() as u64 & MOD31;
                            (a, b)
                        })
                        .collect();
                    Level::Sketch {
                        seeds,
                        counts: vec![0; cells as usize],
                    }
                }
            })
            .collect::<Vec<_>>();

        let cmh = HierarchicalCountMin {
            universe: params.universe,
            phi: params.phi,
            width,
            depth,
            levels,
            total: 0,
            result: Vec::with_capacity((2.0 / params.phi).ceil() as usize),
        };
        debug!(
            width,
            depth,
            levels = cmh.levels.len(),
            exact_levels = cmh.exact_levels(),
            bytes = cmh.space_usage(),
            "created hierarchical count-min"
        );
        Ok(cmh)
    }

    /// Width of the sketched levels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Rows of the sketched levels.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of levels counted exactly.
    pub fn exact_levels(&self) -> usize {
        self.levels
            .iter()
            .filter(|level| matches!(level, Level::Exact(_)))
            .count()
    }

    /// Sum of all update deltas.
    pub fn total_weight(&self) -> i64 {
        self.total
    }

    /// Approximate heap footprint in bytes.
    pub fn space_usage(&self) -> usize {
        let levels: usize = self
            .levels
            .iter()
            .map(|level| match level {
                Level::Exact(counts) => counts.len() * size_of::<i64>(),
                Level::Sketch { seeds, counts } => {
                    counts.len() * size_of::<i64>() + seeds.len() * size_of::<(u64, u64)>()
                }
            })
            .sum();
        size_of::<Self>() + levels + self.result.capacity() * size_of::<u32>()
    }

    /// Adds `delta` to the count of `item`.
    ///
    /// # Panics
    ///
    /// Panics if `item` is outside the universe.
    pub fn update(&mut self, item: u32, delta: i64) {
        assert!(
            (item as u64) < self.universe,
            "item {item} outside the universe"
        );
        let width = self.width as u64;
        let mut node = item;
        for level in self.levels.iter_mut() {
            match level {
                Level::Exact(counts) => counts[node as usize] += delta,
                Level::Sketch { seeds, counts } => {
                    for (row, &(a, b)) in seeds.iter().enumerate() {
                        let bucket = hash31(a, b, node as u64) % width;
                        counts[row * width as usize + bucket as usize] += delta;
                    }
                }
            }
            node >>= Self::GRANULARITY;
        }
        self.total += delta;
    }

    /// Estimate for `node` at `level`; the level above the top is the root.
    fn count(&self, level: usize, node: u32) -> i64 {
        let Some(level) = self.levels.get(level) else {
            return self.total;
        };
        match level {
            Level::Exact(counts) => counts[node as usize],
            Level::Sketch { seeds, counts } => {
                let width = self.width as u64;
                seeds
                    .iter()
                    .enumerate()
                    .map(|(row, &(a, b))| {
                        counts[row * width as usize + (hash31(a, b, node as u64) % width) as usize]
                    })
                    .min()
                    .unwrap_or(0)
            }
        }
    }

    fn descend(&mut self, level: usize, node: u32, threshold: f64) {
        if (self.count(level, node) as f64) < threshold {
            return;
        }
        if level == 0 {
            if (node as u64) < self.universe {
                self.result.push(node);
            }
            return;
        }
        let first = node << Self::GRANULARITY;
        for child in 0..1u32 << Self::GRANULARITY {
            self.descend(level - 1, first + child, threshold);
        }
    }

    /// Returns the items whose count reaches `phi` of the total weight, in ascending order.
    pub fn query(&mut self) -> &[u32] {
        self.result.clear();
        if self.total <= 0 {
            return &self.result;
        }
        let threshold = self.phi * self.total as f64;
        self.descend(self.levels.len(), 0, threshold);
        trace!(threshold, candidates = self.result.len(), "queried hierarchical count-min");
        &self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Prng;

    #[test]
    fn test_hash31_reduces() {
        assert_eq!(hash31(1, 0, 5), 5);
        assert_eq!(hash31(1, 0, 1 << 31), 1);
        assert!(hash31(MOD31, MOD31, u32::MAX as u64) <= MOD31);
    }

    #[test]
    fn test_exact_levels_are_upper_levels() {
        let params = Params {
            phi: 0.1,
            epsilon: 0.01,
            delta: 0.1,
            universe: 1 << 20,
            branching: 2,
            hash: HashFamily::CarterWegman,
        };
        let mut rng = Prng::default();
        let mut cmh = HierarchicalCountMin::new(&params, &mut rng).unwrap();
        assert_eq!(cmh.width(), 200);
        assert!(cmh.exact_levels() > 0 && cmh.exact_levels() < 20);
        cmh.update(0xFFFFF, 10);
        cmh.update(1, 1);
        assert_eq!(cmh.count(19, 1), 10);
        assert_eq!(cmh.count(20, 0), 11);
        assert_eq!(cmh.query(), &[0xFFFFF]);
    }
}
