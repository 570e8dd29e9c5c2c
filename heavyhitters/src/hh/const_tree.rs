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
use super::Trie;
use super::exact::ExactLevels;
use crate::common::Fifo;
use crate::error::Error;
use crate::hash::HashFamily;
use crate::hash::mbits;
use crate::sketch::FrequencySketch;
use crate::sketch::MAX_TABLE_ENTRIES;

// Load factor of a hashed level relative to the leaf sketch width.
const ROW_LOAD: f64 = 0.25;

/// One hashed counter row per sketch level, all rows in one arena.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HashedRows {
    hash: HashFamily,
    width: u32,
    m_bits: u32,
    seeds: Vec<(u64, u64)>,
    counters: Vec<i64>,
}

impl HashedRows {
    fn new<R: Rng + ?Sized>(hash: HashFamily, width: u32, rows: u32, rng: &mut R) -> Self {
        let m_bits = mbits(width);
        let seeds = (0..rows)
            .map(|_| {
                let a = hash.seed_a(rng);
                let b = hash.seed_b(m_bits, rng);
                (a, b)
            })
            .collect();
        HashedRows {
            hash,
            width,
            m_bits,
            seeds,
            counters: vec![0; width as usize * rows as usize],
        }
    }

    #[inline]
    fn index(&self, row: usize, node: u32) -> usize {
        let (a, b) = self.seeds[row];
        let bucket = self.hash.hash(self.width, self.m_bits, node, a, b);
        debug_assert!(bucket < self.width, "bucket {bucket} out of range");
        row * self.width as usize + bucket as usize
    }

    fn add(&mut self, row: usize, node: u32, delta: i64) {
        let index = self.index(row, node);
        self.counters[index] += delta;
    }

    fn get(&self, row: usize, node: u32) -> i64 {
        self.counters[self.index(row, node)]
    }

    fn space_usage(&self) -> usize {
        self.counters.len() * size_of::<i64>() + self.seeds.len() * size_of::<(u64, u64)>()
    }
}

/// Binary heavy hitter trie whose sketch levels are single hashed rows.
///
/// Each level below the exact ones keeps one row of counters addressed by its own hash, so
/// space grows with `w * log(m)` instead of `w * d * log(m)`. Rows are tested against the
/// raised threshold `(phi + epsilon) * N`, and every surviving leaf is confirmed against a full
/// sketch over the items. With high probability no item lighter than `phi * N` is reported and
/// every item of weight at least `(phi + epsilon) * N` is.
#[derive(Debug, Clone)]
pub struct ConstSketchTree<S> {
    universe: u64,
    phi: f64,
    epsilon: f64,
    trie: Trie,
    exact: ExactLevels,
    rows: HashedRows,
    leaf: S,
    norm: i64,
    fifo: Fifo<(u32, u8)>,
    result: Vec<u32>,
}

impl<S: FrequencySketch> ConstSketchTree<S> {
    pub(crate) fn new<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> Result<Self, Error> {
        let trie = Trie::new(params.bits(), 1);
        let levels = trie.levels;

        let leaf = S::new(
            params.hash,
            params.branching,
            params.epsilon * params.hash.constant() as f64,
            params.delta * (params.phi + params.epsilon) / (2.0 * levels as f64),
            rng,
        )?;

        let width = (leaf.width() as f64 / ROW_LOAD).ceil();
        if width > MAX_TABLE_ENTRIES as f64 {
            return Err(Error::invalid_argument("hashed level width overflows")
                .with_context("width", width));
        }
        let mut width = width as u32;
        if params.hash.requires_pow2() {
            width = width.next_power_of_two();
        }

        let exact_levels = levels.min(width.next_power_of_two().ilog2() + 1);
        let hashed_levels = levels - exact_levels;
        if width as u64 * hashed_levels as u64 > MAX_TABLE_ENTRIES {
            return Err(Error::invalid_argument("hashed levels overflow")
                .with_context("width", width)
                .with_context("levels", hashed_levels));
        }

        let tree = ConstSketchTree {
            universe: params.universe,
            phi: params.phi,
            epsilon: params.epsilon,
            trie,
            exact: ExactLevels::new(&trie, exact_levels),
            rows: HashedRows::new(params.hash, width, hashed_levels, rng),
            leaf,
            norm: 0,
            fifo: Fifo::with_capacity((2.0 / params.phi).ceil() as usize),
            result: Vec::with_capacity((2.0 / params.phi).ceil() as usize),
        };
        debug!(
            kind = ?S::KIND,
            levels,
            exact_levels,
            row_width = width,
            bytes = tree.space_usage(),
            "created constant sketch tree"
        );
        Ok(tree)
    }

    /// Number of trie levels.
    pub fn levels(&self) -> u32 {
        self.trie.levels
    }

    /// Number of top levels counted exactly.
    pub fn exact_levels(&self) -> u32 {
        self.exact.levels()
    }

    /// Width of each hashed level.
    pub fn row_width(&self) -> u32 {
        self.rows.width
    }

    /// The sketch confirming leaf candidates.
    pub fn leaf_sketch(&self) -> &S {
        &self.leaf
    }

    /// Sum of all update deltas.
    pub fn total_weight(&self) -> i64 {
        self.norm
    }

    /// Approximate heap footprint in bytes.
    pub fn space_usage(&self) -> usize {
        size_of::<Self>()
            + self.exact.space_usage()
            + self.rows.space_usage()
            + self.leaf.space_usage()
            + self.fifo.capacity() * size_of::<(u32, u8)>()
            + self.result.capacity() * size_of::<u32>()
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
        let exact_levels = self.exact.levels();
        for level in 1..=exact_levels {
            self.exact.add(level, self.trie.prefix(item, level), delta);
        }
        for level in exact_levels + 1..=self.trie.levels {
            let row = (level - exact_levels - 1) as usize;
            self.rows.add(row, self.trie.prefix(item, level), delta);
        }
        self.leaf.update(item, delta);
        self.norm += delta;
    }

    /// Returns the reported items in ascending order.
    pub fn query(&mut self) -> &[u32] {
        self.result.clear();
        self.fifo.clear();
        if self.norm <= 0 {
            return &self.result;
        }

        let threshold = self.phi * self.norm as f64;
        let raised = threshold + self.epsilon * self.norm as f64;
        let exact_levels = self.exact.levels();
        let levels = self.trie.levels;

        self.fifo.push_back((0, 1));
        while let Some((base, level)) = self.fifo.pop_front() {
            let level = level as u32;
            for child in 0..self.trie.fanout(level) {
                let node = base + child;
                let heavy = if level <= exact_levels {
                    self.exact.get(level, node) as f64 >= threshold
                } else {
                    let row = (level - exact_levels - 1) as usize;
                    self.rows.get(row, node) as f64 >= raised
                };
                if !heavy {
                    continue;
                }
                if level < levels {
                    self.fifo.push_back((node << 1, (level + 1) as u8));
                } else if (node as u64) < self.universe
                    && (level <= exact_levels || self.leaf.above_threshold(node, raised))
                {
                    self.result.push(node);
                }
            }
        }

        trace!(threshold, raised, candidates = self.result.len(), "queried constant sketch tree");
        &self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Prng;
    use crate::sketch::CountMin;

    fn params(universe: u64) -> Params {
        Params {
            phi: 0.05,
            epsilon: 1.0 / 64.0,
            delta: 0.2,
            universe,
            branching: 2,
            hash: HashFamily::MultiplyShift,
        }
    }

    #[test]
    fn test_geometry() {
        let mut rng = Prng::default();
        let tree = ConstSketchTree::<CountMin>::new(&params(1 << 24), &mut rng).unwrap();
        // leaf width ceil(2 / (1/64)) = 128, hashed rows four times as wide
        assert_eq!(tree.leaf_sketch().width(), 128);
        assert_eq!(tree.row_width(), 512);
        assert_eq!(tree.exact_levels(), 10);
        assert_eq!(tree.levels(), 24);
    }

    #[test]
    fn test_heavy_item_survives_raised_threshold() {
        let mut rng = Prng::default();
        let mut tree = ConstSketchTree::<CountMin>::new(&params(1 << 24), &mut rng).unwrap();
        for item in 0..2000u32 {
            tree.update(item * 4099, 1);
        }
        tree.update(123_456, 1000);
        tree.update(7_654_321, 60);
        // 60 of 3060 is below phi, 1000 is far above phi + epsilon
        assert_eq!(tree.query(), &[123_456]);
    }
}
