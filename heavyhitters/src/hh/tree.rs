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
use crate::sketch::FrequencySketch;

/// Heavy hitter trie with exact top levels and one sketch per remaining level.
///
/// With granularity 1 this is the binary trie; larger granularities trade a wider fan-out for
/// fewer levels.
#[derive(Debug, Clone)]
pub struct SketchTree<S> {
    universe: u64,
    phi: f64,
    epsilon: f64,
    trie: Trie,
    exact: ExactLevels,
    sketches: Vec<S>,
    norm: i64,
    fifo: Fifo<(u32, u8)>,
    result: Vec<u32>,
}

impl<S: FrequencySketch> SketchTree<S> {
    pub(crate) fn new<R: Rng + ?Sized>(
        params: &Params,
        granularity: u32,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let trie = Trie::new(params.bits(), granularity);
        let k = trie.branching() as f64;
        let levels = trie.levels;

        // Exact counters are kept while a level is no larger than one sketch.
        let delta = params.delta * params.phi / (k * levels as f64);
        let (width, depth) =
            S::KIND.dimensions(params.hash, params.branching, params.epsilon, delta)?;
        let budget = (width as u64 * depth as u64).next_power_of_two();
        let mut exact_levels = 0;
        while exact_levels < levels && 1u64 << (granularity * (exact_levels + 1)) <= budget {
            exact_levels += 1;
        }

        let sketch_levels = levels - exact_levels;
        let mut sketches = Vec::with_capacity(sketch_levels as usize);
        if sketch_levels > 0 {
            let delta = params.delta * params.phi / (k * sketch_levels as f64);
            for _ in 0..sketch_levels {
                sketches.push(S::new(
                    params.hash,
                    params.branching,
                    params.epsilon,
                    delta,
                    rng,
                )?);
            }
        }

        let tree = SketchTree {
            universe: params.universe,
            phi: params.phi,
            epsilon: params.epsilon,
            trie,
            exact: ExactLevels::new(&trie, exact_levels),
            sketches,
            norm: 0,
            fifo: Fifo::with_capacity((k / params.phi).ceil() as usize),
            result: Vec::with_capacity((2.0 / params.phi).ceil() as usize),
        };
        debug!(
            kind = ?S::KIND,
            granularity,
            levels,
            exact_levels,
            bytes = tree.space_usage(),
            "created sketch tree"
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

    /// Sum of all update deltas.
    pub fn total_weight(&self) -> i64 {
        self.norm
    }

    /// Approximate heap footprint in bytes.
    pub fn space_usage(&self) -> usize {
        size_of::<Self>()
            + self.exact.space_usage()
            + self.sketches.iter().map(S::space_usage).sum::<usize>()
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
        for (i, sketch) in self.sketches.iter_mut().enumerate() {
            let level = exact_levels + 1 + i as u32;
            sketch.update(self.trie.prefix(item, level), delta);
        }
        self.norm += delta;
    }

    /// Returns the items whose count reaches `phi` of the total weight, in ascending order.
    pub fn query(&mut self) -> &[u32] {
        self.result.clear();
        self.fifo.clear();
        if self.norm <= 0 {
            return &self.result;
        }

        let threshold = self.phi * self.norm as f64;
        let sketch_threshold = S::heavy_hitter_threshold(threshold, self.epsilon, self.norm);
        let exact_levels = self.exact.levels();
        let levels = self.trie.levels;
        let granularity = self.trie.granularity;

        self.fifo.push_back((0, 1));
        while let Some((base, level)) = self.fifo.pop_front() {
            let level = level as u32;
            for child in 0..self.trie.fanout(level) {
                let node = base + child;
                let heavy = if level <= exact_levels {
                    self.exact.get(level, node) as f64 >= threshold
                } else {
                    // The lowered bound only keeps inner prefixes alive; leaves need theta.
                    let bound = if level == levels { threshold } else { sketch_threshold };
                    let sketch = &self.sketches[(level - exact_levels - 1) as usize];
                    sketch.above_threshold(node, bound)
                };
                if !heavy {
                    continue;
                }
                if level == levels {
                    if (node as u64) < self.universe {
                        self.result.push(node);
                    }
                } else {
                    self.fifo.push_back((node << granularity, (level + 1) as u8));
                }
            }
        }

        trace!(threshold, candidates = self.result.len(), "queried sketch tree");
        &self.result
    }
}
