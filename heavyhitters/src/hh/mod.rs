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

//! Hierarchical heavy hitter detection.
//!
//! The item universe `[0, m)` is viewed as a trie: level `l` groups items by their top
//! `l * g` bits, so every level splits each node into `k = 2^g` children. The levels closest to
//! the root are small enough to count exactly; every level below them is summarized by a
//! frequency sketch. A query walks the trie breadth first and prunes every node whose count
//! falls below `phi * N`, so only the ancestors of heavy items are ever expanded.
//!
//! Four engines implement this contract and are selected through [`HeavyHitterKind`]:
//!
//! - [`SketchTree`] with a binary trie, one sketch per sketch level.
//! - [`SketchTree`] with a `2^g`-ary trie.
//! - [`ConstSketchTree`], a binary trie whose sketch levels are single hashed rows, confirmed
//!   by one full sketch over the leaves.
//! - [`HierarchicalCountMin`], Cormode's hierarchical Count-Min.
//!
//! # Usage
//!
//! ```rust
//! # use heavyhitters::hh::HeavyHitterBuilder;
//! # use heavyhitters::hh::HeavyHitterKind;
//! let mut hh = HeavyHitterBuilder::new(0.1, 0.01, 0.1, 1 << 16)
//!     .build(HeavyHitterKind::Sketch)
//!     .unwrap();
//! for item in 0..1000u32 {
//!     hh.update(item, 1);
//! }
//! hh.update(4242, 500);
//! assert_eq!(hh.query(), &[4242]);
//! ```

mod builder;
pub use self::builder::DEFAULT_SEED;
pub use self::builder::HeavyHitterBuilder;

mod cmh;
pub use self::cmh::HierarchicalCountMin;

mod const_tree;
pub use self::const_tree::ConstSketchTree;

mod exact;

mod heavy_hitter;
pub use self::heavy_hitter::HeavyHitter;

mod tree;
pub use self::tree::SketchTree;

use crate::hash::HashFamily;

/// Largest supported granularity of a k-ary trie.
pub const MAX_GRANULARITY: u32 = 16;

/// Selects the engine behind a [`HeavyHitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeavyHitterKind {
    /// Binary trie with one sketch per sketch level.
    Sketch,
    /// `2^granularity`-ary trie with one sketch per sketch level.
    KaryTree {
        /// Bits consumed per level, in `1..=16`.
        granularity: u32,
    },
    /// Binary trie with hashed single-row levels and a confirming leaf sketch.
    ConstSketch,
    /// Cormode's hierarchical Count-Min.
    Hierarchical,
}

/// Validated construction parameters shared by the engines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Params {
    pub phi: f64,
    pub epsilon: f64,
    pub delta: f64,
    pub universe: u64,
    pub branching: u32,
    pub hash: HashFamily,
}

impl Params {
    /// `ceil(log2(universe))`.
    pub fn bits(&self) -> u32 {
        u64::BITS - (self.universe - 1).leading_zeros()
    }
}

/// Shape of a trie over `bits`-bit items with `2^granularity` children per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Trie {
    pub bits: u32,
    pub granularity: u32,
    pub levels: u32,
}

impl Trie {
    pub fn new(bits: u32, granularity: u32) -> Self {
        Trie {
            bits,
            granularity,
            levels: bits.div_ceil(granularity),
        }
    }

    pub fn branching(&self) -> u32 {
        1 << self.granularity
    }

    fn shift(&self, level: u32) -> u32 {
        self.granularity * (self.levels - level)
    }

    /// Node of `item` at `level`, in `1..=levels`.
    #[inline]
    pub fn prefix(&self, item: u32, level: u32) -> u32 {
        debug_assert!((1..=self.levels).contains(&level));
        item >> self.shift(level)
    }

    /// Number of nodes at `level`.
    pub fn node_count(&self, level: u32) -> u64 {
        1u64 << (self.bits - self.shift(level))
    }

    /// Number of children of a node whose children live at `level`.
    pub fn fanout(&self, level: u32) -> u32 {
        if level == 1 {
            self.node_count(1) as u32
        } else {
            self.branching()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trie_binary() {
        let trie = Trie::new(20, 1);
        assert_eq!(trie.levels, 20);
        assert_eq!(trie.node_count(1), 2);
        assert_eq!(trie.node_count(20), 1 << 20);
        assert_eq!(trie.prefix(0b1011 << 16, 4), 0b1011);
        assert_eq!(trie.fanout(1), 2);
    }

    #[test]
    fn test_trie_uneven_granularity() {
        // 20 bits in steps of 3: the root splits into 2^2 nodes, then 8 per level
        let trie = Trie::new(20, 3);
        assert_eq!(trie.levels, 7);
        assert_eq!(trie.node_count(1), 4);
        assert_eq!(trie.fanout(1), 4);
        assert_eq!(trie.fanout(2), 8);
        assert_eq!(trie.node_count(7), 1 << 20);
        let item = 0xABCDE;
        assert_eq!(trie.prefix(item, 1), item >> 18);
        assert_eq!(trie.prefix(item, 7), item);
    }

    #[test]
    fn test_bits() {
        let mut params = Params {
            phi: 0.1,
            epsilon: 0.01,
            delta: 0.1,
            universe: 2,
            branching: 2,
            hash: HashFamily::MultiplyShift,
        };
        assert_eq!(params.bits(), 1);
        params.universe = 1000;
        assert_eq!(params.bits(), 10);
        params.universe = 1 << 20;
        assert_eq!(params.bits(), 20);
        params.universe = 1 << 32;
        assert_eq!(params.bits(), 32);
    }
}
