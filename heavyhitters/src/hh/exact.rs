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

use super::Trie;

/// Exact counters for the top levels of a trie, stored level after level in one array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExactLevels {
    offsets: Vec<usize>,
    counts: Vec<i64>,
}

impl ExactLevels {
    /// Counters for levels `1..=levels` of `trie`.
    pub fn new(trie: &Trie, levels: u32) -> Self {
        let mut offsets = Vec::with_capacity(levels as usize);
        let mut len = 0usize;
        for level in 1..=levels {
            offsets.push(len);
            len += trie.node_count(level) as usize;
        }
        ExactLevels {
            offsets,
            counts: vec![0; len],
        }
    }

    pub fn levels(&self) -> u32 {
        self.offsets.len() as u32
    }

    #[inline]
    pub fn add(&mut self, level: u32, node: u32, delta: i64) {
        let index = self.offsets[level as usize - 1] + node as usize;
        self.counts[index] += delta;
    }

    #[inline]
    pub fn get(&self, level: u32, node: u32) -> i64 {
        self.counts[self.offsets[level as usize - 1] + node as usize]
    }

    pub fn space_usage(&self) -> usize {
        self.counts.len() * size_of::<i64>() + self.offsets.len() * size_of::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_disjoint() {
        let trie = Trie::new(8, 2);
        let mut exact = ExactLevels::new(&trie, 3);
        assert_eq!(exact.levels(), 3);
        for level in 1..=3 {
            exact.add(level, trie.prefix(0xFF, level), level as i64);
        }
        assert_eq!(exact.get(1, 3), 1);
        assert_eq!(exact.get(2, 15), 2);
        assert_eq!(exact.get(3, 63), 3);
        assert_eq!(exact.get(2, 14), 0);
    }
}
