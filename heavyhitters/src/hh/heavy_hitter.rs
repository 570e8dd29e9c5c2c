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

use super::ConstSketchTree;
use super::HeavyHitterKind;
use super::HierarchicalCountMin;
use super::Params;
use super::SketchTree;
use crate::error::Error;
use crate::sketch::CountMedian;
use crate::sketch::CountMin;
use crate::sketch::SketchKind;
use crate::stream::ItemSource;

#[derive(Debug, Clone)]
enum Engine {
    CountMinTree(SketchTree<CountMin>),
    CountMedianTree(SketchTree<CountMedian>),
    CountMinConst(ConstSketchTree<CountMin>),
    CountMedianConst(ConstSketchTree<CountMedian>),
    Hierarchical(HierarchicalCountMin),
}

macro_rules! dispatch {
    ($engine:expr, $inner:ident => $body:expr) => {
        match $engine {
            Engine::CountMinTree($inner) => $body,
            Engine::CountMedianTree($inner) => $body,
            Engine::CountMinConst($inner) => $body,
            Engine::CountMedianConst($inner) => $body,
            Engine::Hierarchical($inner) => $body,
        }
    };
}

/// A heavy hitter engine chosen at runtime.
///
/// Created through [`HeavyHitterBuilder`](super::HeavyHitterBuilder). Updates and queries may
/// interleave freely; a query reflects every update applied before it.
#[derive(Debug, Clone)]
pub struct HeavyHitter {
    kind: HeavyHitterKind,
    sketch: SketchKind,
    engine: Engine,
}

impl HeavyHitter {
    pub(crate) fn new<R: Rng + ?Sized>(
        kind: HeavyHitterKind,
        sketch: SketchKind,
        params: &Params,
        rng: &mut R,
    ) -> Result<Self, Error> {
        let engine = match (kind, sketch) {
            (HeavyHitterKind::Sketch, SketchKind::CountMin) => {
                Engine::CountMinTree(SketchTree::new(params, 1, rng)?)
            }
            (HeavyHitterKind::Sketch, SketchKind::CountMedian) => {
                Engine::CountMedianTree(SketchTree::new(params, 1, rng)?)
            }
            (HeavyHitterKind::KaryTree { granularity }, SketchKind::CountMin) => {
                Engine::CountMinTree(SketchTree::new(params, granularity, rng)?)
            }
            (HeavyHitterKind::KaryTree { granularity }, SketchKind::CountMedian) => {
                Engine::CountMedianTree(SketchTree::new(params, granularity, rng)?)
            }
            (HeavyHitterKind::ConstSketch, SketchKind::CountMin) => {
                Engine::CountMinConst(ConstSketchTree::new(params, rng)?)
            }
            (HeavyHitterKind::ConstSketch, SketchKind::CountMedian) => {
                Engine::CountMedianConst(ConstSketchTree::new(params, rng)?)
            }
            (HeavyHitterKind::Hierarchical, _) => {
                Engine::Hierarchical(HierarchicalCountMin::new(params, rng)?)
            }
        };
        Ok(HeavyHitter {
            kind,
            sketch,
            engine,
        })
    }

    /// The engine behind this instance.
    pub fn kind(&self) -> HeavyHitterKind {
        self.kind
    }

    /// The sketch backing the sketched levels.
    pub fn sketch_kind(&self) -> SketchKind {
        self.sketch
    }

    /// Adds `delta` to the count of `item`.
    ///
    /// # Panics
    ///
    /// Panics if `item` is outside the universe.
    pub fn update(&mut self, item: u32, delta: i64) {
        dispatch!(&mut self.engine, engine => engine.update(item, delta))
    }

    /// Returns the heavy hitters in ascending order.
    ///
    /// The returned slice borrows a buffer reused by every query.
    pub fn query(&mut self) -> &[u32] {
        dispatch!(&mut self.engine, engine => engine.query())
    }

    /// Sum of all update deltas.
    pub fn total_weight(&self) -> i64 {
        dispatch!(&self.engine, engine => engine.total_weight())
    }

    /// Approximate heap footprint in bytes.
    pub fn space_usage(&self) -> usize {
        dispatch!(&self.engine, engine => engine.space_usage())
    }

    /// Adds one occurrence of every item `source` yields, returning how many were read.
    pub fn ingest<S: ItemSource + ?Sized>(&mut self, source: &mut S) -> Result<u64, Error> {
        let mut read = 0;
        while let Some(item) = source.next_item()? {
            self.update(item, 1);
            read += 1;
        }
        Ok(read)
    }
}

impl Extend<u32> for HeavyHitter {
    fn extend<T: IntoIterator<Item = u32>>(&mut self, iter: T) {
        for item in iter {
            self.update(item, 1);
        }
    }
}
