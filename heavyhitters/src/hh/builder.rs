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

use super::HeavyHitter;
use super::HeavyHitterKind;
use super::MAX_GRANULARITY;
use super::Params;
use crate::error::Error;
use crate::hash::HashFamily;
use crate::hash::Prng;
use crate::sketch::SketchKind;

/// Seed of the default [`Prng`] state `(1234, 5678)`.
pub const DEFAULT_SEED: u64 = (5678 << 32) | 1234;

const MAX_UNIVERSE: u64 = 1 << 32;

/// Builder for creating [`HeavyHitter`] instances.
///
/// `phi` is the fraction of the total weight an item needs to be reported, `epsilon < phi` the
/// estimation error of the sketches and `delta` their failure probability. Items live in
/// `[0, universe)`.
///
/// # Examples
///
/// ```
/// # use heavyhitters::hash::HashFamily;
/// # use heavyhitters::hh::HeavyHitterBuilder;
/// # use heavyhitters::hh::HeavyHitterKind;
/// # use heavyhitters::sketch::SketchKind;
/// let hh = HeavyHitterBuilder::new(0.05, 0.01, 0.1, 1 << 20)
///     .sketch(SketchKind::CountMedian)
///     .branching(8)
///     .hash(HashFamily::CarterWegmanPow2)
///     .seed(42)
///     .build(HeavyHitterKind::KaryTree { granularity: 4 })
///     .unwrap();
/// assert_eq!(hh.kind(), HeavyHitterKind::KaryTree { granularity: 4 });
/// ```
#[derive(Debug, Clone)]
pub struct HeavyHitterBuilder {
    phi: f64,
    epsilon: f64,
    delta: f64,
    universe: u64,
    branching: Option<u32>,
    sketch: SketchKind,
    hash: HashFamily,
    seed: u64,
}

impl HeavyHitterBuilder {
    /// Creates a builder for the given accuracy over `[0, universe)`.
    ///
    /// Parameters are validated by [`build`](Self::build).
    pub fn new(phi: f64, epsilon: f64, delta: f64, universe: u64) -> Self {
        HeavyHitterBuilder {
            phi,
            epsilon,
            delta,
            universe,
            branching: None,
            sketch: SketchKind::default(),
            hash: HashFamily::default(),
            seed: DEFAULT_SEED,
        }
    }

    /// Sets the branching factor `b` of the sketch dimension formulas.
    ///
    /// Defaults to the smallest value the sketch accepts: 2 for Count-Min, 3 for Count-Median.
    pub fn branching(mut self, branching: u32) -> Self {
        self.branching = Some(branching);
        self
    }

    /// Sets the sketch backing the tree levels (default: Count-Min).
    ///
    /// Ignored by [`HeavyHitterKind::Hierarchical`], which is always Count-Min.
    pub fn sketch(mut self, sketch: SketchKind) -> Self {
        self.sketch = sketch;
        self
    }

    /// Sets the hash family of the sketches (default: multiply-shift).
    pub fn hash(mut self, hash: HashFamily) -> Self {
        self.hash = hash;
        self
    }

    /// Sets the seed of the [`Prng`] drawing the hash seeds.
    ///
    /// The low and high halves become the two state words of the generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builds the heavy hitter engine selected by `kind`.
    pub fn build(&self, kind: HeavyHitterKind) -> Result<HeavyHitter, Error> {
        let mut rng = Prng::new(self.seed as u32, (self.seed >> 32) as u32);
        self.build_with_rng(kind, &mut rng)
    }

    /// Builds the heavy hitter engine selected by `kind`, drawing hash seeds from `rng`.
    pub fn build_with_rng<R: Rng + ?Sized>(
        &self,
        kind: HeavyHitterKind,
        rng: &mut R,
    ) -> Result<HeavyHitter, Error> {
        let sketch = match kind {
            HeavyHitterKind::Hierarchical => SketchKind::CountMin,
            _ => self.sketch,
        };
        let params = self.validate(kind, sketch)?;
        HeavyHitter::new(kind, sketch, &params, rng)
    }

    fn validate(&self, kind: HeavyHitterKind, sketch: SketchKind) -> Result<Params, Error> {
        if !(self.phi > 0.0 && self.phi < 1.0) {
            return Err(Error::out_of_range("phi", "(0, 1)", self.phi));
        }
        if !(self.epsilon > 0.0 && self.epsilon < self.phi) {
            return Err(Error::invalid_argument("epsilon must be in (0, phi)")
                .with_context("epsilon", self.epsilon)
                .with_context("phi", self.phi));
        }
        if !(self.delta > 0.0 && self.delta < 1.0) {
            return Err(Error::out_of_range("delta", "(0, 1)", self.delta));
        }
        if !(self.universe > 1 && self.universe <= MAX_UNIVERSE) {
            return Err(Error::invalid_argument("universe must be in (1, 2^32]")
                .with_context("universe", self.universe));
        }

        let branching = self.branching.unwrap_or(sketch.min_branching());
        if branching < sketch.min_branching() {
            return Err(Error::invalid_argument(format!(
                "branching factor must be at least {}",
                sketch.min_branching()
            ))
            .with_context("branching", branching));
        }

        let params = Params {
            phi: self.phi,
            epsilon: self.epsilon,
            delta: self.delta,
            universe: self.universe,
            branching,
            hash: self.hash,
        };

        if let HeavyHitterKind::KaryTree { granularity } = kind {
            if !(1..=MAX_GRANULARITY).contains(&granularity) || granularity > params.bits() {
                return Err(Error::invalid_argument(format!(
                    "granularity must be in [1, min({MAX_GRANULARITY}, log2(universe))]"
                ))
                .with_context("granularity", granularity)
                .with_context("universe", self.universe));
            }
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::error::ErrorKind;

    fn build_err(builder: HeavyHitterBuilder, kind: HeavyHitterKind) -> Error {
        match builder.build(kind) {
            Ok(_) => panic!("expected an error"),
            Err(err) => err,
        }
    }

    #[test]
    fn test_epsilon_must_be_below_phi() {
        let err = build_err(
            HeavyHitterBuilder::new(0.05, 0.05, 0.1, 1 << 20),
            HeavyHitterKind::Sketch,
        );
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_snapshot!(err, @"InvalidArgument, context: { epsilon: 0.05, phi: 0.05 } => epsilon must be in (0, phi)");
    }

    #[test]
    fn test_out_of_range_parameters() {
        let kind = HeavyHitterKind::Sketch;
        let err = build_err(HeavyHitterBuilder::new(1.0, 0.01, 0.1, 1 << 20), kind);
        assert_snapshot!(err, @"InvalidArgument, context: { phi: 1 } => phi must be in (0, 1)");
        let err = build_err(HeavyHitterBuilder::new(0.1, 0.01, 0.0, 1 << 20), kind);
        assert_snapshot!(err, @"InvalidArgument, context: { delta: 0 } => delta must be in (0, 1)");
        let err = build_err(HeavyHitterBuilder::new(0.1, 0.01, 0.1, 1), kind);
        assert_snapshot!(err, @"InvalidArgument, context: { universe: 1 } => universe must be in (1, 2^32]");
        let err = build_err(HeavyHitterBuilder::new(0.1, 0.01, 0.1, (1 << 32) + 1), kind);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_granularity_bounds() {
        let builder = HeavyHitterBuilder::new(0.1, 0.01, 0.1, 1 << 10);
        let err = build_err(builder.clone(), HeavyHitterKind::KaryTree { granularity: 0 });
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = build_err(builder.clone(), HeavyHitterKind::KaryTree { granularity: 11 });
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(builder.build(HeavyHitterKind::KaryTree { granularity: 10 }).is_ok());
    }

    #[test]
    fn test_branching_defaults_to_sketch_minimum() {
        let builder = HeavyHitterBuilder::new(0.1, 0.05, 0.1, 1 << 12).sketch(SketchKind::CountMedian);
        assert!(builder.build(HeavyHitterKind::Sketch).is_ok());
        let err = build_err(builder.branching(2), HeavyHitterKind::Sketch);
        assert_snapshot!(err, @"InvalidArgument, context: { branching: 2 } => branching factor must be at least 3");
    }

    #[test]
    fn test_oversized_sketch_is_rejected() {
        let builder = HeavyHitterBuilder::new(0.5, 1e-6, 0.1, 1 << 20).sketch(SketchKind::CountMedian);
        let err = build_err(builder, HeavyHitterKind::Sketch);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
