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

use heavyhitters::hh::HeavyHitter;

/// Heavy items planted in a `2^20` universe.
pub const PLANTED: [u32; 7] = [3, 134, 2345, 38474, 374298, 849793, 1000000];

/// Weight of each planted item, about a tenth of the stream.
pub const HEAVY_WEIGHT: i64 = 350_000;

pub const UNIVERSE: u64 = 1 << 20;

/// Feeds one unit of every non planted item of the universe and [`HEAVY_WEIGHT`] of every
/// planted one, so that planted items carry 10% of the mass each and every other item less
/// than a millionth.
pub fn feed_planted(hh: &mut HeavyHitter) {
    for item in 0..UNIVERSE as u32 {
        if PLANTED.contains(&item) {
            hh.update(item, HEAVY_WEIGHT);
        } else {
            hh.update(item, 1);
        }
    }
}

pub fn planted_total() -> i64 {
    (UNIVERSE as i64 - PLANTED.len() as i64) + PLANTED.len() as i64 * HEAVY_WEIGHT
}
