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

//! # Hierarchical heavy hitters
//!
//! Streaming detection of the items whose weight reaches a fraction `phi` of a stream of
//! `(item, delta)` updates over a 32-bit universe, in space sublinear in the universe and with
//! `(epsilon, delta)` accuracy guarantees.
//!
//! The engines in [`hh`] decompose the universe into a prefix trie, count its top levels
//! exactly and summarize the rest with the Count-Min and Count-Median sketches of [`sketch`].
//! A query descends the trie breadth first, pruning every prefix below the threshold.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub mod common;
pub mod error;
pub mod hash;
pub mod hh;
pub mod norm;
pub mod sketch;
pub mod stream;
