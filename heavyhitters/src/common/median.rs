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

/// Returns the lower median of `values`, reordering them in place.
///
/// Wirth's selection for the element of rank `(n - 1) / 2`. Linear on average.
///
/// # Panics
///
/// Panics if `values` is empty.
///
/// # Examples
///
/// ```
/// # use heavyhitters::common::median_wirth;
/// let mut values = [9, 1, 7, 3, 5];
/// assert_eq!(median_wirth(&mut values), 5);
/// let mut even = [4, 1, 3, 2];
/// assert_eq!(median_wirth(&mut even), 2);
/// ```
pub fn median_wirth<T: PartialOrd + Copy>(values: &mut [T]) -> T {
    assert!(!values.is_empty(), "median of an empty slice");
    let k = (values.len() as isize - 1) / 2;
    let mut l = 0isize;
    let mut m = values.len() as isize - 1;
    while l < m {
        let x = values[k as usize];
        let mut i = l;
        let mut j = m;
        loop {
            while values[i as usize] < x {
                i += 1;
            }
            while x < values[j as usize] {
                j -= 1;
            }
            if i <= j {
                values.swap(i as usize, j as usize);
                i += 1;
                j -= 1;
            }
            if i > j {
                break;
            }
        }
        if j < k {
            l = i;
        }
        if k < i {
            m = j;
        }
    }
    values[k as usize]
}
