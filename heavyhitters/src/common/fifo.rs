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

/// Circular first-in first-out queue with a power-of-two capacity.
///
/// The buffer doubles as soon as it becomes full, so [`push_back`](Self::push_back) never fails.
#[derive(Debug, Clone)]
pub struct Fifo<T> {
    data: Vec<T>,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T: Copy + Default> Fifo<T> {
    /// Creates a queue able to hold `capacity` elements, rounded up to a power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        let size = capacity.max(1).next_power_of_two();
        Fifo {
            data: vec![T::default(); size],
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Appends an element at the back.
    pub fn push_back(&mut self, value: T) {
        let mask = self.data.len() - 1;
        self.data[self.tail] = value;
        self.tail = (self.tail + 1) & mask;
        self.count += 1;
        if self.count == self.data.len() {
            self.grow();
        }
    }

    /// Removes the front element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let value = self.data[self.head];
        self.head = (self.head + 1) & (self.data.len() - 1);
        self.count -= 1;
        Some(value)
    }

    /// Returns true if the queue holds no element.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of queued elements.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Current size of the ring buffer.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Drops every element, keeping the allocation.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    // Full buffer: tail has caught up with head. The run head..size moves to the end of the
    // doubled buffer so that the wrapped part 0..tail keeps following it.
    fn grow(&mut self) {
        let size = self.data.len();
        let new_size = size * 2;
        self.data.resize(new_size, T::default());
        let moved = size - self.head;
        self.data.copy_within(self.head..size, new_size - moved);
        self.head = new_size - moved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_across_growth() {
        let mut fifo = Fifo::with_capacity(4);
        assert_eq!(fifo.capacity(), 4);
        for i in 0..3u32 {
            fifo.push_back((i, 0u8));
        }
        assert_eq!(fifo.pop_front(), Some((0, 0)));
        assert_eq!(fifo.pop_front(), Some((1, 0)));
        // head is now in the middle, so the next pushes wrap around before growing
        for i in 3..9u32 {
            fifo.push_back((i, 1));
        }
        assert_eq!(fifo.capacity(), 8);
        assert_eq!(fifo.len(), 7);
        let drained: Vec<u32> = std::iter::from_fn(|| fifo.pop_front()).map(|(i, _)| i).collect();
        assert_eq!(drained, vec![2, 3, 4, 5, 6, 7, 8]);
        assert!(fifo.is_empty());
        assert_eq!(fifo.pop_front(), None);
    }

    #[test]
    fn test_zero_capacity_rounds_up() {
        let mut fifo = Fifo::<u64>::with_capacity(0);
        assert_eq!(fifo.capacity(), 1);
        fifo.push_back(7);
        assert_eq!(fifo.capacity(), 2);
        fifo.push_back(8);
        assert_eq!(fifo.pop_front(), Some(7));
        assert_eq!(fifo.pop_front(), Some(8));
        assert!(fifo.is_empty());
    }

    #[test]
    fn test_clear_resets() {
        let mut fifo = Fifo::with_capacity(3);
        fifo.push_back(1u32);
        fifo.push_back(2);
        fifo.clear();
        assert!(fifo.is_empty());
        fifo.push_back(3);
        assert_eq!(fifo.pop_front(), Some(3));
    }
}
