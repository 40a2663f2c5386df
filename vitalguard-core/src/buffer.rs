//! Fixed-Size Circular Buffer for Signal Windows
//!
//! ## Overview
//!
//! Every channel in VitalGuard works on a sliding window of recent filtered
//! samples: the cardiac channel needs about three seconds to see a few beats,
//! the metabolic channels need four seconds to estimate waveform morphology.
//! The same structure also backs RR-interval histories and the blood-pressure
//! candidate histories.
//!
//! The buffer has a fixed capacity chosen at compile time through a const
//! generic and never allocates while pushing:
//! - O(1) insertion (overwrites the oldest element when full)
//! - O(1) access to the most recent element
//! - O(n) iteration from oldest to newest
//!
//! ### Why Not `heapless::Deque`?
//!
//! When full we want the oldest sample discarded silently instead of an
//! error returned. A sliding window of a live signal always prefers fresh
//! data, and the push site in the per-frame path should not branch on it.
//!
//! ### Memory Layout
//!
//! ```text
//! CircularBuffer<f32, 5>, after 7 pushes of values 0..7:
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  5  │  6  │  2  │  3  │  4  │  ← physical slots
//! └─────┴─────┴─────┴─────┴─────┘
//!              ↑
//!              └── write_pos = 2 (oldest element lives here)
//!
//! Logical view (iter): [2, 3, 4, 5, 6]
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use vitalguard_core::buffer::CircularBuffer;
//!
//! let mut window: CircularBuffer<f32, 4> = CircularBuffer::new();
//! for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
//!     window.push(v);
//! }
//! assert_eq!(window.len(), 4);
//! assert_eq!(window.last(), Some(&5.0));
//! assert_eq!(window.to_vec(), vec![2.0, 3.0, 4.0, 5.0]);
//! ```

use alloc::vec::Vec;

/// Fixed-size ring buffer that overwrites its oldest element when full
///
/// ## Internal Invariants
///
/// - `write_pos < N`
/// - `len <= N`
/// - Iteration yields elements in insertion order
#[derive(Clone, Debug)]
pub struct CircularBuffer<T: Copy, const N: usize> {
    /// Storage; `Option` keeps the crate free of `unsafe`
    data: [Option<T>; N],

    /// Index where the next write will occur
    write_pos: usize,

    /// Current number of valid elements
    len: usize,
}

impl<T: Copy, const N: usize> CircularBuffer<T, N> {
    /// Creates a new empty buffer
    pub const fn new() -> Self {
        Self {
            data: [None; N],
            write_pos: 0,
            len: 0,
        }
    }

    /// Appends an element, overwriting the oldest one when full
    pub fn push(&mut self, item: T) {
        if N == 0 {
            return;
        }
        self.data[self.write_pos] = Some(item);
        self.write_pos = (self.write_pos + 1) % N;

        if self.len < N {
            self.len += 1;
        }
    }

    /// Number of stored elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Compile-time capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most recent element
    pub fn last(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let idx = if self.write_pos == 0 { N - 1 } else { self.write_pos - 1 };
        self.data[idx].as_ref()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> CircularBufferIter<'_, T, N> {
        CircularBufferIter {
            buffer: self,
            index: 0,
        }
    }

    /// Copies the contents into a `Vec`, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().copied().collect()
    }

    /// Remove all elements
    pub fn clear(&mut self) {
        self.data = [None; N];
        self.write_pos = 0;
        self.len = 0;
    }

    /// Element by logical index (0 = oldest, len-1 = newest)
    ///
    /// When the buffer is full the oldest element sits at `write_pos`,
    /// so the logical index is offset from there.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }

        let actual_index = if self.len < N {
            index
        } else {
            (self.write_pos + index) % N
        };

        self.data[actual_index].as_ref()
    }
}

/// Iterator over circular buffer contents, oldest first
pub struct CircularBufferIter<'a, T: Copy, const N: usize> {
    buffer: &'a CircularBuffer<T, N>,
    index: usize,
}

impl<'a, T: Copy, const N: usize> Iterator for CircularBufferIter<'a, T, N> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<T: Copy, const N: usize> Default for CircularBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
