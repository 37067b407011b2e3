//! Fixed-capacity circular buffer for signal and packet-rate samples.
//!
//! Storage is an inline `[T; N]` array: no allocation after construction,
//! `push` overwrites the oldest slot once full. Traversal is oldest-first
//! over the entries actually held.
//!
//! Reductions (`sum`, `mean`, `min`, `max`) skip slots whose value is the
//! type's "unset" sentinel, so an RSSI ring can tell "never sampled" apart
//! from "sampled a very weak signal".

use serde::Serialize;

// ---------------------------------------------------------------------------
// Sample trait
// ---------------------------------------------------------------------------

/// A value that can live in a [`RingBuffer`].
pub trait Sample: Copy + Default {
    /// True for the reserved "never written" value. Most sample types have none.
    fn is_unset(&self) -> bool {
        false
    }
}

impl Sample for u32 {}

/// Received signal strength in dBm. Zero is reserved for "no reading".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Rssi(pub i8);

impl Rssi {
    pub const UNSET: Rssi = Rssi(0);
}

impl Sample for Rssi {
    fn is_unset(&self) -> bool {
        self.0 == 0
    }
}

impl From<Rssi> for i64 {
    fn from(r: Rssi) -> i64 {
        r.0 as i64
    }
}

// ---------------------------------------------------------------------------
// RingBuffer
// ---------------------------------------------------------------------------

/// Circular buffer holding at most `N` samples. `N` must be non-zero.
#[derive(Debug, Clone)]
pub struct RingBuffer<T, const N: usize> {
    slots: [T; N],
    /// Next slot to write.
    head: usize,
    len: usize,
}

impl<T: Sample, const N: usize> RingBuffer<T, N> {
    pub fn new() -> Self {
        RingBuffer {
            slots: [T::default(); N],
            head: 0,
            len: 0,
        }
    }

    /// Append a sample, overwriting the oldest when full.
    pub fn push(&mut self, value: T) {
        self.slots[self.head] = value;
        self.head = (self.head + 1) % N;
        if self.len < N {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Drop all samples, resetting every slot to its default.
    pub fn clear(&mut self) {
        self.slots = [T::default(); N];
        self.head = 0;
        self.len = 0;
    }

    /// The `i`-th held sample, oldest first.
    ///
    /// # Panics
    /// If `i >= self.len()`.
    pub fn get(&self, i: usize) -> T {
        assert!(i < self.len, "ring index {i} out of range (len {})", self.len);
        self.slots[(self.oldest() + i) % N]
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        Some(self.slots[(self.head + N - 1) % N])
    }

    /// Held samples in insertion order. Each call starts a fresh traversal.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Held samples that are not the unset sentinel.
    pub fn valid(&self) -> impl Iterator<Item = T> + '_ {
        self.iter().filter(|v| !v.is_unset())
    }

    pub fn fold<B, F: FnMut(B, T) -> B>(&self, init: B, f: F) -> B {
        self.iter().fold(init, f)
    }

    pub fn valid_count(&self) -> usize {
        self.valid().count()
    }

    fn oldest(&self) -> usize {
        if self.len < N {
            0
        } else {
            self.head
        }
    }
}

impl<T: Sample + Into<i64>, const N: usize> RingBuffer<T, N> {
    pub fn sum(&self) -> i64 {
        self.valid().map(Into::into).sum()
    }

    pub fn min(&self) -> Option<i64> {
        self.valid().map(Into::into).min()
    }

    pub fn max(&self) -> Option<i64> {
        self.valid().map(Into::into).max()
    }

    /// Arithmetic mean of valid samples, `None` if there are none.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .valid()
            .fold((0i64, 0usize), |(s, c), v| (s + v.into(), c + 1));
        if count == 0 {
            return None;
        }
        Some(sum as f64 / count as f64)
    }
}

impl<T: Sample, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_iter_partial() {
        let mut ring: RingBuffer<u32, 4> = RingBuffer::new();
        ring.push(1);
        ring.push(2);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.iter().collect::<Vec<_>>(), vec![1, 2]);
        assert!(!ring.is_full());
    }

    #[test]
    fn test_overwrite_oldest() {
        let mut ring: RingBuffer<u32, 3> = RingBuffer::new();
        for v in 1..=5 {
            ring.push(v);
        }
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.iter().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(ring.get(0), 3);
        assert_eq!(ring.latest(), Some(5));
    }

    #[test]
    fn test_iter_is_restartable() {
        let mut ring: RingBuffer<u32, 3> = RingBuffer::new();
        ring.push(7);
        ring.push(8);
        let first: Vec<_> = ring.iter().collect();
        let second: Vec<_> = ring.iter().collect();
        assert_eq!(first, second);
        assert_eq!(ring.fold(0, |acc, v| acc + v), 15);
    }

    #[test]
    fn test_rssi_reductions_skip_unset() {
        let mut ring: RingBuffer<Rssi, 4> = RingBuffer::new();
        for v in [-40, 0, -60, 0] {
            ring.push(Rssi(v));
        }
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.valid_count(), 2);
        assert_eq!(ring.mean(), Some(-50.0));
        assert_eq!(ring.min(), Some(-60));
        assert_eq!(ring.max(), Some(-40));
        assert_eq!(ring.sum(), -100);
    }

    #[test]
    fn test_empty_reductions() {
        let ring: RingBuffer<Rssi, 4> = RingBuffer::new();
        assert_eq!(ring.mean(), None);
        assert_eq!(ring.min(), None);
        assert_eq!(ring.max(), None);
        assert_eq!(ring.sum(), 0);
        assert_eq!(ring.latest(), None);
    }

    #[test]
    fn test_only_unset_is_no_data() {
        let mut ring: RingBuffer<Rssi, 2> = RingBuffer::new();
        ring.push(Rssi::UNSET);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.mean(), None);
    }

    #[test]
    fn test_minimum_reading_is_not_unset() {
        let mut ring: RingBuffer<Rssi, 2> = RingBuffer::new();
        ring.push(Rssi(i8::MIN));
        assert_eq!(ring.min(), Some(-128));
        assert_eq!(ring.valid_count(), 1);
    }

    #[test]
    fn test_zero_counts_are_valid_packet_samples() {
        let mut ring: RingBuffer<u32, 3> = RingBuffer::new();
        ring.push(0);
        ring.push(4);
        assert_eq!(ring.valid_count(), 2);
        assert_eq!(ring.mean(), Some(2.0));
    }

    #[test]
    fn test_clear() {
        let mut ring: RingBuffer<u32, 3> = RingBuffer::new();
        ring.push(9);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.sum(), 0);
        ring.push(1);
        assert_eq!(ring.iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_range_panics() {
        let ring: RingBuffer<u32, 3> = RingBuffer::new();
        ring.get(0);
    }
}
