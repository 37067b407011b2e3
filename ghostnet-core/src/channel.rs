//! Round-robin channel hopping over the 2.4 GHz channel set.

use log::trace;

use crate::types::{age_ms, Timestamp};

/// Channels 1..=13 (ETSI 2.4 GHz set).
pub const DEFAULT_CHANNEL_COUNT: u8 = 13;

/// Dwell time per channel.
pub const DEFAULT_HOP_INTERVAL_MS: u64 = 200;

/// Center frequency of a 2.4 GHz channel in MHz.
pub fn channel_to_mhz(channel: u8) -> Option<u16> {
    match channel {
        1..=13 => Some(2407 + 5 * channel as u16),
        14 => Some(2484),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ChannelSequencer {
    current: u8,
    count: u8,
    interval: u64,
    last_hop: Timestamp,
}

impl ChannelSequencer {
    /// Start on channel 1. `count` is clamped to at least 1.
    pub fn new(count: u8, interval: u64) -> Self {
        ChannelSequencer {
            current: 1,
            count: count.max(1),
            interval,
            last_hop: 0,
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    /// Advance to the next channel unconditionally and return it.
    pub fn tick(&mut self) -> u8 {
        self.current = (self.current % self.count) + 1;
        self.current
    }

    /// Hop if the dwell interval has elapsed since the last hop.
    pub fn poll(&mut self, now: Timestamp) -> Option<u8> {
        if age_ms(now, self.last_hop) < self.interval {
            return None;
        }
        self.last_hop = now;
        let ch = self.tick();
        trace!("switching to channel {ch}");
        Some(ch)
    }
}

impl Default for ChannelSequencer {
    fn default() -> Self {
        ChannelSequencer::new(DEFAULT_CHANNEL_COUNT, DEFAULT_HOP_INTERVAL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut seq = ChannelSequencer::default();
        assert_eq!(seq.current(), 1);
        let visited: Vec<u8> = (0..13).map(|_| seq.tick()).collect();
        let mut expected: Vec<u8> = (2..=13).collect();
        expected.push(1);
        assert_eq!(visited, expected);
        assert_eq!(seq.current(), 1);
    }

    #[test]
    fn test_poll_respects_interval() {
        let mut seq = ChannelSequencer::default();
        assert_eq!(seq.poll(100), None);
        assert_eq!(seq.poll(200), Some(2));
        assert_eq!(seq.poll(399), None);
        assert_eq!(seq.poll(400), Some(3));
    }

    #[test]
    fn test_poll_single_hop_after_long_gap() {
        let mut seq = ChannelSequencer::default();
        assert_eq!(seq.poll(5_000), Some(2));
        assert_eq!(seq.poll(5_100), None);
    }

    #[test]
    fn test_single_channel() {
        let mut seq = ChannelSequencer::new(0, 200);
        assert_eq!(seq.tick(), 1);
        assert_eq!(seq.tick(), 1);
    }

    #[test]
    fn test_channel_frequencies() {
        assert_eq!(channel_to_mhz(1), Some(2412));
        assert_eq!(channel_to_mhz(6), Some(2437));
        assert_eq!(channel_to_mhz(13), Some(2472));
        assert_eq!(channel_to_mhz(14), Some(2484));
        assert_eq!(channel_to_mhz(0), None);
    }
}
