//! Bounded set of hardware addresses with first/last-seen times.
//!
//! Retention is first-come-first-served: once the tracker is full, frames
//! from unseen addresses are dropped rather than evicting anything.
//! Storage is preallocated at construction and never grows past capacity.

use log::debug;
use serde::Serialize;

use crate::types::{age_ms, MacAddr, Timestamp};

/// Default number of addresses retained.
pub const DEFAULT_MAC_CAPACITY: usize = 100;

/// Activity windows shown on the MAC page.
pub const MAC_WINDOW_SHORT_MS: u64 = 60_000;
pub const MAC_WINDOW_LONG_MS: u64 = 120_000;

/// One tracked address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacRecord {
    pub address: MacAddr,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
    pub active: bool,
}

impl MacRecord {
    pub fn age(&self, now: Timestamp) -> u64 {
        age_ms(now, self.last_seen)
    }

    pub fn is_active_within(&self, window: u64, now: Timestamp) -> bool {
        self.age(now) <= window
    }
}

/// Outcome of a single `observe` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacOutcome {
    Inserted,
    Updated,
    /// Broadcast address; never stored.
    Ignored,
    /// Tracker full and address unseen.
    Dropped,
}

#[derive(Debug, Clone)]
pub struct MacAddressTracker {
    records: Vec<MacRecord>,
    capacity: usize,
    dropped: u64,
}

impl MacAddressTracker {
    pub fn new(capacity: usize) -> Self {
        MacAddressTracker {
            records: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Record a sighting of `address` at `now`.
    pub fn observe(&mut self, address: MacAddr, now: Timestamp) -> MacOutcome {
        if address.is_broadcast() {
            return MacOutcome::Ignored;
        }

        if let Some(rec) = self.records.iter_mut().find(|r| r.address == address) {
            rec.last_seen = now;
            rec.active = true;
            return MacOutcome::Updated;
        }

        if self.records.len() >= self.capacity {
            self.dropped += 1;
            debug!("MAC tracker full ({}), dropping {address}", self.capacity);
            return MacOutcome::Dropped;
        }

        self.records.push(MacRecord {
            address,
            first_seen: now,
            last_seen: now,
            active: true,
        });
        MacOutcome::Inserted
    }

    /// Number of records seen within `window` ms of `now`.
    pub fn count_active_within(&self, window: u64, now: Timestamp) -> usize {
        self.records
            .iter()
            .filter(|r| r.is_active_within(window, now))
            .count()
    }

    /// Recompute every record's `active` flag against `window`.
    pub fn refresh_activity(&mut self, window: u64, now: Timestamp) {
        for rec in &mut self.records {
            rec.active = rec.is_active_within(window, now);
        }
    }

    pub fn get(&self, address: &MacAddr) -> Option<MacRecord> {
        self.records.iter().find(|r| r.address == *address).copied()
    }

    /// Records in insertion order, copied out.
    pub fn records(&self) -> impl Iterator<Item = MacRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Addresses rejected because the tracker was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for MacAddressTracker {
    fn default() -> Self {
        MacAddressTracker::new(DEFAULT_MAC_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
