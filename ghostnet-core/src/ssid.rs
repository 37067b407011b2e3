//! Network-name trackers fed by probe requests and beacons.
//!
//! Two independent lists share the same input:
//! - [`RecentSsids`]: short-lived sightings in a fixed ring. A new name always
//!   takes the next ring slot, clobbering whatever was there even if still
//!   fresh. Freshness (TTL) is applied by the reader, not stored.
//! - [`UniqueSsids`]: de-duplicated names with a dedup window. When full, the
//!   record with the smallest `first_seen` is evicted and the remaining
//!   records keep their relative order.
//!
//! Both preallocate their storage and never grow past capacity.

use log::debug;
use serde::Serialize;

use crate::types::{age_ms, SsidName, Timestamp};

pub const DEFAULT_RECENT_CAPACITY: usize = 50;
pub const DEFAULT_UNIQUE_CAPACITY: usize = 50;

/// Sightings older than this are hidden from the recent list.
pub const RECENT_TTL_MS: u64 = 30_000;

/// Repeat sightings inside this window do not count as new.
pub const UNIQUE_WINDOW_MS: u64 = 120_000;

// ---------------------------------------------------------------------------
// Recent sightings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SsidSighting {
    pub name: SsidName,
    pub last_seen: Timestamp,
}

impl SsidSighting {
    pub fn age(&self, now: Timestamp) -> u64 {
        age_ms(now, self.last_seen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentOutcome {
    Ignored,
    Updated,
    /// Written into a ring slot; carries the name it overwrote, if any.
    Inserted { overwrote: Option<SsidName> },
}

#[derive(Debug, Clone)]
pub struct RecentSsids {
    slots: Vec<SsidSighting>,
    capacity: usize,
    cursor: usize,
}

impl RecentSsids {
    pub fn new(capacity: usize) -> Self {
        RecentSsids {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    pub fn observe(&mut self, name: &SsidName, now: Timestamp) -> RecentOutcome {
        if name.is_empty() || self.capacity == 0 {
            return RecentOutcome::Ignored;
        }

        if let Some(s) = self.slots.iter_mut().find(|s| s.name == *name) {
            s.last_seen = now;
            return RecentOutcome::Updated;
        }

        let sighting = SsidSighting {
            name: *name,
            last_seen: now,
        };
        let overwrote = if self.slots.len() < self.capacity {
            self.slots.push(sighting);
            None
        } else {
            let old = std::mem::replace(&mut self.slots[self.cursor], sighting);
            Some(old.name)
        };
        self.cursor = (self.cursor + 1) % self.capacity;
        RecentOutcome::Inserted { overwrote }
    }

    /// Sightings in slot order, copied out.
    pub fn sightings(&self) -> impl Iterator<Item = SsidSighting> + '_ {
        self.slots.iter().copied()
    }

    /// Sightings no older than `ttl` at `now`, in slot order. Ages compare
    /// in whole seconds, so a 30 s TTL keeps a sighting until 30.999 s.
    pub fn fresh(&self, ttl: u64, now: Timestamp) -> impl Iterator<Item = SsidSighting> + '_ {
        let ttl_secs = ttl / 1000;
        self.sightings().filter(move |s| s.age(now) / 1000 <= ttl_secs)
    }

    pub fn count_fresh(&self, ttl: u64, now: Timestamp) -> usize {
        self.fresh(ttl, now).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecentSsids {
    fn default() -> Self {
        RecentSsids::new(DEFAULT_RECENT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Unique networks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UniqueSsidRecord {
    pub name: SsidName,
    pub first_seen: Timestamp,
    pub active: bool,
}

impl UniqueSsidRecord {
    pub fn age(&self, now: Timestamp) -> u64 {
        age_ms(now, self.first_seen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueOutcome {
    Ignored,
    /// Known and still inside the dedup window.
    AlreadyTracked,
    /// Known but expired; `first_seen` restarted in place.
    Renewed,
    Added { evicted: Option<SsidName> },
}

impl UniqueOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, UniqueOutcome::Added { .. })
    }
}

#[derive(Debug, Clone)]
pub struct UniqueSsids {
    records: Vec<UniqueSsidRecord>,
    capacity: usize,
    window: u64,
    evictions: u64,
}

impl UniqueSsids {
    pub fn new(capacity: usize, window: u64) -> Self {
        UniqueSsids {
            records: Vec::with_capacity(capacity),
            capacity,
            window,
            evictions: 0,
        }
    }

    pub fn observe(&mut self, name: &SsidName, now: Timestamp) -> UniqueOutcome {
        if name.is_empty() || self.capacity == 0 {
            return UniqueOutcome::Ignored;
        }

        let window = self.window;
        if let Some(rec) = self.records.iter_mut().find(|r| r.name == *name) {
            rec.active = true;
            if rec.age(now) <= window {
                return UniqueOutcome::AlreadyTracked;
            }
            rec.first_seen = now;
            return UniqueOutcome::Renewed;
        }

        let evicted = if self.records.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        self.records.push(UniqueSsidRecord {
            name: *name,
            first_seen: now,
            active: true,
        });
        debug!("new unique network {name} ({} tracked)", self.records.len());
        UniqueOutcome::Added { evicted }
    }

    /// Remove the record with the smallest `first_seen`, shifting the rest left.
    fn evict_oldest(&mut self) -> Option<SsidName> {
        let idx = self
            .records
            .iter()
            .enumerate()
            .min_by_key(|(_, r)| r.first_seen)
            .map(|(i, _)| i)?;
        let removed = self.records.remove(idx);
        self.evictions += 1;
        debug!("evicted unique network {}", removed.name);
        Some(removed.name)
    }

    /// Recompute `active` for every record against the dedup window.
    pub fn refresh_activity(&mut self, now: Timestamp) {
        let window = self.window;
        for rec in &mut self.records {
            rec.active = rec.age(now) <= window;
        }
    }

    /// Records in storage order, copied out.
    pub fn records(&self) -> impl Iterator<Item = UniqueSsidRecord> + '_ {
        self.records.iter().copied()
    }

    pub fn count_active(&self) -> usize {
        self.records.iter().filter(|r| r.active).count()
    }

    pub fn get(&self, name: &SsidName) -> Option<UniqueSsidRecord> {
        self.records.iter().find(|r| r.name == *name).copied()
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

    pub fn evictions(&self) -> u64 {
        self.evictions
    }
}

impl Default for UniqueSsids {
    fn default() -> Self {
        UniqueSsids::new(DEFAULT_UNIQUE_CAPACITY, UNIQUE_WINDOW_MS)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
