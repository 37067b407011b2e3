//! Engine state and the aggregated read view handed to renderers.
//!
//! Pure state machine: the capture side calls [`Engine::observe_frame`] per
//! classified frame, the host loop calls [`Engine::on_tick`] periodically,
//! and a renderer pulls [`Engine::snapshot`]. Nothing here performs I/O.
//!
//! Frame-path operations never allocate and are bounded by tracker capacity.

use log::trace;
use serde::Serialize;

use crate::channel::ChannelSequencer;
use crate::config::Config;
use crate::mac::{MacAddressTracker, MAC_WINDOW_LONG_MS, MAC_WINDOW_SHORT_MS};
use crate::ring::{RingBuffer, Rssi};
use crate::ssid::{RecentSsids, UniqueSsids};
use crate::types::*;

/// RSSI samples kept for the signal page.
pub const RSSI_SAMPLES: usize = 100;

/// One-second packet buckets kept (two minutes).
pub const PACKET_BUCKETS: usize = 120;

pub const BUCKET_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// Packet rate
// ---------------------------------------------------------------------------

/// Per-second packet counts over a rolling window.
///
/// Frames accumulate into the open bucket; [`PacketRate::advance`] closes one
/// bucket per whole second elapsed. If ticks arrive late, the open count goes
/// into the first closed bucket and the remaining elapsed seconds are closed
/// as empty, so the window always spans real time.
#[derive(Debug, Clone)]
pub struct PacketRate {
    ring: RingBuffer<u32, PACKET_BUCKETS>,
    current: u32,
    last_close: Timestamp,
}

impl PacketRate {
    pub fn new(start: Timestamp) -> Self {
        PacketRate {
            ring: RingBuffer::new(),
            current: 0,
            last_close: start,
        }
    }

    pub fn record(&mut self) {
        self.current = self.current.saturating_add(1);
    }

    /// Close every bucket whose second has fully elapsed. Returns how many.
    pub fn advance(&mut self, now: Timestamp) -> usize {
        let elapsed = age_ms(now, self.last_close) / BUCKET_MS;
        if elapsed == 0 {
            return 0;
        }

        self.ring.push(self.current);
        self.current = 0;
        let idle = (elapsed - 1).min(PACKET_BUCKETS as u64) as usize;
        for _ in 0..idle {
            self.ring.push(0);
        }
        self.last_close += elapsed * BUCKET_MS;
        trace!("closed {} packet bucket(s)", 1 + idle);
        1 + idle
    }

    /// Frames counted across the retained buckets.
    pub fn total(&self) -> u64 {
        self.ring.sum() as u64
    }

    /// Mean frames per second over closed buckets.
    pub fn per_second(&self) -> Option<f64> {
        self.ring.mean()
    }

    /// Count in the most recently closed bucket.
    pub fn last_second(&self) -> Option<u32> {
        self.ring.latest()
    }

    /// Frames in the still-open bucket.
    pub fn pending(&self) -> u32 {
        self.current
    }

    pub fn buckets(&self) -> impl Iterator<Item = u32> + '_ {
        self.ring.iter()
    }

    pub fn filled(&self) -> usize {
        self.ring.len()
    }

    /// Drop all history and start a fresh bucket at `now`.
    pub fn reset(&mut self, now: Timestamp) {
        self.ring.clear();
        self.current = 0;
        self.last_close = now;
    }
}

// ---------------------------------------------------------------------------
// Read-side types
// ---------------------------------------------------------------------------

/// Signal statistics over valid RSSI samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RssiSummary {
    pub average: f64,
    pub min: i8,
    pub max: i8,
    pub sample_count: usize,
}

impl RssiSummary {
    /// Signal bars 0..=4, linear over -100..-30 dBm.
    pub fn bars(&self) -> u8 {
        let avg = self.average as i64;
        let scaled = (avg + 100) * 4 / 70;
        scaled.clamp(0, 4) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacActivity {
    pub last_1m: usize,
    pub last_2m: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    pub text: String,
    pub age: AgeBucket,
}

/// Immutable, point-in-time view for one display page.
///
/// `active_count`/`total_count` depend on the mode: listed entries for the
/// list pages, filled/total buckets for `Packets`, valid/held samples for
/// `Signal`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub mode: DisplayMode,
    pub timestamp: Timestamp,
    pub scroll_offset: usize,
    pub active_count: usize,
    pub total_count: usize,
    pub entries: Vec<SnapshotEntry>,
    pub rssi: Option<RssiSummary>,
    pub packet_total: u64,
    pub packets_per_second: Option<f64>,
    pub packets_last_second: Option<u32>,
    pub mac_activity: MacActivity,
    pub current_channel: u8,
}

/// Result of a periodic tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// New channel to tune the radio to, if a hop happened.
    pub hopped_to: Option<u8>,
    pub buckets_closed: usize,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EngineStats {
    pub frames_seen: u64,
    pub frames_tracked: u64,
    pub ssid_frames: u64,
    pub macs_dropped: u64,
    pub unique_evictions: u64,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// All tracker state, created once with a defined initial state.
#[derive(Debug, Clone)]
pub struct Engine {
    macs: MacAddressTracker,
    recent: RecentSsids,
    unique: UniqueSsids,
    rssi: RingBuffer<Rssi, RSSI_SAMPLES>,
    packets: PacketRate,
    channel: ChannelSequencer,
    recent_ttl: u64,
    page_size: usize,
    frames_seen: u64,
    frames_tracked: u64,
    ssid_frames: u64,
}

impl Engine {
    /// Empty trackers, channel 1, zeroed rings, bucket clock at 0.
    pub fn new(config: &Config) -> Self {
        Engine {
            macs: MacAddressTracker::new(config.tracker.mac_capacity),
            recent: RecentSsids::new(config.tracker.recent_capacity),
            unique: UniqueSsids::new(config.tracker.unique_capacity, config.unique_window_ms()),
            rssi: RingBuffer::new(),
            packets: PacketRate::new(0),
            channel: ChannelSequencer::new(config.channel.count, config.channel.hop_interval_ms),
            recent_ttl: config.recent_ttl_ms(),
            page_size: config.display.page_size,
            frames_seen: 0,
            frames_tracked: 0,
            ssid_frames: 0,
        }
    }

    /// Feed one classified frame.
    pub fn observe_frame(&mut self, frame: &FrameObservation) {
        self.frames_seen += 1;
        self.packets.record();

        if frame.kind == FrameKind::Other {
            return;
        }
        self.frames_tracked += 1;

        self.rssi.push(Rssi(frame.rssi_dbm));
        self.macs.observe(frame.destination, frame.timestamp);
        self.macs.observe(frame.source, frame.timestamp);

        let FrameKind::Mgmt(subtype) = frame.kind else {
            return;
        };
        if !subtype.carries_ssid() {
            return;
        }
        if let Some(ssid) = frame.ssid.as_ref() {
            self.ssid_frames += 1;
            self.unique.observe(ssid, frame.timestamp);
            self.recent.observe(ssid, frame.timestamp);
        }
    }

    /// Count a frame without classifying it.
    pub fn on_frame_observed(&mut self) {
        self.frames_seen += 1;
        self.packets.record();
    }

    /// Hop channel if due and close elapsed packet buckets.
    pub fn on_tick(&mut self, now: Timestamp) -> TickOutcome {
        TickOutcome {
            hopped_to: self.channel.poll(now),
            buckets_closed: self.packets.advance(now),
        }
    }

    /// Clear packet-rate history (done when entering or leaving the packets page).
    pub fn reset_packet_rate(&mut self, now: Timestamp) {
        self.packets.reset(now);
    }

    pub fn rssi_summary(&self) -> Option<RssiSummary> {
        let average = self.rssi.mean()?;
        Some(RssiSummary {
            average,
            min: self.rssi.min()? as i8,
            max: self.rssi.max()? as i8,
            sample_count: self.rssi.valid_count(),
        })
    }

    /// Build the read view for `mode`, listing up to one page of entries
    /// starting `scroll` entries in. Only the activity flags are touched.
    pub fn snapshot(&mut self, mode: DisplayMode, scroll: usize, now: Timestamp) -> Snapshot {
        let page = self.page_size;
        let (active_count, total_count, entries) = match mode {
            DisplayMode::Normal => {
                let ttl = self.recent_ttl;
                let entries = self
                    .recent
                    .fresh(ttl, now)
                    .skip(scroll)
                    .take(page)
                    .map(|s| SnapshotEntry {
                        text: s.name.to_text(),
                        age: AgeBucket::from_age_ms(s.age(now)),
                    })
                    .collect();
                (self.recent.count_fresh(ttl, now), self.recent.len(), entries)
            }
            DisplayMode::Unique => {
                self.unique.refresh_activity(now);
                let entries = self
                    .unique
                    .records()
                    .filter(|r| r.active)
                    .skip(scroll)
                    .take(page)
                    .map(|r| SnapshotEntry {
                        text: r.name.to_text(),
                        age: AgeBucket::from_age_ms(r.age(now)),
                    })
                    .collect();
                (self.unique.count_active(), self.unique.len(), entries)
            }
            DisplayMode::Mac => {
                self.macs.refresh_activity(MAC_WINDOW_LONG_MS, now);
                let entries = self
                    .macs
                    .records()
                    .filter(|r| r.active)
                    .skip(scroll)
                    .take(page)
                    .map(|r| SnapshotEntry {
                        text: r.address.to_string(),
                        age: AgeBucket::from_age_ms(r.age(now)),
                    })
                    .collect();
                let active = self.macs.count_active_within(MAC_WINDOW_LONG_MS, now);
                (active, self.macs.len(), entries)
            }
            DisplayMode::Packets => (self.packets.filled(), PACKET_BUCKETS, Vec::new()),
            DisplayMode::Signal => (self.rssi.valid_count(), self.rssi.len(), Vec::new()),
        };

        Snapshot {
            mode,
            timestamp: now,
            scroll_offset: scroll,
            active_count,
            total_count,
            entries,
            rssi: self.rssi_summary(),
            packet_total: self.packets.total(),
            packets_per_second: self.packets.per_second(),
            packets_last_second: self.packets.last_second(),
            mac_activity: MacActivity {
                last_1m: self.macs.count_active_within(MAC_WINDOW_SHORT_MS, now),
                last_2m: self.macs.count_active_within(MAC_WINDOW_LONG_MS, now),
            },
            current_channel: self.channel.current(),
        }
    }

    pub fn current_channel(&self) -> u8 {
        self.channel.current()
    }

    pub fn channel_count(&self) -> u8 {
        self.channel.count()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            frames_seen: self.frames_seen,
            frames_tracked: self.frames_tracked,
            ssid_frames: self.ssid_frames,
            macs_dropped: self.macs.dropped(),
            unique_evictions: self.unique.evictions(),
        }
    }

    pub fn macs(&self) -> &MacAddressTracker {
        &self.macs
    }

    pub fn recent(&self) -> &RecentSsids {
        &self.recent
    }

    pub fn unique(&self) -> &UniqueSsids {
        &self.unique
    }

    pub fn packets(&self) -> &PacketRate {
        &self.packets
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(&Config::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::Scroller;
    use std::collections::HashSet;

    fn mac(n: u8) -> MacAddr {
        MacAddr([0x02, 0, 0, 0, 0, n])
    }

    fn probe(src: u8, ssid: &str, rssi: i8, ts: Timestamp) -> FrameObservation {
        FrameObservation {
            kind: FrameKind::Mgmt(MgmtSubtype::ProbeRequest),
            source: mac(src),
            destination: MacAddr::BROADCAST,
            rssi_dbm: rssi,
            ssid: Some(ssid.parse().unwrap()),
            timestamp: ts,
        }
    }

    fn data(src: u8, dst: u8, rssi: i8, ts: Timestamp) -> FrameObservation {
        FrameObservation {
            kind: FrameKind::Data,
            source: mac(src),
            destination: mac(dst),
            rssi_dbm: rssi,
            ssid: None,
            timestamp: ts,
        }
    }

    fn other(ts: Timestamp) -> FrameObservation {
        FrameObservation {
            kind: FrameKind::Other,
            source: mac(9),
            destination: mac(10),
            rssi_dbm: -30,
            ssid: None,
            timestamp: ts,
        }
    }

    #[test]
    fn test_initial_state() {
        let mut engine = Engine::default();
        assert_eq!(engine.current_channel(), 1);
        assert!(engine.rssi_summary().is_none());

        let snap = engine.snapshot(DisplayMode::Normal, 0, 0);
        assert_eq!(snap.active_count, 0);
        assert_eq!(snap.total_count, 0);
        assert!(snap.entries.is_empty());
        assert_eq!(snap.packet_total, 0);
        assert!(snap.rssi.is_none());
    }

    #[test]
    fn test_probe_feeds_all_trackers() {
        let mut engine = Engine::default();
        engine.observe_frame(&probe(1, "HomeNet", -50, 1_000));

        assert_eq!(engine.recent().len(), 1);
        assert_eq!(engine.unique().len(), 1);
        assert_eq!(engine.macs().len(), 1, "broadcast destination skipped");
        assert_eq!(engine.rssi_summary().unwrap().sample_count, 1);
        assert_eq!(engine.packets().pending(), 1);
        assert_eq!(engine.stats().ssid_frames, 1);
    }

    #[test]
    fn test_other_frames_count_only() {
        let mut engine = Engine::default();
        engine.observe_frame(&other(0));
        engine.on_frame_observed();

        assert_eq!(engine.packets().pending(), 2);
        assert!(engine.macs().is_empty());
        assert!(engine.rssi_summary().is_none());
        let stats = engine.stats();
        assert_eq!(stats.frames_seen, 2);
        assert_eq!(stats.frames_tracked, 0);
    }

    #[test]
    fn test_data_frames_track_both_addresses() {
        let mut engine = Engine::default();
        engine.observe_frame(&data(1, 2, -60, 0));
        engine.observe_frame(&data(2, 1, -62, 10));
        assert_eq!(engine.macs().len(), 2);
        assert!(engine.recent().is_empty());
    }

    #[test]
    fn test_rssi_summary() {
        let mut engine = Engine::default();
        engine.observe_frame(&data(1, 2, -40, 0));
        engine.observe_frame(&data(1, 2, -60, 1));
        let s = engine.rssi_summary().unwrap();
        assert_eq!(s.average, -50.0);
        assert_eq!(s.min, -60);
        assert_eq!(s.max, -40);
        assert_eq!(s.sample_count, 2);
    }

    #[test]
    fn test_unset_rssi_readings_ignored() {
        let mut engine = Engine::default();
        engine.observe_frame(&data(1, 2, 0, 0));
        assert!(engine.rssi_summary().is_none());
        engine.observe_frame(&data(1, 2, -70, 1));
        assert_eq!(engine.rssi_summary().unwrap().sample_count, 1);
    }

    #[test]
    fn test_signal_bars() {
        let bars = |avg: f64| {
            RssiSummary {
                average: avg,
                min: 0,
                max: 0,
                sample_count: 1,
            }
            .bars()
        };
        assert_eq!(bars(-100.0), 0);
        assert_eq!(bars(-110.0), 0);
        assert_eq!(bars(-65.0), 2);
        assert_eq!(bars(-30.0), 4);
        assert_eq!(bars(-10.0), 4);
    }

    #[test]
    fn test_packet_rate_window() {
        let mut engine = Engine::default();
        for s in 0..130u64 {
            for _ in 0..10 {
                engine.on_frame_observed();
            }
            engine.on_tick((s + 1) * 1000);
        }
        assert_eq!(engine.packets().filled(), PACKET_BUCKETS);
        assert_eq!(engine.packets().total(), 1200);
        assert_eq!(engine.packets().per_second(), Some(10.0));
    }

    #[test]
    fn test_packet_rate_irregular_ticks() {
        let mut rate = PacketRate::new(0);
        for _ in 0..5 {
            rate.record();
        }
        assert_eq!(rate.advance(400), 0);
        assert_eq!(rate.advance(999), 0);
        assert_eq!(rate.advance(3_500), 3);
        assert_eq!(rate.buckets().collect::<Vec<_>>(), vec![5, 0, 0]);
        // Fractional remainder carried: next bucket closes at 4000
        assert_eq!(rate.advance(3_999), 0);
        assert_eq!(rate.advance(4_000), 1);
    }

    #[test]
    fn test_packet_rate_long_gap_bounded() {
        let mut rate = PacketRate::new(0);
        rate.record();
        let closed = rate.advance(10_000_000);
        assert_eq!(closed, 1 + PACKET_BUCKETS);
        assert_eq!(rate.filled(), PACKET_BUCKETS);
        assert_eq!(rate.total(), 0, "the single frame scrolled out");
    }

    #[test]
    fn test_reset_packet_rate() {
        let mut engine = Engine::default();
        engine.on_frame_observed();
        engine.on_tick(1_000);
        engine.on_frame_observed();
        engine.reset_packet_rate(1_500);
        assert_eq!(engine.packets().total(), 0);
        assert_eq!(engine.packets().pending(), 0);
        assert_eq!(engine.on_tick(2_000).buckets_closed, 0);
        assert_eq!(engine.on_tick(2_500).buckets_closed, 1);
    }

    #[test]
    fn test_tick_hops_channel() {
        let mut engine = Engine::default();
        let out = engine.on_tick(200);
        assert_eq!(out.hopped_to, Some(2));
        assert_eq!(out.buckets_closed, 0);
        assert_eq!(engine.on_tick(300).hopped_to, None);
        assert_eq!(engine.current_channel(), 2);
    }

    #[test]
    fn test_normal_snapshot_ttl_and_age_buckets() {
        let mut engine = Engine::default();
        engine.observe_frame(&probe(1, "stale", -50, 0));
        engine.observe_frame(&probe(2, "fading", -50, 20_000));
        engine.observe_frame(&probe(3, "recent", -50, 30_000));
        engine.observe_frame(&probe(4, "fresh", -50, 38_000));

        let snap = engine.snapshot(DisplayMode::Normal, 0, 40_000);
        assert_eq!(snap.total_count, 4);
        assert_eq!(snap.active_count, 3);
        let got: Vec<_> = snap
            .entries
            .iter()
            .map(|e| (e.text.as_str(), e.age))
            .collect();
        assert_eq!(
            got,
            vec![
                ("fading", AgeBucket::Fading),
                ("recent", AgeBucket::Recent),
                ("fresh", AgeBucket::Fresh),
            ]
        );
    }

    #[test]
    fn test_snapshot_paging() {
        let mut engine = Engine::default();
        for i in 0..12u8 {
            engine.observe_frame(&probe(i, &format!("net{i:02}"), -50, i as u64));
        }
        let snap = engine.snapshot(DisplayMode::Unique, 0, 100);
        assert_eq!(snap.active_count, 12);
        assert_eq!(snap.entries.len(), 8);
        assert_eq!(snap.entries[0].text, "net00");

        let snap = engine.snapshot(DisplayMode::Unique, 10, 100);
        let names: Vec<_> = snap.entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(names, vec!["net10", "net11"]);

        let snap = engine.snapshot(DisplayMode::Unique, 20, 100);
        assert!(snap.entries.is_empty());
    }

    #[test]
    fn test_unique_snapshot_hides_expired() {
        let mut engine = Engine::default();
        engine.observe_frame(&probe(1, "old", -50, 0));
        engine.observe_frame(&probe(2, "new", -50, 100_000));
        let snap = engine.snapshot(DisplayMode::Unique, 0, 150_000);
        assert_eq!(snap.total_count, 2);
        assert_eq!(snap.active_count, 1);
        assert_eq!(snap.entries[0].text, "new");
    }

    #[test]
    fn test_mac_snapshot_activity() {
        let mut engine = Engine::default();
        engine.observe_frame(&data(1, 2, -50, 0));
        engine.observe_frame(&data(3, 4, -50, 90_000));

        let snap = engine.snapshot(DisplayMode::Mac, 0, 100_000);
        assert_eq!(snap.mac_activity, MacActivity { last_1m: 2, last_2m: 4 });
        assert_eq!(snap.active_count, 4, "counts the listed entries");
        assert_eq!(snap.total_count, 4);
        assert_eq!(snap.entries.len(), 4);
        assert_eq!(snap.entries[2].text, "02:00:00:00:00:04");
    }

    #[test]
    fn test_mac_page_scrolls_through_two_minute_list() {
        let mut engine = Engine::default();
        for n in 0..15 {
            engine.observe_frame(&probe(n, "x", -50, 30_000));
        }
        for n in 15..20 {
            engine.observe_frame(&probe(n, "x", -50, 90_000));
        }

        let now = 100_000;
        let mut scroller = Scroller::new(engine.page_size, 0);
        let mut seen = HashSet::new();
        for _ in 0..20 {
            let active = engine.snapshot(DisplayMode::Mac, 0, now).active_count;
            let snap = engine.snapshot(DisplayMode::Mac, scroller.update(active, now), now);
            assert_eq!(snap.mac_activity, MacActivity { last_1m: 5, last_2m: 20 });
            assert_eq!(snap.active_count, 20);
            seen.extend(snap.entries.into_iter().map(|e| e.text));
        }
        assert_eq!(seen.len(), 20);
    }

    #[test]
    fn test_packets_and_signal_snapshots() {
        let mut engine = Engine::default();
        engine.observe_frame(&data(1, 2, -45, 0));
        engine.on_tick(1_000);

        let snap = engine.snapshot(DisplayMode::Packets, 0, 1_000);
        assert_eq!(snap.packet_total, 1);
        assert_eq!(snap.packets_last_second, Some(1));
        assert_eq!(snap.active_count, 1);
        assert_eq!(snap.total_count, PACKET_BUCKETS);
        assert!(snap.entries.is_empty());

        let snap = engine.snapshot(DisplayMode::Signal, 0, 1_000);
        assert_eq!(snap.rssi.unwrap().max, -45);
        assert_eq!(snap.active_count, 1);
    }

    #[test]
    fn test_snapshot_idempotent() {
        let mut engine = Engine::default();
        engine.observe_frame(&probe(1, "a", -50, 0));
        engine.observe_frame(&probe(2, "b", -55, 130_000));
        engine.observe_frame(&data(3, 4, -60, 131_000));
        engine.on_tick(131_000);

        for mode in DisplayMode::ALL {
            let first = engine.snapshot(mode, 0, 140_000);
            let second = engine.snapshot(mode, 0, 140_000);
            assert_eq!(first, second, "mode {mode}");
        }
    }
}
