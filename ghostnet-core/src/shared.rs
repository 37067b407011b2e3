//! Thread-safe engine handle.
//!
//! The capture context, the tick context and the renderer all hold clones
//! of one [`SharedEngine`]. Every operation runs under a single short lock,
//! so a snapshot never observes a record mid-update or mid-eviction.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::Config;
use crate::engine::{Engine, EngineStats, RssiSummary, Snapshot, TickOutcome};
use crate::types::{DisplayMode, FrameObservation, Timestamp};

#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(config: &Config) -> Self {
        SharedEngine::from_engine(Engine::new(config))
    }

    pub fn from_engine(engine: Engine) -> Self {
        SharedEngine {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Engine state stays consistent across a panicking holder: each
    /// operation completes its own update before returning.
    fn lock(&self) -> MutexGuard<'_, Engine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn observe_frame(&self, frame: &FrameObservation) {
        self.lock().observe_frame(frame);
    }

    pub fn on_frame_observed(&self) {
        self.lock().on_frame_observed();
    }

    pub fn on_tick(&self, now: Timestamp) -> TickOutcome {
        self.lock().on_tick(now)
    }

    pub fn reset_packet_rate(&self, now: Timestamp) {
        self.lock().reset_packet_rate(now);
    }

    pub fn snapshot(&self, mode: DisplayMode, scroll: usize, now: Timestamp) -> Snapshot {
        self.lock().snapshot(mode, scroll, now)
    }

    pub fn rssi_summary(&self) -> Option<RssiSummary> {
        self.lock().rssi_summary()
    }

    pub fn current_channel(&self) -> u8 {
        self.lock().current_channel()
    }

    pub fn stats(&self) -> EngineStats {
        self.lock().stats()
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.lock())
    }
}

impl Default for SharedEngine {
    fn default() -> Self {
        SharedEngine::from_engine(Engine::default())
    }
}
