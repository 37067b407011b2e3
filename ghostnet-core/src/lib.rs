//! ghostnet-core: bounded tracking of what an 802.11 monitor has seen.
//!
//! No async, no I/O: just bounded data structures. Shared by
//! `ghostnet-feeder` (capture ingestion) and `ghostnet-cli` (replay/render).

pub mod channel;
pub mod config;
pub mod engine;
pub mod frame;
pub mod mac;
pub mod ring;
pub mod scroll;
pub mod shared;
pub mod ssid;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use engine::{Engine, EngineStats, RssiSummary, Snapshot, SnapshotEntry, TickOutcome};
pub use frame::classify;
pub use ring::{RingBuffer, Rssi};
pub use scroll::Scroller;
pub use shared::SharedEngine;
pub use types::*;
