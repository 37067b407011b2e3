//! Classify raw 802.11 frames into engine inputs.
//!
//! Responsibilities:
//! - Frame type/subtype from the frame-control byte
//! - Receiver (addr1) and transmitter (addr2) addresses
//! - SSID element from probe requests and beacons
//!
//! Every field read is bounds-checked against the supplied slice. A frame
//! too short for its header is still classified (as `Other`) so it counts
//! toward packet rate.

use crate::types::{
    FrameKind, FrameObservation, MacAddr, MgmtSubtype, SsidName, Timestamp, MAX_SSID_LEN,
};

const ADDR1: usize = 4;
const ADDR2: usize = 10;
/// Frame control + duration + three addresses + sequence control.
const MGMT_HEADER_LEN: usize = 24;
/// Beacons carry timestamp, interval and capability fields before elements.
const BEACON_FIXED_LEN: usize = 12;

const TYPE_MGMT: u8 = 0;
const TYPE_DATA: u8 = 2;

const SUBTYPE_PROBE_REQUEST: u8 = 4;
const SUBTYPE_BEACON: u8 = 8;

const ELEMENT_SSID: u8 = 0;

/// Frame type and subtype from the first frame-control byte.
pub fn frame_kind(fc: u8) -> FrameKind {
    let ftype = (fc >> 2) & 0x03;
    let subtype = (fc >> 4) & 0x0F;
    match ftype {
        TYPE_MGMT => FrameKind::Mgmt(match subtype {
            SUBTYPE_PROBE_REQUEST => MgmtSubtype::ProbeRequest,
            SUBTYPE_BEACON => MgmtSubtype::Beacon,
            other => MgmtSubtype::Other(other),
        }),
        TYPE_DATA => FrameKind::Data,
        _ => FrameKind::Other,
    }
}

/// Classify one captured frame.
pub fn classify(payload: &[u8], rssi_dbm: i8, timestamp: Timestamp) -> FrameObservation {
    let other = FrameObservation {
        kind: FrameKind::Other,
        source: MacAddr::ZERO,
        destination: MacAddr::ZERO,
        rssi_dbm,
        ssid: None,
        timestamp,
    };

    let Some(&fc) = payload.first() else {
        return other;
    };
    let kind = frame_kind(fc);
    if kind == FrameKind::Other {
        return other;
    }

    let (Some(destination), Some(source)) = (
        payload.get(ADDR1..).and_then(MacAddr::from_slice),
        payload.get(ADDR2..).and_then(MacAddr::from_slice),
    ) else {
        return other;
    };

    let ssid = match kind {
        FrameKind::Mgmt(MgmtSubtype::ProbeRequest) => ssid_element(payload, MGMT_HEADER_LEN),
        FrameKind::Mgmt(MgmtSubtype::Beacon) => {
            ssid_element(payload, MGMT_HEADER_LEN + BEACON_FIXED_LEN)
        }
        _ => None,
    };

    FrameObservation {
        kind,
        source,
        destination,
        rssi_dbm,
        ssid,
        timestamp,
    }
}

/// Read the SSID element at `offset`. Wildcard (zero-length), oversized or
/// truncated elements yield `None`.
pub fn ssid_element(payload: &[u8], offset: usize) -> Option<SsidName> {
    let id = *payload.get(offset)?;
    if id != ELEMENT_SSID {
        return None;
    }
    let len = *payload.get(offset + 1)? as usize;
    if len == 0 || len > MAX_SSID_LEN {
        return None;
    }
    let start = offset + 2;
    let bytes = payload.get(start..start + len)?;
    SsidName::new(bytes).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
