//! Capture file ingestion for 802.11 frames.
//!
//! One frame per line: `hex[;timestamp_ms[;rssi_dbm]]`. Blank lines and
//! `#` comments are skipped. A missing timestamp continues from the previous
//! frame; a missing RSSI is recorded as unset (0 dBm).

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use ghostnet_core::types::{hex_decode, FrameObservation, GhostError, Result, Timestamp};

/// Spacing applied to frames without an explicit timestamp.
pub const AUTO_STEP_MS: u64 = 10;

/// Shortest payload worth keeping: one frame-control byte.
const MIN_FRAME_BYTES: usize = 1;

/// 2304-byte MSDU plus header and FCS.
const MAX_FRAME_BYTES: usize = 2346;

/// One raw frame as read from a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub payload: Vec<u8>,
    pub timestamp: Timestamp,
    pub rssi_dbm: i8,
}

impl CapturedFrame {
    pub fn classify(&self) -> FrameObservation {
        ghostnet_core::classify(&self.payload, self.rssi_dbm, self.timestamp)
    }
}

// ---------------------------------------------------------------------------
// Frame Reader
// ---------------------------------------------------------------------------

/// Read hex-encoded frames from a capture file, or stdin for `-`.
pub struct FrameReader {
    path: PathBuf,
}

impl FrameReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        FrameReader {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all frames from the file.
    pub fn read_all(&self) -> io::Result<Vec<CapturedFrame>> {
        if self.path.as_os_str() == "-" {
            return read_frames(io::stdin().lock());
        }
        let content = fs::read_to_string(&self.path)?;
        read_frames(content.as_bytes())
    }
}

/// Parse every frame line from `reader`, skipping malformed ones.
pub fn read_frames(reader: impl BufRead) -> io::Result<Vec<CapturedFrame>> {
    let mut frames = Vec::new();
    let mut next_ts: Timestamp = 0;
    let mut skipped = 0usize;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(&line, next_ts) {
            Ok(Some(frame)) => {
                next_ts = frame.timestamp.saturating_add(AUTO_STEP_MS);
                frames.push(frame);
            }
            Ok(None) => {}
            Err(e) => {
                skipped += 1;
                debug!("line {}: {e}", lineno + 1);
            }
        }
    }

    if skipped > 0 {
        warn!("skipped {skipped} malformed capture line(s)");
    }
    Ok(frames)
}

/// Parse a single capture line. `default_ts` is used when the line has none.
/// Blank and comment lines yield `Ok(None)`.
pub fn parse_line(line: &str, default_ts: Timestamp) -> Result<Option<CapturedFrame>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split(';').map(str::trim);
    let hex = fields.next().unwrap_or_default();
    let payload = clean_hex(hex).ok_or_else(|| GhostError::InvalidHex(hex.to_string()))?;

    let timestamp = match fields.next() {
        None | Some("") => default_ts,
        Some(t) => t
            .parse()
            .map_err(|_| GhostError::InvalidField(format!("timestamp {t:?}")))?,
    };

    let rssi_dbm = match fields.next() {
        None | Some("") => 0,
        Some(r) => r
            .parse()
            .map_err(|_| GhostError::InvalidField(format!("rssi {r:?}")))?,
    };

    Ok(Some(CapturedFrame {
        payload,
        timestamp,
        rssi_dbm,
    }))
}

/// Decode a hex payload, tolerating embedded spaces and colons.
pub fn clean_hex(hex: &str) -> Option<Vec<u8>> {
    let compact: String = hex
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let bytes = hex_decode(&compact)?;
    (MIN_FRAME_BYTES..=MAX_FRAME_BYTES)
        .contains(&bytes.len())
        .then_some(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
