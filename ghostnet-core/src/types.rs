//! Shared types, error enum, and frame observation types for ghostnet-core.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// All errors produced by ghostnet-core.
#[derive(Debug, Error)]
pub enum GhostError {
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    #[error("invalid capture field: {0}")]
    InvalidField(String),
    #[error("SSID too long: {0} bytes (max 32)")]
    SsidTooLong(usize),
    #[error("unknown display mode: {0}")]
    UnknownMode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GhostError>;

/// Milliseconds since engine start.
pub type Timestamp = u64;

/// Age of a record at `now`. Clamped to zero if the clock went backwards.
pub fn age_ms(now: Timestamp, then: Timestamp) -> u64 {
    now.saturating_sub(then)
}

// ---------------------------------------------------------------------------
// MAC address
// ---------------------------------------------------------------------------

/// 6-byte hardware address, compared by value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);
    pub const ZERO: MacAddr = MacAddr([0x00; 6]);

    /// Read an address from the first 6 bytes of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Option<MacAddr> {
        let arr: [u8; 6] = bytes.get(..6)?.try_into().ok()?;
        Some(MacAddr(arr))
    }

    pub fn is_broadcast(&self) -> bool {
        *self == MacAddr::BROADCAST
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({self})")
    }
}

impl FromStr for MacAddr {
    type Err = GhostError;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 6];
        let mut parts = s.trim().split(':');
        for byte in bytes.iter_mut() {
            let part = parts
                .next()
                .filter(|p| p.len() == 2)
                .ok_or_else(|| GhostError::InvalidMac(s.to_string()))?;
            *byte =
                u8::from_str_radix(part, 16).map_err(|_| GhostError::InvalidMac(s.to_string()))?;
        }
        if parts.next().is_some() {
            return Err(GhostError::InvalidMac(s.to_string()));
        }
        Ok(MacAddr(bytes))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// SSID
// ---------------------------------------------------------------------------

/// Maximum SSID length in bytes (802.11 element limit).
pub const MAX_SSID_LEN: usize = 32;

/// Network name stored inline so tracking never touches the heap.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SsidName {
    bytes: [u8; MAX_SSID_LEN],
    len: u8,
}

impl SsidName {
    /// Copy `bytes` into a new name. Rejects anything over 32 bytes.
    pub fn new(bytes: &[u8]) -> Result<SsidName> {
        if bytes.len() > MAX_SSID_LEN {
            return Err(GhostError::SsidTooLong(bytes.len()));
        }
        let mut buf = [0u8; MAX_SSID_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(SsidName {
            bytes: buf,
            len: bytes.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Display text. Invalid UTF-8 is replaced, not rejected.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }
}

impl fmt::Display for SsidName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Debug for SsidName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SsidName({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl FromStr for SsidName {
    type Err = GhostError;

    fn from_str(s: &str) -> Result<Self> {
        SsidName::new(s.as_bytes())
    }
}

impl Serialize for SsidName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Frame observation (input from the capture side)
// ---------------------------------------------------------------------------

/// Management frame subtypes the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MgmtSubtype {
    ProbeRequest,
    Beacon,
    Other(u8),
}

impl MgmtSubtype {
    /// Only probe requests and beacons carry an SSID we track.
    pub fn carries_ssid(&self) -> bool {
        matches!(self, MgmtSubtype::ProbeRequest | MgmtSubtype::Beacon)
    }
}

/// Coarse frame classification delivered by the capture collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrameKind {
    Mgmt(MgmtSubtype),
    Data,
    Other,
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Mgmt(MgmtSubtype::ProbeRequest) => write!(f, "probe"),
            FrameKind::Mgmt(MgmtSubtype::Beacon) => write!(f, "beacon"),
            FrameKind::Mgmt(MgmtSubtype::Other(st)) => write!(f, "mgmt/{st}"),
            FrameKind::Data => write!(f, "data"),
            FrameKind::Other => write!(f, "other"),
        }
    }
}

/// One classified frame, ready to feed the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameObservation {
    pub kind: FrameKind,
    pub source: MacAddr,
    pub destination: MacAddr,
    pub rssi_dbm: i8,
    pub ssid: Option<SsidName>,
    pub timestamp: Timestamp,
}

// ---------------------------------------------------------------------------
// Display modes and age buckets (read side)
// ---------------------------------------------------------------------------

/// Pages a renderer can ask the engine for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Normal,
    Unique,
    Mac,
    Packets,
    Signal,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 5] = [
        DisplayMode::Normal,
        DisplayMode::Unique,
        DisplayMode::Mac,
        DisplayMode::Packets,
        DisplayMode::Signal,
    ];

    /// Next page in the button cycle.
    pub fn next(self) -> DisplayMode {
        let idx = DisplayMode::ALL.iter().position(|m| *m == self).unwrap_or(0);
        DisplayMode::ALL[(idx + 1) % DisplayMode::ALL.len()]
    }

    pub fn title(&self) -> &'static str {
        match self {
            DisplayMode::Normal => "Ghost Networks",
            DisplayMode::Unique => "Unique Networks (2m)",
            DisplayMode::Mac => "Unique MACs",
            DisplayMode::Packets => "Packets (2min)",
            DisplayMode::Signal => "Signal Strength",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayMode::Normal => "normal",
            DisplayMode::Unique => "unique",
            DisplayMode::Mac => "mac",
            DisplayMode::Packets => "packets",
            DisplayMode::Signal => "signal",
        };
        f.write_str(name)
    }
}

impl FromStr for DisplayMode {
    type Err = GhostError;

    fn from_str(s: &str) -> Result<Self> {
        DisplayMode::ALL
            .into_iter()
            .find(|m| m.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GhostError::UnknownMode(s.to_string()))
    }
}

/// Freshness band of a displayed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBucket {
    /// Under 5 seconds.
    Fresh,
    /// Under 15 seconds.
    Recent,
    Fading,
}

impl AgeBucket {
    pub fn from_age_ms(age: u64) -> AgeBucket {
        match age / 1000 {
            0..=4 => AgeBucket::Fresh,
            5..=14 => AgeBucket::Recent,
            _ => AgeBucket::Fading,
        }
    }
}

// ---------------------------------------------------------------------------
// Hex utilities
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes. Case-insensitive, must be even length.
pub fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for chunk in hex.as_bytes().chunks(2) {
        let high = hex_digit(chunk[0])?;
        let low = hex_digit(chunk[1])?;
        bytes.push((high << 4) | low);
    }
    Some(bytes)
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
