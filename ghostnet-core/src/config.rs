//! Configuration file management for ghostnet.
//!
//! Reads/writes `~/.ghostnet/config.yaml` with tracker capacities, activity
//! windows, channel hopping and display paging settings.

use std::path::{Path, PathBuf};

use crate::channel::{DEFAULT_CHANNEL_COUNT, DEFAULT_HOP_INTERVAL_MS};
use crate::mac::DEFAULT_MAC_CAPACITY;
use crate::ssid::{DEFAULT_RECENT_CAPACITY, DEFAULT_UNIQUE_CAPACITY, RECENT_TTL_MS, UNIQUE_WINDOW_MS};
use crate::types::{GhostError, Result};

/// Longest window or TTL accepted, in seconds (one year).
pub const MAX_WINDOW_SECS: u64 = 365 * 24 * 3600;

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub channel: ChannelConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub mac_capacity: usize,
    pub recent_capacity: usize,
    pub unique_capacity: usize,
    pub unique_window_secs: u64,
    pub recent_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub count: u8,
    pub hop_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub page_size: usize,
    pub scroll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tracker: TrackerConfig {
                mac_capacity: DEFAULT_MAC_CAPACITY,
                recent_capacity: DEFAULT_RECENT_CAPACITY,
                unique_capacity: DEFAULT_UNIQUE_CAPACITY,
                unique_window_secs: UNIQUE_WINDOW_MS / 1000,
                recent_ttl_secs: RECENT_TTL_MS / 1000,
            },
            channel: ChannelConfig {
                count: DEFAULT_CHANNEL_COUNT,
                hop_interval_ms: DEFAULT_HOP_INTERVAL_MS,
            },
            display: DisplayConfig {
                page_size: 8,
                scroll_interval_ms: 2000,
            },
        }
    }
}

impl Config {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.tracker;
        if t.mac_capacity == 0 || t.recent_capacity == 0 || t.unique_capacity == 0 {
            return Err(GhostError::Config("tracker capacities must be non-zero".into()));
        }
        if !(1..=14).contains(&self.channel.count) {
            return Err(GhostError::Config(format!(
                "channel count {} outside 1..=14",
                self.channel.count
            )));
        }
        for (name, secs) in [
            ("unique_window_secs", t.unique_window_secs),
            ("recent_ttl_secs", t.recent_ttl_secs),
        ] {
            if secs > MAX_WINDOW_SECS {
                return Err(GhostError::Config(format!(
                    "{name} {secs} exceeds {MAX_WINDOW_SECS}"
                )));
            }
        }
        if self.display.page_size == 0 {
            return Err(GhostError::Config("page_size must be non-zero".into()));
        }
        Ok(())
    }

    pub fn unique_window_ms(&self) -> u64 {
        self.tracker.unique_window_secs.saturating_mul(1000)
    }

    pub fn recent_ttl_ms(&self) -> u64 {
        self.tracker.recent_ttl_secs.saturating_mul(1000)
    }
}

/// Get the config directory path (`~/.ghostnet/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".ghostnet")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.ghostnet/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

/// Load config from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }

    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("cannot read {}: {e}; using defaults", path.display());
            return Config::default();
        }
    };

    parse_config(&text)
}

/// Save config to `~/.ghostnet/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| GhostError::Config(e.to_string()))?;
    }
    std::fs::write(path, serialize_config(config))?;
    Ok(())
}

/// Parse simple YAML-like config text. Unknown keys and bad values keep defaults.
fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = strip_comment(val);

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }

        let Some(section) = current_section.as_deref() else {
            continue;
        };
        match (section, key) {
            ("tracker", "mac_capacity") => set(&mut config.tracker.mac_capacity, val),
            ("tracker", "recent_capacity") => set(&mut config.tracker.recent_capacity, val),
            ("tracker", "unique_capacity") => set(&mut config.tracker.unique_capacity, val),
            ("tracker", "unique_window_secs") => {
                set(&mut config.tracker.unique_window_secs, val)
            }
            ("tracker", "recent_ttl_secs") => set(&mut config.tracker.recent_ttl_secs, val),
            ("channel", "count") => set(&mut config.channel.count, val),
            ("channel", "hop_interval_ms") => set(&mut config.channel.hop_interval_ms, val),
            ("display", "page_size") => set(&mut config.display.page_size, val),
            ("display", "scroll_interval_ms") => {
                set(&mut config.display.scroll_interval_ms, val)
            }
            _ => log::debug!("ignoring unknown config key {section}.{key}"),
        }
    }

    config
}

fn strip_comment(val: &str) -> &str {
    val.split_once(" #").map_or(val, |(v, _)| v).trim()
}

fn set<T: std::str::FromStr>(slot: &mut T, val: &str) {
    match val.parse() {
        Ok(v) => *slot = v,
        Err(_) => log::warn!("invalid config value {val:?}; keeping default"),
    }
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# ghostnet configuration".to_string(), String::new()];

    lines.push("tracker:".into());
    lines.push(format!("  mac_capacity: {}", config.tracker.mac_capacity));
    lines.push(format!("  recent_capacity: {}", config.tracker.recent_capacity));
    lines.push(format!("  unique_capacity: {}", config.tracker.unique_capacity));
    lines.push(format!(
        "  unique_window_secs: {}",
        config.tracker.unique_window_secs
    ));
    lines.push(format!("  recent_ttl_secs: {}", config.tracker.recent_ttl_secs));
    lines.push(String::new());

    lines.push("channel:".into());
    lines.push(format!("  count: {}", config.channel.count));
    lines.push(format!("  hop_interval_ms: {}", config.channel.hop_interval_ms));
    lines.push(String::new());

    lines.push("display:".into());
    lines.push(format!("  page_size: {}", config.display.page_size));
    lines.push(format!(
        "  scroll_interval_ms: {}",
        config.display.scroll_interval_ms
    ));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.tracker.mac_capacity, 100);
        assert_eq!(config.tracker.unique_capacity, 50);
        assert_eq!(config.unique_window_ms(), 120_000);
        assert_eq!(config.recent_ttl_ms(), 30_000);
        assert_eq!(config.channel.count, 13);
        assert_eq!(config.channel.hop_interval_ms, 200);
        assert_eq!(config.display.page_size, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
tracker:
  mac_capacity: 200
  unique_window_secs: 60  # one minute

channel:
  count: 11
  hop_interval_ms: 250

display:
  page_size: 12
"#;
        let config = parse_config(text);
        assert_eq!(config.tracker.mac_capacity, 200);
        assert_eq!(config.tracker.unique_window_secs, 60);
        assert_eq!(config.tracker.recent_capacity, 50);
        assert_eq!(config.channel.count, 11);
        assert_eq!(config.channel.hop_interval_ms, 250);
        assert_eq!(config.display.page_size, 12);
        assert_eq!(config.display.scroll_interval_ms, 2000);
    }

    #[test]
    fn test_parse_config_bad_values_keep_defaults() {
        let text = "tracker:\n  mac_capacity: lots\n  bogus: 1\nchannel:\n  count: 300\n";
        let config = parse_config(text);
        assert_eq!(config.tracker.mac_capacity, 100);
        assert_eq!(config.channel.count, 13, "300 does not fit in u8");
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config::default();
        config.tracker.unique_capacity = 0;
        assert!(matches!(config.validate(), Err(GhostError::Config(_))));

        let mut config = Config::default();
        config.channel.count = 15;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_huge_windows() {
        let mut config = Config::default();
        config.tracker.unique_window_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(GhostError::Config(_))));
        assert_eq!(config.unique_window_ms(), u64::MAX);

        let mut config = Config::default();
        config.tracker.recent_ttl_secs = MAX_WINDOW_SECS + 1;
        assert!(config.validate().is_err());
        config.tracker.recent_ttl_secs = MAX_WINDOW_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.tracker.mac_capacity = 64;
        config.channel.count = 11;
        config.display.scroll_interval_ms = 3000;

        let parsed = parse_config(&serialize_config(&config));
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.tracker.recent_ttl_secs = 45;
        save_config_to(&config, &path).unwrap();

        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.yaml"));
        assert_eq!(config, Config::default());
    }
}
