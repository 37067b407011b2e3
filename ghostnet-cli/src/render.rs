//! Text and JSON rendering of engine snapshots.

use comfy_table::{Cell, Table};
use serde::Serialize;

use ghostnet_core::channel::channel_to_mhz;
use ghostnet_core::engine::{EngineStats, Snapshot};
use ghostnet_core::types::{AgeBucket, DisplayMode};

/// Everything `replay --json` prints.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub snapshot: &'a Snapshot,
    pub stats: EngineStats,
}

pub fn render_json(snapshot: &Snapshot, stats: EngineStats) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Report { snapshot, stats })
}

fn age_label(age: AgeBucket) -> &'static str {
    match age {
        AgeBucket::Fresh => "fresh",
        AgeBucket::Recent => "recent",
        AgeBucket::Fading => "fading",
    }
}

fn bar_glyphs(bars: u8) -> String {
    (0..4).map(|i| if i < bars { '#' } else { '.' }).collect()
}

fn dash<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

/// Header line: page title, counts, channel.
pub fn render_header(snap: &Snapshot) -> String {
    let mhz = channel_to_mhz(snap.current_channel)
        .map(|f| format!(" ({f} MHz)"))
        .unwrap_or_default();
    format!(
        "{} [{}/{}]  ch {}{}  t={:.1}s",
        snap.mode.title(),
        snap.active_count,
        snap.total_count,
        snap.current_channel,
        mhz,
        snap.timestamp as f64 / 1000.0
    )
}

/// Full page as printable text.
pub fn render_text(snap: &Snapshot) -> String {
    let body = match snap.mode {
        DisplayMode::Normal | DisplayMode::Unique | DisplayMode::Mac => render_list(snap),
        DisplayMode::Packets => render_packets(snap),
        DisplayMode::Signal => render_signal(snap),
    };
    format!("{}\n{body}", render_header(snap))
}

fn render_list(snap: &Snapshot) -> String {
    if snap.entries.is_empty() {
        return match snap.mode {
            DisplayMode::Mac => "No devices seen".into(),
            _ => "No networks seen".into(),
        };
    }

    let name = match snap.mode {
        DisplayMode::Mac => "Address",
        _ => "SSID",
    };
    let mut table = Table::new();
    table.set_header(vec!["#", name, "Age"]);
    for (i, entry) in snap.entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(snap.scroll_offset + i + 1),
            Cell::new(&entry.text),
            Cell::new(age_label(entry.age)),
        ]);
    }

    let mut out = table.to_string();
    if snap.mode == DisplayMode::Mac {
        out.push_str(&format!(
            "\n1m: {}  2m: {}",
            snap.mac_activity.last_1m, snap.mac_activity.last_2m
        ));
    }
    out
}

fn render_packets(snap: &Snapshot) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Total (2m)", "Per second", "Last second", "Seconds"]);
    table.add_row(vec![
        Cell::new(snap.packet_total),
        Cell::new(dash(snap.packets_per_second.map(|r| format!("{r:.1}")))),
        Cell::new(dash(snap.packets_last_second)),
        Cell::new(snap.active_count),
    ]);
    table.to_string()
}

fn render_signal(snap: &Snapshot) -> String {
    let Some(rssi) = snap.rssi else {
        return "No signal".into();
    };
    let mut table = Table::new();
    table.set_header(vec!["Avg (dBm)", "Min", "Max", "Samples", "Bars"]);
    table.add_row(vec![
        Cell::new(format!("{:.1}", rssi.average)),
        Cell::new(rssi.min),
        Cell::new(rssi.max),
        Cell::new(rssi.sample_count),
        Cell::new(bar_glyphs(rssi.bars())),
    ]);
    table.to_string()
}
