//! ghostnet-feeder: inspect 802.11 capture files.
//!
//! Parses `hex[;timestamp_ms[;rssi]]` capture lines and prints each frame's
//! classification, or a per-kind summary.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::info;

use ghostnet_feeder::capture::FrameReader;

#[derive(Parser)]
#[command(
    name = "ghostnet-feeder",
    version,
    about = "802.11 capture ingestion and frame classification"
)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every frame in a capture file
    Parse {
        /// Path to capture file (one hex frame per line, `-` for stdin)
        file: PathBuf,

        /// Print only per-kind counts
        #[arg(short, long)]
        summary: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match cli.command {
        Commands::Parse { file, summary } => cmd_parse(file, summary),
    }
}

fn cmd_parse(file: PathBuf, summary: bool) {
    let reader = FrameReader::new(&file);
    let frames = match reader.read_all() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error reading {}: {e}", reader.path().display());
            std::process::exit(1);
        }
    };

    info!("{} frames from {}", frames.len(), reader.path().display());

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for frame in &frames {
        let obs = frame.classify();
        let kind = obs.kind.to_string();
        *counts.entry(kind.clone()).or_default() += 1;

        if !summary {
            let ssid = obs.ssid.map(|s| s.to_text()).unwrap_or_else(|| "-".into());
            println!(
                "{:>10} {:<14} {} -> {} {:>4} dBm  {}",
                obs.timestamp, kind, obs.source, obs.destination, obs.rssi_dbm, ssid
            );
        }
    }

    if summary {
        for (kind, n) in &counts {
            println!("{kind:<14} {n}");
        }
    }
}
