//! ghostnet: replay and watch 802.11 captures through the tracking engine.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use log::{debug, info};

use ghostnet_core::config::{self, Config};
use ghostnet_core::engine::{Engine, BUCKET_MS, PACKET_BUCKETS};
use ghostnet_core::types::{DisplayMode, Timestamp};
use ghostnet_feeder::capture::{CapturedFrame, FrameReader};

mod render;
mod watch;

#[derive(Parser)]
#[command(name = "ghostnet", version, about = "802.11 observation tracker")]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Config file (defaults to ~/.ghostnet/config.yaml)
    #[arg(long, global = true, env = "GHOSTNET_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a capture file and print the resulting page
    Replay {
        /// Capture file (`hex[;timestamp_ms[;rssi]]` per line, `-` for stdin)
        file: PathBuf,

        /// Page to print: normal, unique, mac, packets, signal
        #[arg(short, long, default_value = "normal")]
        mode: DisplayMode,

        /// Skip this many list entries
        #[arg(long, default_value = "0")]
        scroll: usize,

        /// Print the snapshot and counters as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a capture back in real time with a live display
    Watch {
        /// Capture file (`hex[;timestamp_ms[;rssi]]` per line)
        file: PathBuf,

        /// Starting page
        #[arg(short, long, default_value = "normal")]
        mode: DisplayMode,

        /// Playback speed multiplier
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Switch to the next page every N seconds
        #[arg(long)]
        cycle: Option<u64>,
    },

    /// Show the active configuration
    Config {
        /// Write the default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match cli.command {
        Commands::Replay {
            file,
            mode,
            scroll,
            json,
        } => cmd_replay(file, load(cli.config), mode, scroll, json),
        Commands::Watch {
            file,
            mode,
            speed,
            cycle,
        } => cmd_watch(file, load(cli.config), mode, speed, cycle),
        Commands::Config { init } => cmd_config(cli.config, init),
    }
}

fn load(path: Option<PathBuf>) -> Config {
    let config = match path {
        Some(p) => config::load_config_from(&p),
        None => config::load_config(),
    };
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    config
}

fn read_capture(file: &Path) -> Vec<CapturedFrame> {
    FrameReader::new(file).read_all().unwrap_or_else(|e| {
        eprintln!("Error opening {}: {e}", file.display());
        std::process::exit(1);
    })
}

/// Ticks kept before a frame after a long idle gap: enough to roll the whole
/// packet window over.
const REPLAY_WINDOW_MS: u64 = (PACKET_BUCKETS as u64 + 1) * BUCKET_MS;

/// Feed `frames` through `engine`, ticking every `tick_ms` of capture time.
/// Returns the capture time of the last frame.
fn replay(engine: &mut Engine, frames: &[CapturedFrame], tick_ms: u64) -> Timestamp {
    let tick_ms = tick_ms.max(1);
    let mut next_tick = Some(tick_ms);
    let mut now = 0;

    for frame in frames {
        next_tick = tick_through(engine, next_tick, frame.timestamp, tick_ms);
        engine.observe_frame(&frame.classify());
        now = now.max(frame.timestamp);
    }
    engine.on_tick(now);
    now
}

/// Run every tick due at or before `until`. Returns the next due tick, or
/// `None` once the clock cannot advance any further.
///
/// Each tick hops one channel, so idle stretches are skipped in whole
/// channel cycles; the ticks closest to `until` still run.
fn tick_through(
    engine: &mut Engine,
    next_tick: Option<Timestamp>,
    until: Timestamp,
    tick_ms: u64,
) -> Option<Timestamp> {
    let mut next = next_tick?;
    if next > until {
        return Some(next);
    }

    let due = (until - next) / tick_ms + 1;
    let keep = REPLAY_WINDOW_MS / tick_ms + 1;
    let cycle = u64::from(engine.channel_count());
    let skippable = due.saturating_sub(keep);
    let skip = skippable - skippable % cycle;
    if skip > 0 {
        debug!("skipping {skip} idle ticks");
        next += skip * tick_ms;
    }

    while next <= until {
        engine.on_tick(next);
        next = next.checked_add(tick_ms)?;
    }
    Some(next)
}

fn cmd_replay(file: PathBuf, config: Config, mode: DisplayMode, scroll: usize, json: bool) {
    let frames = read_capture(&file);
    let mut engine = Engine::new(&config);
    let now = replay(&mut engine, &frames, config.channel.hop_interval_ms);

    let stats = engine.stats();
    info!(
        "{}: {} frames, {} tracked, {} with SSID",
        file.display(),
        stats.frames_seen,
        stats.frames_tracked,
        stats.ssid_frames
    );

    let snap = engine.snapshot(mode, scroll, now);
    if json {
        match render::render_json(&snap, stats) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("{}", render::render_text(&snap));
    }
}

fn cmd_watch(file: PathBuf, config: Config, mode: DisplayMode, speed: f64, cycle: Option<u64>) {
    if !(speed.is_finite() && speed > 0.0) {
        eprintln!("Error: speed must be positive");
        std::process::exit(1);
    }
    let frames = read_capture(&file);
    info!("watching {} ({} frames, {speed}x)", file.display(), frames.len());

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Error starting runtime: {e}");
        std::process::exit(1);
    });
    runtime.block_on(watch::run(
        frames,
        config,
        watch::WatchOptions { mode, speed, cycle },
    ));
}

fn cmd_config(path: Option<PathBuf>, init: bool) {
    let path = path.unwrap_or_else(config::config_file);

    if init {
        if path.exists() {
            println!("Config already exists: {}", path.display());
        } else if let Err(e) = config::save_config_to(&Config::default(), &path) {
            eprintln!("Error writing {}: {e}", path.display());
            std::process::exit(1);
        } else {
            println!("Wrote {}", path.display());
        }
        return;
    }

    let config = config::load_config_from(&path);
    println!("# {}", path.display());
    print!("{}", config::serialize_config(&config));
    if let Err(e) = config.validate() {
        eprintln!("Warning: {e}");
    }
}
