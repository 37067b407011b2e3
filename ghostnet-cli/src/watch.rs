//! Live view: paced capture replay with periodic ticks and rendering.
//!
//! Three tasks share one [`SharedEngine`]: the capture task feeds frames at
//! their recorded pace, the tick task hops channels and closes packet
//! buckets, and the render task redraws the current page once per second.

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::time::{interval, sleep_until, Instant as TokioInstant, MissedTickBehavior};

use ghostnet_core::config::Config;
use ghostnet_core::scroll::Scroller;
use ghostnet_core::shared::SharedEngine;
use ghostnet_core::types::{DisplayMode, Timestamp};
use ghostnet_feeder::capture::CapturedFrame;

use crate::render;

const RENDER_INTERVAL: Duration = Duration::from_secs(1);

pub struct WatchOptions {
    pub mode: DisplayMode,
    pub speed: f64,
    /// Advance to the next page every this many seconds.
    pub cycle: Option<u64>,
}

/// Milliseconds since `start`, the engine's time base.
fn elapsed_ms(start: Instant) -> Timestamp {
    start.elapsed().as_millis() as Timestamp
}

/// Run until Ctrl-C.
pub async fn run(frames: Vec<CapturedFrame>, config: Config, opts: WatchOptions) {
    let engine = SharedEngine::new(&config);
    let start = Instant::now();
    let (stop_tx, stop_rx) = watch::channel(false);

    let capture = tokio::spawn(capture_task(engine.clone(), frames, start, opts.speed));
    let ticker = tokio::spawn(tick_task(
        engine.clone(),
        start,
        config.channel.hop_interval_ms,
        stop_rx.clone(),
    ));
    let renderer = tokio::spawn(render_task(
        engine.clone(),
        start,
        config,
        opts.mode,
        opts.cycle,
        stop_rx,
    ));

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error waiting for Ctrl-C: {e}");
    }
    let _ = stop_tx.send(true);
    capture.abort();
    let _ = ticker.await;
    let _ = renderer.await;

    let stats = engine.stats();
    println!();
    println!(
        "Frames: {} seen, {} tracked, {} with SSID",
        stats.frames_seen, stats.frames_tracked, stats.ssid_frames
    );
    println!(
        "Dropped MACs: {}  Evicted SSIDs: {}",
        stats.macs_dropped, stats.unique_evictions
    );
}

/// Feed frames at their recorded spacing divided by `speed`, stamped with
/// the engine clock.
async fn capture_task(
    engine: SharedEngine,
    frames: Vec<CapturedFrame>,
    start: Instant,
    speed: f64,
) {
    let origin = frames.first().map_or(0, |f| f.timestamp);
    let t0 = TokioInstant::from_std(start);

    for frame in &frames {
        let Some(deadline) = playback_deadline(t0, origin, frame.timestamp, speed) else {
            warn!("capture time {} out of range; stopping playback", frame.timestamp);
            break;
        };
        sleep_until(deadline).await;

        let obs = ghostnet_core::classify(&frame.payload, frame.rssi_dbm, elapsed_ms(start));
        engine.observe_frame(&obs);
    }
    info!("capture finished");
}

/// When a frame recorded at `ts` is due, or `None` past the clock's range.
fn playback_deadline(
    t0: TokioInstant,
    origin: Timestamp,
    ts: Timestamp,
    speed: f64,
) -> Option<TokioInstant> {
    let offset = ts.saturating_sub(origin) as f64 / speed;
    t0.checked_add(Duration::from_millis(offset as u64))
}

async fn tick_task(
    engine: SharedEngine,
    start: Instant,
    period_ms: u64,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticks = interval(Duration::from_millis(period_ms.max(1)));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                let out = engine.on_tick(elapsed_ms(start));
                if let Some(ch) = out.hopped_to {
                    debug!("tuned to channel {ch}");
                }
            }
            _ = stop.changed() => break,
        }
    }
}

async fn render_task(
    engine: SharedEngine,
    start: Instant,
    config: Config,
    mut mode: DisplayMode,
    cycle: Option<u64>,
    mut stop: watch::Receiver<bool>,
) {
    let mut scroller = Scroller::new(config.display.page_size, config.display.scroll_interval_ms);
    let mut frames = interval(RENDER_INTERVAL);
    let mut page_since = 0;

    loop {
        tokio::select! {
            _ = frames.tick() => {}
            _ = stop.changed() => break,
        }
        let now = elapsed_ms(start);

        if let Some(secs) = cycle {
            if now.saturating_sub(page_since) >= secs.saturating_mul(1000) {
                let next = mode.next();
                if mode == DisplayMode::Packets || next == DisplayMode::Packets {
                    engine.reset_packet_rate(now);
                }
                debug!("page {mode} -> {next}");
                mode = next;
                page_since = now;
                scroller.reset(now);
            }
        }

        let active = engine.snapshot(mode, 0, now).active_count;
        let offset = scroller.update(active, now);
        let snap = engine.snapshot(mode, offset, now);
        println!("\n{}", render::render_text(&snap));
    }
}
