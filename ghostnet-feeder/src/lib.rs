//! ghostnet-feeder: reads 802.11 capture files and hands classified frames
//! to the tracking engine.

pub mod capture;

pub use capture::{read_frames, CapturedFrame, FrameReader};
