//! Camera acquisition.
//!
//! This module provides the sources a capture session can stream from:
//! - Synthetic frames for `stub://` devices (tests, demos)
//! - Network camera snapshot URLs (`http://`, `https://`)
//! - USB/V4L2 devices (feature: ingest-v4l2)
//!
//! Acquisition returns a `CameraStream`, a scoped handle that releases the
//! device when it is dropped. Sessions never hold a bare `CameraSource`.

pub mod http;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::{anyhow, Result};

use crate::frame::Frame;

pub use http::HttpSnapshotSource;
pub use synthetic::SyntheticSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

/// Requested camera parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraConfig {
    /// Device path (`/dev/video0`), snapshot URL, or `stub://<name>`.
    pub device: String,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
    /// Preferred device frame rate.
    pub target_fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://front_camera".to_string(),
            width: 640,
            height: 480,
            target_fps: 10,
        }
    }
}

/// A video-only frame source.
pub trait CameraSource {
    /// Human readable device label, used in logs and the rendered view.
    fn describe(&self) -> String;

    /// Grab the current frame at the source's native resolution.
    fn next_frame(&mut self) -> Result<Frame>;

    /// Release the underlying device. Called exactly once, from `CameraStream`.
    fn release(&mut self) {}
}

/// Scoped camera handle. The source is released when the stream is dropped,
/// on every exit path.
pub struct CameraStream {
    source: Box<dyn CameraSource>,
    label: String,
    frames_captured: u64,
}

impl CameraStream {
    pub fn new(source: Box<dyn CameraSource>) -> Self {
        let label = source.describe();
        Self {
            source,
            label,
            frames_captured: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }

    pub fn next_frame(&mut self) -> Result<Frame> {
        let frame = self.source.next_frame()?;
        self.frames_captured += 1;
        Ok(frame)
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.source.release();
        log::info!(
            "camera {} released after {} frames",
            self.label,
            self.frames_captured
        );
    }
}

impl std::fmt::Debug for CameraStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraStream")
            .field("label", &self.label)
            .field("frames_captured", &self.frames_captured)
            .finish()
    }
}

/// Request a video stream for the configured device.
pub fn acquire_camera(config: &CameraConfig) -> Result<CameraStream> {
    let device = config.device.trim();
    if device.is_empty() {
        return Err(anyhow!("no camera device configured"));
    }

    let source: Box<dyn CameraSource> = if device.starts_with("stub://") {
        Box::new(SyntheticSource::new(config.clone()))
    } else if device.starts_with("http://") || device.starts_with("https://") {
        let mut source = HttpSnapshotSource::new(config.clone())?;
        source.connect()?;
        Box::new(source)
    } else {
        open_local_device(config)?
    };

    let stream = CameraStream::new(source);
    log::info!("camera {} acquired", stream.label());
    Ok(stream)
}

#[cfg(feature = "ingest-v4l2")]
fn open_local_device(config: &CameraConfig) -> Result<Box<dyn CameraSource>> {
    let mut source = V4l2Source::new(config.clone());
    source.connect()?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "ingest-v4l2"))]
fn open_local_device(config: &CameraConfig) -> Result<Box<dyn CameraSource>> {
    Err(anyhow!(
        "camera {} requires the ingest-v4l2 feature",
        config.device
    ))
}
