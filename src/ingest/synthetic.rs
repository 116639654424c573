//! Synthetic camera for `stub://` devices.
//!
//! Produces a moving gradient so consecutive snapshots differ. Never fails.

use anyhow::Result;

use super::{CameraConfig, CameraSource};
use crate::frame::Frame;

pub struct SyntheticSource {
    config: CameraConfig,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    fn generate_pixels(&self) -> Vec<u8> {
        let width = self.config.width as usize;
        let height = self.config.height as usize;
        let shift = self.frame_count as usize;
        let mut pixels = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x + shift) % 256) as u8);
                pixels.push(((y + shift) % 256) as u8);
                pixels.push(((x + y) % 256) as u8);
            }
        }
        pixels
    }
}

impl CameraSource for SyntheticSource {
    fn describe(&self) -> String {
        format!(
            "{} (synthetic {}x{})",
            self.config.device, self.config.width, self.config.height
        )
    }

    fn next_frame(&mut self) -> Result<Frame> {
        self.frame_count += 1;
        Frame::new(
            self.generate_pixels(),
            self.config.width,
            self.config.height,
        )
    }

    fn release(&mut self) {
        log::debug!(
            "SyntheticSource: {} stopped after {} frames",
            self.config.device,
            self.frame_count
        );
    }
}
