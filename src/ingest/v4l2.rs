//! V4L2 camera source.
//!
//! Streams RGB frames from a local device node (e.g. /dev/video0) through
//! memory-mapped buffers. The device and its stream live together in a
//! self-referencing state so the mmap stream can borrow the device.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::{CameraConfig, CameraSource};
use crate::frame::Frame;

const MMAP_BUFFERS: u32 = 4;

pub struct V4l2Source {
    config: CameraConfig,
    state: Option<DeviceState>,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Source {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            active_width: config.width,
            active_height: config.height,
            config,
            state: None,
        }
    }

    /// Open the device, negotiate RGB3 at the preferred size, and start streaming.
    pub fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = device
            .set_format(&format)
            .with_context(|| format!("set rgb format on {}", self.config.device))?;
        if format.fourcc != v4l::FourCC::new(b"RGB3") {
            return Err(anyhow!(
                "v4l2 device {} does not stream RGB3 (got {})",
                self.config.device,
                format.fourcc
            ));
        }

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Source: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = DeviceStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, MMAP_BUFFERS)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "V4l2Source: streaming from {} ({}x{})",
            self.config.device,
            self.active_width,
            self.active_height
        );
        Ok(())
    }
}

impl CameraSource for V4l2Source {
    fn describe(&self) -> String {
        format!(
            "{} (v4l2 {}x{})",
            self.config.device, self.active_width, self.active_height
        )
    }

    fn next_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not connected")?;
        // mmap buffers can be padded past the image size
        let expected = self.active_width as usize * self.active_height as usize * 3;
        let pixels = state
            .with_mut(|fields| {
                fields
                    .stream
                    .next()
                    .map(|(buf, _meta)| buf[..expected.min(buf.len())].to_vec())
            })
            .context("capture v4l2 frame")?;
        Frame::new(pixels, self.active_width, self.active_height)
    }

    fn release(&mut self) {
        // Dropping the state stops the stream and closes the device node.
        if self.state.take().is_some() {
            log::debug!("V4l2Source: closed {}", self.config.device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_fails_to_connect() {
        let mut source = V4l2Source::new(CameraConfig {
            device: "/dev/video-does-not-exist".to_string(),
            ..CameraConfig::default()
        });
        assert!(source.connect().is_err());
    }

    #[test]
    fn next_frame_requires_connect() {
        let mut source = V4l2Source::new(CameraConfig::default());
        assert!(source.next_frame().is_err());
    }
}
