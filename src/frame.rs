//! Video frames and their encoded snapshots.
//!
//! - `Frame`: one RGB8 frame as delivered by a camera source, at the source's
//!   native resolution.
//! - `Snapshot`: a frame encoded as PNG, plus the `data:` URL that is posted to
//!   the detection endpoint.

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};

/// Prefix of every snapshot data URL.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

const BYTES_PER_PIXEL: usize = 3;

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// One RGB8 video frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    /// Wraps packed RGB8 pixels. The buffer length must match the dimensions.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| anyhow!("frame dimensions {}x{} overflow", width, height))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "frame buffer is {} bytes, expected {} for {}x{} rgb",
                pixels.len(),
                expected,
                width,
                height
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// A frame with no pixels, e.g. a device that has not started streaming yet.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Encode this frame into a PNG snapshot at its native resolution.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Snapshot::encode(self)
    }
}

// ----------------------------------------------------------------------------
// Snapshot
// ----------------------------------------------------------------------------

/// A captured still: PNG bytes and the data URL built from them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    png: Vec<u8>,
    data_url: String,
    width: u32,
    height: u32,
}

impl Snapshot {
    /// Encode a frame as PNG. The snapshot always carries the frame's own
    /// width and height; there is no scaling step.
    pub fn encode(frame: &Frame) -> Result<Self> {
        if frame.is_empty() {
            return Err(anyhow!(
                "cannot snapshot an empty {}x{} frame",
                frame.width,
                frame.height
            ));
        }
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(
                frame.pixels(),
                frame.width,
                frame.height,
                ExtendedColorType::Rgb8,
            )
            .context("encode png snapshot")?;
        let data_url = format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(&png));
        Ok(Self {
            png,
            data_url,
            width: frame.width,
            height: frame.height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// `data:image/png;base64,...`
    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}
