//! Network camera snapshot source.
//!
//! Polls a single HTTP(S) snapshot URL that answers each GET with one JPEG
//! or PNG image, decoding it in-memory to RGB8.

use anyhow::{anyhow, Context, Result};
use image::GenericImageView;
use std::io::Read;
use std::time::Duration;

use super::{CameraConfig, CameraSource};
use crate::frame::Frame;

const MAX_SNAPSHOT_BYTES: u64 = 10 * 1024 * 1024;
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpSnapshotSource {
    config: CameraConfig,
    agent: Option<ureq::Agent>,
}

impl HttpSnapshotSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        let url = url::Url::parse(&config.device).context("parse camera snapshot url")?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "unsupported snapshot scheme '{}'; expected http(s)",
                url.scheme()
            ));
        }
        Ok(Self {
            config,
            agent: None,
        })
    }

    /// Open the agent and fetch one snapshot to prove the camera answers.
    pub fn connect(&mut self) -> Result<()> {
        let agent = ureq::AgentBuilder::new()
            .timeout(SNAPSHOT_TIMEOUT)
            .build();
        let bytes = fetch_snapshot(&agent, &self.config.device)?;
        let (_, width, height) = decode_image(&bytes)?;
        log::info!(
            "HttpSnapshotSource: connected to {} ({}x{})",
            self.config.device,
            width,
            height
        );
        self.agent = Some(agent);
        Ok(())
    }
}

impl CameraSource for HttpSnapshotSource {
    fn describe(&self) -> String {
        format!("{} (http snapshot)", self.config.device)
    }

    fn next_frame(&mut self) -> Result<Frame> {
        let agent = self
            .agent
            .as_ref()
            .ok_or_else(|| anyhow!("snapshot source not connected; call connect() first"))?;
        let bytes = fetch_snapshot(agent, &self.config.device)?;
        let (pixels, width, height) = decode_image(&bytes)?;
        Frame::new(pixels, width, height)
    }

    fn release(&mut self) {
        self.agent = None;
    }
}

fn fetch_snapshot(agent: &ureq::Agent, url: &str) -> Result<Vec<u8>> {
    let response = agent
        .get(url)
        .call()
        .with_context(|| format!("fetch camera snapshot from {}", url))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_SNAPSHOT_BYTES)
        .read_to_end(&mut bytes)
        .context("read camera snapshot")?;
    if bytes.is_empty() {
        return Err(anyhow!("empty camera snapshot"));
    }
    Ok(bytes)
}

fn decode_image(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32)> {
    let image = image::load_from_memory(bytes).context("decode camera snapshot")?;
    let (width, height) = image.dimensions();
    Ok((image.into_rgb8().into_raw(), width, height))
}
