use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::io::Read;
use std::time::Duration;

use crate::detect::backend::DetectionBackend;
use crate::detect::result::{decode_detections, DetectedObject};
use crate::frame::Snapshot;

/// Default detection endpoint of the local vision server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:5001/api/detectObjects";

const MAX_RESPONSE_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Serialize)]
struct DetectRequest<'a> {
    image: &'a str,
}

/// Posts snapshots to a remote vision endpoint as `{"image": <data url>}`.
pub struct HttpBackend {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }
}

impl DetectionBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    fn detect(&mut self, snapshot: &Snapshot) -> Result<Vec<DetectedObject>> {
        let body = serde_json::to_string(&DetectRequest {
            image: snapshot.data_url(),
        })
        .context("encode detection request")?;

        let response = match self
            .agent
            .post(&self.endpoint)
            .set("Content-Type", "application/json")
            .send_string(&body)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(anyhow!(
                    "detection endpoint {} returned status {}",
                    self.endpoint,
                    code
                ))
            }
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("post snapshot to {}", self.endpoint)))
            }
        };

        let bytes = read_bounded(response.into_reader(), MAX_RESPONSE_BYTES)?;
        decode_detections(&bytes)
    }
}

/// Read a whole response body, failing rather than truncating when it is
/// longer than `limit`.
fn read_bounded(reader: impl Read, limit: u64) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut bytes)
        .context("read detection response")?;
    if bytes.len() as u64 > limit {
        return Err(anyhow!(
            "detection response exceeds {} MiB",
            limit / (1024 * 1024)
        ));
    }
    Ok(bytes)
}
