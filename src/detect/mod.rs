//! Detection: the validated response schema and the backends that produce it.

mod backend;
mod backends;
mod result;

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

pub use backend::DetectionBackend;
pub use backends::{HttpBackend, StubBackend, DEFAULT_ENDPOINT};
pub use result::{decode_detections, BoundingPoly, Bounds, DetectedObject, NormalizedVertex};

/// Select a backend for an endpoint string.
///
/// `stub://...` selects the offline `StubBackend`; `http(s)://...` posts to
/// the remote service.
pub fn backend_for_endpoint(
    endpoint: &str,
    timeout: Duration,
) -> Result<Box<dyn DetectionBackend>> {
    if endpoint.starts_with("stub://") {
        return Ok(Box::new(StubBackend::default()));
    }
    let url = url::Url::parse(endpoint)
        .with_context(|| format!("parse detection endpoint {}", endpoint))?;
    match url.scheme() {
        "http" | "https" => Ok(Box::new(HttpBackend::new(endpoint, timeout))),
        other => Err(anyhow!(
            "unsupported detection endpoint scheme '{}'; expected http(s) or stub",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_backend_by_scheme() {
        let timeout = Duration::from_secs(1);
        assert_eq!(backend_for_endpoint("stub://vision", timeout).unwrap().name(), "stub");
        assert_eq!(
            backend_for_endpoint(DEFAULT_ENDPOINT, timeout).unwrap().name(),
            "http"
        );
        assert!(backend_for_endpoint("mqtt://broker/vision", timeout).is_err());
        assert!(backend_for_endpoint("not a url", timeout).is_err());
    }
}
