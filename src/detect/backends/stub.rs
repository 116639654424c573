use anyhow::Result;

use crate::detect::backend::DetectionBackend;
use crate::detect::result::{BoundingPoly, DetectedObject, NormalizedVertex};
use crate::frame::Snapshot;

/// Offline backend. Returns the same batch for every snapshot.
pub struct StubBackend {
    objects: Vec<DetectedObject>,
    calls: u64,
}

impl StubBackend {
    pub fn new(objects: Vec<DetectedObject>) -> Self {
        Self { objects, calls: 0 }
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Default for StubBackend {
    /// One centered "cup" filling most of the frame.
    fn default() -> Self {
        Self::new(vec![DetectedObject {
            name: "cup".to_string(),
            score: 0.92,
            bounding_poly: BoundingPoly {
                normalized_vertices: vec![
                    NormalizedVertex { x: 0.1, y: 0.1 },
                    NormalizedVertex { x: 0.9, y: 0.1 },
                    NormalizedVertex { x: 0.9, y: 0.9 },
                    NormalizedVertex { x: 0.1, y: 0.9 },
                ],
            },
        }])
    }
}

impl DetectionBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _snapshot: &Snapshot) -> Result<Vec<DetectedObject>> {
        self.calls += 1;
        Ok(self.objects.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    #[test]
    fn stub_backend_repeats_batch() {
        let snapshot = Frame::new(vec![0; 12], 2, 2).unwrap().snapshot().unwrap();
        let mut backend = StubBackend::default();

        let first = backend.detect(&snapshot).unwrap();
        let second = backend.detect(&snapshot).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].name, "cup");
        assert_eq!(backend.calls(), 2);
    }
}
