use anyhow::Result;

use crate::detect::result::DetectedObject;
use crate::frame::Snapshot;

/// Detection backend trait.
///
/// The vision service is an external collaborator. A backend takes one
/// encoded snapshot and returns the validated batch of objects found in it.
/// Calls are blocking; the capture session never issues two at once.
pub trait DetectionBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a snapshot.
    fn detect(&mut self, snapshot: &Snapshot) -> Result<Vec<DetectedObject>>;
}
