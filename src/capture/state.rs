use std::time::Instant;

use super::timer::CaptureTimer;
use crate::detect::DetectedObject;
use crate::frame::Snapshot;

/// Everything that can change the capture state.
#[derive(Clone, Debug)]
pub enum CaptureEvent {
    /// The user started the loop; the timer becomes the loop handle.
    LoopStarted(CaptureTimer),
    /// The loop handle was cleared.
    LoopStopped,
    /// A frame was grabbed and encoded.
    SnapshotCaptured(Snapshot),
    /// The detection call succeeded. Replaces the displayed list.
    DetectionsReceived(Vec<DetectedObject>),
    /// The detection call failed. The displayed list is kept.
    DetectionFailed,
}

/// State of one mounted capture session.
///
/// Created empty on mount and dropped on unmount. The last capture always
/// replaces the previous one.
#[derive(Clone, Debug, Default)]
pub struct CaptureState {
    captured_image: Option<Snapshot>,
    detected_objects: Vec<DetectedObject>,
    timer: Option<CaptureTimer>,
    cycles_completed: u64,
    failed_requests: u64,
    skipped_ticks: u64,
}

impl CaptureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: CaptureEvent) {
        match event {
            CaptureEvent::LoopStarted(timer) => {
                if self.timer.is_none() {
                    self.timer = Some(timer);
                }
            }
            CaptureEvent::LoopStopped => {
                self.timer = None;
            }
            CaptureEvent::SnapshotCaptured(snapshot) => {
                self.captured_image = Some(snapshot);
            }
            CaptureEvent::DetectionsReceived(objects) => {
                self.detected_objects = objects;
                self.cycles_completed += 1;
            }
            CaptureEvent::DetectionFailed => {
                self.failed_requests += 1;
            }
        }
    }

    /// Poll the loop timer. Returns true when a cycle is due.
    pub(crate) fn poll_timer(&mut self, now: Instant) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        match timer.poll(now) {
            Some(missed) => {
                if missed > 0 {
                    log::debug!("capture cycle overran; coalesced {} ticks", missed);
                }
                self.skipped_ticks += missed;
                true
            }
            None => false,
        }
    }

    pub fn captured_image(&self) -> Option<&Snapshot> {
        self.captured_image.as_ref()
    }

    pub fn detected_objects(&self) -> &[DetectedObject] {
        &self.detected_objects
    }

    pub fn timer(&self) -> Option<&CaptureTimer> {
        self.timer.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn failed_requests(&self) -> u64 {
        self.failed_requests
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }
}
