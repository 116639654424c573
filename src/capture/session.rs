use std::time::{Duration, Instant};

use super::state::{CaptureEvent, CaptureState};
use super::timer::CaptureTimer;
use crate::detect::{DetectedObject, DetectionBackend};
use crate::ingest::{acquire_camera, CameraConfig, CameraStream};

/// Default time between capture cycles.
pub const DEFAULT_CAPTURE_INTERVAL: Duration = Duration::from_secs(2);

type ResultCallback = Box<dyn FnMut(&[DetectedObject])>;

/// What a call to `tick` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Loop not running or no tick due.
    Idle,
    /// A tick was due but there is no video to capture.
    NoVideo,
    /// Grabbing or encoding the frame failed.
    CaptureFailed,
    /// The detection call failed; previous results are kept.
    RequestFailed,
    /// The detection call succeeded with this many objects.
    Detected(usize),
}

/// A mounted capture component.
///
/// Single-threaded: the host calls `tick` from its event loop and each due
/// tick runs one full cycle (grab, encode, detect, store, notify) before
/// returning. Detection calls therefore never overlap.
pub struct CaptureSession {
    camera: Option<CameraStream>,
    backend: Box<dyn DetectionBackend>,
    interval: Duration,
    state: CaptureState,
    on_result: Option<ResultCallback>,
    converged: bool,
}

impl CaptureSession {
    pub fn new(
        camera: Option<CameraStream>,
        backend: Box<dyn DetectionBackend>,
        interval: Duration,
    ) -> Self {
        Self {
            camera,
            backend,
            interval,
            state: CaptureState::new(),
            on_result: None,
            converged: false,
        }
    }

    /// Acquire the configured camera and mount a session around it.
    ///
    /// Acquisition failure is logged; the session is still returned and
    /// simply has no video.
    pub fn mount(
        camera: &CameraConfig,
        backend: Box<dyn DetectionBackend>,
        interval: Duration,
    ) -> Self {
        let camera = match acquire_camera(camera) {
            Ok(stream) => Some(stream),
            Err(err) => {
                log::error!("error accessing camera {}: {:#}", camera.device, err);
                None
            }
        };
        Self::new(camera, backend, interval)
    }

    /// Register the parent callback that receives each detection batch.
    pub fn on_result(mut self, callback: impl FnMut(&[DetectedObject]) + 'static) -> Self {
        self.on_result = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn has_video(&self) -> bool {
        self.camera.is_some()
    }

    pub fn camera_label(&self) -> Option<&str> {
        self.camera.as_ref().map(|camera| camera.label())
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Start the capture loop. Returns false when a loop is already running,
    /// or when the last observed match list was non-empty.
    pub fn start_capture_loop(&mut self, now: Instant) -> bool {
        if self.state.is_running() {
            return false;
        }
        if self.converged {
            log::info!("capture loop not started: target already matched");
            return false;
        }
        self.state
            .apply(CaptureEvent::LoopStarted(CaptureTimer::start(self.interval, now)));
        log::info!(
            "capture loop started (every {} ms, backend {})",
            self.interval.as_millis(),
            self.backend.name()
        );
        true
    }

    /// React to the parent's match list. A non-empty list stops the loop.
    /// Returns true when this call cancelled a running loop.
    pub fn observe_matches<T>(&mut self, matched: &[T]) -> bool {
        self.converged = !matched.is_empty();
        if self.converged && self.state.is_running() {
            self.state.apply(CaptureEvent::LoopStopped);
            log::info!("capture loop stopped: object is close enough and centered");
            return true;
        }
        false
    }

    /// Advance the loop to `now`, running a capture cycle if one is due.
    pub fn tick(&mut self, now: Instant) -> CycleOutcome {
        if !self.state.poll_timer(now) {
            return CycleOutcome::Idle;
        }
        self.run_cycle()
    }

    fn run_cycle(&mut self) -> CycleOutcome {
        let Some(camera) = self.camera.as_mut() else {
            log::debug!("capture tick skipped: no video");
            return CycleOutcome::NoVideo;
        };

        let frame = match camera.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("frame capture from {} failed: {:#}", camera.label(), err);
                return CycleOutcome::CaptureFailed;
            }
        };
        if frame.is_empty() {
            log::debug!("capture tick skipped: video has no frame yet");
            return CycleOutcome::NoVideo;
        }
        let snapshot = match frame.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("snapshot encoding failed: {:#}", err);
                return CycleOutcome::CaptureFailed;
            }
        };

        let result = self.backend.detect(&snapshot);
        self.state.apply(CaptureEvent::SnapshotCaptured(snapshot));

        match result {
            Ok(objects) => {
                let count = objects.len();
                if let Some(callback) = self.on_result.as_mut() {
                    callback(&objects);
                }
                self.state.apply(CaptureEvent::DetectionsReceived(objects));
                log::debug!("detection returned {} objects", count);
                CycleOutcome::Detected(count)
            }
            Err(err) => {
                log::error!(
                    "error sending snapshot to {} backend: {:#}",
                    self.backend.name(),
                    err
                );
                self.state.apply(CaptureEvent::DetectionFailed);
                CycleOutcome::RequestFailed
            }
        }
    }

    /// Render the current view.
    pub fn render(&self) -> String {
        crate::render::render_view(self.camera_label(), &self.state)
    }

    /// Tear the component down. The camera is released here; state is dropped.
    pub fn unmount(mut self) {
        if self.state.is_running() {
            self.state.apply(CaptureEvent::LoopStopped);
        }
        drop(self.camera.take());
        log::info!(
            "capture session unmounted after {} cycles ({} failed requests)",
            self.state.cycles_completed(),
            self.state.failed_requests()
        );
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("camera", &self.camera)
            .field("backend", &self.backend.name())
            .field("interval", &self.interval)
            .field("state", &self.state)
            .field("converged", &self.converged)
            .finish()
    }
}
