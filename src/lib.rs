//! Vision capture
//!
//! Streams frames from a local camera, snapshots one frame per interval,
//! posts it to a remote vision-detection endpoint and renders the returned
//! bounding boxes.
//!
//! # Module Structure
//!
//! - `ingest`: camera acquisition (synthetic, HTTP snapshot, V4L2) behind a
//!   scoped `CameraStream`
//! - `frame`: RGB frames and their PNG data-URL snapshots
//! - `detect`: validated detection schema and backends (HTTP, stub)
//! - `capture`: the capture session, its state and timer
//! - `target`: the parent-side "close enough and centered" rule
//! - `render`: text view of a session
//! - `config`: file + environment configuration
//! - `ui`: terminal output for the CLI

pub mod capture;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod render;
pub mod target;
pub mod ui;

pub use capture::{CaptureEvent, CaptureSession, CaptureState, CaptureTimer, CycleOutcome};
pub use config::CaptureConfig;
pub use detect::{
    backend_for_endpoint, decode_detections, BoundingPoly, DetectedObject, DetectionBackend,
    HttpBackend, NormalizedVertex, StubBackend,
};
pub use frame::{Frame, Snapshot};
pub use ingest::{acquire_camera, CameraConfig, CameraSource, CameraStream};
pub use target::{TargetMatcher, TargetRegion};
