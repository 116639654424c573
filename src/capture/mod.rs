//! The capture component.
//!
//! - `CaptureSession`: mounted component. Owns the camera, the detection
//!   backend and the state, and runs one capture cycle per due tick.
//! - `CaptureState`: the single state object, changed only through
//!   `CaptureState::apply`.
//! - `CaptureTimer`: fixed-interval schedule with missed-tick coalescing.

mod session;
mod state;
mod timer;

pub use session::{CaptureSession, CycleOutcome, DEFAULT_CAPTURE_INTERVAL};
pub use state::{CaptureEvent, CaptureState};
pub use timer::CaptureTimer;
