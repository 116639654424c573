//! Text rendering of a capture session.

use std::fmt::Write as _;

use crate::capture::CaptureState;
use crate::detect::DetectedObject;

/// Render the session view: video status, start control, last still and the
/// detected object list (omitted while empty).
pub fn render_view(video_label: Option<&str>, state: &CaptureState) -> String {
    let mut out = String::new();

    match video_label {
        Some(label) => {
            let _ = writeln!(out, "Video: {}", label);
        }
        None => out.push_str("Video: unavailable\n"),
    }

    match state.timer() {
        Some(timer) => {
            let _ = writeln!(
                out,
                "[Start Capture Loop] running every {} ms",
                timer.interval().as_millis()
            );
        }
        None => out.push_str("[Start Capture Loop]\n"),
    }

    if let Some(snapshot) = state.captured_image() {
        let _ = writeln!(
            out,
            "Captured: {}x{} PNG ({} bytes)",
            snapshot.width(),
            snapshot.height(),
            snapshot.png_bytes().len()
        );
    }

    out.push_str(&render_detections(state.detected_objects()));
    out
}

/// Render a detection list. Empty input renders nothing.
pub fn render_detections(objects: &[DetectedObject]) -> String {
    if objects.is_empty() {
        return String::new();
    }
    let mut out = String::from("Detected Objects:\n");
    for object in objects {
        let _ = writeln!(
            out,
            "  {} - Confidence: {}%",
            object.name,
            object.confidence_percent()
        );
        out.push_str("    Bounding Box Coordinates:\n");
        for vertex in &object.bounding_poly.normalized_vertices {
            let _ = writeln!(out, "      x: {}, y: {}", vertex.x, vertex.y);
        }
    }
    out
}
