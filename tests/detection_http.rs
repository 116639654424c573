//! Tests for the HTTP detection backend and a full capture session against
//! a loopback fake of the vision endpoint.
//!
//! These tests verify that:
//! 1. Snapshots are posted as `{"image": <png data url>}`
//! 2. Valid responses are decoded, rendered and forwarded to the parent
//! 3. Error statuses, malformed bodies and refused connections are failures
//!    that leave the rendered list unchanged
//! 4. A converged match list stops further requests

use std::cell::RefCell;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::rc::Rc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use vision_capture::{
    acquire_camera, CameraConfig, CaptureSession, CycleOutcome, DetectedObject, DetectionBackend,
    Frame, HttpBackend, TargetMatcher,
};

const CUP_RESPONSE: &str = r#"[{"name":"cup","score":0.92,"boundingPoly":{"normalizedVertices":[{"x":0.1,"y":0.2}]}}]"#;

const CENTERED_CUP_RESPONSE: &str = r#"[{"name":"cup","score":0.97,"boundingPoly":{"normalizedVertices":[
    {"x":0.1,"y":0.1},{"x":0.9,"y":0.1},{"x":0.9,"y":0.9},{"x":0.1,"y":0.9}]}}]"#;

const INTERVAL: Duration = Duration::from_secs(2);

/// Serve one canned response per connection, in order, and return the
/// request bodies that were received.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake vision server");
    let addr = listener.local_addr().expect("local addr");
    let handle = std::thread::spawn(move || {
        let mut bodies = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().expect("accept");
            bodies.push(read_request_body(&mut stream));
            let reason = if status == 200 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).expect("write response");
        }
        bodies
    });
    (format!("http://{}/api/detectObjects", addr), handle)
}

fn read_request_body(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).expect("read request");
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    assert!(headers.starts_with("POST /api/detectObjects"));
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .expect("content-length header");
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).expect("read body");
        assert!(n > 0, "client closed mid body");
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8(buf[header_end..header_end + content_length].to_vec()).expect("utf8 body")
}

fn stub_camera() -> CameraConfig {
    CameraConfig {
        device: "stub://desk".to_string(),
        width: 32,
        height: 24,
        target_fps: 10,
    }
}

#[test]
fn posts_snapshot_as_image_field() {
    let (url, server) = serve(vec![(200, CUP_RESPONSE)]);
    let snapshot = Frame::new(vec![200; 4 * 3 * 3], 4, 3)
        .unwrap()
        .snapshot()
        .unwrap();

    let mut backend = HttpBackend::new(url, Duration::from_secs(5));
    let objects = backend.detect(&snapshot).expect("detect");
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].name, "cup");

    let bodies = server.join().unwrap();
    let request: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(request["image"], snapshot.data_url());
    assert!(snapshot.data_url().starts_with("data:image/png;base64,"));
}

#[test]
fn error_status_is_a_failure() {
    let (url, server) = serve(vec![(500, r#"{"error":"model offline"}"#)]);
    let snapshot = Frame::new(vec![0; 3], 1, 1).unwrap().snapshot().unwrap();

    let mut backend = HttpBackend::new(url, Duration::from_secs(5));
    let err = backend.detect(&snapshot).unwrap_err();
    assert!(err.to_string().contains("status 500"), "{err:#}");
    server.join().unwrap();
}

#[test]
fn malformed_body_is_a_failure() {
    let (url, server) = serve(vec![(200, r#"[{"name":"cup"}]"#)]);
    let snapshot = Frame::new(vec![0; 3], 1, 1).unwrap().snapshot().unwrap();

    let mut backend = HttpBackend::new(url, Duration::from_secs(5));
    assert!(backend.detect(&snapshot).is_err());
    server.join().unwrap();
}

#[test]
fn session_renders_results_and_survives_failures() {
    let (url, server) = serve(vec![(200, CUP_RESPONSE), (503, "busy"), (200, "not json")]);
    let batches: Rc<RefCell<Vec<Vec<DetectedObject>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = batches.clone();

    let camera = acquire_camera(&stub_camera()).expect("stub camera");
    let backend = HttpBackend::new(url, Duration::from_secs(5));
    let mut session = CaptureSession::new(Some(camera), Box::new(backend), INTERVAL)
        .on_result(move |objects| sink.borrow_mut().push(objects.to_vec()));

    let t0 = Instant::now();
    assert!(session.start_capture_loop(t0));
    assert!(!session.start_capture_loop(t0));

    assert_eq!(session.tick(t0 + INTERVAL), CycleOutcome::Detected(1));
    let view = session.render();
    assert!(view.contains("cup - Confidence: 92%"), "{view}");
    assert!(view.contains("x: 0.1, y: 0.2"), "{view}");
    assert!(view.contains("Captured: 32x24 PNG"), "{view}");

    assert_eq!(session.tick(t0 + 2 * INTERVAL), CycleOutcome::RequestFailed);
    assert_eq!(session.tick(t0 + 3 * INTERVAL), CycleOutcome::RequestFailed);
    assert_eq!(session.state().detected_objects()[0].name, "cup");
    assert!(session.render().contains("cup - Confidence: 92%"));
    assert_eq!(batches.borrow().len(), 1);

    let bodies = server.join().unwrap();
    assert_eq!(bodies.len(), 3);
    session.unmount();
}

#[test]
fn refused_connection_keeps_previous_results() {
    let (url, server) = serve(vec![(200, CUP_RESPONSE)]);
    let camera = acquire_camera(&stub_camera()).expect("stub camera");
    let backend = HttpBackend::new(url, Duration::from_secs(5));
    let mut session = CaptureSession::new(Some(camera), Box::new(backend), INTERVAL);

    let t0 = Instant::now();
    session.start_capture_loop(t0);
    assert_eq!(session.tick(t0 + INTERVAL), CycleOutcome::Detected(1));
    // the fake server has exited and its listener is closed
    server.join().unwrap();

    assert_eq!(session.tick(t0 + 2 * INTERVAL), CycleOutcome::RequestFailed);
    assert_eq!(session.state().detected_objects().len(), 1);
    assert_eq!(session.state().detected_objects()[0].name, "cup");
}

#[test]
fn matched_target_stops_requests() {
    let (url, server) = serve(vec![(200, CUP_RESPONSE), (200, CENTERED_CUP_RESPONSE)]);
    let matcher = TargetMatcher::default();
    let matched: Rc<RefCell<Vec<DetectedObject>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = matched.clone();

    let camera = acquire_camera(&stub_camera()).expect("stub camera");
    let backend = HttpBackend::new(url, Duration::from_secs(5));
    let mut session = CaptureSession::new(Some(camera), Box::new(backend), INTERVAL)
        .on_result(move |objects| *sink.borrow_mut() = matcher.matches(objects));

    let t0 = Instant::now();
    session.start_capture_loop(t0);

    // small box: not matched yet
    assert_eq!(session.tick(t0 + INTERVAL), CycleOutcome::Detected(1));
    assert!(!session.observe_matches(matched.borrow().as_slice()));
    assert!(session.is_running());

    // centered box filling the region: loop stops
    assert_eq!(session.tick(t0 + 2 * INTERVAL), CycleOutcome::Detected(1));
    assert!(session.observe_matches(matched.borrow().as_slice()));
    assert!(!session.is_running());

    assert_eq!(session.tick(t0 + 3 * INTERVAL), CycleOutcome::Idle);
    assert_eq!(session.tick(t0 + 10 * INTERVAL), CycleOutcome::Idle);

    let bodies = server.join().unwrap();
    assert_eq!(bodies.len(), 2);
}
