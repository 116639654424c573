//! vision_capture - camera capture loop host
//!
//! This binary:
//! 1. Loads configuration (file, environment, flags)
//! 2. Mounts a capture session on the configured camera
//! 3. Starts the capture loop (immediately, or after Enter)
//! 4. Prints the rendered view after every capture cycle
//! 5. Stops once a detected object is close enough and centered, or on Ctrl-C

use anyhow::{Context, Result};
use clap::Parser;
use std::cell::RefCell;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use vision_capture::ui::{Ui, UiMode};
use vision_capture::{
    backend_for_endpoint, CaptureConfig, CaptureSession, CycleOutcome, DetectedObject,
};

/// How often the host loop wakes up to check the capture timer.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Snapshot a camera periodically and render vision detections"
)]
struct Args {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Camera device: /dev/videoN, http(s) snapshot URL, or stub://name.
    #[arg(long)]
    camera: Option<String>,

    /// Detection endpoint (http(s)://... or stub://).
    #[arg(long)]
    endpoint: Option<String>,

    /// Milliseconds between capture cycles.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Object label that ends the loop once it fills the target region.
    #[arg(long)]
    target: Option<String>,

    /// Wait for Enter before starting the capture loop.
    #[arg(long)]
    wait_for_enter: bool,

    /// Output style.
    #[arg(long, value_enum, default_value_t = UiMode::Auto)]
    ui: UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = Ui::new(args.ui, std::io::stdout().is_terminal());

    if let Some(path) = &args.config {
        std::env::set_var("VISION_CAPTURE_CONFIG", path);
    }
    let mut cfg = CaptureConfig::load()?;
    if let Some(camera) = args.camera {
        cfg.camera.device = camera;
    }
    if let Some(endpoint) = args.endpoint {
        cfg.endpoint = endpoint;
    }
    if let Some(ms) = args.interval_ms {
        cfg.interval = Duration::from_millis(ms);
    }
    if let Some(target) = args.target {
        cfg.target.label = Some(target);
    }
    cfg.validate()?;

    let matcher = cfg.target.matcher()?;
    let backend = backend_for_endpoint(&cfg.endpoint, cfg.request_timeout)?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .context("error setting Ctrl-C handler")?;

    // The parent side: each batch is reduced to the objects that satisfy
    // the target rule, and that list is fed back to the session.
    let matched: Rc<RefCell<Vec<DetectedObject>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = matched.clone();

    let mut session = {
        let _stage = ui.stage("acquire camera");
        CaptureSession::mount(&cfg.camera, backend, cfg.interval)
            .on_result(move |objects| *sink.borrow_mut() = matcher.matches(objects))
    };
    ui.show(&session.render());

    if args.wait_for_enter {
        eprintln!("press Enter to start the capture loop");
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("read start confirmation")?;
    }
    session.start_capture_loop(Instant::now());
    log::info!(
        "posting snapshots to {} (target: {})",
        cfg.endpoint,
        cfg.target.label.as_deref().unwrap_or("any object")
    );

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                log::info!("shutdown signal received, stopping capture");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        let outcome = session.tick(Instant::now());
        if outcome == CycleOutcome::Idle {
            continue;
        }
        let stopped = session.observe_matches(matched.borrow().as_slice());
        ui.show(&session.render());
        if stopped {
            for object in matched.borrow().iter() {
                log::info!(
                    "matched {} ({}%)",
                    object.name,
                    object.confidence_percent()
                );
            }
            break;
        }
    }

    session.unmount();
    Ok(())
}
