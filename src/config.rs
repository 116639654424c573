use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::capture::DEFAULT_CAPTURE_INTERVAL;
use crate::detect::DEFAULT_ENDPOINT;
use crate::ingest::CameraConfig;
use crate::target::{TargetMatcher, TargetRegion, DEFAULT_MIN_COVERAGE};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const MAX_CAMERA_DIMENSION: u32 = 8192;

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    camera: Option<CameraConfigFile>,
    detection: Option<DetectionConfigFile>,
    capture: Option<LoopConfigFile>,
    target: Option<TargetConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    endpoint: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct LoopConfigFile {
    interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct TargetConfigFile {
    label: Option<String>,
    min_coverage: Option<f64>,
    region: Option<[f64; 4]>,
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub camera: CameraConfig,
    pub endpoint: String,
    pub request_timeout: Duration,
    pub interval: Duration,
    pub target: TargetSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetSettings {
    pub label: Option<String>,
    pub min_coverage: f64,
    pub region: TargetRegion,
}

impl TargetSettings {
    pub fn matcher(&self) -> Result<TargetMatcher> {
        TargetMatcher::new(self.label.clone(), self.region, self.min_coverage)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            interval: DEFAULT_CAPTURE_INTERVAL,
            target: TargetSettings {
                label: None,
                min_coverage: DEFAULT_MIN_COVERAGE,
                region: TargetRegion::default(),
            },
        }
    }
}

impl CaptureConfig {
    /// Load from the JSON file named by `VISION_CAPTURE_CONFIG` (if set),
    /// then apply `VISION_CAPTURE_*` environment overrides, then validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("VISION_CAPTURE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: CaptureConfigFile) -> Self {
        let defaults = Self::default();
        let camera = file.camera.unwrap_or_default();
        let detection = file.detection.unwrap_or_default();
        let target = file.target.unwrap_or_default();
        Self {
            camera: CameraConfig {
                device: camera.device.unwrap_or(defaults.camera.device),
                width: camera.width.unwrap_or(defaults.camera.width),
                height: camera.height.unwrap_or(defaults.camera.height),
                target_fps: camera.target_fps.unwrap_or(defaults.camera.target_fps),
            },
            endpoint: detection.endpoint.unwrap_or(defaults.endpoint),
            request_timeout: detection
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            interval: file
                .capture
                .and_then(|capture| capture.interval_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            target: TargetSettings {
                label: target.label.or(defaults.target.label),
                min_coverage: target.min_coverage.unwrap_or(defaults.target.min_coverage),
                region: target
                    .region
                    .map(|[min_x, min_y, max_x, max_y]| TargetRegion {
                        min_x,
                        min_y,
                        max_x,
                        max_y,
                    })
                    .unwrap_or(defaults.target.region),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("VISION_CAPTURE_CAMERA") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(endpoint) = std::env::var("VISION_CAPTURE_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(label) = std::env::var("VISION_CAPTURE_TARGET") {
            if !label.trim().is_empty() {
                self.target.label = Some(label);
            }
        }
        if let Ok(interval) = std::env::var("VISION_CAPTURE_INTERVAL_MS") {
            let ms: u64 = interval.trim().parse().map_err(|_| {
                anyhow!("VISION_CAPTURE_INTERVAL_MS must be an integer number of milliseconds")
            })?;
            self.interval = Duration::from_millis(ms);
        }
        if let Ok(timeout) = std::env::var("VISION_CAPTURE_TIMEOUT_MS") {
            let ms: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("VISION_CAPTURE_TIMEOUT_MS must be an integer number of milliseconds")
            })?;
            self.request_timeout = Duration::from_millis(ms);
        }
        Ok(())
    }

    /// Check the invariants the capture loop relies on.
    pub fn validate(&self) -> Result<()> {
        if self.camera.device.trim().is_empty() {
            return Err(anyhow!("camera device must not be empty"));
        }
        let (width, height) = (self.camera.width, self.camera.height);
        if width == 0 || height == 0 {
            return Err(anyhow!("camera size must be non-zero, got {}x{}", width, height));
        }
        if width > MAX_CAMERA_DIMENSION || height > MAX_CAMERA_DIMENSION {
            return Err(anyhow!(
                "camera size {}x{} exceeds {} pixels per side",
                width,
                height,
                MAX_CAMERA_DIMENSION
            ));
        }
        if self.interval.is_zero() {
            return Err(anyhow!("capture interval must be greater than zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        if !self.endpoint.starts_with("stub://") {
            let url = url::Url::parse(&self.endpoint)
                .with_context(|| format!("invalid detection endpoint {}", self.endpoint))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(anyhow!(
                    "detection endpoint must be http(s) or stub://, got {}",
                    url.scheme()
                ));
            }
        }
        self.target.matcher()?;
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<CaptureConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = CaptureConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:5001/api/detectObjects");
        assert_eq!(cfg.interval, Duration::from_secs(2));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file: CaptureConfigFile =
            serde_json::from_str(r#"{"camera": {"width": 1280}}"#).unwrap();
        let cfg = CaptureConfig::from_file(file);
        assert_eq!(cfg.camera.width, 1280);
        assert_eq!(cfg.camera.height, 480);
        assert_eq!(cfg.camera.device, "stub://front_camera");
    }

    #[test]
    fn rejects_zero_interval_and_bad_endpoint() {
        let cfg = CaptureConfig {
            interval: Duration::ZERO,
            ..CaptureConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = CaptureConfig {
            endpoint: "ws://localhost:5001/detect".to_string(),
            ..CaptureConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = CaptureConfig {
            endpoint: "stub://vision".to_string(),
            ..CaptureConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_zero_and_oversized_camera() {
        let mut cfg = CaptureConfig::default();
        cfg.camera.width = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("non-zero"), "{err:#}");

        let mut cfg = CaptureConfig::default();
        cfg.camera.height = MAX_CAMERA_DIMENSION + 1;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds 8192"), "{err:#}");

        let mut cfg = CaptureConfig::default();
        cfg.camera.width = MAX_CAMERA_DIMENSION;
        cfg.camera.height = MAX_CAMERA_DIMENSION;
        assert!(cfg.validate().is_ok());
    }
}
