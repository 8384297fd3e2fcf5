use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::frame::Roi;

const DEFAULT_CAMERA_DEVICE: &str = "stub://camera0";
const DEFAULT_CAMERA_WIDTH: u32 = 240;
const DEFAULT_CAMERA_HEIGHT: u32 = 240;
const DEFAULT_LABELS_PATH: &str = "labels.txt";
const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;
const DEFAULT_FIRE_THRESHOLD: f32 = 0.70;
const DEFAULT_REARM_FRAMES: u32 = 5;
const DEFAULT_PULSE_MS: u64 = 30;

#[derive(Debug, Deserialize, Default)]
struct SentrydConfigFile {
    camera: Option<CameraConfigFile>,
    model: Option<ModelConfigFile>,
    roi: Option<RoiConfigFile>,
    trigger: Option<TriggerConfigFile>,
    serial_device: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    min_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct RoiConfigFile {
    x: Option<u32>,
    y: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct TriggerConfigFile {
    gpio: Option<u32>,
    fire_threshold: Option<f32>,
    rearm_frames: Option<u32>,
    pulse_ms: Option<u64>,
}

/// Resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct SentrydConfig {
    pub camera: CameraSettings,
    pub model: ModelSettings,
    pub roi: Roi,
    pub trigger: TriggerSettings,
    pub serial_device: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    /// ONNX artifact path. None selects the stub backend.
    pub path: Option<PathBuf>,
    pub labels_path: PathBuf,
    /// Decoder confidence threshold.
    pub min_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct TriggerSettings {
    /// GPIO number for the trigger pin. None selects the null pin.
    pub gpio: Option<u32>,
    pub fire_threshold: f32,
    pub rearm_frames: u32,
    pub pulse_width: Duration,
}

impl SentrydConfig {
    /// Load configuration: optional JSON file (SENTRY_CONFIG), then
    /// environment overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SENTRY_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Like `load`, but with an explicit config file path taking precedence
    /// over SENTRY_CONFIG.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SentrydConfigFile) -> Self {
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|camera| camera.device.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_CAMERA_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_CAMERA_HEIGHT),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(0),
        };
        let model = ModelSettings {
            path: file.model.as_ref().and_then(|model| model.path.clone()),
            labels_path: file
                .model
                .as_ref()
                .and_then(|model| model.labels_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LABELS_PATH)),
            min_confidence: file
                .model
                .as_ref()
                .and_then(|model| model.min_confidence)
                .unwrap_or(DEFAULT_MIN_CONFIDENCE),
        };
        let roi = Roi {
            x: file.roi.as_ref().and_then(|roi| roi.x).unwrap_or(0),
            y: file.roi.as_ref().and_then(|roi| roi.y).unwrap_or(0),
            width: file
                .roi
                .as_ref()
                .and_then(|roi| roi.width)
                .unwrap_or(camera.width),
            height: file
                .roi
                .as_ref()
                .and_then(|roi| roi.height)
                .unwrap_or(camera.height),
        };
        let trigger = TriggerSettings {
            gpio: file.trigger.as_ref().and_then(|trigger| trigger.gpio),
            fire_threshold: file
                .trigger
                .as_ref()
                .and_then(|trigger| trigger.fire_threshold)
                .unwrap_or(DEFAULT_FIRE_THRESHOLD),
            rearm_frames: file
                .trigger
                .as_ref()
                .and_then(|trigger| trigger.rearm_frames)
                .unwrap_or(DEFAULT_REARM_FRAMES),
            pulse_width: Duration::from_millis(
                file.trigger
                    .as_ref()
                    .and_then(|trigger| trigger.pulse_ms)
                    .unwrap_or(DEFAULT_PULSE_MS),
            ),
        };
        Self {
            camera,
            model,
            roi,
            trigger,
            serial_device: file.serial_device,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("SENTRY_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(path) = std::env::var("SENTRY_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model.path = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("SENTRY_LABELS_PATH") {
            if !path.trim().is_empty() {
                self.model.labels_path = PathBuf::from(path);
            }
        }
        if let Ok(gpio) = std::env::var("SENTRY_TRIGGER_GPIO") {
            if !gpio.trim().is_empty() {
                let number: u32 = gpio
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("SENTRY_TRIGGER_GPIO must be a GPIO number"))?;
                self.trigger.gpio = Some(number);
            }
        }
        if let Ok(path) = std::env::var("SENTRY_SERIAL_DEVICE") {
            if !path.trim().is_empty() {
                self.serial_device = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera dimensions must be nonzero"));
        }
        if !(self.model.min_confidence > 0.0 && self.model.min_confidence <= 1.0) {
            return Err(anyhow!(
                "min_confidence must be in (0, 1], got {}",
                self.model.min_confidence
            ));
        }
        if !(self.trigger.fire_threshold > 0.0 && self.trigger.fire_threshold <= 1.0) {
            return Err(anyhow!(
                "fire_threshold must be in (0, 1], got {}",
                self.trigger.fire_threshold
            ));
        }
        if self.trigger.pulse_width.is_zero() {
            return Err(anyhow!("pulse_ms must be greater than zero"));
        }
        if !self.roi.fits(self.camera.width, self.camera.height) {
            return Err(anyhow!(
                "roi ({},{}) {}x{} does not fit camera frame {}x{}",
                self.roi.x,
                self.roi.y,
                self.roi.width,
                self.roi.height,
                self.camera.width,
                self.camera.height
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SentrydConfigFile> {
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
        let cfg = SentrydConfig::from_file(SentrydConfigFile::default());
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.camera.device, DEFAULT_CAMERA_DEVICE);
        assert_eq!(cfg.roi, Roi::full_frame(240, 240));
        assert!(cfg.model.path.is_none());
        assert!(cfg.trigger.gpio.is_none());
    }

    #[test]
    fn oversized_roi_is_rejected() {
        let mut cfg = SentrydConfig::from_file(SentrydConfigFile::default());
        cfg.roi.width = 500;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_thresholds_are_rejected() {
        let mut cfg = SentrydConfig::from_file(SentrydConfigFile::default());
        cfg.model.min_confidence = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SentrydConfig::from_file(SentrydConfigFile::default());
        cfg.trigger.fire_threshold = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_pulse_width_is_rejected() {
        let mut cfg = SentrydConfig::from_file(SentrydConfigFile::default());
        cfg.trigger.pulse_width = Duration::ZERO;
        assert!(cfg.validate().is_err());
    }
}
