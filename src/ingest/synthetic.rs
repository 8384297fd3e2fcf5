use anyhow::Result;

use crate::frame::Frame;

use super::{CameraConfig, CameraStats};

/// Frames per synthetic scene cycle.
const CYCLE_FRAMES: u64 = 40;
/// Leading frames of each cycle that contain a bright target.
const TARGET_FRAMES: u64 = 10;

/// Synthetic scene generator for `stub://` device paths.
///
/// Produces a dark scene with a periodic bright episode: the first
/// `TARGET_FRAMES` frames of every `CYCLE_FRAMES`-frame cycle are bright
/// enough for the stub inference backend to report a detection. This gives
/// the full pipeline deterministic detection episodes without hardware.
pub struct SyntheticSource {
    config: CameraConfig,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    pub fn connect(&mut self) -> Result<()> {
        log::info!(
            "CameraSource: connected to {} (synthetic, {}x{})",
            self.config.device,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    pub fn next_frame(&mut self) -> Result<Frame> {
        let bright = self.frame_count % CYCLE_FRAMES < TARGET_FRAMES;
        self.frame_count += 1;

        let luma = if bright { 200 } else { 30 };
        let pixel_count = (self.config.width * self.config.height * 3) as usize;
        Frame::new(vec![luma; pixel_count], self.config.width, self.config.height)
    }

    pub fn is_healthy(&self) -> bool {
        true
    }

    pub fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.config.device.clone(),
        }
    }
}
