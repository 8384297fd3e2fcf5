//! Captured frame and region-of-interest types.
//!
//! A `Frame` is an RGB24 buffer handed from the ingest layer to the inference
//! backend. A `Roi` names the sub-rectangle of the sensor frame the model
//! consumed; the decoder uses it to rescale network-space rectangles back into
//! sensor-frame pixel coordinates.

use anyhow::{anyhow, Result};

/// One captured RGB24 frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Packed RGB pixel data, row-major, 3 bytes per pixel.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Create a frame, checking that the buffer matches the dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Mean luminance over the pixels inside `roi`, 0..=255.
    ///
    /// Used by the stub inference backend; real backends consume the pixels
    /// directly.
    pub fn mean_luma(&self, roi: Roi) -> u8 {
        let mut sum: u64 = 0;
        let mut count: u64 = 0;
        let x_end = roi.x.saturating_add(roi.width).min(self.width);
        let y_end = roi.y.saturating_add(roi.height).min(self.height);
        for y in roi.y..y_end {
            for x in roi.x..x_end {
                let idx = ((y * self.width + x) * 3) as usize;
                let r = self.data[idx] as u64;
                let g = self.data[idx + 1] as u64;
                let b = self.data[idx + 2] as u64;
                sum += (r + g + b) / 3;
                count += 1;
            }
        }
        if count == 0 {
            return 0;
        }
        (sum / count) as u8
    }
}

/// Region of the sensor frame fed to the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// A region covering the whole frame.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Check that the region fits inside a frame of the given size.
    pub fn fits(&self, frame_width: u32, frame_height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|r| r <= frame_width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= frame_height)
    }
}
