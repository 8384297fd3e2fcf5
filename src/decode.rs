//! Heat-map decoding.
//!
//! FOMO-style models emit a per-pixel class confidence grid instead of box
//! regressions. This module converts one output tensor into discrete
//! detections: each class channel is byte-scaled, thresholded, and segmented
//! into connected blobs, and each blob's bounding rectangle is mapped from
//! network-output coordinates back into sensor-frame pixel coordinates.

use anyhow::{anyhow, Result};

use crate::frame::Roi;

/// One decoded detection in sensor-frame pixel coordinates.
///
/// Immutable once produced. The score is the mean thresholded intensity of
/// the blob normalized back to [0,1], never a raw heat value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub class_index: usize,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub score: f32,
}

impl Detection {
    /// Floored centroid of the bounding rectangle.
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }
}

/// Owned view of a model's heat-map output, batch fixed at 1.
///
/// Layout is NHWC: `scores[(y * width + x) * channels + c]` holds the
/// confidence for class `c` at grid cell `(x, y)`, in [0,1].
#[derive(Clone, Debug)]
pub struct ModelOutput {
    height: usize,
    width: usize,
    channels: usize,
    scores: Vec<f32>,
}

impl ModelOutput {
    /// Wrap a flat NHWC score buffer. A shape mismatch is a precondition
    /// violation and surfaces as a fatal error.
    pub fn from_nhwc(height: usize, width: usize, channels: usize, scores: Vec<f32>) -> Result<Self> {
        if height == 0 || width == 0 || channels == 0 {
            return Err(anyhow!(
                "model output dimensions must be nonzero (got {}x{}x{})",
                height,
                width,
                channels
            ));
        }
        let expected = height
            .checked_mul(width)
            .and_then(|v| v.checked_mul(channels))
            .ok_or_else(|| anyhow!("model output dimensions overflow"))?;
        if scores.len() != expected {
            return Err(anyhow!(
                "model output length {} does not match shape [1,{},{},{}]",
                scores.len(),
                height,
                width,
                channels
            ));
        }
        Ok(Self {
            height,
            width,
            channels,
            scores,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    fn score(&self, y: usize, x: usize, c: usize) -> f32 {
        self.scores[(y * self.width + x) * self.channels + c]
    }

    /// Byte-scaled intensity image of one class channel (value * 255).
    fn channel_bytes(&self, c: usize) -> Vec<u8> {
        let mut plane = Vec::with_capacity(self.height * self.width);
        for y in 0..self.height {
            for x in 0..self.width {
                let v = self.score(y, x, c).clamp(0.0, 1.0);
                plane.push((v * 255.0) as u8);
            }
        }
        plane
    }
}

/// Decodes heat-map outputs into per-class detection lists.
#[derive(Clone, Copy, Debug)]
pub struct HeatmapDecoder {
    threshold: f32,
}

impl HeatmapDecoder {
    /// Create a decoder with confidence threshold in (0, 1].
    pub fn new(threshold: f32) -> Result<Self> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(anyhow!(
                "decoder threshold must be in (0, 1], got {}",
                threshold
            ));
        }
        Ok(Self { threshold })
    }

    /// Decode one model output into one detection list per class channel.
    ///
    /// Channel 0 (background) is decoded like any other channel; dropping it
    /// is the filter's job.
    pub fn decode(&self, output: &ModelOutput, roi: Roi) -> Vec<Vec<Detection>> {
        let ow = output.width();
        let oh = output.height();

        let x_scale = roi.width as f32 / ow as f32;
        let y_scale = roi.height as f32 / oh as f32;
        let scale = x_scale.min(y_scale);

        // Both offsets share the width-derived slack term. The deployments
        // this decoder targets use square ROIs and square output grids, where
        // the two terms coincide; kept as-is so frame-space coordinates match
        // the model tooling's preview output. See DESIGN.md.
        let x_offset = ((roi.width as f32 - ow as f32 * scale) / 2.0) + roi.x as f32;
        let y_offset = ((roi.width as f32 - ow as f32 * scale) / 2.0) + roi.y as f32;

        let low = (self.threshold * 255.0).ceil() as u8;

        let mut per_class = Vec::with_capacity(output.channels());
        for c in 0..output.channels() {
            let plane = output.channel_bytes(c);
            let blobs = find_blobs(&plane, ow, oh, low);

            let mut detections = Vec::with_capacity(blobs.len());
            for blob in blobs {
                let score = mean_thresholded(&plane, ow, &blob, low);
                detections.push(Detection {
                    class_index: c,
                    x: (blob.min_x as f32 * scale + x_offset) as i32,
                    y: (blob.min_y as f32 * scale + y_offset) as i32,
                    w: (blob.width() as f32 * scale) as i32,
                    h: (blob.height() as f32 * scale) as i32,
                    score,
                });
            }
            per_class.push(detections);
        }
        per_class
    }
}

/// Bounding rectangle of one connected component, in grid coordinates.
#[derive(Clone, Copy, Debug)]
struct Blob {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl Blob {
    fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }
}

/// 8-connected component extraction over a thresholded byte plane.
///
/// Every pixel with intensity in [low, 255] belongs to exactly one blob;
/// the minimum blob size is one pixel.
fn find_blobs(plane: &[u8], width: usize, height: usize, low: u8) -> Vec<Blob> {
    let mut visited = vec![false; plane.len()];
    let mut blobs = Vec::new();
    let mut stack = Vec::new();

    for start in 0..plane.len() {
        if visited[start] || plane[start] < low {
            continue;
        }

        let mut blob = Blob {
            min_x: start % width,
            min_y: start / width,
            max_x: start % width,
            max_y: start / width,
        };
        visited[start] = true;
        stack.push(start);

        while let Some(idx) = stack.pop() {
            let x = idx % width;
            let y = idx / width;
            blob.min_x = blob.min_x.min(x);
            blob.min_y = blob.min_y.min(y);
            blob.max_x = blob.max_x.max(x);
            blob.max_y = blob.max_y.max(y);

            for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    let nidx = ny * width + nx;
                    if !visited[nidx] && plane[nidx] >= low {
                        visited[nidx] = true;
                        stack.push(nidx);
                    }
                }
            }
        }

        blobs.push(blob);
    }
    blobs
}

/// Mean intensity of thresholded pixels inside a blob's bounding rectangle,
/// normalized to [0,1].
fn mean_thresholded(plane: &[u8], width: usize, blob: &Blob, low: u8) -> f32 {
    let mut sum: u32 = 0;
    let mut count: u32 = 0;
    for y in blob.min_y..=blob.max_y {
        for x in blob.min_x..=blob.max_x {
            let v = plane[y * width + x];
            if v >= low {
                sum += v as u32;
                count += 1;
            }
        }
    }
    if count == 0 {
        return 0.0;
    }
    (sum as f32 / count as f32) / 255.0
}
