//! fomo-sentry
//!
//! Detection-to-trigger pipeline for vision boards running FOMO-style
//! heat-map object detectors. Each captured frame flows through four stages:
//!
//! 1. An inference backend turns the frame ROI into a per-class confidence
//!    grid (`ModelOutput`).
//! 2. `HeatmapDecoder` thresholds each class channel, extracts connected
//!    blobs, and maps their bounding rectangles back into sensor-frame
//!    pixel coordinates.
//! 3. `DetectionFilter` drops the background class and empty lists.
//! 4. `TriggerController` debounces confident detections into single
//!    bounded-width pulses on a GPIO pin, re-arming only after a run of
//!    detection-free frames.
//!
//! The loop is single-threaded and blocking; the only mutable cross-frame
//! state is owned by the trigger controller.
//!
//! # Module Structure
//!
//! - `ingest`: camera frame sources (synthetic, V4L2)
//! - `infer`: inference backends (stub, tract/ONNX)
//! - `decode`, `filter`, `trigger`: the decision pipeline
//! - `pipeline`: the per-frame loop gluing the stages together
//! - `config`, `labels`, `gpio`, `report`: daemon plumbing

pub mod config;
pub mod decode;
pub mod filter;
pub mod frame;
pub mod gpio;
pub mod infer;
pub mod ingest;
pub mod labels;
pub mod pipeline;
pub mod report;
pub mod trigger;

pub use config::SentrydConfig;
pub use decode::{Detection, HeatmapDecoder, ModelOutput};
pub use filter::{ClassDetections, DetectionFilter};
pub use frame::{Frame, Roi};
pub use gpio::{NullPin, SysfsPin};
pub use infer::{InferenceBackend, OutputDims, StubBackend};
#[cfg(feature = "backend-tract")]
pub use infer::TractBackend;
pub use ingest::{CameraConfig, CameraSource, CameraStats};
pub use labels::{LabelSet, BACKGROUND_CLASS};
pub use pipeline::{FrameLoop, FrameReport};
pub use report::{LogSink, ReportSink};
pub use trigger::{TriggerConfig, TriggerController, TriggerPin};
