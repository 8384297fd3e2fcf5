//! Per-frame processing loop.
//!
//! One synchronous pass per captured frame: infer, decode, filter, report,
//! trigger, throughput. No per-frame error recovery; a failed capture or
//! inference propagates out of `run` as a fatal error.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::decode::HeatmapDecoder;
use crate::filter::DetectionFilter;
use crate::frame::{Frame, Roi};
use crate::infer::InferenceBackend;
use crate::ingest::CameraSource;
use crate::labels::LabelSet;
use crate::report::ReportSink;
use crate::trigger::{TriggerController, TriggerPin};

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Exponentially smoothed frames-per-second estimate.
#[derive(Debug, Default)]
pub struct FpsMeter {
    last_tick: Option<Instant>,
    smoothed: f32,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame boundary and return the current estimate.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        if let Some(last) = self.last_tick {
            let elapsed = now.duration_since(last).as_secs_f32();
            if elapsed > 0.0 {
                let instant_fps = 1.0 / elapsed;
                self.smoothed = if self.smoothed == 0.0 {
                    instant_fps
                } else {
                    0.9 * self.smoothed + 0.1 * instant_fps
                };
            }
        }
        self.last_tick = Some(now);
        self.smoothed
    }
}

/// Summary of one processed frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameReport {
    /// Reported (non-background, non-empty) class groups.
    pub groups: usize,
    /// Total detections across reported groups.
    pub detections: usize,
    /// Whether the trigger fired this frame.
    pub pulsed: bool,
}

/// The per-frame pipeline: decode, filter, report, trigger.
pub struct FrameLoop<P: TriggerPin, S: ReportSink> {
    backend: Box<dyn InferenceBackend>,
    decoder: HeatmapDecoder,
    filter: DetectionFilter,
    trigger: TriggerController<P>,
    sink: S,
    labels: LabelSet,
    roi: Roi,
    fps: FpsMeter,
}

impl<P: TriggerPin, S: ReportSink> FrameLoop<P, S> {
    /// Assemble the pipeline, validating the backend against the label set.
    pub fn new(
        backend: Box<dyn InferenceBackend>,
        decoder: HeatmapDecoder,
        trigger: TriggerController<P>,
        sink: S,
        labels: LabelSet,
        roi: Roi,
    ) -> Result<Self> {
        let dims = backend.output_dims();
        if dims.channels != labels.len() {
            return Err(anyhow!(
                "backend '{}' emits {} channels but the label file has {} labels",
                backend.name(),
                dims.channels,
                labels.len()
            ));
        }
        Ok(Self {
            backend,
            decoder,
            filter: DetectionFilter::new(),
            trigger,
            sink,
            labels,
            roi,
            fps: FpsMeter::new(),
        })
    }

    /// Process one captured frame.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport> {
        let output = self.backend.infer(frame, self.roi)?;
        let per_class = self.decoder.decode(&output, self.roi);
        let groups = self.filter.filter(&per_class, &self.labels);

        for group in &groups {
            self.sink.report_group(group);
        }

        let pulsed = self.trigger.observe_frame(&groups);
        self.sink.report_throughput(self.fps.tick());

        Ok(FrameReport {
            groups: groups.len(),
            detections: groups.iter().map(|g| g.detections.len()).sum(),
            pulsed,
        })
    }

    /// Drive the pipeline from a camera source until `shutdown` is set.
    ///
    /// The trigger pin is forced low on the way out, whatever the exit path.
    pub fn run(&mut self, source: &mut CameraSource, shutdown: &AtomicBool) -> Result<()> {
        self.backend.warm_up()?;
        let mut last_health_log = Instant::now();

        let result = loop {
            if shutdown.load(Ordering::Relaxed) {
                log::info!("shutdown requested, stopping frame loop");
                break Ok(());
            }

            let frame = match source.next_frame() {
                Ok(frame) => frame,
                Err(err) => break Err(err),
            };
            if let Err(err) = self.process_frame(&frame) {
                break Err(err);
            }

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let stats = source.stats();
                log::info!(
                    "camera health={} frames={} device={}",
                    source.is_healthy(),
                    stats.frames_captured,
                    stats.device
                );
                last_health_log = Instant::now();
            }
        };

        self.trigger.release();
        result
    }

    pub fn trigger(&self) -> &TriggerController<P> {
        &self.trigger
    }
}
