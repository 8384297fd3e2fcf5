//! Result reporting sinks.
//!
//! The pipeline reports detection groups and throughput through a sink trait
//! so the daemon can log them and tests can record them. This replaces the
//! draw/print side effects of an attached display: the centroid marker
//! collapses into the centroid log line.

use crate::filter::ClassDetections;
use std::io::Write;
use std::path::Path;

/// Receives per-frame pipeline results.
pub trait ReportSink {
    /// One reported class with its detections.
    fn report_group(&mut self, group: &ClassDetections);

    /// Smoothed frames-per-second estimate for the loop.
    fn report_throughput(&mut self, fps: f32);
}

/// Sink that writes results to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn report_group(&mut self, group: &ClassDetections) {
        log::info!("********** {} **********", group.label);
        for det in &group.detections {
            let (cx, cy) = det.center();
            log::info!("x {}\ty {}\tscore {:.2}", cx, cy, det.score);
        }
    }

    fn report_throughput(&mut self, fps: f32) {
        log::debug!("{:.1} fps", fps);
    }
}

/// Best-effort one-time serial greeting.
///
/// The serial line carries status only; nothing parses it, so failures are
/// logged and swallowed.
pub fn serial_hello<P: AsRef<Path>>(device: P) {
    let device = device.as_ref();
    let result = std::fs::OpenOptions::new()
        .write(true)
        .open(device)
        .and_then(|mut port| port.write_all(b"hello\n"));
    match result {
        Ok(()) => log::info!("serial hello sent to {}", device.display()),
        Err(err) => log::warn!("serial hello to {} failed: {}", device.display(), err),
    }
}
