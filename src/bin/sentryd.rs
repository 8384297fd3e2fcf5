//! sentryd - FOMO detection-to-trigger daemon
//!
//! This daemon:
//! 1. Captures frames from the configured camera source
//! 2. Runs heat-map inference on the frame ROI
//! 3. Decodes and filters per-class detections
//! 4. Fires a debounced GPIO pulse per detection episode
//! 5. Logs detection groups and loop throughput

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fomo_sentry::{
    gpio, report, CameraConfig, CameraSource, FrameLoop, HeatmapDecoder, InferenceBackend,
    LabelSet, LogSink, NullPin, SentrydConfig, StubBackend, TriggerConfig, TriggerController,
    TriggerPin,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run the FOMO detection-to-trigger pipeline against a camera"
)]
struct Args {
    /// Path to the JSON config file.
    #[arg(long, env = "SENTRY_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = SentrydConfig::load_from(args.config.as_deref())?;

    // Startup guards: a missing label file or model artifact aborts here with
    // a descriptive message, before any hardware is touched.
    let labels = LabelSet::load(&cfg.model.labels_path)?;
    let backend = build_backend(&cfg, labels.len())?;
    log::info!(
        "inference backend '{}', {} classes",
        backend.name(),
        labels.len()
    );

    if let Some(serial_device) = &cfg.serial_device {
        report::serial_hello(serial_device);
    }

    let pin: Box<dyn TriggerPin> = match cfg.trigger.gpio {
        Some(number) => Box::new(gpio::SysfsPin::open(number)?),
        None => {
            log::warn!("no trigger GPIO configured, pulses will be dropped");
            Box::new(NullPin)
        }
    };
    let trigger = TriggerController::new(
        pin,
        TriggerConfig {
            fire_threshold: cfg.trigger.fire_threshold,
            rearm_frames: cfg.trigger.rearm_frames,
            pulse_width: cfg.trigger.pulse_width,
        },
    );

    let decoder = HeatmapDecoder::new(cfg.model.min_confidence)?;
    let mut frame_loop = FrameLoop::new(backend, decoder, trigger, LogSink, labels, cfg.roi)?;

    let mut source = CameraSource::new(CameraConfig {
        device: cfg.camera.device.clone(),
        width: cfg.camera.width,
        height: cfg.camera.height,
        target_fps: cfg.camera.target_fps,
    })?;
    source.connect()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })?;
    }

    log::info!(
        "sentryd running: camera={} roi=({},{}) {}x{} fire_threshold={:.2} rearm_frames={}",
        cfg.camera.device,
        cfg.roi.x,
        cfg.roi.y,
        cfg.roi.width,
        cfg.roi.height,
        cfg.trigger.fire_threshold,
        cfg.trigger.rearm_frames
    );

    frame_loop.run(&mut source, &shutdown)?;
    log::info!(
        "sentryd stopped ({} pulses fired)",
        frame_loop.trigger().pulses_fired()
    );
    Ok(())
}

fn build_backend(cfg: &SentrydConfig, label_count: usize) -> Result<Box<dyn InferenceBackend>> {
    match &cfg.model.path {
        Some(model_path) => {
            #[cfg(feature = "backend-tract")]
            {
                let backend = fomo_sentry::TractBackend::new(
                    model_path,
                    cfg.roi.width,
                    cfg.roi.height,
                )?;
                Ok(Box::new(backend))
            }
            #[cfg(not(feature = "backend-tract"))]
            {
                Err(anyhow::anyhow!(
                    "model inference for {} requires the backend-tract feature",
                    model_path.display()
                ))
            }
        }
        None => {
            log::warn!("no model artifact configured, using the stub backend");
            Ok(Box::new(StubBackend::new(label_count)))
        }
    }
}
