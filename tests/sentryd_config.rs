use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use fomo_sentry::config::SentrydConfig;
use fomo_sentry::Roi;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SENTRY_CONFIG",
        "SENTRY_CAMERA_DEVICE",
        "SENTRY_MODEL_PATH",
        "SENTRY_LABELS_PATH",
        "SENTRY_TRIGGER_GPIO",
        "SENTRY_SERIAL_DEVICE",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "camera": {
            "device": "stub://bench",
            "width": 320,
            "height": 240,
            "target_fps": 15
        },
        "model": {
            "labels_path": "bench_labels.txt",
            "min_confidence": 0.6
        },
        "roi": {
            "x": 40,
            "y": 0,
            "width": 240,
            "height": 240
        },
        "trigger": {
            "gpio": 17,
            "fire_threshold": 0.8,
            "rearm_frames": 3,
            "pulse_ms": 50
        },
        "serial_device": "/dev/ttyS1"
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("SENTRY_CONFIG", file.path());
    std::env::set_var("SENTRY_CAMERA_DEVICE", "stub://override");
    std::env::set_var("SENTRY_TRIGGER_GPIO", "27");

    let cfg = SentrydConfig::load().expect("load config");

    assert_eq!(cfg.camera.device, "stub://override");
    assert_eq!(cfg.camera.width, 320);
    assert_eq!(cfg.camera.height, 240);
    assert_eq!(cfg.camera.target_fps, 15);
    assert_eq!(cfg.model.labels_path.to_str(), Some("bench_labels.txt"));
    assert!((cfg.model.min_confidence - 0.6).abs() < 1e-6);
    assert_eq!(
        cfg.roi,
        Roi {
            x: 40,
            y: 0,
            width: 240,
            height: 240
        }
    );
    assert_eq!(cfg.trigger.gpio, Some(27));
    assert!((cfg.trigger.fire_threshold - 0.8).abs() < 1e-6);
    assert_eq!(cfg.trigger.rearm_frames, 3);
    assert_eq!(cfg.trigger.pulse_width, Duration::from_millis(50));
    assert_eq!(cfg.serial_device.as_deref().and_then(|p| p.to_str()), Some("/dev/ttyS1"));

    clear_env();
}

#[test]
fn defaults_apply_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SentrydConfig::load().expect("load defaults");

    assert_eq!(cfg.camera.device, "stub://camera0");
    assert_eq!(cfg.roi, Roi::full_frame(240, 240));
    assert!(cfg.model.path.is_none());
    assert!(cfg.trigger.gpio.is_none());
    assert!(cfg.serial_device.is_none());

    clear_env();
}

#[test]
fn invalid_gpio_env_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SENTRY_TRIGGER_GPIO", "not-a-number");
    let err = SentrydConfig::load().unwrap_err();
    assert!(err.to_string().contains("SENTRY_TRIGGER_GPIO"));

    clear_env();
}
