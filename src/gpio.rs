//! GPIO pin drivers.
//!
//! `SysfsPin` drives a single digital output through the Linux sysfs GPIO
//! interface. `NullPin` stands in when no pin is configured, so the rest of
//! the pipeline behaves identically on development hosts.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::trigger::TriggerPin;

const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Digital output backed by /sys/class/gpio.
#[derive(Debug)]
pub struct SysfsPin {
    number: u32,
    value_path: PathBuf,
}

impl SysfsPin {
    /// Export the pin if needed, set it to output, and drive it low.
    pub fn open(number: u32) -> Result<Self> {
        Self::open_at(Path::new(SYSFS_GPIO_ROOT), number)
    }

    fn open_at(root: &Path, number: u32) -> Result<Self> {
        let pin_dir = root.join(format!("gpio{}", number));
        if !pin_dir.exists() {
            let export = root.join("export");
            std::fs::write(&export, number.to_string())
                .with_context(|| format!("failed to export gpio{} via {}", number, export.display()))?;
        }

        let direction_path = pin_dir.join("direction");
        std::fs::write(&direction_path, "out").with_context(|| {
            format!(
                "failed to set gpio{} direction via {}",
                number,
                direction_path.display()
            )
        })?;

        let mut pin = Self {
            number,
            value_path: pin_dir.join("value"),
        };
        pin.set_low()
            .with_context(|| format!("failed to drive gpio{} low at startup", number))?;
        log::info!("gpio{}: configured as output, driven low", number);
        Ok(pin)
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    fn write_value(&self, value: &str) -> Result<()> {
        std::fs::write(&self.value_path, value)
            .with_context(|| format!("failed to write gpio{} value", self.number))
    }
}

impl TriggerPin for SysfsPin {
    fn set_high(&mut self) -> Result<()> {
        self.write_value("1")
    }

    fn set_low(&mut self) -> Result<()> {
        self.write_value("0")
    }
}

/// No-op pin for hosts without GPIO. Logs level changes at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullPin;

impl TriggerPin for NullPin {
    fn set_high(&mut self) -> Result<()> {
        log::debug!("null pin: high");
        Ok(())
    }

    fn set_low(&mut self) -> Result<()> {
        log::debug!("null pin: low");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_sysfs(number: u32) -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("temp sysfs");
        let pin_dir = root.path().join(format!("gpio{}", number));
        std::fs::create_dir(&pin_dir).expect("pin dir");
        std::fs::write(pin_dir.join("direction"), "in").expect("direction file");
        std::fs::write(pin_dir.join("value"), "0").expect("value file");
        root
    }

    #[test]
    fn open_sets_direction_and_drives_low() {
        let root = fake_sysfs(17);
        let pin = SysfsPin::open_at(root.path(), 17).expect("open pin");
        assert_eq!(pin.number(), 17);

        let pin_dir = root.path().join("gpio17");
        assert_eq!(std::fs::read_to_string(pin_dir.join("direction")).unwrap(), "out");
        assert_eq!(std::fs::read_to_string(pin_dir.join("value")).unwrap(), "0");
    }

    #[test]
    fn pin_writes_levels() {
        let root = fake_sysfs(4);
        let mut pin = SysfsPin::open_at(root.path(), 4).expect("open pin");
        let value = root.path().join("gpio4/value");

        pin.set_high().expect("high");
        assert_eq!(std::fs::read_to_string(&value).unwrap(), "1");
        pin.set_low().expect("low");
        assert_eq!(std::fs::read_to_string(&value).unwrap(), "0");
    }

    #[test]
    fn unexported_pin_without_export_file_fails() {
        let root = tempfile::tempdir().expect("temp sysfs");
        let err = SysfsPin::open_at(root.path(), 9).unwrap_err();
        assert!(err.to_string().contains("export"));
    }
}
