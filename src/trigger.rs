//! Debounced hardware trigger.
//!
//! Converts "at least one sufficiently confident detection this frame" into a
//! single bounded-width pulse on a digital output, with re-arm logic so a
//! sustained detection episode fires exactly once. The controller owns all
//! trigger state; nothing here is process-global.
//!
//! Pin writes are fire-and-forget: there is no acknowledgement channel, so
//! write failures are logged and never propagated.

use anyhow::Result;
use std::time::Duration;

use crate::filter::ClassDetections;

/// A single digital output used only for timed pulses.
pub trait TriggerPin: Send {
    fn set_high(&mut self) -> Result<()>;
    fn set_low(&mut self) -> Result<()>;
}

impl<T: TriggerPin + ?Sized> TriggerPin for Box<T> {
    fn set_high(&mut self) -> Result<()> {
        (**self).set_high()
    }

    fn set_low(&mut self) -> Result<()> {
        (**self).set_low()
    }
}

/// Trigger tuning knobs.
#[derive(Clone, Copy, Debug)]
pub struct TriggerConfig {
    /// Minimum detection score that counts as a hit.
    pub fire_threshold: f32,
    /// Consecutive detection-free frames required to re-arm.
    pub rearm_frames: u32,
    /// Width of the emitted pulse.
    pub pulse_width: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            fire_threshold: 0.70,
            rearm_frames: 5,
            pulse_width: Duration::from_millis(30),
        }
    }
}

/// Debounce state machine driving a `TriggerPin`.
///
/// Two logical states: ARMED (`frames_since_hit >= rearm_frames`) and
/// REFRACTORY. A fired pulse moves ARMED to REFRACTORY; `rearm_frames`
/// consecutive detection-free frames move it back. Starts ARMED.
pub struct TriggerController<P: TriggerPin> {
    pin: P,
    config: TriggerConfig,
    frames_since_hit: u32,
    pulses_fired: u64,
}

impl<P: TriggerPin> TriggerController<P> {
    /// Take ownership of the pin and start armed, with the pin driven low.
    pub fn new(mut pin: P, config: TriggerConfig) -> Self {
        if let Err(err) = pin.set_low() {
            log::warn!("trigger pin initial low failed: {:#}", err);
        }
        Self {
            pin,
            frames_since_hit: config.rearm_frames,
            config,
            pulses_fired: 0,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.frames_since_hit >= self.config.rearm_frames
    }

    pub fn pulses_fired(&self) -> u64 {
        self.pulses_fired
    }

    /// Feed one frame's filtered detections. Returns true when a pulse fired.
    ///
    /// Blocks the caller for the full pulse width when it fires.
    pub fn observe_frame(&mut self, groups: &[ClassDetections]) -> bool {
        let hit = groups
            .iter()
            .flat_map(|group| group.detections.iter())
            .any(|det| det.score >= self.config.fire_threshold);

        if hit {
            if self.is_armed() {
                self.pulse();
                self.frames_since_hit = 0;
                return true;
            }
            // Refractory window: the episode is still running.
            return false;
        }

        self.frames_since_hit = self.config.rearm_frames.min(self.frames_since_hit + 1);
        false
    }

    /// Emit one bounded-width pulse. The guard forces the pin low on every
    /// exit path so an interrupted pulse cannot leave the output stuck high.
    fn pulse(&mut self) {
        let guard = PulseGuard::raise(&mut self.pin);
        std::thread::sleep(self.config.pulse_width);
        drop(guard);
        self.pulses_fired += 1;
        log::info!(
            "trigger pulse #{} ({} ms)",
            self.pulses_fired,
            self.config.pulse_width.as_millis()
        );
    }

    /// Force the pin low. Called on shutdown.
    pub fn release(&mut self) {
        if let Err(err) = self.pin.set_low() {
            log::warn!("trigger pin release failed: {:#}", err);
        }
    }
}

/// Scoped high level on a pin; drop drives it low again.
struct PulseGuard<'a, P: TriggerPin> {
    pin: &'a mut P,
}

impl<'a, P: TriggerPin> PulseGuard<'a, P> {
    fn raise(pin: &'a mut P) -> Self {
        if let Err(err) = pin.set_high() {
            log::warn!("trigger pin high failed: {:#}", err);
        }
        Self { pin }
    }
}

impl<P: TriggerPin> Drop for PulseGuard<'_, P> {
    fn drop(&mut self) {
        if let Err(err) = self.pin.set_low() {
            log::warn!("trigger pin low failed: {:#}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::Detection;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum PinEvent {
        High,
        Low,
    }

    #[derive(Clone, Default)]
    struct MockPin {
        events: Arc<Mutex<Vec<PinEvent>>>,
    }

    impl MockPin {
        fn events(&self) -> Vec<PinEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl TriggerPin for MockPin {
        fn set_high(&mut self) -> Result<()> {
            self.events.lock().unwrap().push(PinEvent::High);
            Ok(())
        }

        fn set_low(&mut self) -> Result<()> {
            self.events.lock().unwrap().push(PinEvent::Low);
            Ok(())
        }
    }

    fn group(score: f32) -> Vec<ClassDetections> {
        vec![ClassDetections {
            class_index: 1,
            label: "rock".into(),
            detections: vec![Detection {
                class_index: 1,
                x: 0,
                y: 0,
                w: 8,
                h: 8,
                score,
            }],
        }]
    }

    fn fast_config() -> TriggerConfig {
        TriggerConfig {
            pulse_width: Duration::from_millis(1),
            ..TriggerConfig::default()
        }
    }

    #[test]
    fn armed_hit_fires_exactly_one_pulse() {
        let pin = MockPin::default();
        let mut trigger = TriggerController::new(pin.clone(), fast_config());
        assert!(trigger.is_armed());

        assert!(trigger.observe_frame(&group(0.9)));
        assert!(!trigger.is_armed());
        assert_eq!(trigger.pulses_fired(), 1);
        // Initial low, then one high/low pulse.
        assert_eq!(pin.events(), vec![PinEvent::Low, PinEvent::High, PinEvent::Low]);
    }

    #[test]
    fn sustained_episode_fires_once() {
        let mut trigger = TriggerController::new(MockPin::default(), fast_config());

        assert!(trigger.observe_frame(&group(0.9)));
        for _ in 0..10 {
            assert!(!trigger.observe_frame(&group(0.9)));
        }
        assert_eq!(trigger.pulses_fired(), 1);
    }

    #[test]
    fn rearms_after_five_quiet_frames() {
        let mut trigger = TriggerController::new(MockPin::default(), fast_config());

        assert!(trigger.observe_frame(&group(0.9)));
        for i in 0..5 {
            assert!(!trigger.observe_frame(&[]), "quiet frame {i} must not fire");
        }
        assert!(trigger.is_armed());
        assert!(trigger.observe_frame(&group(0.9)));
        assert_eq!(trigger.pulses_fired(), 2);
    }

    #[test]
    fn hit_during_refractory_does_not_fire() {
        let mut trigger = TriggerController::new(MockPin::default(), fast_config());

        assert!(trigger.observe_frame(&group(0.9)));
        // Partial re-arm, then another hit: still refractory.
        for _ in 0..3 {
            trigger.observe_frame(&[]);
        }
        assert!(!trigger.observe_frame(&group(0.9)));
        assert_eq!(trigger.pulses_fired(), 1);
    }

    #[test]
    fn low_scores_do_not_count_as_hits() {
        let mut trigger = TriggerController::new(MockPin::default(), fast_config());
        assert!(!trigger.observe_frame(&group(0.5)));
        assert!(trigger.is_armed());
        assert_eq!(trigger.pulses_fired(), 0);
    }

    #[test]
    fn quiet_counter_saturates_at_rearm_threshold() {
        let mut trigger = TriggerController::new(MockPin::default(), fast_config());
        trigger.observe_frame(&group(0.9));
        for _ in 0..100 {
            trigger.observe_frame(&[]);
        }
        // Saturated counter still fires on the next hit.
        assert!(trigger.observe_frame(&group(0.9)));
    }

    #[test]
    fn pulse_guard_releases_pin_on_drop() {
        let pin = MockPin::default();
        {
            let mut owned = pin.clone();
            let _guard = PulseGuard::raise(&mut owned);
        }
        assert_eq!(pin.events(), vec![PinEvent::High, PinEvent::Low]);
    }
}
