use log::{debug, info};

use crate::config::CHANNEL_CENTER_MS;
use crate::error::SignalError;

/// Two-channel actuator sink driven by the navigation session.
///
/// `start` and `stop` are idempotent. `update` is called once per tick and
/// must not block or acquire anything per call. A failing sink only degrades
/// feedback: the session logs the error and carries on.
pub trait SignalOutput: Send {
    fn start(&mut self) -> Result<(), SignalError>;

    fn update(&mut self, ch1_ms: f64, ch2_ms: f64) -> Result<(), SignalError>;

    /// Release whatever `start` acquired and go inert.
    fn stop(&mut self);
}

impl<S: SignalOutput + ?Sized> SignalOutput for Box<S> {
    fn start(&mut self) -> Result<(), SignalError> {
        (**self).start()
    }

    fn update(&mut self, ch1_ms: f64, ch2_ms: f64) -> Result<(), SignalError> {
        (**self).update(ch1_ms, ch2_ms)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Base tone while the channel sits at its center.
pub const TONE_BASE_HZ: f64 = 100.0;
/// Frequency shift per millisecond of CH1 deviation from center.
pub const TONE_HZ_PER_MS: f64 = 100.0;

/// Audible-feedback stand-in for the PWM hardware.
///
/// Models a square-wave tone: silent until started, a low hum at the base
/// frequency once started, pitched up or down with the CH1 deflection. No
/// audio device is opened; the tone state is tracked and logged.
#[derive(Debug)]
pub struct ToneEmulator {
    ch1_center_ms: f64,
    frequency_hz: Option<f64>,
}

impl Default for ToneEmulator {
    fn default() -> Self {
        Self::new(CHANNEL_CENTER_MS)
    }
}

impl ToneEmulator {
    pub fn new(ch1_center_ms: f64) -> Self {
        Self {
            ch1_center_ms,
            frequency_hz: None,
        }
    }

    pub fn is_emitting(&self) -> bool {
        self.frequency_hz.is_some()
    }

    /// Current tone pitch, `None` while silent.
    pub fn frequency_hz(&self) -> Option<f64> {
        self.frequency_hz
    }
}

impl SignalOutput for ToneEmulator {
    fn start(&mut self) -> Result<(), SignalError> {
        if self.frequency_hz.is_none() {
            self.frequency_hz = Some(TONE_BASE_HZ);
            info!("Tone output started at {:.1} Hz", TONE_BASE_HZ);
        }
        Ok(())
    }

    fn update(&mut self, ch1_ms: f64, ch2_ms: f64) -> Result<(), SignalError> {
        let Some(frequency) = self.frequency_hz.as_mut() else {
            return Err(SignalError::Unavailable("tone output not started".to_string()));
        };
        *frequency = TONE_BASE_HZ + (ch1_ms - self.ch1_center_ms) * TONE_HZ_PER_MS;
        debug!(
            "Tone {:.1} Hz (CH1 {:.3} ms, CH2 {:.3} ms)",
            frequency, ch1_ms, ch2_ms
        );
        Ok(())
    }

    fn stop(&mut self) {
        if self.frequency_hz.take().is_some() {
            info!("Tone output stopped");
        }
    }
}

impl Drop for ToneEmulator {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_silent_until_started() {
        let mut tone = ToneEmulator::default();
        assert!(!tone.is_emitting());
        assert!(tone.update(1.5, 1.5).is_err());
        assert_eq!(tone.frequency_hz(), None);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut tone = ToneEmulator::default();
        tone.start().unwrap();
        tone.update(2.0, 1.0).unwrap();
        tone.start().unwrap();
        // a second start keeps the current pitch
        assert_abs_diff_eq!(tone.frequency_hz().unwrap(), 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pitch_follows_ch1() {
        let mut tone = ToneEmulator::new(1.6);
        tone.start().unwrap();
        assert_eq!(tone.frequency_hz(), Some(TONE_BASE_HZ));

        tone.update(1.6, 1.4).unwrap();
        assert_abs_diff_eq!(tone.frequency_hz().unwrap(), 100.0, epsilon = 1e-9);

        tone.update(1.1, 1.9).unwrap();
        assert_abs_diff_eq!(tone.frequency_hz().unwrap(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stop_is_idempotent_and_inert() {
        let mut tone = ToneEmulator::default();
        tone.start().unwrap();
        tone.stop();
        tone.stop();
        assert!(!tone.is_emitting());
        assert!(tone.update(2.0, 1.0).is_err());
    }

    #[test]
    fn test_boxed_output() {
        let mut output: Box<dyn SignalOutput> = Box::new(ToneEmulator::default());
        output.start().unwrap();
        assert!(output.update(1.7, 1.3).is_ok());
        output.stop();
    }
}
