use std::fmt;

use crate::compass::wrap_180;
use crate::config::{ChannelRange, NavSessionConfig};

/// Pulse widths for the two actuator channels, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerOutput {
    pub ch1_ms: f64,
    pub ch2_ms: f64,
}

impl fmt::Display for ControllerOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH1 {:.3} ms / CH2 {:.3} ms", self.ch1_ms, self.ch2_ms)
    }
}

/// Signed heading error from `current_heading` to `desired_bearing`,
/// normalized to (-180, 180]. Positive means turn clockwise (starboard).
pub fn heading_error(current_heading: f64, desired_bearing: f64) -> f64 {
    wrap_180(desired_bearing - current_heading)
}

/// Proportional steering controller.
///
/// The heading error is scaled by the angle range into a correction in
/// [-1, 1], and the correction is spread over the two channels in opposite
/// directions around their centers. There is no integral or derivative term.
#[derive(Clone, Debug)]
pub struct SteeringController {
    angle_range_deg: f64,
    ch1: ChannelRange,
    ch2: ChannelRange,
}

impl SteeringController {
    pub fn new(angle_range_deg: f64, ch1: ChannelRange, ch2: ChannelRange) -> Self {
        Self {
            angle_range_deg,
            ch1,
            ch2,
        }
    }

    pub fn from_config(config: &NavSessionConfig) -> Self {
        Self::new(config.angle_range_deg, config.ch1, config.ch2)
    }

    pub fn angle_range_deg(&self) -> f64 {
        self.angle_range_deg
    }

    /// Correction in [-1, 1] for steering from `current_heading` onto
    /// `desired_bearing`. No bearing, or any non-finite intermediate, gives 0.
    pub fn correction(&self, current_heading: f64, desired_bearing: Option<f64>) -> f64 {
        let Some(desired) = desired_bearing else {
            return 0.0;
        };

        let error = heading_error(current_heading, desired);
        let correction = error / self.angle_range_deg;

        if correction.is_finite() {
            correction.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// Map a correction onto the two channels. CH2 moves opposite to CH1.
    pub fn channels(&self, correction: f64) -> ControllerOutput {
        let correction = if correction.is_finite() {
            correction.clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let ch1_ms = self
            .ch1
            .clamp(self.ch1.center_ms + correction * (self.ch1.span_ms() / 2.0));
        let ch2_ms = self
            .ch2
            .clamp(self.ch2.center_ms - correction * (self.ch2.span_ms() / 2.0));

        ControllerOutput { ch1_ms, ch2_ms }
    }

    /// Both channels at their configured centers.
    pub fn neutral(&self) -> ControllerOutput {
        ControllerOutput {
            ch1_ms: self.ch1.center_ms,
            ch2_ms: self.ch2.center_ms,
        }
    }

    /// Correction and channel output in one step.
    pub fn steer(&self, current_heading: f64, desired_bearing: Option<f64>) -> (f64, ControllerOutput) {
        let correction = self.correction(current_heading, desired_bearing);
        (correction, self.channels(correction))
    }
}
