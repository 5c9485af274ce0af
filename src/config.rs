use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, NavError, NavResult};

// ** CHANNEL DEFAULTS ** //
/// Physical pulse width bounds of an RC-style channel (milliseconds).
pub const CHANNEL_MIN_MS: f64 = 1.0;
pub const CHANNEL_MAX_MS: f64 = 2.0;
pub const CHANNEL_CENTER_MS: f64 = 1.5;

// ** CONTROL DEFAULTS ** //
/// Heading error (degrees) that maps to full deflection.
pub const ANGLE_RANGE_DEG: f64 = 5.0;
pub const TICK_PERIOD_MS: u64 = 1000;
/// Window for averaging reported speed before estimating ETA.
pub const AVERAGE_TIME_S: f64 = 10.0;

// ** SIMULATION DEFAULTS ** //
pub const SIMULATED_SPEED_KNOTS: f64 = 3.5;
pub const CRUISE_SPEED_KNOTS: f64 = 3.5;
/// One hour of history at the default tick rate.
pub const TRACK_CAPACITY: usize = 3600;
/// Roughly 18.5 m.
pub const ARRIVAL_RADIUS_NM: f64 = 0.01;

/// Pulse width range of one output channel, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelRange {
    pub center_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl Default for ChannelRange {
    fn default() -> Self {
        Self {
            center_ms: CHANNEL_CENTER_MS,
            min_ms: CHANNEL_MIN_MS,
            max_ms: CHANNEL_MAX_MS,
        }
    }
}

impl ChannelRange {
    pub fn with_center(center_ms: f64) -> Self {
        Self {
            center_ms,
            ..Self::default()
        }
    }

    pub fn span_ms(&self) -> f64 {
        self.max_ms - self.min_ms
    }

    pub fn clamp(&self, value_ms: f64) -> f64 {
        value_ms.clamp(self.min_ms, self.max_ms)
    }

    fn validate(&self, label: &str) -> NavResult<()> {
        let finite = self.center_ms.is_finite() && self.min_ms.is_finite() && self.max_ms.is_finite();
        if !finite || self.min_ms >= self.max_ms {
            return Err(NavError::InvalidConfig(format!(
                "{} range [{}, {}] is malformed",
                label, self.min_ms, self.max_ms
            )));
        }
        if self.center_ms < self.min_ms || self.center_ms > self.max_ms {
            return Err(NavError::InvalidConfig(format!(
                "{} center {} ms outside [{}, {}]",
                label, self.center_ms, self.min_ms, self.max_ms
            )));
        }
        Ok(())
    }
}

/// Settings captured when a navigation session starts. Immutable afterwards.
///
/// Deserializes from the app's stored settings object as well, so
/// `{"ch1Center":1.6,"angleRange":10,"averageTime":15}` is accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavSessionConfig {
    #[serde(alias = "angleRange")]
    pub angle_range_deg: f64,
    pub ch1: ChannelRange,
    pub ch2: ChannelRange,
    #[serde(alias = "ch1Center", skip_serializing)]
    pub ch1_center_ms: Option<f64>,
    #[serde(alias = "ch2Center", skip_serializing)]
    pub ch2_center_ms: Option<f64>,
    pub tick_period_ms: u64,
    #[serde(alias = "averageTime")]
    pub average_time_s: f64,
    pub simulated_speed_knots: f64,
    pub cruise_speed_knots: f64,
    pub track_capacity: usize,
    pub arrival_radius_nm: f64,
}

impl Default for NavSessionConfig {
    fn default() -> Self {
        Self {
            angle_range_deg: ANGLE_RANGE_DEG,
            ch1: ChannelRange::default(),
            ch2: ChannelRange::default(),
            ch1_center_ms: None,
            ch2_center_ms: None,
            tick_period_ms: TICK_PERIOD_MS,
            average_time_s: AVERAGE_TIME_S,
            simulated_speed_knots: SIMULATED_SPEED_KNOTS,
            cruise_speed_knots: CRUISE_SPEED_KNOTS,
            track_capacity: TRACK_CAPACITY,
            arrival_radius_nm: ARRIVAL_RADIUS_NM,
        }
    }
}

impl NavSessionConfig {
    /// Read settings from a JSON file, fold in center overrides and validate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: NavSessionConfig = serde_json::from_str(raw)?;
        let config = config.resolved();
        config.validate()?;
        Ok(config)
    }

    /// Apply the flat `ch1CenterMs`/`ch2CenterMs` overrides to the channel ranges.
    pub fn resolved(mut self) -> Self {
        if let Some(center) = self.ch1_center_ms.take() {
            self.ch1.center_ms = center;
        }
        if let Some(center) = self.ch2_center_ms.take() {
            self.ch2.center_ms = center;
        }
        self
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Number of tick samples covering `average_time_s`, at least one.
    pub fn average_window(&self) -> usize {
        let ticks = (self.average_time_s * 1000.0 / self.tick_period_ms as f64).ceil();
        if ticks.is_finite() && ticks >= 1.0 {
            ticks as usize
        } else {
            1
        }
    }

    pub fn validate(&self) -> NavResult<()> {
        if !self.angle_range_deg.is_finite() || self.angle_range_deg <= 0.0 {
            return Err(NavError::InvalidConfig(format!(
                "angle range must be positive, got {}",
                self.angle_range_deg
            )));
        }
        let mut ch1 = self.ch1;
        let mut ch2 = self.ch2;
        if let Some(center) = self.ch1_center_ms {
            ch1.center_ms = center;
        }
        if let Some(center) = self.ch2_center_ms {
            ch2.center_ms = center;
        }
        ch1.validate("ch1")?;
        ch2.validate("ch2")?;
        if self.tick_period_ms == 0 {
            return Err(NavError::InvalidConfig("tick period must be non-zero".to_string()));
        }
        if !self.average_time_s.is_finite() || self.average_time_s <= 0.0 {
            return Err(NavError::InvalidConfig(format!(
                "average time must be positive, got {}",
                self.average_time_s
            )));
        }
        if !self.simulated_speed_knots.is_finite() || self.simulated_speed_knots < 0.0 {
            return Err(NavError::InvalidConfig(format!(
                "simulated speed must be non-negative, got {}",
                self.simulated_speed_knots
            )));
        }
        if !self.cruise_speed_knots.is_finite() || self.cruise_speed_knots <= 0.0 {
            return Err(NavError::InvalidConfig(format!(
                "cruise speed must be positive, got {}",
                self.cruise_speed_knots
            )));
        }
        if self.track_capacity == 0 {
            return Err(NavError::InvalidConfig("track capacity must be non-zero".to_string()));
        }
        if !self.arrival_radius_nm.is_finite() || self.arrival_radius_nm < 0.0 {
            return Err(NavError::InvalidConfig(format!(
                "arrival radius must be non-negative, got {}",
                self.arrival_radius_nm
            )));
        }
        Ok(())
    }
}
