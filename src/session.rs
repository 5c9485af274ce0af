//! Navigation session state machine.
//!
//! A session owns the boat state, the actuator sink and the subscription to an
//! external position feed. `tick` is the only writer of derived state: it
//! drains the staged fix (or dead-reckons when the feed is silent), runs the
//! steering controller, pushes the channel values to the sink, updates ETA
//! and appends to the track.

use std::fmt;

use log::{debug, info, warn};

use crate::compass::{Point, wrap_360};
use crate::config::NavSessionConfig;
use crate::error::{InvalidState, NavError, NavResult};
use crate::geo::{GeoPoint, SAME_POINT_NM};
use crate::position_feed::{FixSink, PositionFix, PositionSource, SubscriptionId};
use crate::signal::SignalOutput;
use crate::steering::{ControllerOutput, SteeringController};
use crate::track::{SpeedAverager, TrackHistory};
use crate::waypoint::Waypoint;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Where this tick's position came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionMode {
    /// A fix arrived from the position feed since the last tick.
    Live,
    /// No fix; advanced toward the target at the simulated speed.
    DeadReckoning,
    /// No fix and no target; position held.
    Holding,
}

impl fmt::Display for PositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionMode::Live => write!(f, "live"),
            PositionMode::DeadReckoning => write!(f, "dead reckoning"),
            PositionMode::Holding => write!(f, "holding"),
        }
    }
}

/// Boat state as last written by the tick.
#[derive(Clone, Debug)]
pub struct BoatState {
    pub position: GeoPoint,
    pub heading_deg: f64,
    pub speed_knots: f64,
    pub is_navigating: bool,
    pub track: TrackHistory,
}

impl Default for BoatState {
    fn default() -> Self {
        Self {
            position: GeoPoint::default(),
            heading_deg: 0.0,
            speed_knots: 0.0,
            is_navigating: false,
            track: TrackHistory::new(1),
        }
    }
}

/// Snapshot produced by every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct NavStatus {
    pub position: GeoPoint,
    pub heading_deg: f64,
    pub speed_knots: f64,
    pub target: Option<String>,
    pub bearing_deg: Option<f64>,
    pub distance_nm: Option<f64>,
    pub eta_minutes: f64,
    pub correction: f64,
    pub output: ControllerOutput,
    pub mode: PositionMode,
    pub arrived: bool,
}

impl fmt::Display for NavStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} HDG {:05.1}° ({}) KNT {:.1}",
            self.position,
            self.heading_deg,
            Point::from_heading(self.heading_deg),
            self.speed_knots
        )?;
        match (&self.target, self.bearing_deg, self.distance_nm) {
            (Some(name), Some(bearing), Some(distance)) => write!(
                f,
                " | {} BRG {:05.1}° {:.2} NM time {:.0} m.",
                name, bearing, distance, self.eta_minutes
            )?,
            _ => write!(f, " | NO WAYPOINT")?,
        }
        write!(f, " | {} [{}]", self.output, self.mode)?;
        if self.arrived {
            write!(f, " ARRIVED")?;
        }
        Ok(())
    }
}

struct ActiveSession {
    config: NavSessionConfig,
    controller: SteeringController,
    source: Option<Box<dyn PositionSource>>,
    subscription: Option<SubscriptionId>,
    sink: FixSink,
    target: Option<Waypoint>,
    eta_minutes: f64,
    speed: SpeedAverager,
    last_output: ControllerOutput,
    last_status: Option<NavStatus>,
    mode: Option<PositionMode>,
    arrived: bool,
}

/// Single-owner navigation control loop.
///
/// `Idle -> Active -> Idle`. The session does not schedule itself; call
/// [`tick`](Self::tick) once per `tickPeriodMs`, or hand it to a
/// [`Navigator`](crate::navigator::Navigator).
pub struct NavigationSession<S: SignalOutput> {
    signal: S,
    boat: BoatState,
    active: Option<ActiveSession>,
}

impl<S: SignalOutput> NavigationSession<S> {
    pub fn new(signal: S) -> Self {
        Self {
            signal,
            boat: BoatState::default(),
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn boat(&self) -> &BoatState {
        &self.boat
    }

    pub fn signal(&self) -> &S {
        &self.signal
    }

    pub fn config(&self) -> Option<&NavSessionConfig> {
        self.active.as_ref().map(|a| &a.config)
    }

    pub fn target(&self) -> Option<&Waypoint> {
        self.active.as_ref().and_then(|a| a.target.as_ref())
    }

    /// Minutes to the target, 0 when there is none.
    pub fn eta_minutes(&self) -> f64 {
        self.active.as_ref().map_or(0.0, |a| a.eta_minutes)
    }

    pub fn last_output(&self) -> Option<ControllerOutput> {
        self.active.as_ref().map(|a| a.last_output)
    }

    pub fn last_status(&self) -> Option<&NavStatus> {
        self.active.as_ref().and_then(|a| a.last_status.as_ref())
    }

    fn active_mut(&mut self) -> NavResult<&mut ActiveSession> {
        self.active
            .as_mut()
            .ok_or(NavError::InvalidState(InvalidState::NotActive))
    }

    /// Begin navigating from `initial`.
    ///
    /// Clears the track, starts the signal output and subscribes to `source`
    /// if one is given. A source that fails to subscribe is logged and the
    /// session runs on dead reckoning.
    pub fn start(
        &mut self,
        initial: impl Into<PositionFix>,
        source: Option<Box<dyn PositionSource>>,
        config: NavSessionConfig,
    ) -> NavResult<()> {
        if self.active.is_some() {
            return Err(NavError::InvalidState(InvalidState::AlreadyActive));
        }

        let config = config.resolved();
        config.validate()?;

        let initial = initial.into();
        if !initial.position.is_finite() {
            return Err(NavError::InvalidConfig(format!(
                "initial position {} is not a valid coordinate",
                initial.position
            )));
        }

        self.boat = BoatState {
            position: initial.position,
            heading_deg: initial
                .heading_deg
                .filter(|h| h.is_finite())
                .map(wrap_360)
                .unwrap_or(0.0),
            speed_knots: initial
                .speed_knots
                .filter(|s| s.is_finite() && *s >= 0.0)
                .unwrap_or(0.0),
            is_navigating: true,
            track: TrackHistory::new(config.track_capacity),
        };

        if let Err(e) = self.signal.start() {
            warn!("Signal output failed to start: {}", e);
        }

        let sink = FixSink::new();
        let mut source = source;
        let subscription = match source.as_mut() {
            Some(feed) => match feed.subscribe(sink.clone()) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Position feed unavailable, dead reckoning only: {}", e);
                    None
                }
            },
            None => None,
        };

        let controller = SteeringController::from_config(&config);
        let neutral = controller.neutral();
        info!(
            "Navigation started at {} (angle range {:.1}°, tick {} ms, feed {})",
            self.boat.position,
            config.angle_range_deg,
            config.tick_period_ms,
            if subscription.is_some() { "subscribed" } else { "none" }
        );

        self.active = Some(ActiveSession {
            speed: SpeedAverager::new(config.average_window()),
            config,
            controller,
            source,
            subscription,
            sink,
            target: None,
            eta_minutes: 0.0,
            last_output: neutral,
            last_status: None,
            mode: None,
            arrived: false,
        });
        Ok(())
    }

    /// Select the target; takes effect on the next tick. `None` clears it.
    pub fn set_target(&mut self, target: Option<Waypoint>) -> NavResult<()> {
        let active = self.active_mut()?;
        match &target {
            Some(waypoint) => info!("Target set to {}", waypoint),
            None => info!("Target cleared"),
        }
        active.target = target;
        active.arrived = false;
        Ok(())
    }

    /// Forget the target, the track and the ETA. The session stays active.
    pub fn clear_route(&mut self) -> NavResult<()> {
        let active = self.active_mut()?;
        active.target = None;
        active.eta_minutes = 0.0;
        active.arrived = false;
        self.boat.track.clear();
        info!("Route cleared");
        Ok(())
    }

    /// Tear the session down. Idempotent.
    ///
    /// After this returns the feed sink is closed, the subscription released
    /// and the signal output reset to center and stopped. Nothing further
    /// touches the boat state.
    pub fn stop(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        active.sink.close();
        if let (Some(source), Some(id)) = (active.source.as_mut(), active.subscription.take()) {
            source.unsubscribe(id);
        }
        let neutral = active.controller.neutral();
        if let Err(e) = self.signal.update(neutral.ch1_ms, neutral.ch2_ms) {
            debug!("Neutral reset on stop failed: {}", e);
        }
        self.signal.stop();
        self.boat.is_navigating = false;
        info!(
            "Navigation stopped at {} with {} track points",
            self.boat.position,
            self.boat.track.len()
        );
    }

    /// Run one control-loop iteration.
    pub fn tick(&mut self) -> NavResult<NavStatus> {
        let Some(active) = self.active.as_mut() else {
            return Err(NavError::InvalidState(InvalidState::NotActive));
        };
        let boat = &mut self.boat;
        let config = &active.config;

        let previous = boat.position;
        let target = active.target.as_ref().map(|w| w.position);

        // Resolve the position sample. `steer_heading` is what the boat was
        // measured pointing at; `course` becomes the new boat heading.
        let (position, steer_heading, course, speed, mode) = match active.sink.take() {
            Some(fix) => {
                let moved = previous.distance_to(&fix.position) > SAME_POINT_NM;
                let heading = fix
                    .heading_deg
                    .map(wrap_360)
                    .or_else(|| moved.then(|| previous.bearing_to(&fix.position)))
                    .unwrap_or(boat.heading_deg);
                let speed = fix.speed_knots.unwrap_or(boat.speed_knots);
                (fix.position, heading, heading, speed, PositionMode::Live)
            }
            None => match target {
                Some(target) => {
                    let step = config.simulated_speed_knots * config.tick_period_ms as f64 / MS_PER_HOUR;
                    let remaining = previous.distance_to(&target);
                    let course = previous.bearing_to(&target);
                    let next = if step >= remaining {
                        target
                    } else {
                        previous.project(course, step)
                    };
                    if next.is_finite() && course.is_finite() {
                        (
                            next,
                            boat.heading_deg,
                            course,
                            config.simulated_speed_knots,
                            PositionMode::DeadReckoning,
                        )
                    } else {
                        warn!("Cannot dead reckon toward {}, holding position", target);
                        (previous, boat.heading_deg, boat.heading_deg, 0.0, PositionMode::Holding)
                    }
                }
                None => (
                    previous,
                    boat.heading_deg,
                    boat.heading_deg,
                    boat.speed_knots,
                    PositionMode::Holding,
                ),
            },
        };

        if active.mode != Some(mode) {
            match active.mode {
                Some(previous_mode) => info!("Position source: {} -> {}", previous_mode, mode),
                None => info!("Position source: {}", mode),
            }
            active.mode = Some(mode);
        }

        let leg = target.map(|t| (position.bearing_to(&t), position.distance_to(&t)));
        let arrived = matches!(leg, Some((_, distance)) if distance <= config.arrival_radius_nm);
        if arrived && !active.arrived {
            if let Some(waypoint) = &active.target {
                info!("Arrived at {}", waypoint);
            }
        }
        active.arrived = arrived;

        let desired = if arrived { None } else { leg.map(|(bearing, _)| bearing) };
        let (correction, output) = active.controller.steer(steer_heading, desired);
        if let Err(e) = self.signal.update(output.ch1_ms, output.ch2_ms) {
            warn!("Signal output update failed: {}", e);
        }

        active.speed.push(speed);
        active.eta_minutes = match leg {
            Some((_, distance)) if !arrived && distance.is_finite() => {
                let knots = active
                    .speed
                    .average()
                    .filter(|s| *s > 0.0)
                    .unwrap_or(config.cruise_speed_knots);
                distance / knots * 60.0
            }
            _ => 0.0,
        };

        if target.is_some() || mode == PositionMode::Live {
            boat.track.push(position);
        }
        boat.position = position;
        boat.heading_deg = wrap_360(course);
        boat.speed_knots = speed;
        active.last_output = output;

        let status = NavStatus {
            position,
            heading_deg: boat.heading_deg,
            speed_knots: speed,
            target: active.target.as_ref().map(|w| w.name.clone()),
            bearing_deg: leg.map(|(bearing, _)| bearing),
            distance_nm: leg.map(|(_, distance)| distance),
            eta_minutes: active.eta_minutes,
            correction,
            output,
            mode,
            arrived,
        };
        debug!("{}", status);
        active.last_status = Some(status.clone());
        Ok(status)
    }
}

impl<S: SignalOutput> Drop for NavigationSession<S> {
    fn drop(&mut self) {
        // Ensure the output goes inert on abnormal teardown
        self.stop();
    }
}
