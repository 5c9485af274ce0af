//! Position feed plumbing between an external source and the navigation tick.
//!
//! A source pushes [`PositionFix`]es into a [`FixSink`] from whatever thread it
//! runs on. The sink only stages the latest fix (last write wins); the tick
//! drains it. Once the session closes the sink, late pushes are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::error::FeedError;
use crate::geo::GeoPoint;

/// One sample from a position feed. Heading and speed may be missing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionFix {
    pub position: GeoPoint,
    /// Course over ground, degrees true.
    pub heading_deg: Option<f64>,
    pub speed_knots: Option<f64>,
}

impl PositionFix {
    pub fn new(position: GeoPoint) -> Self {
        Self {
            position,
            heading_deg: None,
            speed_knots: None,
        }
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_deg = Some(heading_deg);
        self
    }

    pub fn with_speed(mut self, speed_knots: f64) -> Self {
        self.speed_knots = Some(speed_knots);
        self
    }

    /// Drop heading/speed values that cannot be used. `None` if the position
    /// itself is unusable.
    fn sanitized(self) -> Option<Self> {
        if !self.position.is_finite() {
            return None;
        }
        Some(Self {
            position: self.position,
            heading_deg: self.heading_deg.filter(|h| h.is_finite()),
            speed_knots: self.speed_knots.filter(|s| s.is_finite() && *s >= 0.0),
        })
    }
}

impl From<GeoPoint> for PositionFix {
    fn from(position: GeoPoint) -> Self {
        PositionFix::new(position)
    }
}

/// Handle returned by [`PositionSource::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// External position provider, e.g. a GPS receiver or a recorded log.
pub trait PositionSource: Send {
    /// Begin delivering fixes into `sink`. Delivery may happen on any thread.
    fn subscribe(&mut self, sink: FixSink) -> Result<SubscriptionId, FeedError>;

    /// Stop delivering for `id`. Must be safe to call more than once.
    fn unsubscribe(&mut self, id: SubscriptionId);
}

#[derive(Debug)]
struct Slot {
    open: bool,
    staged: Option<PositionFix>,
}

/// Single-slot mailbox a position source writes into.
#[derive(Clone, Debug)]
pub struct FixSink {
    slot: Arc<Mutex<Slot>>,
}

impl Default for FixSink {
    fn default() -> Self {
        Self::new()
    }
}

impl FixSink {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                open: true,
                staged: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // the slot holds plain data, a panicked writer cannot leave it torn
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stage `fix`, replacing anything not yet consumed. Returns whether the
    /// fix was accepted. Never blocks on the tick.
    pub fn push(&self, fix: PositionFix) -> bool {
        let Some(fix) = fix.sanitized() else {
            warn!("Dropping malformed position fix: {:?}", fix);
            return false;
        };

        let mut slot = self.lock();
        if !slot.open {
            debug!("Dropping fix delivered after teardown: {}", fix.position);
            return false;
        }
        slot.staged = Some(fix);
        true
    }

    /// Consume the staged fix, if any.
    pub fn take(&self) -> Option<PositionFix> {
        self.lock().staged.take()
    }

    /// Refuse all further pushes and discard anything staged.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.open = false;
        slot.staged = None;
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }
}
