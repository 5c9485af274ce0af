pub mod compass;
pub mod config;
pub mod error;
pub mod geo;
pub mod navigator;
pub mod nmea_source;
pub mod position_feed;
pub mod session;
pub mod signal;
pub mod steering;
pub mod track;
pub mod waypoint;

// Re-export commonly used types
pub use config::NavSessionConfig;
pub use error::{InvalidState, NavError, NavResult};
pub use geo::GeoPoint;
pub use navigator::Navigator;
pub use position_feed::{FixSink, PositionFix, PositionSource, SubscriptionId};
pub use session::{BoatState, NavStatus, NavigationSession, PositionMode};
pub use signal::{SignalOutput, ToneEmulator};
pub use steering::{ControllerOutput, SteeringController};
pub use waypoint::Waypoint;

#[cfg(test)]
pub(crate) mod mocks;
