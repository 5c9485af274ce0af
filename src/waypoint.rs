use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, NavError, NavResult};
use crate::geo::GeoPoint;

/// Waypoint ids are the memory slots 1 through 10.
pub const MAX_WAYPOINTS: u8 = 10;

/// A named navigation target.
///
/// Serialized flat, `{"id":1,"name":"Cala Gavetta","lat":41.21,"lng":9.40}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: u8,
    pub name: String,
    #[serde(flatten)]
    pub position: GeoPoint,
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {}", self.id, self.name, self.position)
    }
}

impl Waypoint {
    pub fn new(id: u8, name: impl Into<String>, position: GeoPoint) -> NavResult<Self> {
        let waypoint = Self {
            id,
            name: name.into(),
            position,
        };
        waypoint.validate()?;
        Ok(waypoint)
    }

    pub fn validate(&self) -> NavResult<()> {
        if self.id == 0 || self.id > MAX_WAYPOINTS {
            return Err(NavError::InvalidWaypoint(format!(
                "id {} outside 1..={}",
                self.id, MAX_WAYPOINTS
            )));
        }
        if self.name.trim().is_empty() {
            return Err(NavError::InvalidWaypoint(format!("waypoint {} has no name", self.id)));
        }
        Ok(())
    }
}

/// Read a stored waypoint list and check every entry, including id uniqueness.
pub fn load_waypoints<P: AsRef<Path>>(path: P) -> Result<Vec<Waypoint>, ConfigError> {
    let raw = fs::read_to_string(path)?;
    parse_waypoints(&raw)
}

pub fn parse_waypoints(raw: &str) -> Result<Vec<Waypoint>, ConfigError> {
    let waypoints: Vec<Waypoint> = serde_json::from_str(raw)?;
    let mut seen = [false; MAX_WAYPOINTS as usize + 1];
    for waypoint in &waypoints {
        waypoint.validate()?;
        let slot = &mut seen[waypoint.id as usize];
        if *slot {
            return Err(NavError::InvalidWaypoint(format!("duplicate id {}", waypoint.id)).into());
        }
        *slot = true;
    }
    Ok(waypoints)
}
