//! World coordinate types shared by every context.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the linked coordinate spaces of the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldSpace {
    /// The surface world.
    Overworld,
    /// The nether, linked to the overworld through portals.
    Nether,
    /// The end.
    End,
}

impl WorldSpace {
    /// Stable lower-case name, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overworld => "overworld",
            Self::Nether => "nether",
            Self::End => "end",
        }
    }
}

impl fmt::Display for WorldSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in a specific coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// The coordinate space the point lives in.
    pub space: WorldSpace,
    /// East-west coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// North-south coordinate.
    pub z: f64,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub fn new(space: WorldSpace, x: f64, y: f64, z: f64) -> Self {
        Self { space, x, y, z }
    }

    /// Euclidean distance to `other`, or `None` when the two points live in
    /// different coordinate spaces.
    #[must_use]
    pub fn distance_to(&self, other: &Location) -> Option<f64> {
        if self.space != other.space {
            return None;
        }
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        Some((dx * dx + dy * dy + dz * dz).sqrt())
    }
}

/// Identity of a run participant (a player).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    /// Generates a random participant id.
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
