//! Bearing triangulation.
//!
//! Two observers in the same coordinate space each report a position and a
//! heading toward an undiscovered landmark; the landmark is predicted at the
//! intersection of the two lines. Headings are in radians, measured
//! clockwise, with heading `0` pointing toward `+z` and `-pi/2` toward `+x`
//! (the host world's yaw convention).

use serde::{Deserialize, Serialize};
use trailmark_core::error::DomainError;
use trailmark_core::world::Location;

/// Below this magnitude the two directions are treated as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-10;

/// A point in the horizontal plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// East-west coordinate.
    pub x: f64,
    /// North-south coordinate.
    pub z: f64,
}

/// Unit direction for `heading`.
#[must_use]
pub fn direction(heading: f64) -> Point2D {
    Point2D {
        x: (-heading).sin(),
        z: (-heading).cos(),
    }
}

/// Intersects the line through `(x1, z1)` along `heading1` with the line
/// through `(x2, z2)` along `heading2`.
///
/// Returns `None` when the headings are parallel or anti-parallel. The
/// intersection is not restricted to the forward half of either line.
#[must_use]
pub fn intersect(x1: f64, z1: f64, heading1: f64, x2: f64, z2: f64, heading2: f64) -> Option<Point2D> {
    let d1 = direction(heading1);
    let d2 = direction(heading2);
    let det = d1.x * d2.z - d1.z * d2.x;
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let (dx, dz) = (x2 - x1, z2 - z1);
    let t = (dx * d2.z - dz * d2.x) / det;
    Some(Point2D {
        x: x1 + t * d1.x,
        z: z1 + t * d1.z,
    })
}

/// A heading observed from a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bearing {
    /// Where the observer stood.
    pub origin: Location,
    /// Heading in radians.
    pub heading: f64,
}

impl Bearing {
    /// Builds a bearing from a yaw in degrees.
    #[must_use]
    pub fn from_yaw_degrees(origin: Location, yaw: f64) -> Self {
        Self {
            origin,
            heading: yaw.to_radians(),
        }
    }
}

/// Predicts a landmark location from two bearings.
///
/// The result lies in the bearings' coordinate space with `y` set to
/// `placeholder_y`, since only the horizontal position can be recovered.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the bearings were taken in
/// different coordinate spaces.
pub fn predict_location(
    first: &Bearing,
    second: &Bearing,
    placeholder_y: f64,
) -> Result<Option<Location>, DomainError> {
    if first.origin.space != second.origin.space {
        return Err(DomainError::Validation(format!(
            "bearings taken in different spaces: {} and {}",
            first.origin.space, second.origin.space
        )));
    }
    let point = intersect(
        first.origin.x,
        first.origin.z,
        first.heading,
        second.origin.x,
        second.origin.z,
        second.heading,
    );
    Ok(point.map(|p| Location::new(first.origin.space, p.x, placeholder_y, p.z)))
}
