//! The two-sided nether portal pair.

use serde::Serialize;
use trailmark_core::world::{Location, WorldSpace};

/// Landmark key of the portal pair.
pub const NETHER_PORTAL: &str = "NETHER_PORTAL";

/// A newly lit portal closer than this to a known side is the same portal.
pub const PORTAL_DEDUP_RADIUS: f64 = 4.0;

/// One side of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalSide {
    /// The side in the overworld.
    Overworld,
    /// The side in the nether.
    Nether,
}

impl PortalSide {
    /// The side that lives in `space`; the end has none.
    #[must_use]
    pub fn for_space(space: WorldSpace) -> Option<Self> {
        match space {
            WorldSpace::Overworld => Some(Self::Overworld),
            WorldSpace::Nether => Some(Self::Nether),
            WorldSpace::End => None,
        }
    }
}

/// Linked portal locations, each side independently known or absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PortalPair {
    overworld: Option<Location>,
    nether: Option<Location>,
}

impl PortalPair {
    /// Location of the overworld side.
    #[must_use]
    pub fn overworld(&self) -> Option<&Location> {
        self.overworld.as_ref()
    }

    /// Location of the nether side.
    #[must_use]
    pub fn nether(&self) -> Option<&Location> {
        self.nether.as_ref()
    }

    /// Location of `side`.
    #[must_use]
    pub fn side(&self, side: PortalSide) -> Option<&Location> {
        match side {
            PortalSide::Overworld => self.overworld(),
            PortalSide::Nether => self.nether(),
        }
    }

    /// Location of the side living in `space`.
    #[must_use]
    pub fn side_in(&self, space: WorldSpace) -> Option<&Location> {
        PortalSide::for_space(space).and_then(|side| self.side(side))
    }

    /// At least one side is known.
    #[must_use]
    pub fn is_partially_known(&self) -> bool {
        self.overworld.is_some() || self.nether.is_some()
    }

    /// Both sides are known.
    #[must_use]
    pub fn is_fully_known(&self) -> bool {
        self.overworld.is_some() && self.nether.is_some()
    }

    /// Whether `location` is within [`PORTAL_DEDUP_RADIUS`] of a known side
    /// in the same space.
    #[must_use]
    pub fn is_near_known_side(&self, location: &Location) -> bool {
        [self.overworld, self.nether]
            .iter()
            .flatten()
            .filter_map(|known| known.distance_to(location))
            .any(|distance| distance <= PORTAL_DEDUP_RADIUS)
    }

    pub(crate) fn slot_mut(&mut self, side: PortalSide) -> &mut Option<Location> {
        match side {
            PortalSide::Overworld => &mut self.overworld,
            PortalSide::Nether => &mut self.nether,
        }
    }

    /// Forgets both sides.
    pub(crate) fn clear(&mut self) {
        self.overworld = None;
        self.nether = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overworld(x: f64, z: f64) -> Location {
        Location::new(WorldSpace::Overworld, x, 64.0, z)
    }

    #[test]
    fn test_empty_pair_is_unknown() {
        let pair = PortalPair::default();

        assert!(!pair.is_partially_known());
        assert!(!pair.is_fully_known());
        assert!(!pair.is_near_known_side(&overworld(0.0, 0.0)));
    }

    #[test]
    fn test_dedup_radius_is_inclusive() {
        let mut pair = PortalPair::default();
        *pair.slot_mut(PortalSide::Overworld) = Some(overworld(0.0, 0.0));

        assert!(pair.is_near_known_side(&overworld(4.0, 0.0)));
        assert!(!pair.is_near_known_side(&overworld(4.1, 0.0)));
    }

    #[test]
    fn test_dedup_only_compares_same_space() {
        let mut pair = PortalPair::default();
        *pair.slot_mut(PortalSide::Overworld) = Some(overworld(0.0, 0.0));

        let nether = Location::new(WorldSpace::Nether, 0.0, 64.0, 0.0);

        assert!(!pair.is_near_known_side(&nether));
    }

    #[test]
    fn test_end_has_no_portal_side() {
        assert_eq!(PortalSide::for_space(WorldSpace::End), None);
        assert!(PortalPair::default().side_in(WorldSpace::End).is_none());
    }
}
