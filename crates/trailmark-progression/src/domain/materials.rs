//! Material grouping and tallies.
//!
//! Item tasks may target either a concrete material (`BLAZE_ROD`) or one of
//! the canonical groups below (`LOGS`), in which case every member of the
//! group counts. The table is fixed at compile time.

use std::collections::HashMap;
use std::hash::BuildHasher;

/// Canonical group for every wood-log and stem variant.
pub const LOGS: &str = "LOGS";
/// Canonical group for every plank variant.
pub const PLANKS: &str = "PLANKS";
/// Canonical group for every cooked food.
pub const COOKED_FOOD: &str = "COOKED_FOOD";
/// Canonical group for every wool colour.
pub const WOOL: &str = "WOOL";
/// Canonical group for every bed colour.
pub const BEDS: &str = "BEDS";

const WOOD_TYPES: &[&str] = &[
    "OAK", "SPRUCE", "BIRCH", "JUNGLE", "ACACIA", "DARK_OAK", "MANGROVE", "CHERRY",
];

const NETHER_WOOD_TYPES: &[&str] = &["CRIMSON", "WARPED"];

const COLOURS: &[&str] = &[
    "WHITE",
    "ORANGE",
    "MAGENTA",
    "LIGHT_BLUE",
    "YELLOW",
    "LIME",
    "PINK",
    "GRAY",
    "LIGHT_GRAY",
    "CYAN",
    "PURPLE",
    "BLUE",
    "BROWN",
    "GREEN",
    "RED",
    "BLACK",
];

const COOKED_FOODS: &[&str] = &[
    "COOKED_BEEF",
    "COOKED_PORKCHOP",
    "COOKED_CHICKEN",
    "COOKED_MUTTON",
    "COOKED_RABBIT",
    "COOKED_COD",
    "COOKED_SALMON",
    "BAKED_POTATO",
];

/// Returns the canonical group `material` belongs to, if any.
#[must_use]
pub fn group_of(material: &str) -> Option<&'static str> {
    if COOKED_FOODS.contains(&material) {
        return Some(COOKED_FOOD);
    }
    if let Some(wood) = material.strip_suffix("_LOG") {
        return WOOD_TYPES.contains(&wood).then_some(LOGS);
    }
    if let Some(wood) = material.strip_suffix("_STEM") {
        return NETHER_WOOD_TYPES.contains(&wood).then_some(LOGS);
    }
    if let Some(wood) = material.strip_suffix("_PLANKS") {
        return (WOOD_TYPES.contains(&wood) || NETHER_WOOD_TYPES.contains(&wood))
            .then_some(PLANKS);
    }
    if let Some(colour) = material.strip_suffix("_WOOL") {
        return COLOURS.contains(&colour).then_some(WOOL);
    }
    if let Some(colour) = material.strip_suffix("_BED") {
        return COLOURS.contains(&colour).then_some(BEDS);
    }
    None
}

/// Whether an observed `material` counts toward a task targeting `target`.
#[must_use]
pub fn matches(target: &str, material: &str) -> bool {
    target == material || group_of(material) == Some(target)
}

/// A source of material counts that item progress is computed from.
pub trait MaterialTally {
    /// Total count of every material that [`matches`] `target`.
    fn total_matching(&self, target: &str) -> u64;
}

impl<S: BuildHasher> MaterialTally for HashMap<String, u64, S> {
    fn total_matching(&self, target: &str) -> u64 {
        self.iter()
            .filter(|(material, _)| matches(target, material))
            .map(|(_, count)| *count)
            .sum()
    }
}
