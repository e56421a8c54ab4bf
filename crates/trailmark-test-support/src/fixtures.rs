//! Shared fixtures.

use chrono::{DateTime, TimeZone, Utc};

/// Fixed timestamp used across tests.
///
/// # Panics
///
/// Never; the literal date is valid.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

/// A five-stage speedrun route, in the stage-definition YAML shape.
///
/// Kept as text so crates below the run layer can parse it into their own
/// definition types.
pub const SPEEDRUN_STAGES_YAML: &str = r"
- key: wood
  world: overworld
  tasks:
    - key: ITEM_LOGS
      kind: item
      amount: 16
    - key: ITEM_COOKED_FOOD
      kind: item
      amount: 8
- key: find_village
  world: overworld
  tasks:
    - key: STRUCTURE_VILLAGE
      kind: structure
- key: enter_nether
  world: nether
  tasks:
    - key: STRUCTURE_NETHER_PORTAL
      kind: structure
    - key: STRUCTURE_NETHER_FORTRESS
      kind: structure
- key: blaze
  world: nether
  tasks:
    - key: ITEM_BLAZE_ROD
      kind: item
      amount: 6
      display_name: Blaze Rods
      scaling_eligible: false
    - key: ITEM_ENDER_PEARL
      kind: item
      amount: 12
- key: stronghold
  world: overworld
  tasks:
    - key: STRUCTURE_STRONGHOLD
      kind: structure
";
