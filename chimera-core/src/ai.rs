//! Greedy tactical AI: one action per unit per turn

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::grid::Grid;
use crate::hex::Offset;
use crate::pathfinding::{Path, Pathfinder};
use crate::unit::{Unit, UnitId};

// ============================================================================
// ACTIONS
// ============================================================================

/// What a unit does with its turn
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Attack { target: UnitId },
    MoveThenAttack { path: Path, target: UnitId },
    MoveOnly { path: Path },
    PassTurn,
}

// ============================================================================
// TACTICAL AI
// ============================================================================

/// Three-tier policy: attack in range, else move and attack, else chase.
///
/// No lookahead and no coordination between units. Ties go to the foe
/// listed first in `foes`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TacticalAI;

impl TacticalAI {
    pub fn new() -> Self {
        Self
    }

    /// Pick an action for `unit`, whose derived ranges must be current
    pub fn decide(&self, grid: &Grid, unit: &Unit, foes: &[&Unit]) -> Result<Action> {
        let pathfinder = Pathfinder::new(grid);

        if let Some(target) = weakest_in_attack_range(unit, foes) {
            tracing::debug!("{} {}: attack {} in range", unit.name, unit.id, target.id);
            return Ok(Action::Attack { target: target.id });
        }

        if let Some(action) = move_and_attack(&pathfinder, unit, foes)? {
            tracing::debug!("{} {}: move then attack", unit.name, unit.id);
            return Ok(action);
        }

        let action = chase(&pathfinder, unit, foes)?;
        tracing::debug!("{} {}: {:?}", unit.name, unit.id, action);
        Ok(action)
    }
}

// ============================================================================
// TIERS
// ============================================================================

/// Tier 1: lowest-health foe on the attack ring
fn weakest_in_attack_range<'u>(unit: &Unit, foes: &[&'u Unit]) -> Option<&'u Unit> {
    let mut best: Option<&Unit> = None;
    for &foe in foes {
        if !unit.attack_tiles_in_range.contains(&foe.tile) {
            continue;
        }
        if best.map_or(true, |b| foe.current_health() < b.current_health()) {
            best = Some(foe);
        }
    }
    best
}

/// Tier 2: cheapest foe inside the movement set, attacked from the
/// nearest tile at attack range
fn move_and_attack(pathfinder: &Pathfinder, unit: &Unit, foes: &[&Unit]) -> Result<Option<Action>> {
    let in_reach: Vec<&Unit> = foes
        .iter()
        .copied()
        .filter(|foe| unit.movement_tiles_in_range.contains(&foe.tile))
        .collect();

    let target = match cheapest_foe(pathfinder, unit.tile, &in_reach)? {
        Some((foe, _)) => foe,
        None => return Ok(None),
    };

    let approach = pathfinder.nearest_approach_tile(
        unit.tile,
        &unit.movement_tiles_in_range,
        target.tile,
        unit.attack_range,
    )?;

    match approach {
        Some(tile) => {
            let path = pathfinder.find_path(unit.tile, tile, None)?;
            Ok(Some(Action::MoveThenAttack {
                path,
                target: target.id,
            }))
        }
        // Surrounded or otherwise unapproachable
        None => Ok(None),
    }
}

/// Tier 3: walk toward the cheapest foe anywhere on the board
fn chase(pathfinder: &Pathfinder, unit: &Unit, foes: &[&Unit]) -> Result<Action> {
    let (target, full) = match cheapest_foe(pathfinder, unit.tile, foes)? {
        Some(found) => found,
        None => return Ok(Action::PassTurn),
    };

    // Stop short of the foe's own tile
    let steps = (unit.movement_range.max(0) as usize).min(full.len() - 1);
    if steps == 0 {
        return Ok(Action::PassTurn);
    }

    let path = pathfinder.find_path(unit.tile, target.tile, Some(steps))?;
    if path.is_empty() {
        return Ok(Action::PassTurn);
    }
    Ok(Action::MoveOnly { path })
}

/// Foe with the cheapest non-empty path from `from`, with that path
fn cheapest_foe<'u>(
    pathfinder: &Pathfinder,
    from: Offset,
    foes: &[&'u Unit],
) -> Result<Option<(&'u Unit, Path)>> {
    let mut best: Option<(&Unit, Path)> = None;
    for &foe in foes {
        let path = pathfinder.find_path(from, foe.tile, None)?;
        if path.is_empty() {
            continue;
        }
        if best.as_ref().map_or(true, |(_, b)| path.cost < b.cost) {
            best = Some((foe, path));
        }
    }
    Ok(best)
}

// ============================================================================
// TESTS
// ============================================================================
