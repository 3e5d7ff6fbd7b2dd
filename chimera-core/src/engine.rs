//! Turn engine: turn queue, phases, and action resolution
//!
//! The engine never animates. Each resolution is one atomic state change
//! that returns what happened; the caller plays it back and then calls
//! [`TurnEngine::advance_turn`].

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::ai::{Action, TacticalAI};
use crate::config::MatchConfig;
use crate::error::{CoreError, Result};
use crate::grid::Grid;
use crate::hex::Offset;
use crate::log::CombatLog;
use crate::pathfinding::{Path, Pathfinder};
use crate::unit::{Allegiance, Unit, UnitId, UnitTemplate};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Where the turn state machine is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    TurnStart,
    AwaitingPlayerAction,
    AiActing,
    ActionResolving,
    TurnEnd,
    MatchOver,
}

/// Match result from the player's side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Victory,
    Defeat,
}

/// Result of one attack
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    pub attacker: UnitId,
    pub defender: UnitId,
    pub damage: i32,
    pub remaining_health: i32,
    pub killed: bool,
    /// Set only by the attack that ended the match
    pub outcome: Option<Outcome>,
}

/// Something the presentation layer may play back
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Moved { unit: UnitId, path: Path },
    Attacked { result: DamageResult },
    Died { unit: UnitId },
    MatchOver(Outcome),
}

// ============================================================================
// TURN ENGINE
// ============================================================================

pub struct TurnEngine {
    grid: Grid,
    units: FxHashMap<UnitId, Unit>,
    /// Live units; the head acts next
    queue: VecDeque<UnitId>,
    on_turn: Option<UnitId>,
    phase: Phase,
    outcome: Option<Outcome>,
    next_id: u32,
    turns: u32,
    ai: TacticalAI,
    log: CombatLog,
    config: MatchConfig,
}

impl TurnEngine {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    pub fn new(grid: Grid, config: MatchConfig) -> Self {
        Self {
            grid,
            units: FxHashMap::default(),
            queue: VecDeque::new(),
            on_turn: None,
            phase: Phase::TurnStart,
            outcome: None,
            next_id: 0,
            turns: 0,
            ai: TacticalAI::new(),
            log: CombatLog::new(config.log_capacity),
            config,
        }
    }

    /// Spawn a unit and append it to the turn queue
    pub fn spawn_unit(
        &mut self,
        template: &UnitTemplate,
        at: Offset,
        allegiance: Allegiance,
    ) -> Result<UnitId> {
        template.validate()?;
        let id = UnitId(self.next_id);
        let unit = self.grid.spawn_unit(id, template, at, allegiance)?;
        self.next_id += 1;
        self.units.insert(id, unit);
        self.queue.push_back(id);
        self.refresh_ranges(id)?;
        tracing::debug!("spawned {} {} at {} for {:?}", template.name, id, at, allegiance);
        Ok(id)
    }

    /// Shuffle the turn queue deterministically
    pub fn shuffle_turn_order(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.queue.make_contiguous().shuffle(&mut rng);
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pathfinder(&self) -> Pathfinder<'_> {
        Pathfinder::new(&self.grid)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    fn live_unit(&self, id: UnitId) -> Result<&Unit> {
        self.units.get(&id).ok_or(CoreError::UnknownUnit(id))
    }

    fn live_unit_mut(&mut self, id: UnitId) -> Result<&mut Unit> {
        self.units.get_mut(&id).ok_or(CoreError::UnknownUnit(id))
    }

    /// Unit whose turn it is
    pub fn unit_on_turn(&self) -> Option<&Unit> {
        self.on_turn.and_then(|id| self.units.get(&id))
    }

    /// Turn queue, head first
    pub fn queue(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.queue.iter().copied()
    }

    /// Live units in queue order
    pub fn units(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.queue.iter().filter_map(|id| self.units.get(id))
    }

    /// Live units of the other side, in queue order
    pub fn foes(&self, id: UnitId) -> Result<Vec<&Unit>> {
        let allegiance = self.live_unit(id)?.allegiance;
        Ok(self.units().filter(|u| u.allegiance != allegiance).collect())
    }

    /// Live units of the same side, excluding `id`, in queue order
    pub fn allies(&self, id: UnitId) -> Result<Vec<&Unit>> {
        let allegiance = self.live_unit(id)?.allegiance;
        Ok(self
            .units()
            .filter(|u| u.allegiance == allegiance && u.id != id)
            .collect())
    }

    /// Recompute movement and attack tiles from the unit's current state
    pub fn refresh_ranges(&mut self, id: UnitId) -> Result<()> {
        let attackable: FxHashSet<UnitId> = self.foes(id)?.iter().map(|u| u.id).collect();
        let unit = self.live_unit(id)?;
        let pathfinder = Pathfinder::new(&self.grid);

        let movement = pathfinder.reachable_set(unit.tile, unit.movement_remaining, &attackable)?;
        let attack = pathfinder.ring(unit.tile, unit.attack_range)?;

        let unit = self.live_unit_mut(id)?;
        unit.movement_tiles_in_range = movement;
        unit.attack_tiles_in_range = attack;
        Ok(())
    }

    // ========================================================================
    // TURN FLOW
    // ========================================================================

    /// Rotate the queue and start the next unit's turn.
    ///
    /// Returns the unit now on turn. Phase becomes `AiActing` for enemy
    /// units and `AwaitingPlayerAction` for player units.
    pub fn advance_turn(&mut self) -> Result<UnitId> {
        if self.phase == Phase::MatchOver {
            return Err(CoreError::MatchOver);
        }

        if let Some(prev) = self.on_turn {
            if let Some(unit) = self.units.get_mut(&prev) {
                unit.movement_remaining = 0;
                self.refresh_ranges(prev)?;
            }
        }

        self.phase = Phase::TurnStart;
        let id = self.queue.pop_front().ok_or(CoreError::EmptyTurnQueue)?;
        self.queue.push_back(id);
        self.on_turn = Some(id);
        self.turns += 1;

        let unit = self.live_unit_mut(id)?;
        unit.movement_remaining = unit.movement_range;
        let allegiance = unit.allegiance;
        self.refresh_ranges(id)?;

        self.phase = match allegiance {
            Allegiance::Enemy => Phase::AiActing,
            Allegiance::Player => Phase::AwaitingPlayerAction,
        };
        tracing::debug!("turn {}: {} ({:?})", self.turns, id, allegiance);
        Ok(id)
    }

    /// End the current unit's turn without further action
    pub fn end_turn(&mut self) -> Result<()> {
        if self.phase == Phase::MatchOver {
            return Err(CoreError::MatchOver);
        }
        self.phase = Phase::TurnEnd;
        Ok(())
    }

    /// Ask the tactical AI what the unit on turn should do
    pub fn decide(&self) -> Result<Action> {
        let unit = self.unit_on_turn().ok_or(CoreError::EmptyTurnQueue)?;
        let foes = self.foes(unit.id)?;
        self.ai.decide(&self.grid, unit, &foes)
    }

    // ========================================================================
    // RESOLUTION
    // ========================================================================

    /// Apply one attack. A kill removes the defender from play and runs the
    /// win/lose check.
    pub fn resolve_attack(&mut self, attacker: UnitId, defender: UnitId) -> Result<DamageResult> {
        if self.phase == Phase::MatchOver {
            return Err(CoreError::MatchOver);
        }

        let (damage, attacker_name) = {
            let a = self.live_unit(attacker)?;
            let d = self.live_unit(defender)?;
            (a.damage_against(d), a.name.clone())
        };

        self.phase = Phase::ActionResolving;
        let target = self.live_unit_mut(defender)?;
        let remaining_health = target.take_damage(damage);
        let defender_name = target.name.clone();

        tracing::info!(
            "{} {} attacked {} {} for {} ({} left)",
            attacker_name,
            attacker,
            defender_name,
            defender,
            damage,
            remaining_health
        );
        self.log.push(format!(
            "{} attacked {} dealing {} damage.",
            attacker_name, defender_name, damage
        ));

        let killed = remaining_health <= 0;
        let mut outcome = None;
        if killed {
            self.log.push(format!("{} killed {}.", attacker_name, defender_name));
            self.remove_unit(defender);
            outcome = self.check_win_lose();
        }

        Ok(DamageResult {
            attacker,
            defender,
            damage,
            remaining_health,
            killed,
            outcome,
        })
    }

    /// Walk `unit` along `path` one hop at a time and charge what the hops
    /// cost. `path.cost` is not trusted.
    ///
    /// The whole path is checked before anything moves.
    pub fn resolve_move(&mut self, id: UnitId, path: &Path) -> Result<i32> {
        if self.phase == Phase::MatchOver {
            return Err(CoreError::MatchOver);
        }

        let unit = self.live_unit(id)?;
        let (start, remaining) = (unit.tile, unit.movement_remaining);
        let dest = match path.destination() {
            Some(dest) => dest,
            None => return Ok(0),
        };

        let cost = self.walk_cost(start, path)?;
        if cost > remaining {
            return Err(CoreError::InsufficientMovement {
                needed: cost,
                remaining,
            });
        }

        self.phase = Phase::ActionResolving;
        let mut at = start;
        for &hop in &path.tiles {
            self.grid.move_occupant(at, hop)?;
            at = hop;
        }

        let unit = self.live_unit_mut(id)?;
        unit.tile = dest;
        unit.movement_remaining -= cost;
        let name = unit.name.clone();
        self.refresh_ranges(id)?;

        tracing::info!("{} {} moved {} -> {} (cost {})", name, id, start, dest, cost);
        self.log.push(format!("{} moved to tile {}.", name, dest));
        Ok(cost)
    }

    /// Validate and apply an action for the unit on turn.
    ///
    /// Attacks and passes end the turn. A player's plain move leaves the
    /// turn open so the unit can still attack.
    pub fn execute(&mut self, action: Action) -> Result<Vec<Event>> {
        if self.phase == Phase::MatchOver {
            return Err(CoreError::MatchOver);
        }
        let id = self.on_turn.ok_or(CoreError::EmptyTurnQueue)?;
        if !matches!(self.phase, Phase::AwaitingPlayerAction | Phase::AiActing) {
            return Err(CoreError::NotOnTurn(id));
        }

        let mut events = Vec::new();
        let mut turn_over = true;

        match action {
            Action::Attack { target } => {
                self.check_attack(id, target, self.live_unit(id)?.tile)?;
                self.attack_into(id, target, &mut events)?;
            }
            Action::MoveThenAttack { path, target } => {
                self.check_move(id, &path)?;
                let from = path.destination().unwrap_or(self.live_unit(id)?.tile);
                self.check_attack(id, target, from)?;
                self.move_into(id, path, &mut events)?;
                self.attack_into(id, target, &mut events)?;
            }
            Action::MoveOnly { path } => {
                self.check_move(id, &path)?;
                self.move_into(id, path, &mut events)?;
                turn_over = self.live_unit(id)?.allegiance == Allegiance::Enemy;
            }
            Action::PassTurn => {}
        }

        if self.phase != Phase::MatchOver {
            self.phase = if turn_over {
                Phase::TurnEnd
            } else {
                Phase::AwaitingPlayerAction
            };
        }
        Ok(events)
    }

    /// One full AI-driven turn for whoever is next, player units included
    pub fn play_turn(&mut self) -> Result<Vec<Event>> {
        self.advance_turn()?;
        let action = self.decide()?;
        self.execute(action)
    }

    /// Play turns until the match ends or the configured turn cap is hit
    pub fn autoplay(&mut self) -> Result<Option<Outcome>> {
        while self.outcome.is_none() && self.turns < self.config.max_turns {
            self.play_turn()?;
        }
        if self.outcome.is_none() {
            tracing::warn!("no result after {} turns", self.turns);
        }
        Ok(self.outcome)
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    fn check_attack(&self, id: UnitId, target: UnitId, from: Offset) -> Result<()> {
        let unit = self.live_unit(id)?;
        let foe = self.live_unit(target)?;
        if !unit.is_foe(foe) || self.grid.distance(from, foe.tile) != unit.attack_range {
            return Err(CoreError::OutOfRange {
                unit: id,
                target: foe.tile,
            });
        }
        Ok(())
    }

    fn check_move(&self, id: UnitId, path: &Path) -> Result<()> {
        let unit = self.live_unit(id)?;
        if let Some(dest) = path.destination() {
            if !unit.movement_tiles_in_range.contains(&dest) {
                return Err(CoreError::OutOfRange {
                    unit: id,
                    target: dest,
                });
            }
        }
        let cost = self.walk_cost(unit.tile, path)?;
        if cost > unit.movement_remaining {
            return Err(CoreError::InsufficientMovement {
                needed: cost,
                remaining: unit.movement_remaining,
            });
        }
        Ok(())
    }

    /// Cost of walking `path` from `start`: each hop must step onto a
    /// neighbouring empty tile and costs one movement point
    fn walk_cost(&self, start: Offset, path: &Path) -> Result<i32> {
        let mut prev = start;
        let mut cost = 0;
        for &hop in &path.tiles {
            if !self.grid.contains(hop) {
                return Err(CoreError::OutOfBounds(hop));
            }
            if self.grid.distance(prev, hop) != 1 {
                return Err(CoreError::NotAdjacent { from: prev, to: hop });
            }
            if !self.grid.is_empty(hop) {
                return Err(CoreError::OccupiedTile(hop));
            }
            cost += self.grid.distance(prev, hop);
            prev = hop;
        }
        Ok(cost)
    }

    fn move_into(&mut self, id: UnitId, path: Path, events: &mut Vec<Event>) -> Result<()> {
        if path.is_empty() {
            return Ok(());
        }
        let cost = self.resolve_move(id, &path)?;
        events.push(Event::Moved {
            unit: id,
            path: Path { cost, ..path },
        });
        Ok(())
    }

    fn attack_into(&mut self, id: UnitId, target: UnitId, events: &mut Vec<Event>) -> Result<()> {
        let result = self.resolve_attack(id, target)?;
        let killed = result.killed;
        let outcome = result.outcome;
        events.push(Event::Attacked { result });
        if killed {
            events.push(Event::Died { unit: target });
        }
        if let Some(outcome) = outcome {
            events.push(Event::MatchOver(outcome));
        }
        Ok(())
    }

    fn remove_unit(&mut self, id: UnitId) {
        self.queue.retain(|&q| q != id);
        if let Some(unit) = self.units.remove(&id) {
            self.grid.remove_occupant(unit.tile);
            tracing::info!("{} {} died", unit.name, id);
        }
        if self.on_turn == Some(id) {
            self.on_turn = None;
        }
    }

    /// Decide the match once: no enemies left is a win, no player units
    /// left is a loss (also when both sides are gone)
    fn check_win_lose(&mut self) -> Option<Outcome> {
        if self.outcome.is_some() {
            return None;
        }

        let player_alive = self.units().any(|u| u.allegiance == Allegiance::Player);
        let enemy_alive = self.units().any(|u| u.allegiance == Allegiance::Enemy);

        let outcome = if !enemy_alive && player_alive {
            Outcome::Victory
        } else if !player_alive {
            Outcome::Defeat
        } else {
            return None;
        };

        self.outcome = Some(outcome);
        self.phase = Phase::MatchOver;
        self.log.push(match outcome {
            Outcome::Victory => "VICTORY!",
            Outcome::Defeat => "DEFEAT!",
        });
        tracing::info!("match over after {} turns: {:?}", self.turns, outcome);
        Some(outcome)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Oddity;

    fn soldier() -> UnitTemplate {
        UnitTemplate::new("Soldier", 30, 10, 3, 1)
    }

    fn engine(width: i32, height: i32) -> TurnEngine {
        TurnEngine::new(
            Grid::generate(width, height, Oddity::Odd).unwrap(),
            MatchConfig::default(),
        )
    }

    #[test]
    fn test_turn_rotation() {
        let mut game = engine(8, 8);
        let a = game.spawn_unit(&soldier(), Offset::new(0, 0), Allegiance::Player).unwrap();
        let b = game.spawn_unit(&soldier(), Offset::new(7, 7), Allegiance::Enemy).unwrap();
        let c = game.spawn_unit(&soldier(), Offset::new(0, 7), Allegiance::Player).unwrap();

        assert_eq!(game.advance_turn().unwrap(), a);
        assert_eq!(game.queue().collect::<Vec<_>>(), vec![b, c, a]);
        assert_eq!(game.phase(), Phase::AwaitingPlayerAction);

        assert_eq!(game.advance_turn().unwrap(), b);
        assert_eq!(game.phase(), Phase::AiActing);
        assert_eq!(game.unit(a).unwrap().movement_remaining, 0);
        assert_eq!(game.unit(b).unwrap().movement_remaining, 3);
    }

    #[test]
    fn test_advance_on_empty_queue() {
        let mut game = engine(4, 4);
        assert_eq!(game.advance_turn(), Err(CoreError::EmptyTurnQueue));
    }

    #[test]
    fn test_bonus_attack_kills() {
        let mut game = engine(6, 6);
        let hunter = UnitTemplate::new("Hunter", 30, 10, 3, 1).with_bonus_against(&["Archer"]);
        let archer = UnitTemplate::new("Archer", 15, 6, 3, 2);
        let h = game.spawn_unit(&hunter, Offset::new(2, 2), Allegiance::Enemy).unwrap();
        let a = game.spawn_unit(&archer, Offset::new(3, 2), Allegiance::Player).unwrap();
        game.spawn_unit(&archer, Offset::new(5, 5), Allegiance::Player).unwrap();

        let result = game.resolve_attack(h, a).unwrap();
        assert_eq!(result.damage, 20);
        assert_eq!(result.remaining_health, -5);
        assert!(result.killed);
        assert_eq!(result.outcome, None);
        assert!(game.unit(a).is_none());
        assert!(game.grid().is_empty(Offset::new(3, 2)));
        assert!(!game.queue().any(|id| id == a));
    }

    #[test]
    fn test_victory_reported_once() {
        let mut game = engine(6, 6);
        let p = game.spawn_unit(&soldier(), Offset::new(0, 0), Allegiance::Player).unwrap();
        let e1 = game.spawn_unit(&soldier(), Offset::new(1, 0), Allegiance::Enemy).unwrap();
        let e2 = game.spawn_unit(&soldier(), Offset::new(4, 4), Allegiance::Enemy).unwrap();

        let mut outcomes = Vec::new();
        for target in [e1, e2] {
            for _ in 0..3 {
                if game.unit(target).is_some() {
                    outcomes.extend(game.resolve_attack(p, target).unwrap().outcome);
                }
            }
        }

        assert_eq!(outcomes, vec![Outcome::Victory]);
        assert_eq!(game.outcome(), Some(Outcome::Victory));
        assert_eq!(game.phase(), Phase::MatchOver);
        assert_eq!(game.resolve_attack(p, e1), Err(CoreError::MatchOver));
        assert_eq!(game.advance_turn(), Err(CoreError::MatchOver));
        assert_eq!(game.log().last(), Some("VICTORY!"));
    }

    #[test]
    fn test_defeat() {
        let mut game = engine(6, 6);
        let p = game.spawn_unit(&soldier(), Offset::new(0, 0), Allegiance::Player).unwrap();
        let e = game.spawn_unit(&soldier(), Offset::new(1, 0), Allegiance::Enemy).unwrap();

        game.resolve_attack(e, p).unwrap();
        game.resolve_attack(e, p).unwrap();
        let result = game.resolve_attack(e, p).unwrap();
        assert_eq!(result.outcome, Some(Outcome::Defeat));
    }

    #[test]
    fn test_resolve_move() {
        let mut game = engine(8, 8);
        let p = game.spawn_unit(&soldier(), Offset::new(1, 1), Allegiance::Player).unwrap();
        game.spawn_unit(&soldier(), Offset::new(7, 7), Allegiance::Enemy).unwrap();
        game.advance_turn().unwrap();

        let path = game
            .pathfinder()
            .find_path(Offset::new(1, 1), Offset::new(3, 1), None)
            .unwrap();
        assert_eq!(game.resolve_move(p, &path).unwrap(), 2);

        let unit = game.unit(p).unwrap();
        assert_eq!(unit.tile, Offset::new(3, 1));
        assert_eq!(unit.movement_remaining, 1);
        assert!(game.grid().is_empty(Offset::new(1, 1)));
        assert_eq!(game.grid().occupant(Offset::new(3, 1)), Some(p));
        assert!(unit.movement_tiles_in_range.contains(&Offset::new(4, 1)));
        assert!(!unit.movement_tiles_in_range.contains(&Offset::new(5, 1)));
        assert_eq!(game.phase(), Phase::ActionResolving);
    }

    #[test]
    fn test_resolve_move_rejects_bad_paths() {
        let mut game = engine(8, 8);
        let p = game.spawn_unit(&soldier(), Offset::new(1, 1), Allegiance::Player).unwrap();
        game.spawn_unit(&soldier(), Offset::new(2, 1), Allegiance::Enemy).unwrap();

        let jump = Path {
            tiles: vec![Offset::new(4, 1)],
            cost: 1,
        };
        assert_eq!(
            game.resolve_move(p, &jump),
            Err(CoreError::NotAdjacent {
                from: Offset::new(1, 1),
                to: Offset::new(4, 1)
            })
        );

        let blocked = Path {
            tiles: vec![Offset::new(2, 1)],
            cost: 1,
        };
        assert_eq!(
            game.resolve_move(p, &blocked),
            Err(CoreError::OccupiedTile(Offset::new(2, 1)))
        );
        assert_eq!(game.unit(p).unwrap().tile, Offset::new(1, 1));
    }

    #[test]
    fn test_player_move_keeps_turn_open() {
        let mut game = engine(8, 8);
        game.spawn_unit(&soldier(), Offset::new(1, 1), Allegiance::Player).unwrap();
        let e = game.spawn_unit(&soldier(), Offset::new(4, 1), Allegiance::Enemy).unwrap();
        game.advance_turn().unwrap();

        let path = game
            .pathfinder()
            .find_path(Offset::new(1, 1), Offset::new(3, 1), None)
            .unwrap();
        let events = game.execute(Action::MoveOnly { path }).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(game.phase(), Phase::AwaitingPlayerAction);

        let events = game.execute(Action::Attack { target: e }).unwrap();
        assert!(matches!(events[0], Event::Attacked { .. }));
        assert_eq!(game.phase(), Phase::TurnEnd);
        assert_eq!(game.unit(e).unwrap().current_health(), 20);
    }

    #[test]
    fn test_execute_rejects_out_of_range() {
        let mut game = engine(8, 8);
        game.spawn_unit(&soldier(), Offset::new(0, 0), Allegiance::Player).unwrap();
        let e = game.spawn_unit(&soldier(), Offset::new(6, 6), Allegiance::Enemy).unwrap();
        game.advance_turn().unwrap();

        assert!(matches!(
            game.execute(Action::Attack { target: e }),
            Err(CoreError::OutOfRange { .. })
        ));

        let far = game
            .pathfinder()
            .find_path(Offset::new(0, 0), Offset::new(5, 0), None)
            .unwrap();
        assert!(matches!(
            game.execute(Action::MoveOnly { path: far }),
            Err(CoreError::OutOfRange { .. })
        ));
        assert_eq!(game.phase(), Phase::AwaitingPlayerAction);
    }

    #[test]
    fn test_ai_turn_move_then_attack() {
        let mut game = engine(8, 8);
        let p = game.spawn_unit(&soldier(), Offset::new(1, 3), Allegiance::Player).unwrap();
        let e = game.spawn_unit(&soldier(), Offset::new(4, 3), Allegiance::Enemy).unwrap();

        game.advance_turn().unwrap();
        game.end_turn().unwrap();
        assert_eq!(game.phase(), Phase::TurnEnd);

        let events = game.play_turn().unwrap();
        assert!(matches!(events[0], Event::Moved { unit, .. } if unit == e));
        assert!(matches!(&events[1], Event::Attacked { result } if result.defender == p));
        assert_eq!(game.grid().distance(game.unit(e).unwrap().tile, Offset::new(1, 3)), 1);
        assert_eq!(game.phase(), Phase::TurnEnd);
    }

    #[test]
    fn test_autoplay_finishes() {
        let mut game = engine(8, 8);
        game.spawn_unit(&soldier(), Offset::new(0, 0), Allegiance::Player).unwrap();
        game.spawn_unit(&soldier(), Offset::new(7, 7), Allegiance::Enemy).unwrap();
        game.spawn_unit(&soldier(), Offset::new(6, 7), Allegiance::Enemy).unwrap();

        let outcome = game.autoplay().unwrap();
        assert!(outcome.is_some());
        assert_eq!(game.phase(), Phase::MatchOver);
        assert_eq!(game.log().last().map(|l| l.ends_with('!')), Some(true));
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let build = || {
            let mut game = engine(8, 8);
            for col in 0..6 {
                game.spawn_unit(&soldier(), Offset::new(col, 0), Allegiance::Player).unwrap();
            }
            game.shuffle_turn_order(11);
            game.queue().collect::<Vec<_>>()
        };
        let first = build();
        assert_eq!(first, build());
        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, (0..6).map(UnitId).collect::<Vec<_>>());
    }

    #[test]
    fn test_foes_and_allies() {
        let mut game = engine(8, 8);
        let p1 = game.spawn_unit(&soldier(), Offset::new(0, 0), Allegiance::Player).unwrap();
        let e1 = game.spawn_unit(&soldier(), Offset::new(5, 5), Allegiance::Enemy).unwrap();
        let p2 = game.spawn_unit(&soldier(), Offset::new(1, 0), Allegiance::Player).unwrap();

        let foes: Vec<_> = game.foes(p1).unwrap().iter().map(|u| u.id).collect();
        let allies: Vec<_> = game.allies(p1).unwrap().iter().map(|u| u.id).collect();
        assert_eq!(foes, vec![e1]);
        assert_eq!(allies, vec![p2]);
        assert_eq!(game.foes(UnitId(99)).unwrap_err(), CoreError::UnknownUnit(UnitId(99)));
    }

    #[test]
    fn test_move_cost_counted_from_hops() {
        let mut game = engine(12, 3);
        let p = game.spawn_unit(&soldier(), Offset::new(0, 1), Allegiance::Player).unwrap();
        game.spawn_unit(&soldier(), Offset::new(11, 0), Allegiance::Enemy).unwrap();
        game.advance_turn().unwrap();

        let forged = Path {
            tiles: vec![Offset::new(1, 1), Offset::new(2, 1), Offset::new(3, 1)],
            cost: 0,
        };
        let events = game.execute(Action::MoveOnly { path: forged }).unwrap();
        assert!(matches!(&events[0], Event::Moved { path, .. } if path.cost == 3));
        assert_eq!(game.unit(p).unwrap().movement_remaining, 0);

        let again = Path {
            tiles: vec![Offset::new(4, 1)],
            cost: -5,
        };
        assert!(matches!(
            game.execute(Action::MoveOnly { path: again }),
            Err(CoreError::OutOfRange { .. })
        ));
        let unit = game.unit(p).unwrap();
        assert_eq!(unit.tile, Offset::new(3, 1));
        assert_eq!(unit.movement_remaining, 0);
    }

    #[test]
    fn test_resolve_move_charges_walked_cost() {
        let mut game = engine(8, 8);
        let p = game.spawn_unit(&soldier(), Offset::new(1, 1), Allegiance::Player).unwrap();
        game.spawn_unit(&soldier(), Offset::new(7, 7), Allegiance::Enemy).unwrap();
        game.advance_turn().unwrap();

        let understated = Path {
            tiles: vec![Offset::new(2, 1), Offset::new(3, 1)],
            cost: 1,
        };
        assert_eq!(game.resolve_move(p, &understated), Ok(2));
        assert_eq!(game.unit(p).unwrap().movement_remaining, 1);

        let too_far = Path {
            tiles: vec![Offset::new(4, 1), Offset::new(5, 1)],
            cost: 0,
        };
        assert_eq!(
            game.resolve_move(p, &too_far),
            Err(CoreError::InsufficientMovement {
                needed: 2,
                remaining: 1
            })
        );
        assert_eq!(game.unit(p).unwrap().tile, Offset::new(3, 1));
    }

    #[test]
    fn test_execute_rejects_detour_over_budget() {
        let mut game = engine(8, 8);
        game.spawn_unit(&soldier(), Offset::new(2, 2), Allegiance::Player).unwrap();
        game.spawn_unit(&soldier(), Offset::new(7, 7), Allegiance::Enemy).unwrap();
        game.advance_turn().unwrap();

        // Ends two tiles away, but walks four hops getting there
        let detour = Path {
            tiles: vec![
                Offset::new(3, 2),
                Offset::new(4, 2),
                Offset::new(3, 2),
                Offset::new(4, 2),
            ],
            cost: 2,
        };
        assert_eq!(
            game.execute(Action::MoveOnly { path: detour }),
            Err(CoreError::InsufficientMovement {
                needed: 4,
                remaining: 3
            })
        );
        assert_eq!(game.phase(), Phase::AwaitingPlayerAction);
    }

    #[test]
    fn test_execute_after_turn_ended() {
        let mut game = engine(8, 8);
        let p = game.spawn_unit(&soldier(), Offset::new(1, 1), Allegiance::Player).unwrap();
        let e = game.spawn_unit(&soldier(), Offset::new(2, 1), Allegiance::Enemy).unwrap();
        game.spawn_unit(&soldier(), Offset::new(7, 7), Allegiance::Enemy).unwrap();

        game.advance_turn().unwrap();
        game.execute(Action::Attack { target: e }).unwrap();
        assert_eq!(game.phase(), Phase::TurnEnd);
        assert_eq!(
            game.execute(Action::Attack { target: e }),
            Err(CoreError::NotOnTurn(p))
        );
        assert_eq!(game.unit(e).unwrap().current_health(), 20);

        let e_turn = game.advance_turn().unwrap();
        assert_eq!(e_turn, e);
        game.end_turn().unwrap();
        assert_eq!(game.execute(Action::PassTurn), Err(CoreError::NotOnTurn(e)));
    }

    #[test]
    fn test_move_then_attack_out_of_range_from_destination() {
        let mut game = engine(8, 8);
        let p = game.spawn_unit(&soldier(), Offset::new(1, 1), Allegiance::Player).unwrap();
        let e = game.spawn_unit(&soldier(), Offset::new(6, 1), Allegiance::Enemy).unwrap();
        game.advance_turn().unwrap();

        let path = game
            .pathfinder()
            .find_path(Offset::new(1, 1), Offset::new(3, 1), None)
            .unwrap();
        assert_eq!(
            game.execute(Action::MoveThenAttack { path, target: e }),
            Err(CoreError::OutOfRange {
                unit: p,
                target: Offset::new(6, 1)
            })
        );

        let unit = game.unit(p).unwrap();
        assert_eq!(unit.tile, Offset::new(1, 1));
        assert_eq!(unit.movement_remaining, 3);
        assert_eq!(game.unit(e).unwrap().current_health(), 30);
    }

    #[test]
    fn test_spawn_rejects_invalid_template() {
        let mut game = engine(4, 4);
        let statue = UnitTemplate::new("Statue", 10, 0, 0, 0);
        assert!(matches!(
            game.spawn_unit(&statue, Offset::new(0, 0), Allegiance::Enemy),
            Err(CoreError::InvalidTemplate { .. })
        ));
        assert!(game.grid().is_empty(Offset::new(0, 0)));
        assert_eq!(game.queue().count(), 0);
    }
}
