//! Pathfinding and range queries over a [`Grid`]
//!
//! - `find_path`: weighted A* between two tiles
//! - `reachable_set`: obstacle-aware flood fill for movement
//! - `disc` / `ring`: pure geometric ranges
//! - `nearest_approach_tile`: cheapest tile to attack a target from

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::grid::Grid;
use crate::hex::{Axis, Offset};
use crate::unit::UnitId;

/// Tiles to walk (start excluded) and what walking them costs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub tiles: Vec<Offset>,
    pub cost: i32,
}

impl Path {
    /// An empty path means the goal could not be reached
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn destination(&self) -> Option<Offset> {
        self.tiles.last().copied()
    }
}

/// Per-search scratch data, never stored on the tile itself
#[derive(Clone, Copy, Debug)]
struct PathNode {
    g_cost: i32,
    h_cost: i32,
    parent: Option<Offset>,
    base_weight: i32,
}

impl PathNode {
    fn unvisited() -> Self {
        Self {
            g_cost: i32::MAX,
            h_cost: 0,
            parent: None,
            base_weight: 1,
        }
    }

    fn f_cost(&self) -> i32 {
        self.g_cost + self.h_cost
    }
}

/// Read-only queries over one grid snapshot
#[derive(Clone, Copy)]
pub struct Pathfinder<'a> {
    grid: &'a Grid,
}

impl<'a> Pathfinder<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &'a Grid {
        self.grid
    }

    fn check_bounds(&self, pos: Offset) -> Result<()> {
        if self.grid.contains(pos) {
            Ok(())
        } else {
            Err(CoreError::OutOfBounds(pos))
        }
    }

    // ========================================================================
    // A* SEARCH
    // ========================================================================

    /// Cheapest path from `start` to `goal`.
    ///
    /// Intermediate tiles must be empty; the goal may be occupied. An
    /// unreachable goal gives an empty path with cost 0. With `max_steps`
    /// the path is clipped to its first `max_steps` tiles and the cost is
    /// that of the clipped path.
    pub fn find_path(&self, start: Offset, goal: Offset, max_steps: Option<usize>) -> Result<Path> {
        self.check_bounds(start)?;
        self.check_bounds(goal)?;

        let grid = self.grid;
        let mut nodes: FxHashMap<Offset, PathNode> = FxHashMap::default();
        let mut closed: FxHashSet<Offset> = FxHashSet::default();
        // Min-heap on (f, h, position): lower f first, then lower h
        let mut open = BinaryHeap::new();

        let h = grid.distance(start, goal);
        nodes.insert(
            start,
            PathNode {
                g_cost: 0,
                h_cost: h,
                parent: None,
                base_weight: 1,
            },
        );
        open.push(Reverse((h, h, start)));

        while let Some(Reverse((_, _, current))) = open.pop() {
            if !closed.insert(current) {
                continue;
            }

            if current == goal {
                let path = retrace(&nodes, start, goal, max_steps);
                tracing::debug!(
                    "path {} -> {}: {} tiles, cost {}",
                    start,
                    goal,
                    path.len(),
                    path.cost
                );
                return Ok(path);
            }

            let current_g = nodes[&current].g_cost;

            for n in grid.neighbors(current) {
                if n != goal && !grid.is_empty(n) {
                    continue;
                }
                if closed.contains(&n) {
                    continue;
                }

                let node = nodes.entry(n).or_insert_with(PathNode::unvisited);
                let tentative = current_g + grid.distance(current, n) * node.base_weight;

                if tentative < node.g_cost {
                    node.g_cost = tentative;
                    node.h_cost = grid.distance(n, goal);
                    node.parent = Some(current);
                    open.push(Reverse((node.f_cost(), node.h_cost, n)));
                }
            }
        }

        tracing::debug!("path {} -> {}: unreachable", start, goal);
        Ok(Path::default())
    }

    // ========================================================================
    // RANGE QUERIES
    // ========================================================================

    /// Tiles reachable within `budget` steps through empty tiles.
    ///
    /// Occupied tiles whose occupant is in `attackable` are included but
    /// never expanded. The start tile is always included.
    pub fn reachable_set(
        &self,
        start: Offset,
        budget: i32,
        attackable: &FxHashSet<UnitId>,
    ) -> Result<FxHashSet<Offset>> {
        self.check_bounds(start)?;

        let grid = self.grid;
        let mut visited = FxHashSet::default();
        visited.insert(start);
        let mut fringe = vec![start];

        for _ in 0..budget.max(0) {
            let mut next = Vec::new();
            for &tile in &fringe {
                for n in grid.neighbors(tile) {
                    if visited.contains(&n) {
                        continue;
                    }
                    match grid.occupant(n) {
                        None => {
                            visited.insert(n);
                            next.push(n);
                        }
                        Some(id) if attackable.contains(&id) => {
                            visited.insert(n);
                        }
                        Some(_) => {}
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            fringe = next;
        }

        Ok(visited)
    }

    /// All tiles within `radius` of `center`, center excluded.
    ///
    /// Built as the intersection of three axis bands of width 2r+1.
    pub fn disc(&self, center: Offset, radius: i32) -> Result<FxHashSet<Offset>> {
        self.check_bounds(center)?;
        if radius < 0 {
            return Err(CoreError::InvalidRadius(radius));
        }

        let layout = self.grid.layout();
        let in_band = |pos: Offset, axis: Axis| {
            let d = layout.axis_distance(center, pos, axis);
            (-radius..=radius).contains(&d)
        };

        Ok(self
            .grid
            .tiles()
            .map(|t| t.position())
            .filter(|&pos| in_band(pos, Axis::X))
            .filter(|&pos| in_band(pos, Axis::Y))
            .filter(|&pos| in_band(pos, Axis::Z))
            .filter(|&pos| pos != center)
            .collect())
    }

    /// Tiles at exactly `radius` from `center`
    pub fn ring(&self, center: Offset, radius: i32) -> Result<FxHashSet<Offset>> {
        if radius < 1 {
            return Err(CoreError::InvalidRadius(radius));
        }
        if radius == 1 {
            return self.disc(center, 1);
        }

        let inner = self.disc(center, radius - 1)?;
        let mut outer = self.disc(center, radius)?;
        outer.retain(|pos| !inner.contains(pos));
        Ok(outer)
    }

    /// Among tiles in `reachable` at exactly `attack_range` from `target`,
    /// the one with the cheapest path from `attacker_start`.
    ///
    /// Candidates are tried in row-major order; only empty tiles (or the
    /// attacker's own) qualify.
    pub fn nearest_approach_tile(
        &self,
        attacker_start: Offset,
        reachable: &FxHashSet<Offset>,
        target: Offset,
        attack_range: i32,
    ) -> Result<Option<Offset>> {
        self.check_bounds(attacker_start)?;

        let mut candidates: Vec<Offset> = self
            .ring(target, attack_range)?
            .into_iter()
            .filter(|pos| reachable.contains(pos))
            .filter(|&pos| pos == attacker_start || self.grid.is_empty(pos))
            .collect();
        candidates.sort();

        let mut best: Option<(Offset, i32)> = None;
        for tile in candidates {
            let cost = if tile == attacker_start {
                0
            } else {
                let path = self.find_path(attacker_start, tile, None)?;
                if path.is_empty() {
                    continue;
                }
                path.cost
            };

            if best.map_or(true, |(_, lowest)| cost < lowest) {
                best = Some((tile, cost));
            }
        }

        Ok(best.map(|(tile, _)| tile))
    }
}

/// Walk parents back from `goal`, then clip to `max_steps`
fn retrace(
    nodes: &FxHashMap<Offset, PathNode>,
    start: Offset,
    goal: Offset,
    max_steps: Option<usize>,
) -> Path {
    let mut steps = Vec::new();
    let mut current = goal;

    while current != start {
        let node = &nodes[&current];
        steps.push((current, node.base_weight));
        match node.parent {
            Some(parent) => current = parent,
            None => break,
        }
    }
    steps.reverse();

    if let Some(max) = max_steps {
        steps.truncate(max);
    }

    Path {
        cost: steps.iter().map(|&(_, w)| w).sum(),
        tiles: steps.into_iter().map(|(pos, _)| pos).collect(),
    }
}
