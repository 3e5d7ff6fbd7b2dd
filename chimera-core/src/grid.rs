//! Board model: tiles and occupancy

use crate::error::{CoreError, Result};
use crate::hex::{HexLayout, Oddity, Offset};
use crate::unit::{Allegiance, Unit, UnitId, UnitTemplate};

/// One cell of the board
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    position: Offset,
    movement_penalty: f32,
    occupant: Option<UnitId>,
}

impl Tile {
    fn new(position: Offset) -> Self {
        Self {
            position,
            movement_penalty: 1.0,
            occupant: None,
        }
    }

    pub fn position(&self) -> Offset {
        self.position
    }

    pub fn movement_penalty(&self) -> f32 {
        self.movement_penalty
    }

    pub fn occupant(&self) -> Option<UnitId> {
        self.occupant
    }

    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }
}

/// Rectangular board of hex tiles, stored row-major
#[derive(Clone, Debug)]
pub struct Grid {
    layout: HexLayout,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn generate(width: i32, height: i32, oddity: Oddity) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }

        let tiles = (0..height)
            .flat_map(|row| (0..width).map(move |col| Tile::new(Offset::new(col, row))))
            .collect();

        Ok(Self {
            layout: HexLayout::new(width, height, oddity),
            tiles,
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    pub fn width(&self) -> i32 {
        self.layout.width
    }

    pub fn height(&self) -> i32 {
        self.layout.height
    }

    pub fn contains(&self, pos: Offset) -> bool {
        self.layout.contains(pos)
    }

    fn index(&self, pos: Offset) -> Option<usize> {
        if self.contains(pos) {
            Some((pos.row * self.layout.width + pos.col) as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, pos: Offset) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    fn tile_mut(&mut self, pos: Offset) -> Result<&mut Tile> {
        match self.index(pos) {
            Some(i) => Ok(&mut self.tiles[i]),
            None => Err(CoreError::OutOfBounds(pos)),
        }
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// True for an in-bounds tile without an occupant
    pub fn is_empty(&self, pos: Offset) -> bool {
        self.tile(pos).is_some_and(Tile::is_empty)
    }

    pub fn occupant(&self, pos: Offset) -> Option<UnitId> {
        self.tile(pos).and_then(Tile::occupant)
    }

    pub fn neighbors(&self, pos: Offset) -> impl Iterator<Item = Offset> + '_ {
        self.layout.neighbors(pos)
    }

    pub fn distance(&self, a: Offset, b: Offset) -> i32 {
        self.layout.distance(a, b)
    }

    pub fn set_movement_penalty(&mut self, pos: Offset, penalty: f32) -> Result<()> {
        if !(penalty >= 0.0) {
            return Err(CoreError::InvalidPenalty(penalty));
        }
        self.tile_mut(pos)?.movement_penalty = penalty;
        Ok(())
    }

    // ========================================================================
    // OCCUPANCY
    // ========================================================================

    /// Create a unit from `template` standing on `at`
    pub fn spawn_unit(
        &mut self,
        id: UnitId,
        template: &UnitTemplate,
        at: Offset,
        allegiance: Allegiance,
    ) -> Result<Unit> {
        self.place(id, at)?;
        Ok(Unit::from_template(id, template, allegiance, at))
    }

    /// Put `id` on an empty tile
    pub fn place(&mut self, id: UnitId, at: Offset) -> Result<()> {
        let tile = self.tile_mut(at)?;
        if tile.occupant.is_some() {
            return Err(CoreError::OccupiedTile(at));
        }
        tile.occupant = Some(id);
        Ok(())
    }

    /// Move the occupant of `from` onto the empty tile `to`
    pub fn move_occupant(&mut self, from: Offset, to: Offset) -> Result<UnitId> {
        if !self.contains(to) {
            return Err(CoreError::OutOfBounds(to));
        }
        if !self.is_empty(to) {
            return Err(CoreError::OccupiedTile(to));
        }
        let id = self
            .tile_mut(from)?
            .occupant
            .take()
            .ok_or(CoreError::EmptyTile(from))?;
        self.tile_mut(to)?.occupant = Some(id);
        Ok(id)
    }

    pub fn remove_occupant(&mut self, pos: Offset) -> Option<UnitId> {
        self.tile_mut(pos).ok().and_then(|tile| tile.occupant.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> UnitTemplate {
        UnitTemplate::new("Guard", 20, 5, 2, 1)
    }

    #[test]
    fn test_generate() {
        let grid = Grid::generate(6, 4, Oddity::Odd).unwrap();
        assert_eq!(grid.tiles().count(), 24);
        for row in 0..4 {
            for col in 0..6 {
                let pos = Offset::new(col, row);
                let tile = grid.tile(pos).unwrap();
                assert_eq!(tile.position(), pos);
                assert_eq!(tile.movement_penalty(), 1.0);
                assert!(tile.is_empty());
            }
        }
        assert!(grid.tile(Offset::new(6, 0)).is_none());
        assert!(grid.tile(Offset::new(0, -1)).is_none());
    }

    #[test]
    fn test_generate_rejects_empty() {
        assert_eq!(
            Grid::generate(0, 5, Oddity::Even).unwrap_err(),
            CoreError::InvalidDimensions { width: 0, height: 5 }
        );
    }

    #[test]
    fn test_spawn_occupied() {
        let mut grid = Grid::generate(5, 5, Oddity::Odd).unwrap();
        let at = Offset::new(2, 2);
        let unit = grid.spawn_unit(UnitId(1), &guard(), at, Allegiance::Player).unwrap();
        assert_eq!(unit.tile, at);
        assert_eq!(grid.occupant(at), Some(UnitId(1)));

        let err = grid.spawn_unit(UnitId(2), &guard(), at, Allegiance::Enemy).unwrap_err();
        assert_eq!(err, CoreError::OccupiedTile(at));
        assert_eq!(grid.occupant(at), Some(UnitId(1)));
    }

    #[test]
    fn test_spawn_out_of_bounds() {
        let mut grid = Grid::generate(5, 5, Oddity::Odd).unwrap();
        let at = Offset::new(9, 9);
        let err = grid.spawn_unit(UnitId(1), &guard(), at, Allegiance::Player).unwrap_err();
        assert_eq!(err, CoreError::OutOfBounds(at));
    }

    #[test]
    fn test_move_occupant() {
        let mut grid = Grid::generate(5, 5, Oddity::Odd).unwrap();
        grid.place(UnitId(1), Offset::new(0, 0)).unwrap();
        grid.place(UnitId(2), Offset::new(2, 0)).unwrap();

        assert_eq!(grid.move_occupant(Offset::new(0, 0), Offset::new(1, 0)), Ok(UnitId(1)));
        assert!(grid.is_empty(Offset::new(0, 0)));
        assert_eq!(
            grid.move_occupant(Offset::new(1, 0), Offset::new(2, 0)),
            Err(CoreError::OccupiedTile(Offset::new(2, 0)))
        );
        assert_eq!(grid.occupant(Offset::new(1, 0)), Some(UnitId(1)));
        assert_eq!(grid.remove_occupant(Offset::new(2, 0)), Some(UnitId(2)));
        assert!(grid.is_empty(Offset::new(2, 0)));
    }

    #[test]
    fn test_movement_penalty() {
        let mut grid = Grid::generate(3, 3, Oddity::Even).unwrap();
        grid.set_movement_penalty(Offset::new(1, 1), 2.5).unwrap();
        assert_eq!(grid.tile(Offset::new(1, 1)).unwrap().movement_penalty(), 2.5);
        assert_eq!(
            grid.set_movement_penalty(Offset::new(1, 1), -1.0),
            Err(CoreError::InvalidPenalty(-1.0))
        );
    }
}
