//! Hex grid geometry with offset and cube coordinates

use serde::{Deserialize, Serialize};

/// Which rows are shifted half a hex to the right
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Oddity {
    #[default]
    Odd,
    Even,
}

/// Cube axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// The six neighbour directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    TopLeft,
    TopRight,
    Right,
    BottomRight,
    BottomLeft,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Left,
        Direction::TopLeft,
        Direction::TopRight,
        Direction::Right,
        Direction::BottomRight,
        Direction::BottomLeft,
    ];

    /// Cube delta (dx, dy, dz) for one step in this direction
    pub const fn delta(self) -> Cube {
        match self {
            Direction::Left => Cube::new(-1, 0, 1),
            Direction::Right => Cube::new(1, 0, -1),
            Direction::TopLeft => Cube::new(0, 1, -1),
            Direction::BottomRight => Cube::new(0, -1, 1),
            Direction::TopRight => Cube::new(1, -1, 0),
            Direction::BottomLeft => Cube::new(-1, 1, 0),
        }
    }
}

/// Offset coordinates (column, row) as stored in the tile array
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    pub col: i32,
    pub row: i32,
}

impl Offset {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

impl PartialOrd for Offset {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Offset {
    // Row-major, so sorted iteration walks the board the way it is stored
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.row, self.col).cmp(&(other.row, other.col))
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.col, self.row)
    }
}

/// Cube coordinates, x + y + z == 0
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cube {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Cube {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn is_valid(&self) -> bool {
        self.x + self.y + self.z == 0
    }

    /// Chebyshev distance in cube space
    pub fn distance_to(&self, other: Cube) -> i32 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }

    pub fn axis(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

impl std::ops::Add for Cube {
    type Output = Cube;

    fn add(self, rhs: Cube) -> Cube {
        Cube::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Fixed geometry of one board: row shift and bounds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexLayout {
    pub oddity: Oddity,
    pub width: i32,
    pub height: i32,
}

impl HexLayout {
    pub const fn new(width: i32, height: i32, oddity: Oddity) -> Self {
        Self { oddity, width, height }
    }

    pub fn contains(&self, pos: Offset) -> bool {
        pos.col >= 0 && pos.col < self.width && pos.row >= 0 && pos.row < self.height
    }

    pub fn offset_to_cube(&self, pos: Offset) -> Cube {
        offset_to_cube(pos, self.oddity)
    }

    pub fn cube_to_offset(&self, cube: Cube) -> Offset {
        cube_to_offset(cube, self.oddity)
    }

    /// Neighbour in `dir`, or None when it falls off the board
    pub fn neighbor(&self, pos: Offset, dir: Direction) -> Option<Offset> {
        let next = self.cube_to_offset(self.offset_to_cube(pos) + dir.delta());
        if next == pos || !self.contains(next) {
            return None;
        }
        Some(next)
    }

    pub fn neighbors(&self, pos: Offset) -> impl Iterator<Item = Offset> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| self.neighbor(pos, dir))
    }

    pub fn distance(&self, a: Offset, b: Offset) -> i32 {
        self.offset_to_cube(a).distance_to(self.offset_to_cube(b))
    }

    /// Signed difference a - b along one cube axis
    pub fn axis_distance(&self, a: Offset, b: Offset, axis: Axis) -> i32 {
        self.offset_to_cube(a).axis(axis) - self.offset_to_cube(b).axis(axis)
    }
}

/// Offset to cube. Odd shifts odd rows right, Even shifts even rows right.
pub fn offset_to_cube(pos: Offset, oddity: Oddity) -> Cube {
    let parity = pos.row & 1;
    let x = match oddity {
        Oddity::Odd => pos.col - (pos.row - parity) / 2,
        Oddity::Even => pos.col - (pos.row + parity) / 2,
    };
    let z = pos.row;
    Cube::new(x, -x - z, z)
}

/// Exact inverse of [`offset_to_cube`]
pub fn cube_to_offset(cube: Cube, oddity: Oddity) -> Offset {
    let parity = cube.z & 1;
    let col = match oddity {
        Oddity::Odd => cube.x + (cube.z - parity) / 2,
        Oddity::Even => cube.x + (cube.z + parity) / 2,
    };
    Offset::new(col, cube.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for oddity in [Oddity::Odd, Oddity::Even] {
            let layout = HexLayout::new(9, 7, oddity);
            for row in 0..layout.height {
                for col in 0..layout.width {
                    let pos = Offset::new(col, row);
                    let cube = layout.offset_to_cube(pos);
                    assert!(cube.is_valid());
                    assert_eq!(layout.cube_to_offset(cube), pos);
                }
            }
        }
    }

    #[test]
    fn test_direction_deltas_are_unit_steps() {
        for dir in Direction::ALL {
            let d = dir.delta();
            assert!(d.is_valid());
            assert_eq!(d.distance_to(Cube::default()), 1);
        }
    }

    #[test]
    fn test_interior_has_six_neighbors() {
        let layout = HexLayout::new(8, 8, Oddity::Odd);
        let center = Offset::new(4, 4);
        let neighbors: Vec<_> = layout.neighbors(center).collect();
        assert_eq!(neighbors.len(), 6);
        for n in neighbors {
            assert_eq!(layout.distance(center, n), 1);
        }
    }

    #[test]
    fn test_corner_neighbors_clipped() {
        let layout = HexLayout::new(8, 8, Oddity::Even);
        let corner = Offset::new(0, 0);
        let count = layout.neighbors(corner).count();
        assert!(count < 6 && count >= 2, "corner had {} neighbors", count);
        assert!(layout.neighbors(corner).all(|n| layout.contains(n)));
    }

    #[test]
    fn test_distance() {
        let layout = HexLayout::new(10, 10, Oddity::Odd);
        let a = Offset::new(2, 3);
        let b = Offset::new(6, 7);
        assert_eq!(layout.distance(a, a), 0);
        assert_eq!(layout.distance(a, b), layout.distance(b, a));
        // Same row: distance is the column gap
        assert_eq!(layout.distance(Offset::new(1, 4), Offset::new(5, 4)), 4);
    }

    #[test]
    fn test_axis_distance_is_signed() {
        let layout = HexLayout::new(10, 10, Oddity::Odd);
        let a = Offset::new(2, 3);
        let b = Offset::new(6, 7);
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            assert_eq!(
                layout.axis_distance(a, b, axis),
                -layout.axis_distance(b, a, axis)
            );
        }
        assert_eq!(layout.axis_distance(a, b, Axis::Z), -4);
    }

    #[test]
    fn test_offset_ordering_is_row_major() {
        assert!(Offset::new(5, 0) < Offset::new(0, 1));
        assert!(Offset::new(1, 2) < Offset::new(2, 2));
    }
}
