//! Cardinal directions and the rotation ⇄ facing mapping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four grid directions. `y` grows southwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Canonical order used wherever all four directions are tried.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Facing for an object's rotation counter (`rotation % 4`).
    pub fn from_rotation(rotation: u32) -> Self {
        Self::ALL[(rotation % 4) as usize]
    }

    /// Rotation value (0..4) that faces this direction.
    pub fn rotation(self) -> u32 {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// Unit step `(dx, dy)`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        Self::from_rotation(self.rotation() + 2)
    }

    /// The coordinate one step away from `(x, y)`.
    pub fn step(self, x: i32, y: i32) -> (i32, i32) {
        let (dx, dy) = self.delta();
        (x + dx, y + dy)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        };
        f.write_str(name)
    }
}
