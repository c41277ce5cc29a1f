//! Static arena description: wall segments and landmark beacons.

use arena_kinematics::{Point, Segment};

/// A wall is an immutable segment between two points.
pub type Wall = Segment;

/// A landmark beacon at a known map position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Beacon {
    /// Map x coordinate.
    pub x: f64,
    /// Map y coordinate.
    pub y: f64,
}

impl Beacon {
    /// Creates a new `Beacon`.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Map position of the beacon.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// The walls and beacons of one simulation. Owned by the simulation and never mutated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct Arena {
    /// Wall segments.
    pub walls: Vec<Wall>,
    /// Landmark beacons.
    pub beacons: Vec<Beacon>,
}

fn wall(x1: f64, y1: f64, x2: f64, y2: f64) -> Wall {
    Segment::new(Point::new(x1, y1), Point::new(x2, y2))
}

impl Arena {
    /// Creates an arena from its walls and beacons.
    pub fn new(walls: Vec<Wall>, beacons: Vec<Beacon>) -> Self {
        Self { walls, beacons }
    }

    /// An axis-aligned square room spanning `[min, max]` on both axes, with a beacon in each corner.
    pub fn square_room(min: f64, max: f64) -> Self {
        Self {
            walls: vec![
                wall(min, min, max, min),
                wall(min, max, max, max),
                wall(min, min, min, max),
                wall(max, min, max, max),
            ],
            beacons: vec![
                Beacon::new(min, min),
                Beacon::new(max, min),
                Beacon::new(min, max),
                Beacon::new(max, max),
            ],
        }
    }

    /// The 700×700 reference room with two diagonal maze walls and a beacon on every wall end.
    pub fn reference() -> Self {
        let mut arena = Self::square_room(50.0, 750.0);
        arena.walls.push(wall(200.0, 150.0, 650.0, 300.0));
        arena.walls.push(wall(200.0, 600.0, 500.0, 400.0));
        arena.beacons.extend([
            Beacon::new(200.0, 150.0),
            Beacon::new(650.0, 300.0),
            Beacon::new(200.0, 600.0),
            Beacon::new(500.0, 400.0),
        ]);
        arena
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::reference()
    }
}
