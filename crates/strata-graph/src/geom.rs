//! Geometry primitives shared by the model and the layout phases.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    pub fn midpoint(self, other: Point) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Space reserved around a node (or inside a graph, as padding).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub const fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// Grows the margin so that `p` (relative to the top-left corner of a box of `size`) is covered.
    pub fn include(&mut self, size: Point, p: Point) {
        self.left = self.left.max(-p.x);
        self.right = self.right.max(p.x - size.x);
        self.top = self.top.max(-p.y);
        self.bottom = self.bottom.max(p.y - size.y);
    }
}

/// The side of a node a port sits on.
///
/// The declaration order (`Undefined`, `North`, `East`, `South`, `West`) is the canonical sort
/// order used when ports or sides need a deterministic ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortSide {
    #[default]
    Undefined,
    North,
    East,
    South,
    West,
}

impl PortSide {
    /// The four defined sides in clockwise order, starting at the top.
    pub const CLOCKWISE: [PortSide; 4] = [
        PortSide::North,
        PortSide::East,
        PortSide::South,
        PortSide::West,
    ];

    pub fn is_defined(self) -> bool {
        self != PortSide::Undefined
    }

    /// Next side in clockwise direction.
    pub fn right(self) -> Self {
        match self {
            PortSide::North => PortSide::East,
            PortSide::East => PortSide::South,
            PortSide::South => PortSide::West,
            PortSide::West => PortSide::North,
            PortSide::Undefined => PortSide::Undefined,
        }
    }

    /// Next side in counter-clockwise direction.
    pub fn left(self) -> Self {
        match self {
            PortSide::North => PortSide::West,
            PortSide::West => PortSide::South,
            PortSide::South => PortSide::East,
            PortSide::East => PortSide::North,
            PortSide::Undefined => PortSide::Undefined,
        }
    }

    pub fn opposed(self) -> Self {
        match self {
            PortSide::North => PortSide::South,
            PortSide::South => PortSide::North,
            PortSide::East => PortSide::West,
            PortSide::West => PortSide::East,
            PortSide::Undefined => PortSide::Undefined,
        }
    }

    /// Index into per-side arrays of length 4. `Undefined` has no slot.
    pub fn ordinal(self) -> Option<usize> {
        match self {
            PortSide::North => Some(0),
            PortSide::East => Some(1),
            PortSide::South => Some(2),
            PortSide::West => Some(3),
            PortSide::Undefined => None,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, PortSide::North | PortSide::South)
    }
}
