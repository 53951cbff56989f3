//! Approach directions and along-track geometry.

use crate::math::Point2d;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// The approach a vehicle arrives from.
///
/// A `North` vehicle enters at the top of the junction and travels down
/// (towards +y), a `West` vehicle enters on the left and travels right, and
/// so on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    North,
    South,
    East,
    West,
}

/// A pair of opposing approaches which share a signal phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    /// North and south approaches.
    NorthSouth,
    /// East and west approaches.
    EastWest,
}

impl Direction {
    /// All four approaches.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// The signal axis this approach belongs to.
    pub fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::NorthSouth,
            Direction::East | Direction::West => Axis::EastWest,
        }
    }

    /// The on-screen rotation of a vehicle body, in degrees.
    pub fn heading_degrees(self) -> f64 {
        match self {
            Direction::North => 180.0,
            Direction::South => 0.0,
            Direction::East => -90.0,
            Direction::West => 90.0,
        }
    }

    /// The coordinate of `point` along the axis of travel.
    pub fn track_coord(self, point: Point2d) -> f64 {
        match self.axis() {
            Axis::NorthSouth => point.y,
            Axis::EastWest => point.x,
        }
    }

    /// The signed distance from `from` to `to` along the direction of travel.
    /// Positive when `to` lies ahead of `from`.
    pub fn along(self, from: Point2d, to: Point2d) -> f64 {
        self.along_to_coord(from, self.track_coord(to))
    }

    /// The signed distance from `from` to the line `track = coord` along the
    /// direction of travel.
    pub fn along_to_coord(self, from: Point2d, coord: f64) -> f64 {
        let sign = match self {
            Direction::North | Direction::West => 1.0,
            Direction::South | Direction::East => -1.0,
        };
        sign * (coord - self.track_coord(from))
    }
}

impl Axis {
    /// The crossing axis.
    pub fn other(self) -> Axis {
        match self {
            Axis::NorthSouth => Axis::EastWest,
            Axis::EastWest => Axis::NorthSouth,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        };
        f.pad(name)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::NorthSouth => f.write_str("NS"),
            Axis::EastWest => f.write_str("EW"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn along_follows_travel() {
        let a = Point2d::new(100.0, 200.0);
        let b = Point2d::new(130.0, 260.0);
        assert_approx_eq!(Direction::North.along(a, b), 60.0);
        assert_approx_eq!(Direction::South.along(a, b), -60.0);
        assert_approx_eq!(Direction::East.along(a, b), -30.0);
        assert_approx_eq!(Direction::West.along(a, b), 30.0);
    }

    #[test]
    fn stop_line_distances() {
        // Southbound vehicle at y = 610, stop line at y = 510
        let pos = Point2d::new(375.0, 610.0);
        assert_approx_eq!(Direction::South.along_to_coord(pos, 510.0), 100.0);
        // Northbound vehicle at y = 190, stop line at y = 290
        let pos = Point2d::new(425.0, 190.0);
        assert_approx_eq!(Direction::North.along_to_coord(pos, 290.0), 100.0);
        // Eastbound vehicle already past its line
        let pos = Point2d::new(490.0, 425.0);
        assert_approx_eq!(Direction::East.along_to_coord(pos, 510.0), -20.0);
    }

    #[test]
    fn axes() {
        assert_eq!(Direction::West.axis(), Axis::EastWest);
        assert_eq!(Axis::NorthSouth.other(), Axis::EastWest);
        assert_eq!(Direction::South.axis(), Axis::NorthSouth);
    }
}
