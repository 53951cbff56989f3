//! Junction geometry: vehicle paths, stop lines and the simulated region.

use crate::error::ConfigError;
use crate::math::Point2d;
use crate::util::Interval;
use crate::Direction;
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A fixed polyline of waypoints followed by a vehicle.
pub type Path = SmallVec<[Point2d; 8]>;

/// Provides the fixed geometry vehicles are spawned onto.
///
/// All queries must return the same answer for the life of a simulation.
pub trait WaypointSource {
    /// The ordered waypoints of a lane. May be empty if the lane does not exist.
    fn waypoints(&self, direction: Direction, lane: usize) -> Path;

    /// The track coordinate of the stop line on an approach;
    /// a y coordinate for north/south and an x coordinate for east/west.
    fn stop_line(&self, direction: Direction) -> f64;

    /// The region outside of which vehicles are removed, applied to both axes.
    fn bounds(&self) -> Interval<f64>;
}

/// A value for each of the four approaches.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PerDirection<T> {
    pub north: T,
    pub south: T,
    pub east: T,
    pub west: T,
}

impl<T> PerDirection<T> {
    /// Gets the value for an approach.
    pub fn get(&self, direction: Direction) -> &T {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
            Direction::East => &self.east,
            Direction::West => &self.west,
        }
    }
}

/// A four-way junction where every lane runs straight through.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RoadLayout {
    /// The lateral coordinate of each lane's centre line, per approach.
    pub lanes: PerDirection<Vec<f64>>,
    /// The track coordinates of the waypoints along each approach, in order
    /// of travel: spawn point, stop line, junction entry, junction centre, exit.
    pub stations: PerDirection<Vec<f64>>,
    /// The track coordinate of each approach's stop line.
    pub stop_lines: PerDirection<f64>,
    /// The removal region, applied to both axes.
    pub bounds: Interval<f64>,
}

impl RoadLayout {
    /// Checks that every approach has lanes and the bounds are ordered.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if let Some(direction) = Direction::ALL
            .into_iter()
            .find(|dir| self.lanes.get(*dir).is_empty())
        {
            return Err(ConfigError::NoLanes { direction });
        }
        if !self.bounds.is_valid() {
            return Err(ConfigError::InvertedBounds {
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }
        Ok(())
    }

    /// The total length of a lane's path in px.
    pub fn path_length(&self, direction: Direction, lane: usize) -> f64 {
        self.waypoints(direction, lane)
            .iter()
            .tuple_windows()
            .map(|(a, b)| cgmath::MetricSpace::distance(*a, *b))
            .sum()
    }
}

impl WaypointSource for RoadLayout {
    fn waypoints(&self, direction: Direction, lane: usize) -> Path {
        let lanes = self.lanes.get(direction);
        if lanes.is_empty() {
            return Path::new();
        }
        let offset = lanes[lane % lanes.len()];
        self.stations
            .get(direction)
            .iter()
            .map(|&station| match direction {
                Direction::North | Direction::South => Point2d::new(offset, station),
                Direction::East | Direction::West => Point2d::new(station, offset),
            })
            .collect()
    }

    fn stop_line(&self, direction: Direction) -> f64 {
        *self.stop_lines.get(direction)
    }

    fn bounds(&self) -> Interval<f64> {
        self.bounds
    }
}

impl Default for RoadLayout {
    fn default() -> Self {
        Self {
            lanes: PerDirection {
                north: vec![425.0, 475.0],
                south: vec![375.0, 325.0],
                east: vec![425.0, 475.0],
                west: vec![375.0, 325.0],
            },
            stations: PerDirection {
                north: vec![-100.0, 290.0, 300.0, 400.0, 900.0],
                south: vec![900.0, 510.0, 500.0, 400.0, -100.0],
                east: vec![900.0, 510.0, 500.0, 400.0, -100.0],
                west: vec![-100.0, 290.0, 300.0, 400.0, 900.0],
            },
            stop_lines: PerDirection {
                north: 290.0,
                south: 510.0,
                east: 510.0,
                west: 290.0,
            },
            bounds: Interval::new(-150.0, 950.0),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn lane_paths() {
        let layout = RoadLayout::default();
        let path = layout.waypoints(Direction::East, 1);
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], Point2d::new(900.0, 475.0));
        assert_eq!(path[4], Point2d::new(-100.0, 475.0));

        // Lane indices wrap around
        assert_eq!(layout.waypoints(Direction::South, 2), layout.waypoints(Direction::South, 0));
        assert_approx_eq!(layout.path_length(Direction::North, 0), 1000.0);
    }

    #[test]
    fn paths_cross_their_stop_line() {
        let layout = RoadLayout::default();
        for dir in Direction::ALL {
            let path = layout.waypoints(dir, 0);
            let stop = layout.stop_line(dir);
            assert!(dir.along_to_coord(path[0], stop) > 0.0);
            assert!(dir.along_to_coord(path[path.len() - 1], stop) < 0.0);
        }
    }

    #[test]
    fn missing_lanes() {
        let mut layout = RoadLayout::default();
        layout.lanes.west.clear();
        assert!(layout.waypoints(Direction::West, 0).is_empty());
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::NoLanes { direction: Direction::West })
        ));
    }
}
