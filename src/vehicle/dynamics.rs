use crate::layout::Path;
use crate::math::{normalize_with_length, Point2d};
use cgmath::prelude::*;

/// Tracks a vehicle's progress along its fixed path.
#[derive(Clone, Debug)]
pub struct PathFollower {
    /// The waypoints of the path.
    path: Path,
    /// The index of the waypoint most recently reached.
    index: usize,
    /// The fraction of the path completed, in `[0, 1]`.
    progress: f64,
}

impl PathFollower {
    pub fn new(path: Path) -> Self {
        Self {
            path,
            index: 0,
            progress: 0.0,
        }
    }

    /// The first waypoint, if the path has any.
    pub fn start(&self) -> Option<Point2d> {
        self.path.first().copied()
    }

    /// The index of the waypoint most recently reached.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The fraction of the path completed.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// The waypoint most recently reached.
    pub fn current_waypoint(&self) -> Option<Point2d> {
        let last = self.path.len().checked_sub(1)?;
        self.path.get(usize::min(self.index, last)).copied()
    }

    /// The waypoint being driven towards.
    pub fn next_waypoint(&self) -> Option<Point2d> {
        self.path.get(self.index + 1).copied()
    }

    /// Moves `pos` up to `dist` px towards the next waypoint.
    ///
    /// Movement stops at the waypoint, which `pos` is snapped onto. A path
    /// with no waypoint left is complete. A zero-length segment is skipped
    /// without moving.
    pub fn advance(&mut self, pos: &mut Point2d, dist: f64) {
        debug_assert!(dist >= 0.0, "vehicles never reverse");
        let (current, next) = match (self.current_waypoint(), self.next_waypoint()) {
            (Some(current), Some(next)) => (current, next),
            _ => {
                self.progress = 1.0;
                return;
            }
        };

        let (dir, seg_len) = match normalize_with_length(next - current) {
            Some(seg) => seg,
            None => {
                self.index += 1;
                return;
            }
        };

        let to_next = pos.distance(next);
        let step = f64::min(dist, to_next);
        *pos += dir * step;

        let seg_frac = 1.0 - (to_next - step) / seg_len;
        let progress = (self.index as f64 + seg_frac) / (self.path.len() - 1) as f64;
        self.progress = f64::max(self.progress, progress).min(1.0);

        if to_next <= step {
            self.index += 1;
            *pos = next;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use smallvec::smallvec;

    fn straight() -> PathFollower {
        PathFollower::new(smallvec![
            Point2d::new(0.0, 0.0),
            Point2d::new(0.0, 100.0),
            Point2d::new(0.0, 300.0),
        ])
    }

    #[test]
    fn moves_along_segments() {
        let mut path = straight();
        let mut pos = path.start().unwrap();

        path.advance(&mut pos, 50.0);
        assert_approx_eq!(pos.y, 50.0);
        assert_approx_eq!(path.progress(), 0.25);

        // Stops at, and snaps onto, the waypoint
        path.advance(&mut pos, 80.0);
        assert_eq!(pos, Point2d::new(0.0, 100.0));
        assert_eq!(path.index(), 1);
        assert_approx_eq!(path.progress(), 0.5);

        path.advance(&mut pos, 100.0);
        assert_approx_eq!(pos.y, 200.0);
        assert_approx_eq!(path.progress(), 0.75);
    }

    #[test]
    fn completes_path() {
        let mut path = straight();
        let mut pos = path.start().unwrap();
        for _ in 0..10 {
            path.advance(&mut pos, 100.0);
        }
        assert_eq!(pos, Point2d::new(0.0, 300.0));
        assert_eq!(path.progress(), 1.0);
        assert!(path.next_waypoint().is_none());
    }

    #[test]
    fn skips_degenerate_segment() {
        let mut path = PathFollower::new(smallvec![
            Point2d::new(0.0, 0.0),
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 0.0),
        ]);
        let mut pos = path.start().unwrap();
        path.advance(&mut pos, 5.0);
        assert_eq!(pos, Point2d::new(0.0, 0.0));
        assert_eq!(path.index(), 1);
        path.advance(&mut pos, 5.0);
        assert_approx_eq!(pos.x, 5.0);
    }

    #[test]
    fn empty_path_is_complete() {
        let mut path = PathFollower::new(Path::new());
        let mut pos = Point2d::new(0.0, 0.0);
        assert!(path.current_waypoint().is_none());
        path.advance(&mut pos, 10.0);
        assert_eq!(path.progress(), 1.0);
        assert_eq!(pos, Point2d::new(0.0, 0.0));
    }
}
