//! Per-frame debug geometry, collected only with the `debug` feature.

use crate::math::Point2d;
#[cfg(feature = "debug")]
use serde::Serialize;

/// A shape drawn over the junction for one frame.
#[cfg(feature = "debug")]
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Shape {
    Line {
        name: &'static str,
        p1: [f64; 2],
        p2: [f64; 2],
    },
    Point {
        name: &'static str,
        p: [f64; 2],
    },
}

#[cfg(feature = "debug")]
thread_local!(
    static FRAME: std::cell::RefCell<Vec<Shape>> = Default::default();
);

#[cfg(feature = "debug")]
fn record(shape: Shape) {
    FRAME.with(|frame| frame.borrow_mut().push(shape));
}

/// Records a line between two points, e.g. from a follower to its leader.
#[allow(unused)]
pub fn debug_line(name: &'static str, p1: Point2d, p2: Point2d) {
    #[cfg(feature = "debug")]
    record(Shape::Line {
        name,
        p1: [p1.x, p1.y],
        p2: [p2.x, p2.y],
    });
}

/// Records a single point, e.g. where a vehicle was spawned.
#[allow(unused)]
pub fn debug_point(name: &'static str, point: Point2d) {
    #[cfg(feature = "debug")]
    record(Shape::Point {
        name,
        p: [point.x, point.y],
    });
}

/// Takes the shapes recorded since the last call, as a JSON array.
#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    let shapes = FRAME.with(|frame| frame.take());
    serde_json::to_value(shapes).unwrap_or(serde_json::Value::Null)
}

#[cfg(all(test, feature = "debug"))]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn frame_is_drained() {
        debug_point("spawn", Point2d::new(1.0, 2.0));
        debug_line("follow", Point2d::new(0.0, 0.0), Point2d::new(0.0, 40.0));
        assert_eq!(
            take_debug_frame(),
            json!([
                { "type": "point", "name": "spawn", "p": [1.0, 2.0] },
                { "type": "line", "name": "follow", "p1": [0.0, 0.0], "p2": [0.0, 40.0] },
            ])
        );
        assert_eq!(take_debug_frame(), json!([]));
    }
}
