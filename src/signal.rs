use crate::Direction;

/// The right-of-way queries a vehicle makes of the junction's signals.
///
/// Both queries must be free of side effects; a vehicle may call them
/// several times in one step.
pub trait SignalSource {
    /// Whether vehicles on the given approach may cross the stop line.
    fn can_pass(&self, direction: Direction) -> bool;

    /// Whether a vehicle `distance` px before the stop line, travelling at
    /// `speed` px/s, should begin braking to stop at the line.
    fn should_prepare_to_stop(&self, direction: Direction, distance: f64, speed: f64) -> bool;
}

impl<T: SignalSource + ?Sized> SignalSource for &T {
    fn can_pass(&self, direction: Direction) -> bool {
        (**self).can_pass(direction)
    }

    fn should_prepare_to_stop(&self, direction: Direction, distance: f64, speed: f64) -> bool {
        (**self).should_prepare_to_stop(direction, distance, speed)
    }
}

impl<T: SignalSource + ?Sized> SignalSource for Box<T> {
    fn can_pass(&self, direction: Direction) -> bool {
        (**self).can_pass(direction)
    }

    fn should_prepare_to_stop(&self, direction: Direction, distance: f64, speed: f64) -> bool {
        (**self).should_prepare_to_stop(direction, distance, speed)
    }
}

/// Signals which never stop anyone.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysGreen;

impl SignalSource for AlwaysGreen {
    fn can_pass(&self, _direction: Direction) -> bool {
        true
    }

    fn should_prepare_to_stop(&self, _direction: Direction, _distance: f64, _speed: f64) -> bool {
        false
    }
}
