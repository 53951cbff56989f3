/// Speed differences smaller than this are treated as reached, in px/s.
const SNAP_THRESHOLD: f64 = 1.0;

/// A vehicle told to stop is brought to rest below this speed, in px/s.
pub(crate) const REST_SPEED: f64 = 5.0;

/// The acceleration model of a vehicle.
///
/// Each step the vehicle's traffic rules lower a target speed from the
/// vehicle's maximum, then the model accelerates or brakes towards it at a
/// constant rate.
#[derive(Clone, Debug)]
pub struct AccelerationModel {
    max_acc: f64,
    max_dec: f64,
    max_vel: f64,
    min_gap: f64,
    headway: f64,
    target: f64,
    acc: f64,
    braking: bool,
}

/// The parameters of the acceleration model.
pub struct ModelParams {
    /// The acceleration in px/s<sup>2</sup>.
    pub max_acceleration: f64,
    /// The braking deceleration in px/s<sup>2</sup>, a positive number.
    pub deceleration: f64,
    /// The vehicle's top speed in px/s.
    pub max_speed: f64,
    /// The gap below which the vehicle stops behind another, in px.
    pub min_gap: f64,
    /// The desired gap to the vehicle ahead per unit of own speed, in s.
    pub time_headway: f64,
}

impl AccelerationModel {
    /// Creates a new acceleration model.
    pub fn new(params: &ModelParams) -> Self {
        AccelerationModel {
            max_acc: params.max_acceleration,
            max_dec: params.deceleration,
            max_vel: params.max_speed,
            min_gap: params.min_gap,
            headway: params.time_headway,
            target: params.max_speed,
            acc: 0.0,
            braking: false,
        }
    }

    /// Resets the target speed to the top speed. Use at the start of an update.
    pub fn reset(&mut self) {
        self.target = self.max_vel;
    }

    /// The top speed in px/s.
    pub fn max_vel(&self) -> f64 {
        self.max_vel
    }

    /// The target speed in px/s.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// The current acceleration in px/s<sup>2</sup>.
    pub fn acc(&self) -> f64 {
        self.acc
    }

    /// Whether the vehicle is braking.
    pub fn is_braking(&self) -> bool {
        self.braking
    }

    /// Lowers the target speed to at most `vel`.
    pub fn limit(&mut self, vel: f64) {
        self.target = f64::min(self.target, vel);
    }

    /// Sets the target speed to zero.
    pub fn stop(&mut self) {
        self.target = 0.0;
    }

    /// The highest speed from which the vehicle can brake to a
    /// standstill within `distance` px.
    pub fn stopping_speed(&self, distance: f64) -> f64 {
        if distance <= 0.0 {
            0.0
        } else {
            (2.0 * self.max_dec * distance).sqrt()
        }
    }

    /// Limits the target speed so the vehicle can stop at a line `distance` px ahead.
    pub fn stop_at_line(&mut self, distance: f64) {
        self.limit(self.stopping_speed(distance));
    }

    /// The distance to keep behind the vehicle ahead, in px.
    pub fn safe_distance(&self, my_vel: f64) -> f64 {
        f64::max(self.min_gap, my_vel * self.headway)
    }

    /// Limits the target speed to follow the vehicle ahead.
    ///
    /// # Arguments
    /// * `gap` - The distance to the vehicle ahead (px).
    /// * `my_vel` - The speed of the simulated vehicle (px/s).
    /// * `their_vel` - The speed of the vehicle ahead (px/s).
    pub fn follow_vehicle(&mut self, gap: f64, my_vel: f64, their_vel: f64) {
        let safe = self.safe_distance(my_vel);
        if gap >= safe {
            return;
        }
        let factor = if gap < self.min_gap {
            0.0
        } else {
            f64::max(0.0, gap / safe)
        };
        self.limit(f64::min(their_vel * factor, self.max_vel * factor));
    }

    /// Chooses an acceleration towards the target speed and integrates `vel` over `dt`.
    /// Returns the new speed, which lies in `[0, max_vel]`.
    pub fn integrate(&mut self, vel: f64, dt: f64) -> f64 {
        self.target = f64::min(self.target, self.max_vel);

        let mut vel = vel;
        let diff = self.target - vel;
        if diff.abs() < SNAP_THRESHOLD {
            self.acc = 0.0;
            vel = self.target;
        } else if diff > 0.0 {
            self.acc = self.max_acc;
            self.braking = false;
        } else {
            self.acc = -self.max_dec;
            self.braking = true;
        }

        vel = (vel + self.acc * dt).clamp(0.0, self.max_vel);

        if self.target == 0.0 && vel < REST_SPEED {
            vel = 0.0;
            self.acc = 0.0;
        }
        vel
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn model(deceleration: f64) -> AccelerationModel {
        AccelerationModel::new(&ModelParams {
            max_acceleration: 100.0,
            deceleration,
            max_speed: 250.0,
            min_gap: 40.0,
            time_headway: 1.2,
        })
    }

    #[test]
    fn stopping_speed() {
        let acc = model(200.0);
        assert_approx_eq!(acc.stopping_speed(100.0), 200.0);
        assert_eq!(acc.stopping_speed(0.0), 0.0);
        assert_eq!(acc.stopping_speed(-5.0), 0.0);
    }

    #[test]
    fn snaps_to_target() {
        let mut acc = model(150.0);
        acc.reset();
        acc.limit(120.0);
        let vel = acc.integrate(120.6, 1.0 / 60.0);
        assert_eq!(vel, 120.0);
        assert_eq!(acc.acc(), 0.0);
    }

    #[test]
    fn bang_bang() {
        let mut acc = model(150.0);
        acc.reset();
        let vel = acc.integrate(100.0, 0.1);
        assert_approx_eq!(vel, 110.0);
        assert!(!acc.is_braking());

        acc.reset();
        acc.limit(50.0);
        let vel = acc.integrate(100.0, 0.1);
        assert_approx_eq!(vel, 85.0);
        assert_eq!(acc.acc(), -150.0);
        assert!(acc.is_braking());
    }

    #[test]
    fn comes_to_rest() {
        let mut acc = model(150.0);
        acc.reset();
        acc.stop();
        let vel = acc.integrate(6.0, 1.0 / 60.0);
        assert_eq!(vel, 0.0);
        assert_eq!(acc.acc(), 0.0);
    }

    #[test]
    fn speed_stays_bounded() {
        let mut acc = model(150.0);
        acc.reset();
        assert_eq!(acc.integrate(249.5, 1.0), 250.0);
        acc.stop();
        assert_eq!(acc.integrate(100.0, 10.0), 0.0);
    }

    #[test]
    fn following() {
        let mut acc = model(150.0);

        // Far enough behind; no limit
        acc.reset();
        acc.follow_vehicle(200.0, 100.0, 0.0);
        assert_eq!(acc.target(), 250.0);

        // Inside the safe distance of 1.2 * 100 = 120
        acc.reset();
        acc.follow_vehicle(60.0, 100.0, 80.0);
        assert_approx_eq!(acc.target(), 40.0);

        // Closer than the minimum gap
        acc.reset();
        acc.follow_vehicle(39.0, 0.0, 0.0);
        assert_eq!(acc.target(), 0.0);
    }
}
