use self::acceleration::{AccelerationModel, ModelParams, REST_SPEED};
use self::dynamics::PathFollower;
use crate::config::VehiclePhysics;
use crate::debug::debug_line;
use crate::layout::WaypointSource;
use crate::math::Point2d;
use crate::signal::SignalSource;
use crate::util::Interval;
use crate::{Direction, VehicleId};
use cgmath::MetricSpace;
use log::{trace, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod acceleration;
mod dynamics;

/// Signals are only consulted within this range of signed distances
/// to the stop line, in px.
const SIGNAL_LOOKAHEAD: Interval<f64> = Interval::new(-50.0, 400.0);

/// A vehicle this far past the stop line, in px, no longer brakes for it.
const STOP_LINE_TOLERANCE: f64 = -20.0;

/// The fraction of top speed at which an accelerating vehicle is cruising.
const CRUISE_FRACTION: f64 = 0.9;

/// A simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID
    pub(crate) id: VehicleId,
    /// The vehicle's sequence number, unique within a simulation.
    serial: u64,
    /// The approach the vehicle arrived from.
    direction: Direction,
    /// The lane the vehicle travels in.
    lane: usize,
    /// The vehicle's body dimensions.
    attributes: VehicleAttributes,
    /// The acceleration model
    acc: AccelerationModel,
    /// Progress along the vehicle's path.
    route: PathFollower,
    /// The track coordinate of the stop line on the vehicle's approach.
    stop_line: f64,
    /// Outside this region on either axis the vehicle is removed.
    bounds: Interval<f64>,
    /// The world space coordinates of the centre of the vehicle.
    pos: Point2d,
    /// The speed in px/s.
    vel: f64,
    /// The behavioural state.
    state: VehicleState,
    /// Whether the vehicle came to rest for a signal and is waiting for it.
    has_stopped: bool,
}

/// The body dimensions of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleAttributes {
    /// The vehicle width in px.
    pub width: f64,
    /// The vehicle length in px.
    pub length: f64,
}

/// Where and how a new vehicle drives.
#[derive(Clone, Copy, Debug)]
pub struct VehicleSpec {
    pub direction: Direction,
    pub lane: usize,
    pub attributes: VehicleAttributes,
    /// The vehicle's top speed in px/s.
    pub max_speed: f64,
}

/// The behavioural state of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VehicleState {
    Spawning,
    Accelerating,
    Cruising,
    Decelerating,
    Stopped,
    Leaving,
}

/// What a vehicle can see of another vehicle.
#[derive(Clone, Copy, Debug)]
pub struct Neighbor {
    pub serial: u64,
    pub direction: Direction,
    pub lane: usize,
    pub position: Point2d,
    pub speed: f64,
}

/// A read-only view of a vehicle for renderers.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleSnapshot {
    pub serial: u64,
    pub direction: Direction,
    pub lane: usize,
    pub position: [f64; 2],
    /// The body rotation in degrees.
    pub heading: f64,
    pub width: f64,
    pub length: f64,
    pub speed: f64,
    pub is_braking: bool,
    pub state: VehicleState,
    pub progress: f64,
}

impl VehicleAttributes {
    pub const fn new(width: f64, length: f64) -> Self {
        Self { width, length }
    }
}

impl Vehicle {
    /// Creates a new vehicle at the start of its lane.
    pub fn new(
        id: VehicleId,
        serial: u64,
        spec: &VehicleSpec,
        physics: &VehiclePhysics,
        layout: &dyn WaypointSource,
    ) -> Self {
        let route = PathFollower::new(layout.waypoints(spec.direction, spec.lane));
        let pos = route.start().unwrap_or_else(|| {
            warn!(
                "No waypoints found for vehicle {} ({} lane {})",
                serial, spec.direction, spec.lane
            );
            Point2d::new(0.0, 0.0)
        });

        Self {
            id,
            serial,
            direction: spec.direction,
            lane: spec.lane,
            attributes: spec.attributes,
            acc: AccelerationModel::new(&ModelParams {
                max_acceleration: physics.acceleration,
                deceleration: physics.deceleration,
                max_speed: spec.max_speed,
                min_gap: physics.min_following_distance,
                time_headway: physics.safe_distance_factor,
            }),
            route,
            stop_line: layout.stop_line(spec.direction),
            bounds: layout.bounds(),
            pos,
            vel: 0.0,
            state: VehicleState::Spawning,
            has_stopped: false,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// Gets the vehicle's sequence number.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// The approach the vehicle arrived from.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The lane the vehicle travels in.
    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn attributes(&self) -> VehicleAttributes {
        self.attributes
    }

    /// The coordinates in world space of the centre of the vehicle.
    pub fn position(&self) -> Point2d {
        self.pos
    }

    /// The vehicle's speed in px/s.
    pub fn speed(&self) -> f64 {
        self.vel
    }

    /// The vehicle's top speed in px/s.
    pub fn max_speed(&self) -> f64 {
        self.acc.max_vel()
    }

    /// The speed the vehicle was aiming for in the last update, in px/s.
    pub fn target_speed(&self) -> f64 {
        self.acc.target()
    }

    /// The acceleration applied in the last update, in px/s<sup>2</sup>.
    pub fn acceleration(&self) -> f64 {
        self.acc.acc()
    }

    /// Whether the brake lights are on.
    pub fn is_braking(&self) -> bool {
        self.acc.is_braking()
    }

    pub fn state(&self) -> VehicleState {
        self.state
    }

    /// Whether the vehicle came to rest for a signal and is waiting for it to change.
    pub fn has_stopped(&self) -> bool {
        self.has_stopped
    }

    /// The fraction of the path completed.
    pub fn progress(&self) -> f64 {
        self.route.progress()
    }

    /// The index of the waypoint most recently reached.
    pub fn waypoint_index(&self) -> usize {
        self.route.index()
    }

    /// The signed distance to the stop line along the direction of travel.
    /// Negative once the vehicle has crossed it.
    pub fn distance_to_stop_line(&self) -> f64 {
        self.direction.along_to_coord(self.pos, self.stop_line)
    }

    /// Calculates the highest speed from which the vehicle could stop
    /// within `distance` px.
    pub fn stopping_speed(&self, distance: f64) -> f64 {
        self.acc.stopping_speed(distance)
    }

    /// Whether the vehicle has finished its path or left the simulated region.
    pub fn should_remove(&self) -> bool {
        self.route.progress() >= 1.0
            || !self.bounds.contains(self.pos.x)
            || !self.bounds.contains(self.pos.y)
    }

    /// Gets the view other vehicles have of this one.
    pub fn as_neighbor(&self) -> Neighbor {
        Neighbor {
            serial: self.serial,
            direction: self.direction,
            lane: self.lane,
            position: self.pos,
            speed: self.vel,
        }
    }

    /// Gets a read-only view of the vehicle for rendering.
    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            serial: self.serial,
            direction: self.direction,
            lane: self.lane,
            position: [self.pos.x, self.pos.y],
            heading: self.direction.heading_degrees(),
            width: self.attributes.width,
            length: self.attributes.length,
            speed: self.vel,
            is_braking: self.is_braking(),
            state: self.state,
            progress: self.route.progress(),
        }
    }

    /// Finds the nearest vehicle ahead in the same lane, and the distance to it.
    pub fn find_leading_vehicle<'a>(&self, others: &'a [Neighbor]) -> Option<(&'a Neighbor, f64)> {
        others
            .iter()
            .filter(|other| {
                other.serial != self.serial
                    && other.direction == self.direction
                    && other.lane == self.lane
                    && self.direction.along(self.pos, other.position) > 0.0
            })
            .map(|other| (other, self.pos.distance(other.position)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Advances the vehicle by `dt` seconds.
    ///
    /// # Parameters
    /// * `dt` - The time step in seconds
    /// * `others` - The other vehicles in the simulation
    /// * `signals` - The junction's signals
    pub fn update<S: SignalSource + ?Sized>(&mut self, dt: f64, others: &[Neighbor], signals: &S) {
        self.update_state(signals);
        self.calc_target_speed(others, signals);
        self.vel = self.acc.integrate(self.vel, dt);
        self.integrate_position(dt);

        if self.route.progress() >= 1.0 {
            self.set_state(VehicleState::Leaving);
        }
    }

    /// Applies the state transitions which depend on the previous step.
    fn update_state<S: SignalSource + ?Sized>(&mut self, signals: &S) {
        use VehicleState::*;
        match self.state {
            Spawning => self.set_state(Accelerating),
            Accelerating if self.vel >= CRUISE_FRACTION * self.max_speed() => {
                self.set_state(Cruising)
            }
            Decelerating if self.vel <= REST_SPEED => {
                self.vel = 0.0;
                self.has_stopped = true;
                self.set_state(Stopped);
            }
            Stopped if self.has_stopped && signals.can_pass(self.direction) => {
                self.has_stopped = false;
                self.set_state(Accelerating);
            }
            _ => {}
        }
    }

    /// Applies the signal and car following rules to find this step's target speed.
    fn calc_target_speed<S: SignalSource + ?Sized>(&mut self, others: &[Neighbor], signals: &S) {
        self.acc.reset();

        if self.route.next_waypoint().is_some() {
            let dist = self.distance_to_stop_line();
            if SIGNAL_LOOKAHEAD.contains_open(dist) {
                if signals.should_prepare_to_stop(self.direction, dist, self.vel) {
                    self.acc.stop();
                    if matches!(self.state, VehicleState::Accelerating | VehicleState::Cruising) {
                        self.set_state(VehicleState::Decelerating);
                    }
                }
                if !signals.can_pass(self.direction) && dist > STOP_LINE_TOLERANCE {
                    self.acc.stop_at_line(dist);
                }
            }
        }

        if let Some((leader, gap)) = self.find_leading_vehicle(others) {
            debug_line("follow", self.pos, leader.position);
            self.acc.follow_vehicle(gap, self.vel, leader.speed);
        }

        self.acc.limit(self.acc.max_vel());
    }

    /// Moves the vehicle along its path at its current speed.
    fn integrate_position(&mut self, dt: f64) {
        if self.vel == 0.0 {
            return;
        }
        self.route.advance(&mut self.pos, self.vel * dt);
    }

    fn set_state(&mut self, state: VehicleState) {
        if self.state != state {
            trace!("Vehicle {}: {:?} -> {:?}", self.serial, self.state, state);
            self.state = state;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::layout::RoadLayout;
    use crate::signal::AlwaysGreen;
    use assert_approx_eq::assert_approx_eq;

    fn vehicle(serial: u64, direction: Direction) -> Vehicle {
        Vehicle::new(
            VehicleId::default(),
            serial,
            &VehicleSpec {
                direction,
                lane: 0,
                attributes: VehicleAttributes::new(30.0, 50.0),
                max_speed: 250.0,
            },
            &VehiclePhysics::default(),
            &RoadLayout::default(),
        )
    }

    fn neighbor(serial: u64, direction: Direction, lane: usize, x: f64, y: f64) -> Neighbor {
        Neighbor {
            serial,
            direction,
            lane,
            position: Point2d::new(x, y),
            speed: 0.0,
        }
    }

    #[test]
    fn starts_at_spawn_point() {
        let veh = vehicle(1, Direction::West);
        assert_eq!(veh.position(), Point2d::new(-100.0, 375.0));
        assert_eq!(veh.state(), VehicleState::Spawning);
        assert_approx_eq!(veh.distance_to_stop_line(), 390.0);
    }

    #[test]
    fn leading_vehicle_same_lane_only() {
        // Southbound lane 0 runs along x = 375 towards -y
        let veh = vehicle(1, Direction::South);
        let others = [
            neighbor(2, Direction::South, 0, 375.0, 700.0), // ahead
            neighbor(3, Direction::South, 0, 375.0, 800.0), // nearest ahead
            neighbor(4, Direction::South, 0, 375.0, 950.0), // behind
            neighbor(5, Direction::South, 1, 325.0, 880.0), // other lane
            neighbor(6, Direction::North, 0, 375.0, 890.0), // other approach
            neighbor(1, Direction::South, 0, 375.0, 890.0), // itself
        ];
        let (leader, gap) = veh.find_leading_vehicle(&others).unwrap();
        assert_eq!(leader.serial, 3);
        assert_approx_eq!(gap, 100.0);
    }

    #[test]
    fn accelerates_from_spawn() {
        let mut veh = vehicle(1, Direction::North);
        veh.update(0.1, &[], &AlwaysGreen);
        assert_eq!(veh.state(), VehicleState::Accelerating);
        assert_approx_eq!(veh.speed(), 10.0);
        assert_approx_eq!(veh.position().y, -99.0);
        assert!(veh.progress() > 0.0);
    }

    #[test]
    fn red_light_limits_speed() {
        struct Red;
        impl SignalSource for Red {
            fn can_pass(&self, _: Direction) -> bool {
                false
            }
            fn should_prepare_to_stop(&self, _: Direction, _: f64, _: f64) -> bool {
                false
            }
        }

        // 390 px from the stop line: sqrt(2 * 150 * 390) = 342 > 250
        let mut veh = vehicle(1, Direction::East);
        veh.update(0.01, &[], &Red);
        assert_eq!(veh.target_speed(), 250.0);

        // Bring it 30 px from the line
        let mut veh = vehicle(1, Direction::East);
        veh.pos.x = 540.0;
        veh.update(0.01, &[], &Red);
        assert_approx_eq!(veh.target_speed(), 9000f64.sqrt());
    }
}
