use crate::config::{LightTiming, VehiclePhysics};
use crate::direction::{Axis, Direction};
use crate::signal::SignalSource;
use log::{info, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// The minimum duration of a signal phase in s.
const MIN_PHASE_DURATION: f64 = 1.0;

/// A fixed-cycle signal controlling a four-way junction.
///
/// Right of way alternates between the north-south and east-west axes.
/// Each axis shows green then amber while the crossing axis shows red.
#[derive(Clone, Debug)]
pub struct TrafficLight {
    /// The phase durations.
    timing: LightTiming,
    /// The braking capability assumed when advising vehicles to stop.
    deceleration: f64,
    /// The reaction time assumed when advising vehicles to stop.
    reaction_time: f64,
    /// The axis which currently has right of way.
    axis: Axis,
    /// The state shown to the axis with right of way.
    state: LightState,
    /// The time since the current phase was entered in s.
    since: f64,
    /// The total time simulated in s.
    elapsed: f64,
    /// The most recent phase transitions, oldest first.
    history: VecDeque<PhaseChange>,
}

/// The state of a traffic light.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LightState {
    Red,
    Amber,
    Green,
}

/// A snapshot of the light's timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightStatus {
    pub axis: Axis,
    pub state: LightState,
    /// The time since the phase was entered in s.
    pub since: f64,
    /// The time until the phase ends in s.
    pub remaining: f64,
}

/// A record of one phase transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseChange {
    /// The simulated time of the transition in s.
    pub at: f64,
    pub from: (Axis, LightState),
    pub to: (Axis, LightState),
}

impl TrafficLight {
    /// Creates a light at the start of the north-south green phase.
    pub fn new(timing: LightTiming, physics: &VehiclePhysics) -> Self {
        Self {
            timing,
            deceleration: physics.deceleration,
            reaction_time: physics.reaction_time,
            axis: Axis::NorthSouth,
            state: LightState::Green,
            since: 0.0,
            elapsed: 0.0,
            history: VecDeque::new(),
        }
    }

    /// Advances the light's timing by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.elapsed += dt;
        self.since += dt;
        if self.since >= self.duration(self.axis, self.state) {
            self.advance_phase();
        }
    }

    /// Gets the light shown to an approach.
    pub fn state_for(&self, direction: Direction) -> LightState {
        if direction.axis() == self.axis {
            self.state
        } else {
            LightState::Red
        }
    }

    /// Gets the current phase and its timing.
    pub fn status(&self) -> LightStatus {
        LightStatus {
            axis: self.axis,
            state: self.state,
            since: self.since,
            remaining: f64::max(0.0, self.duration(self.axis, self.state) - self.since),
        }
    }

    /// The total time simulated in s.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// The phase timing currently in use.
    pub fn timing(&self) -> &LightTiming {
        &self.timing
    }

    /// The most recent phase transitions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &PhaseChange> {
        self.history.iter()
    }

    /// Changes the duration of a green or amber phase, to no less than one second.
    /// If that phase is running and has already lasted longer, it ends immediately.
    pub fn set_timing(&mut self, axis: Axis, state: LightState, seconds: f64) {
        let seconds = f64::max(MIN_PHASE_DURATION, seconds);
        let slot = match (axis, state) {
            (Axis::NorthSouth, LightState::Green) => &mut self.timing.ns_green,
            (Axis::NorthSouth, LightState::Amber) => &mut self.timing.ns_amber,
            (Axis::EastWest, LightState::Green) => &mut self.timing.ew_green,
            (Axis::EastWest, LightState::Amber) => &mut self.timing.ew_amber,
            (_, LightState::Red) => {
                warn!("Red phase of {} follows from the crossing axis; ignoring timing", axis);
                return;
            }
        };
        *slot = seconds;
        info!("Set {} {:?} duration to {}s", axis, state, seconds);

        if self.axis == axis && self.state == state && self.since >= seconds {
            self.advance_phase();
        }
    }

    /// Returns the light to the start of the north-south green phase.
    pub fn reset(&mut self) {
        self.axis = Axis::NorthSouth;
        self.state = LightState::Green;
        self.since = 0.0;
        self.elapsed = 0.0;
        self.history.clear();
    }

    /// The configured duration of a phase in s.
    fn duration(&self, axis: Axis, state: LightState) -> f64 {
        let t = &self.timing;
        match (axis, state) {
            (Axis::NorthSouth, LightState::Green) => t.ns_green,
            (Axis::NorthSouth, LightState::Amber) => t.ns_amber,
            (Axis::EastWest, LightState::Green) => t.ew_green,
            (Axis::EastWest, LightState::Amber) => t.ew_amber,
            (axis, LightState::Red) => {
                // Red lasts for the crossing axis' green and amber
                let other = axis.other();
                self.duration(other, LightState::Green) + self.duration(other, LightState::Amber)
            }
        }
    }

    /// Moves to the next phase in the cycle.
    fn advance_phase(&mut self) {
        use LightState::*;
        let from = (self.axis, self.state);
        let to = match from {
            (axis, Green) => (axis, Amber),
            (axis, Amber) | (axis, Red) => (axis.other(), Green),
        };
        (self.axis, self.state) = to;
        self.since = 0.0;

        info!("Traffic light transition: {}_{:?} -> {}_{:?}", from.0, from.1, to.0, to.1);

        if self.timing.history_len > 0 {
            if self.history.len() >= self.timing.history_len {
                self.history.pop_front();
            }
            self.history.push_back(PhaseChange {
                at: self.elapsed,
                from,
                to,
            });
        }
    }
}

impl SignalSource for TrafficLight {
    fn can_pass(&self, direction: Direction) -> bool {
        match self.state_for(direction) {
            LightState::Green => true,
            LightState::Amber => self.since < self.timing.safety_interval,
            LightState::Red => false,
        }
    }

    fn should_prepare_to_stop(&self, direction: Direction, distance: f64, speed: f64) -> bool {
        if self.can_pass(direction) {
            return false;
        }
        let braking_distance = speed.powi(2) / (2.0 * self.deceleration);
        let reaction_distance = speed * self.reaction_time;
        distance <= braking_distance + reaction_distance
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn light() -> TrafficLight {
        TrafficLight::new(LightTiming::default(), &VehiclePhysics::default())
    }

    fn run(light: &mut TrafficLight, seconds: f64) {
        let dt = 1.0 / 60.0;
        for _ in 0..(seconds / dt).round() as usize {
            light.step(dt);
        }
    }

    #[test]
    fn cycles_through_phases() {
        let mut light = light();
        assert_eq!(light.state_for(Direction::North), LightState::Green);
        assert_eq!(light.state_for(Direction::East), LightState::Red);

        run(&mut light, 5.1);
        assert_eq!(light.state_for(Direction::South), LightState::Amber);

        run(&mut light, 2.0);
        assert_eq!(light.state_for(Direction::South), LightState::Red);
        assert_eq!(light.state_for(Direction::West), LightState::Green);

        run(&mut light, 7.0);
        assert_eq!(light.state_for(Direction::North), LightState::Green);
        assert_eq!(light.history().count(), 4);
    }

    #[test]
    fn amber_safety_interval() {
        let mut light = light();
        run(&mut light, 5.1);
        assert!(light.can_pass(Direction::North));
        run(&mut light, 1.0);
        assert!(!light.can_pass(Direction::North));
        assert!(!light.can_pass(Direction::East));
    }

    #[test]
    fn prepare_to_stop_distance() {
        let mut light = light();
        run(&mut light, 5.1);
        // North-south is early in amber and may still pass
        assert!(!light.should_prepare_to_stop(Direction::North, 10.0, 200.0));
        // 150^2 / 300 + 0.5 * 150 = 150
        assert!(light.should_prepare_to_stop(Direction::East, 150.0, 150.0));
        assert!(!light.should_prepare_to_stop(Direction::East, 151.0, 150.0));
        assert!(!light.should_prepare_to_stop(Direction::East, 1.0, 0.0));
    }

    #[test]
    fn shortened_phase_ends_immediately() {
        let mut light = light();
        run(&mut light, 3.0);
        light.set_timing(Axis::NorthSouth, LightState::Green, 0.5);
        assert_eq!(light.timing().ns_green, MIN_PHASE_DURATION);
        assert_eq!(light.status().state, LightState::Amber);
        assert_approx_eq!(light.status().remaining, 2.0);
    }
}
