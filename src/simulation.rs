#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::config::{ClockConfig, SimConfig};
use crate::error::ConfigError;
use crate::light::TrafficLight;
use crate::manager::{ManagerStats, VehicleManager};
use crate::vehicle::{Vehicle, VehicleSnapshot};
use log::info;

/// A signalised four-way junction with its traffic.
pub struct Simulation {
    /// The signal controller.
    light: TrafficLight,
    /// The vehicles.
    manager: VehicleManager,
    /// Clock scaling limits.
    clock: ClockConfig,
    /// The multiplier from wall-clock to simulated time.
    speed: f64,
    /// Whether stepping is suspended.
    paused: bool,
    /// The simulated time in s.
    elapsed: f64,
    /// The current frame of simulation.
    frame: usize,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a new simulation.
    pub fn new(config: &SimConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_manager(config, VehicleManager::new(config)?))
    }

    /// Creates a simulation whose traffic is reproducible.
    pub fn with_seed(config: &SimConfig, seed: u64) -> Result<Self, ConfigError> {
        Ok(Self::with_manager(config, VehicleManager::with_seed(config, seed)?))
    }

    fn with_manager(config: &SimConfig, manager: VehicleManager) -> Self {
        Self {
            light: TrafficLight::new(config.lights, &config.physics),
            manager,
            clock: config.clock,
            speed: config.clock.speed_range.clamp(config.clock.default_speed),
            paused: false,
            elapsed: 0.0,
            frame: 0,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        }
    }

    /// Advances the simulation by `real_dt` seconds of wall-clock time,
    /// scaled by the simulation speed. Does nothing while paused.
    ///
    /// There is no sub-stepping, so large steps let vehicles overshoot.
    pub fn step(&mut self, real_dt: f64) {
        if self.paused {
            return;
        }

        let dt = real_dt * self.speed;
        self.elapsed += dt;
        self.frame += 1;

        self.light.step(dt);
        self.manager.update(dt, &self.light);

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
    }

    /// Suspends stepping.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            info!("Simulation paused at {:.2}s", self.elapsed);
        }
    }

    /// Resumes stepping.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            info!("Simulation resumed at {:.2}s", self.elapsed);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Sets the simulation speed multiplier, clamped to the configured range.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = self.clock.speed_range.clamp(speed);
        info!("Simulation speed set to {:.1}x", self.speed);
    }

    /// The simulation speed multiplier.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Sets the traffic density level. See [VehicleManager::set_density].
    pub fn set_density(&mut self, level: usize) {
        self.manager.set_density(level);
    }

    /// Removes all traffic and restarts the signal cycle and clock.
    /// The speed multiplier and pause state are kept.
    pub fn reset(&mut self) {
        self.light.reset();
        self.manager.reset();
        self.elapsed = 0.0;
        self.frame = 0;
        info!("Simulation reset");
    }

    /// The simulated time in s.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Gets a read-only view of every vehicle, in spawn order.
    pub fn snapshots(&self) -> Vec<VehicleSnapshot> {
        self.manager.iter_vehicles().map(Vehicle::snapshot).collect()
    }

    /// Gets the population statistics.
    pub fn stats(&self) -> ManagerStats {
        self.manager.stats()
    }

    /// The signal controller.
    pub fn light(&self) -> &TrafficLight {
        &self.light
    }

    /// The signal controller, e.g. to change its timing.
    pub fn light_mut(&mut self) -> &mut TrafficLight {
        &mut self.light
    }

    /// The vehicle population.
    pub fn manager(&self) -> &VehicleManager {
        &self.manager
    }

    /// The vehicle population, e.g. to place vehicles.
    pub fn manager_mut(&mut self) -> &mut VehicleManager {
        &mut self.manager
    }

    /// Returns an iterator over all the vehicles in the simulation.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.manager.iter_vehicles()
    }

    /// Gets the debugging information for the previously simulated frame as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&self) -> serde_json::Value {
        self.debug.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::light::LightState;
    use crate::Axis;
    use assert_approx_eq::assert_approx_eq;

    fn sim() -> Simulation {
        Simulation::with_seed(&SimConfig::default(), 3).unwrap()
    }

    #[test]
    fn pause_stops_time() {
        let mut sim = sim();
        sim.step(0.5);
        sim.pause();
        assert!(sim.is_paused());
        sim.step(0.5);
        assert_eq!(sim.frame(), 1);
        assert_approx_eq!(sim.elapsed(), 0.5);
        sim.resume();
        sim.step(0.5);
        assert_eq!(sim.frame(), 2);
    }

    #[test]
    fn speed_scales_time() {
        let mut sim = sim();
        sim.set_speed(10.0);
        assert_eq!(sim.speed(), 3.0);
        sim.step(1.0);
        assert_approx_eq!(sim.elapsed(), 3.0);
        assert_approx_eq!(sim.light().elapsed(), 3.0);

        sim.set_speed(0.1);
        assert_eq!(sim.speed(), 0.5);
    }

    #[test]
    fn traffic_flows() {
        let mut sim = sim();
        for _ in 0..600 {
            sim.step(1.0 / 60.0);
        }
        let stats = sim.stats();
        assert!(stats.total_spawned > 0);
        assert_eq!(stats.current, sim.snapshots().len());
        assert_eq!(
            stats.total_spawned - stats.total_despawned,
            stats.current as u64
        );
    }

    #[test]
    fn reset_restarts() {
        let mut sim = sim();
        for _ in 0..400 {
            sim.step(1.0 / 30.0);
        }
        sim.reset();
        assert_eq!(sim.frame(), 0);
        assert_eq!(sim.iter_vehicles().count(), 0);
        let status = sim.light().status();
        assert_eq!(status.axis, Axis::NorthSouth);
        assert_eq!(status.state, LightState::Green);
    }
}
