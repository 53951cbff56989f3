//! The vehicle population: spawning, per-step updates and removal.

use crate::config::{SimConfig, SpawnConfig, VehiclePhysics};
use crate::debug::debug_point;
use crate::error::ConfigError;
use crate::layout::WaypointSource;
use crate::math::Point2d;
use crate::signal::SignalSource;
use crate::util::Interval;
use crate::vehicle::{Neighbor, Vehicle, VehicleAttributes, VehicleSpec};
use crate::{Direction, VehicleId, VehicleSet};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

/// Owns the simulated vehicles.
pub struct VehicleManager {
    /// Vehicle kinematics shared by all vehicles.
    physics: VehiclePhysics,
    /// Spawning parameters.
    spawn: SpawnConfig,
    /// The vehicle bodies to choose from when spawning.
    kinds: Vec<VehicleAttributes>,
    /// The junction geometry.
    layout: Box<dyn WaypointSource>,
    /// The vehicles being simulated.
    vehicles: VehicleSet,
    /// The vehicle IDs in the order the vehicles were spawned.
    order: Vec<VehicleId>,
    /// The time since the last spawn attempt in s.
    spawn_timer: f64,
    /// The time between the last spawn attempt and the next, in s.
    spawn_interval: f64,
    /// The spawn interval of the current density level, in s.
    base_interval: f64,
    /// The current density level.
    density: usize,
    /// The serial number of the next vehicle.
    next_serial: u64,
    /// Population statistics.
    stats: ManagerStats,
    /// The source of randomness for spawning.
    rng: StdRng,
    /// Scratch buffer of neighbouring vehicles.
    neighbors: Vec<Neighbor>,
}

/// Population statistics. These have no effect on the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManagerStats {
    pub total_spawned: u64,
    pub total_despawned: u64,
    pub max_concurrent: usize,
    pub current: usize,
}

impl VehicleManager {
    /// Creates a manager with an entropy-seeded random number generator.
    pub fn new(config: &SimConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Creates a manager whose spawning is reproducible.
    pub fn with_seed(config: &SimConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &SimConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut manager = Self {
            physics: config.physics,
            spawn: config.spawn.clone(),
            kinds: config.vehicle_kinds.clone(),
            layout: Box::new(config.layout.clone()),
            vehicles: VehicleSet::default(),
            order: vec![],
            spawn_timer: 0.0,
            spawn_interval: 0.0,
            base_interval: 0.0,
            density: 0,
            next_serial: 1,
            stats: ManagerStats::default(),
            rng,
            neighbors: vec![],
        };
        manager.set_density(config.spawn.default_density);
        Ok(manager)
    }

    /// Replaces the junction geometry used for vehicles spawned from now on.
    pub fn with_layout(mut self, layout: impl WaypointSource + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    /// Advances all vehicles by `dt` seconds.
    ///
    /// Vehicles are updated in the order they were spawned. Each sees the
    /// other vehicles as they are at that moment, so vehicles updated later
    /// in a step see the new positions of those updated earlier.
    pub fn update<S: SignalSource + ?Sized>(&mut self, dt: f64, signals: &S) {
        self.update_spawning(dt);

        for idx in 0..self.order.len() {
            let id = self.order[idx];
            self.neighbors.clear();
            self.neighbors.extend(
                self.order
                    .iter()
                    .filter(|other| **other != id)
                    .map(|other| self.vehicles[*other].as_neighbor()),
            );
            self.vehicles[id].update(dt, &self.neighbors, signals);
        }

        self.remove_finished_vehicles();
        self.stats.max_concurrent = usize::max(self.stats.max_concurrent, self.vehicles.len());
    }

    /// Counts down to the next spawn attempt, and attempts a spawn
    /// on a random lane when it is due.
    fn update_spawning(&mut self, dt: f64) {
        if self.vehicles.len() >= self.spawn.max_vehicles {
            return;
        }

        self.spawn_timer += dt;
        if self.spawn_timer < self.spawn_interval {
            return;
        }
        self.spawn_timer = 0.0;

        let direction = Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())];
        let lane = self.rng.gen_range(0..self.spawn.lanes);
        if self.can_spawn_in_direction(direction, lane) {
            self.spawn_vehicle(direction, lane);
        }

        // Jitter the interval so arrivals are not periodic
        let range = Interval::disc_rel(self.base_interval, self.spawn.interval_jitter);
        self.spawn_interval = Uniform::new_inclusive(range.min, range.max).sample(&mut self.rng);
    }

    /// The point at which vehicles enter a lane.
    pub fn spawn_point(&self, direction: Direction, lane: usize) -> Point2d {
        self.layout
            .waypoints(direction, lane)
            .first()
            .copied()
            .unwrap_or_else(|| Point2d::new(0.0, 0.0))
    }

    /// Whether the start of a lane is clear enough for a new vehicle.
    pub fn can_spawn_in_direction(&self, direction: Direction, lane: usize) -> bool {
        let spawn = self.spawn_point(direction, lane);
        self.iter_vehicles()
            .filter(|veh| veh.direction() == direction && veh.lane() == lane)
            .all(|veh| direction.along(spawn, veh.position()) >= self.spawn.clearance)
    }

    /// Adds a vehicle at the start of a lane, with a randomly chosen body and top speed.
    /// Returns `None` if the population is at its limit.
    ///
    /// The spawn clearance is not checked; see [Self::can_spawn_in_direction].
    pub fn spawn_vehicle(&mut self, direction: Direction, lane: usize) -> Option<VehicleId> {
        if self.vehicles.len() >= self.spawn.max_vehicles {
            return None;
        }

        let serial = self.next_serial;
        self.next_serial += 1;

        let attributes = self.kinds[self.rng.gen_range(0..self.kinds.len())];
        let variation = (self.rng.gen::<f64>() - 0.5) * self.physics.speed_variation;
        let spec = VehicleSpec {
            direction,
            lane,
            attributes,
            max_speed: self.physics.max_speed * (1.0 + variation),
        };

        let physics = &self.physics;
        let layout = &*self.layout;
        let id = self
            .vehicles
            .insert_with_key(|id| Vehicle::new(id, serial, &spec, physics, layout));
        self.order.push(id);
        self.stats.total_spawned += 1;

        let vehicle = &self.vehicles[id];
        debug_point("spawn", vehicle.position());
        debug!(
            "Spawned vehicle {} on {} lane {} (max speed {:.1})",
            serial,
            direction,
            lane,
            vehicle.max_speed()
        );
        Some(id)
    }

    /// Removes a vehicle from the simulation.
    pub fn remove_vehicle(&mut self, id: VehicleId) -> Option<Vehicle> {
        let vehicle = self.vehicles.remove(id)?;
        if let Some(idx) = self.order.iter().position(|other| *other == id) {
            self.order.remove(idx);
        }
        self.stats.total_despawned += 1;
        debug!("Removed vehicle {}", vehicle.serial());
        Some(vehicle)
    }

    /// Removes the vehicles which have finished their path or left the region.
    fn remove_finished_vehicles(&mut self) {
        let finished = self
            .order
            .iter()
            .copied()
            .filter(|id| self.vehicles[*id].should_remove())
            .collect::<Vec<_>>();
        for id in finished {
            self.remove_vehicle(id);
        }
    }

    /// Sets the spawn rate from a density level, clamped to the levels available.
    pub fn set_density(&mut self, level: usize) {
        let level = level.clamp(1, self.spawn.density_levels());
        self.density = level;
        self.base_interval = self.spawn.interval_for(level);
        self.spawn_interval = self.base_interval;
        debug!("Vehicle density set to {}/{}", level, self.spawn.density_levels());
    }

    /// The current density level.
    pub fn density(&self) -> usize {
        self.density
    }

    /// The time between the last spawn attempt and the next, in s.
    pub fn spawn_interval(&self) -> f64 {
        self.spawn_interval
    }

    /// Removes all vehicles and restores the initial spawn settings and statistics.
    pub fn reset(&mut self) {
        self.vehicles.clear();
        self.order.clear();
        self.next_serial = 1;
        self.spawn_timer = 0.0;
        self.stats = ManagerStats::default();
        self.set_density(self.spawn.default_density);
    }

    /// The number of vehicles being simulated.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Gets the population statistics.
    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            current: self.vehicles.len(),
            ..self.stats
        }
    }

    /// Returns an iterator over the vehicles in the order they were spawned.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.order.iter().map(|id| &self.vehicles[*id])
    }

    /// Gets a reference to the vehicle with the given ID, if it still exists.
    pub fn get_vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::signal::AlwaysGreen;

    fn manager() -> VehicleManager {
        VehicleManager::with_seed(&SimConfig::default(), 7).unwrap()
    }

    #[test]
    fn serials_increase() {
        let mut mgr = manager();
        let a = mgr.spawn_vehicle(Direction::North, 0).unwrap();
        let b = mgr.spawn_vehicle(Direction::East, 1).unwrap();
        assert_eq!(mgr.get_vehicle(a).unwrap().serial(), 1);
        assert_eq!(mgr.get_vehicle(b).unwrap().serial(), 2);
        assert_eq!(mgr.stats().total_spawned, 2);
    }

    #[test]
    fn max_speed_variation() {
        let mut mgr = manager();
        for _ in 0..50 {
            mgr.spawn_vehicle(Direction::West, 0);
        }
        for veh in mgr.iter_vehicles() {
            assert!(veh.max_speed() >= 225.0 && veh.max_speed() <= 275.0);
        }
    }

    #[test]
    fn population_limit() {
        let mut config = SimConfig::default();
        config.spawn.max_vehicles = 3;
        config.spawn.density_intervals = vec![0.01];
        let mut mgr = VehicleManager::with_seed(&config, 1).unwrap();
        for _ in 0..100 {
            mgr.update(0.02, &AlwaysGreen);
            assert!(mgr.vehicle_count() <= 3);
        }
        // Nobody has left yet, so the population is full
        assert_eq!(mgr.vehicle_count(), 3);
        assert!(mgr.spawn_vehicle(Direction::North, 0).is_none());
    }

    #[test]
    fn density_and_jitter() {
        let mut mgr = manager();
        assert_eq!(mgr.density(), 5);
        assert_eq!(mgr.spawn_interval(), 0.8);

        mgr.set_density(0);
        assert_eq!(mgr.density(), 1);
        mgr.set_density(11);
        assert_eq!(mgr.density(), 10);
        assert_eq!(mgr.spawn_interval(), 0.1);

        // Each attempt re-jitters around the level's interval, not the last interval
        for _ in 0..500 {
            mgr.update(0.05, &AlwaysGreen);
            let interval = mgr.spawn_interval();
            assert!((0.07 - 1e-9..=0.13 + 1e-9).contains(&interval));
        }
    }

    #[test]
    fn reset_clears_population() {
        let mut mgr = manager();
        mgr.spawn_vehicle(Direction::South, 0);
        mgr.set_density(9);
        mgr.reset();
        assert_eq!(mgr.vehicle_count(), 0);
        assert_eq!(mgr.density(), 5);
        assert_eq!(mgr.stats(), ManagerStats::default());
        let id = mgr.spawn_vehicle(Direction::South, 0).unwrap();
        assert_eq!(mgr.get_vehicle(id).unwrap().serial(), 1);
    }
}
