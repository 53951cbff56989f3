//! Simulation configuration.
//!
//! The defaults describe an 800x800 px junction with two lanes per approach.
//! Distances are in pixels and times in seconds.

use crate::error::ConfigError;
use crate::layout::RoadLayout;
use crate::util::Interval;
use crate::vehicle::VehicleAttributes;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Spawn intervals for density levels 1 to 10, in s.
const DENSITY_INTERVALS: [f64; 10] = [3.0, 2.0, 1.5, 1.0, 0.8, 0.6, 0.4, 0.3, 0.2, 0.1];

/// The default vehicle bodies.
const VEHICLE_KINDS: [VehicleAttributes; 5] = [
    VehicleAttributes::new(30.0, 50.0), // car
    VehicleAttributes::new(35.0, 60.0), // suv
    VehicleAttributes::new(40.0, 70.0), // truck
    VehicleAttributes::new(28.0, 45.0), // sports car
    VehicleAttributes::new(32.0, 55.0), // van
];

/// The complete configuration of a [Simulation](crate::Simulation).
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Vehicle kinematics.
    pub physics: VehiclePhysics,
    /// Spawning and population limits.
    pub spawn: SpawnConfig,
    /// Junction geometry.
    pub layout: RoadLayout,
    /// Signal timing.
    pub lights: LightTiming,
    /// Simulation clock scaling.
    pub clock: ClockConfig,
    /// The vehicle bodies to choose from when spawning.
    pub vehicle_kinds: Vec<VehicleAttributes>,
}

/// Kinematic parameters shared by all vehicles.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VehiclePhysics {
    /// Acceleration magnitude in px/s<sup>2</sup>.
    pub acceleration: f64,
    /// Braking magnitude in px/s<sup>2</sup>.
    pub deceleration: f64,
    /// The base maximum speed in px/s.
    pub max_speed: f64,
    /// The relative spread of per-vehicle maximum speeds, e.g. 0.2 for ±10%.
    pub speed_variation: f64,
    /// Following distance per unit of speed, in s.
    pub safe_distance_factor: f64,
    /// The gap below which a follower brakes to a stop, in px.
    pub min_following_distance: f64,
    /// Driver reaction time used when deciding to stop for a signal, in s.
    pub reaction_time: f64,
}

/// Spawning parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpawnConfig {
    /// No vehicles are spawned while the population is at least this size.
    pub max_vehicles: usize,
    /// The number of lanes per approach to spawn into.
    pub lanes: usize,
    /// The clear distance required ahead of a spawn point, in px.
    pub clearance: f64,
    /// The relative jitter applied to the spawn interval after each attempt.
    pub interval_jitter: f64,
    /// Spawn intervals indexed by density level - 1, in s.
    pub density_intervals: Vec<f64>,
    /// The density level used initially and after a reset.
    pub default_density: usize,
}

/// Signal phase durations, in s.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LightTiming {
    pub ns_green: f64,
    pub ns_amber: f64,
    pub ew_green: f64,
    pub ew_amber: f64,
    /// How long into an amber phase vehicles may still pass.
    pub safety_interval: f64,
    /// The number of phase records kept in the light's history.
    pub history_len: usize,
}

/// Scaling of wall-clock time into simulated time.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClockConfig {
    /// The initial speed multiplier.
    pub default_speed: f64,
    /// The permitted range of speed multipliers.
    pub speed_range: Interval<f64>,
}

impl SimConfig {
    /// Parses a JSON configuration. Missing fields take their default values.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration describes a runnable simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        positive("physics.acceleration", p.acceleration)?;
        positive("physics.deceleration", p.deceleration)?;
        positive("physics.max_speed", p.max_speed)?;
        positive("physics.min_following_distance", p.min_following_distance)?;
        non_negative("physics.safe_distance_factor", p.safe_distance_factor)?;
        non_negative("physics.reaction_time", p.reaction_time)?;
        if !(0.0..1.0).contains(&p.speed_variation) {
            return Err(ConfigError::SpeedVariation(p.speed_variation));
        }

        let s = &self.spawn;
        if s.density_intervals.is_empty() {
            return Err(ConfigError::EmptyDensityTable);
        }
        for interval in &s.density_intervals {
            positive("spawn.density_intervals", *interval)?;
        }
        positive("spawn.lanes", s.lanes as f64)?;
        non_negative("spawn.clearance", s.clearance)?;
        non_negative("spawn.interval_jitter", s.interval_jitter)?;

        self.layout.validate()?;

        let l = &self.lights;
        positive("lights.ns_green", l.ns_green)?;
        positive("lights.ns_amber", l.ns_amber)?;
        positive("lights.ew_green", l.ew_green)?;
        positive("lights.ew_amber", l.ew_amber)?;
        non_negative("lights.safety_interval", l.safety_interval)?;

        let c = &self.clock;
        if !c.speed_range.is_valid() {
            return Err(ConfigError::InvertedSpeedRange {
                min: c.speed_range.min,
                max: c.speed_range.max,
            });
        }
        positive("clock.speed_range.min", c.speed_range.min)?;

        if self.vehicle_kinds.is_empty() {
            return Err(ConfigError::NoVehicleKinds);
        }
        Ok(())
    }
}

impl SpawnConfig {
    /// The number of density levels.
    pub fn density_levels(&self) -> usize {
        self.density_intervals.len()
    }

    /// Gets the spawn interval for a density level, clamping the level
    /// into the table's range.
    pub fn interval_for(&self, level: usize) -> f64 {
        let level = level.clamp(1, self.density_levels());
        self.density_intervals[level - 1]
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            physics: VehiclePhysics::default(),
            spawn: SpawnConfig::default(),
            layout: RoadLayout::default(),
            lights: LightTiming::default(),
            clock: ClockConfig::default(),
            vehicle_kinds: VEHICLE_KINDS.to_vec(),
        }
    }
}

impl Default for VehiclePhysics {
    fn default() -> Self {
        Self {
            acceleration: 100.0,
            deceleration: 150.0,
            max_speed: 250.0,
            speed_variation: 0.2,
            safe_distance_factor: 1.2,
            min_following_distance: 40.0,
            reaction_time: 0.5,
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            max_vehicles: 150,
            lanes: 2,
            clearance: 120.0,
            interval_jitter: 0.3,
            density_intervals: DENSITY_INTERVALS.to_vec(),
            default_density: 5,
        }
    }
}

impl Default for LightTiming {
    fn default() -> Self {
        Self {
            ns_green: 5.0,
            ns_amber: 2.0,
            ew_green: 5.0,
            ew_amber: 2.0,
            safety_interval: 1.0,
            history_len: 1000,
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            speed_range: Interval::new(0.5, 3.0),
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}
