pub use cgmath;
pub use config::{ClockConfig, LightTiming, SimConfig, SpawnConfig, VehiclePhysics};
pub use direction::{Axis, Direction};
pub use error::ConfigError;
pub use layout::{Path, PerDirection, RoadLayout, WaypointSource};
pub use light::{LightState, LightStatus, PhaseChange, TrafficLight};
pub use manager::{ManagerStats, VehicleManager};
pub use signal::{AlwaysGreen, SignalSource};
pub use simulation::Simulation;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use util::Interval;
pub use vehicle::{
    Neighbor, Vehicle, VehicleAttributes, VehicleSnapshot, VehicleSpec, VehicleState,
};

mod config;
mod debug;
mod direction;
mod error;
mod layout;
mod light;
mod manager;
pub mod math;
mod signal;
mod simulation;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
