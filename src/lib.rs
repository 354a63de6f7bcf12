//! Rift Ordnance - simulation core for thrown area-effect items
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (ballistics, fuses, area effects, placement)
//! - `tuning`: Data-driven item presets
//!
//! The host game owns rendering, audio and entity storage. It implements
//! [`sim::Host`] and drives [`sim::Simulation::tick`] once per frame.

pub mod sim;
pub mod tuning;

pub use tuning::{GrenadePreset, Tuning, TuningError};

use glam::Vec3;

/// Simulation constants
pub mod consts {
    /// Fixed timestep used by the headless driver (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Gravity magnitude (units/s², applied along -Y)
    pub const GRAVITY: f32 = 9.81;

    /// Pull strength never drops below this fraction of the max force
    pub const PULL_FLOOR_FRACTION: f32 = 0.3;
    /// Entities closer than this to a pull center are left alone
    pub const PULL_MIN_DISTANCE: f32 = 0.5;

    /// Slack when comparing accumulated frame times against intervals
    pub const TIME_EPSILON: f32 = 1e-4;

    /// Random placement attempts before falling back
    pub const PLACEMENT_ATTEMPTS: u32 = 50;
    /// Height above a candidate the ground probe starts from
    pub const PLACEMENT_PROBE_HEIGHT: f32 = 50.0;
    /// Clearance sphere radius checked at a landing point
    pub const PLACEMENT_CLEARANCE: f32 = 0.4;
    /// Radius of the 8-point fallback ring
    pub const FALLBACK_RING_RADIUS: f32 = 2.0;
    /// Lift applied to the origin when every other placement fails
    pub const ORIGIN_LIFT: f32 = 0.5;

    /// Seconds before the same entity can be relocated again
    pub const RELOCATION_COOLDOWN: f32 = 1.0;
}

/// Project a vector onto the XZ plane
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Unit direction on the XZ plane for a yaw angle (radians)
#[inline]
pub fn yaw_direction(yaw: f32) -> Vec3 {
    Vec3::new(yaw.cos(), 0.0, yaw.sin())
}

/// Horizontal (XZ) distance between two points
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(b - a).length()
}
