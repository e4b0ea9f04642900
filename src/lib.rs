//! Skyflight - simulation core of a small 3D flight scene
//!
//! Core modules:
//! - `sim`: Per-frame simulation (rotation, placement, collision, physics, particles)
//! - `settings`: Data-driven tuning loaded from JSON
//! - `error`: Scene-construction and settings errors

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{SceneError, SettingsError};
pub use settings::{ParticleSettings, QualityPreset, SimSettings};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, the damping baseline)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Floor divisor when normalizing a degenerate face normal
    pub const NORMAL_EPSILON: f32 = 1e-6;
    /// Light position; the light vector points from the origin toward it
    pub const LIGHT_POSITION: [f32; 3] = [0.0, 0.0, 250.0];

    /// World-roaming objects further than this from the surface are hidden
    pub const VISIBILITY_RADIUS: f32 = 1400.0;
    /// Minimum seconds between collision checks involving static objects
    pub const STATIC_CHECK_INTERVAL: f64 = 0.1;

    /// Flat per-step damping applied by the gravity step
    pub const GRAVITY_DAMPING: f32 = 0.95;
    /// Frames during which gravity is suspended after a bounce
    pub const BOUNCE_COOLDOWN_FRAMES: u32 = 3;
    /// Frame rate that drag is normalized against
    pub const DRAG_BASELINE_HZ: f32 = 60.0;

    /// Maximum ship thrust (control input 1.0)
    pub const MAX_THRUST: f32 = 40.0;
    /// Particles spawned per unit of thrust
    pub const PARTICLES_PER_THRUST: f32 = 0.5;
    /// Dynamic particle cap at zero thrust
    pub const PARTICLE_CAP_BASE: usize = 40;
    /// Extra cap per unit of thrust
    pub const PARTICLE_CAP_PER_THRUST: f32 = 6.0;
    /// Remaining life multiplier applied on impact
    pub const IMPACT_LIFE_FACTOR: f32 = 0.8;
}

/// Convert degrees to radians
#[inline]
pub fn deg_to_rad(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle % 360.0;
    if wrapped < 0.0 { wrapped + 360.0 } else { wrapped }
}
