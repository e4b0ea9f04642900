//! Simulation settings and tuning
//!
//! Loaded from a JSON file; any missing field falls back to its default.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        };
        f.write_str(name)
    }
}

impl FromStr for QualityPreset {
    type Err = SettingsError;

    /// Case-insensitive; accepts "med" for Medium
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(QualityPreset::Low),
            "medium" | "med" => Ok(QualityPreset::Medium),
            "high" => Ok(QualityPreset::High),
            _ => Err(SettingsError::UnknownPreset(s.to_owned())),
        }
    }
}

impl QualityPreset {
    /// Absolute particle ceiling per emitter for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 300,
            QualityPreset::High => 800,
        }
    }
}

/// Particle emitter tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    /// Particles per unit of thrust (doubled for explosions)
    pub per_thrust: f32,
    /// Dynamic cap at zero thrust
    pub cap_base: usize,
    /// Dynamic cap growth per unit of thrust
    pub cap_per_thrust: f32,
    /// Lifetime range in seconds
    pub life_min: f32,
    pub life_max: f32,
    /// Initial size range
    pub size_min: f32,
    pub size_max: f32,
    /// Start delay range in seconds (ignored for explosions)
    pub delay_min: f32,
    pub delay_max: f32,
    /// Per-axis velocity clamp
    pub max_axis_speed: f32,
    /// Exhaust speed per unit of thrust
    pub speed_per_thrust: f32,
    /// Explosion speed
    pub explosion_speed: f32,
    /// Seconds after ignition during which velocity is boosted
    pub ignition_window: f32,
    /// Velocity multiplier per 60 Hz step inside the ignition window
    pub ignition_boost: f32,
    /// Remaining life multiplier on impact
    pub impact_life_factor: f32,
    /// Gravity applied to particles
    pub gravity: f32,
    /// Bounce energy kept by particles
    pub bounce_energy: f32,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            per_thrust: PARTICLES_PER_THRUST,
            cap_base: PARTICLE_CAP_BASE,
            cap_per_thrust: PARTICLE_CAP_PER_THRUST,
            life_min: 0.6,
            life_max: 1.4,
            size_min: 2.0,
            size_max: 5.0,
            delay_min: 0.0,
            delay_max: 0.25,
            max_axis_speed: 12.0,
            speed_per_thrust: 0.2,
            explosion_speed: 8.0,
            ignition_window: 0.1,
            ignition_boost: 1.05,
            impact_life_factor: IMPACT_LIFE_FACTOR,
            gravity: 9.0,
            bounce_energy: 0.6,
        }
    }
}

impl ParticleSettings {
    /// Check that every sampled range is non-empty and non-negative
    pub fn validate(&self) -> Result<(), SettingsError> {
        let ranges = [
            ("life", self.life_min, self.life_max),
            ("size", self.size_min, self.size_max),
            ("delay", self.delay_min, self.delay_max),
        ];
        for (field, min, max) in ranges {
            if !(min >= 0.0 && min <= max && max.is_finite()) {
                return Err(SettingsError::InvalidRange { field });
            }
        }
        Ok(())
    }
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Quality preset (particle ceiling)
    pub quality: QualityPreset,
    /// World-roaming objects beyond this distance are hidden
    pub visibility_radius: f32,
    /// Seconds between collision checks involving static objects
    pub static_check_interval: f64,
    /// Anchor for screen-fixed objects
    pub screen_anchor: Vec3,
    /// Thrust at full control input
    pub max_thrust: f32,
    /// Particle tuning
    pub particles: ParticleSettings,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            visibility_radius: VISIBILITY_RADIUS,
            static_check_interval: STATIC_CHECK_INTERVAL,
            screen_anchor: Vec3::ZERO,
            max_thrust: MAX_THRUST,
            particles: ParticleSettings::default(),
        }
    }
}

impl SimSettings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Absolute particle ceiling
    pub fn max_particles(&self) -> usize {
        self.quality.max_particles()
    }

    /// Parse settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.particles.validate()?;
        Ok(settings)
    }

    /// Read and parse a settings file
    pub fn read(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings from a file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Using default settings ({}: {err})", path.display());
                Self::default()
            }
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
