//! Error types
//!
//! The numeric core never fails. Errors only describe a scene that was built
//! wrong or a settings file that could not be read.

use thiserror::Error;

/// A scene-construction invariant was violated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    /// A triangle vertex is NaN or infinite
    #[error("object {object:?} part {part:?} has a non-finite vertex")]
    NonFiniteVertex { object: String, part: String },

    /// A crash box has min > max on some axis
    #[error("object {object:?} crash box {index} has min greater than max")]
    InvertedCrashBox { object: String, index: usize },

    /// A surface handle points outside the registry
    #[error("object {object:?} refers to surface {handle} but only {count} are registered")]
    DanglingSurface {
        object: String,
        handle: usize,
        count: usize,
    },

    /// Surface-attached object without a surface to look tiles up in
    #[error("object {object:?} is attached to tile {tile_id} but has no parent surface")]
    MissingParentSurface { object: String, tile_id: u32 },

    /// World-roaming object without a surface to measure its distance from
    #[error("object {object:?} roams the world but has no parent surface")]
    RoamingWithoutSurface { object: String },

    /// Physics state with zero or negative mass
    #[error("object {object:?} has non-positive mass {mass}")]
    NonPositiveMass { object: String, mass: f32 },
}

/// Settings could not be loaded.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file")]
    Io(#[from] std::io::Error),

    #[error("invalid settings JSON")]
    Json(#[from] serde_json::Error),

    /// A min/max pair where min exceeds max, or a negative bound
    #[error("particle setting {field} has an empty or negative range")]
    InvalidRange { field: &'static str },

    #[error("unknown quality preset {0:?}")]
    UnknownPreset(String),
}
