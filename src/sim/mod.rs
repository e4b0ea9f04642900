//! Simulation core
//!
//! Everything that runs once per frame lives here. Stages run in a fixed order:
//! - Movement policies update poses
//! - Placement resolves anchors
//! - Rotation produces this frame's geometry
//! - Collision flags overlapping crash boxes
//! - Physics and particles advance bodies
//!
//! No stage touches the renderer, input devices or the filesystem.

pub mod collision;
pub mod geometry;
pub mod movement;
pub mod particles;
pub mod physics;
pub mod placement;
pub mod rotation;
pub mod state;
pub mod tick;

pub use collision::{CollisionContext, CollisionReport, impact_direction, world_crash_boxes};
pub use geometry::{Axis, CrashBox, ObjectPart, Rgb, Triangle, Vec3, face_normal};
pub use movement::{MovementContext, MovementPolicy, Pose, ShipControls};
pub use particles::{Particle, ParticleEmitter, gradient_color};
pub use physics::{ImpactDirection, PhysicsState};
pub use placement::{
    PlacementKind, Surface, SurfaceHandle, SurfaceRegistry, center_crash_boxes, center_geometry,
    resolve_world_anchor,
};
pub use rotation::{rotate, rotate_point, rotate_point_zyx, rotate_zyx};
pub use state::{Object, ObjectKind, World};
pub use tick::{Frame, RenderedObject, TickInput, tick};
