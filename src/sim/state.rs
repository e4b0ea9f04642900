//! World state and core simulation types
//!
//! Objects are built once by the scene and only carry state that must persist
//! between frames: collision flags, physics velocity and particles. Everything
//! rotated or anchored is recomputed each frame.

use serde::{Deserialize, Serialize};

use super::collision::CollisionContext;
use super::geometry::{CrashBox, ObjectPart, Triangle, Vec3};
use super::movement::MovementPolicy;
use super::particles::ParticleEmitter;
use super::physics::{ImpactDirection, PhysicsState};
use super::placement::{PlacementKind, SurfaceHandle, SurfaceRegistry};
use crate::error::SceneError;
use crate::settings::SimSettings;

/// What an object is; decides static/dynamic collision handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Ship,
    Seeder,
    Tree,
    House,
    Ground,
    Star,
    Other,
}

impl ObjectKind {
    /// Terrain features that never move: checked against others only
    /// periodically and never against each other.
    pub fn is_static(self) -> bool {
        matches!(self, ObjectKind::Ground | ObjectKind::Tree | ObjectKind::House)
    }
}

/// A simulated inhabitant of the world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Object {
    /// Objects with the same name never collide with each other
    pub name: String,
    pub kind: ObjectKind,
    pub parts: Vec<ObjectPart>,
    /// Local position offset
    pub position: Vec3,
    /// Rotation in degrees per axis, applied Z then Y then X
    pub rotation: Vec3,
    /// Stored world position of a world-roaming object; zero means screen-fixed
    pub world_offset: Vec3,
    /// Tile id this object stands on; 0 means not attached
    pub surface_attachment_id: u32,
    /// Lookup-only reference to the surface this object lives on
    pub parent_surface: Option<SurfaceHandle>,
    /// Crash boxes in local space
    pub crash_boxes: Vec<CrashBox>,
    pub has_collided: bool,
    /// Side hit by the most recent collision, consumed by the physics stage
    #[serde(default)]
    pub last_impact: Option<ImpactDirection>,
    #[serde(default)]
    pub physics: Option<PhysicsState>,
    #[serde(skip)]
    pub emitter: Option<ParticleEmitter>,
    #[serde(default)]
    pub movement: Option<MovementPolicy>,
}

impl Object {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parts: Vec::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            world_offset: Vec3::ZERO,
            surface_attachment_id: 0,
            parent_surface: None,
            crash_boxes: Vec::new(),
            has_collided: false,
            last_impact: None,
            physics: None,
            emitter: None,
            movement: None,
        }
    }

    pub fn with_part(mut self, part: ObjectPart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn with_crash_box(mut self, crash_box: CrashBox) -> Self {
        self.crash_boxes.push(crash_box);
        self
    }

    pub fn with_physics(mut self, physics: PhysicsState) -> Self {
        self.physics = Some(physics);
        self
    }

    pub fn with_emitter(mut self, emitter: ParticleEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn with_movement(mut self, movement: MovementPolicy) -> Self {
        self.movement = Some(movement);
        self
    }

    /// Stand on tile `tile_id` of `surface`
    pub fn attached_to(mut self, surface: SurfaceHandle, tile_id: u32) -> Self {
        self.parent_surface = Some(surface);
        self.surface_attachment_id = tile_id;
        self
    }

    /// Roam the world at `world_offset`, relative to `surface`
    pub fn roaming(mut self, surface: SurfaceHandle, world_offset: Vec3) -> Self {
        self.parent_surface = Some(surface);
        self.world_offset = world_offset;
        self
    }

    pub fn placement_kind(&self) -> PlacementKind {
        PlacementKind::of(self)
    }

    pub fn is_static(&self) -> bool {
        self.kind.is_static()
    }

    /// Triangles of all visible parts
    pub fn visible_triangles(&self) -> impl Iterator<Item = &Triangle> {
        self.parts
            .iter()
            .filter(|p| p.visible)
            .flat_map(|p| p.triangles.iter())
    }

    /// Forget collisions, for a scene reset
    pub fn clear_collision(&mut self) {
        self.has_collided = false;
        self.last_impact = None;
    }

    fn validate(&self, surfaces: &SurfaceRegistry) -> Result<(), SceneError> {
        for part in &self.parts {
            if part.triangles.iter().any(|t| !t.is_finite()) {
                return Err(SceneError::NonFiniteVertex {
                    object: self.name.clone(),
                    part: part.name.clone(),
                });
            }
        }
        if let Some(index) = self.crash_boxes.iter().position(|b| !b.is_ordered()) {
            return Err(SceneError::InvertedCrashBox {
                object: self.name.clone(),
                index,
            });
        }
        match self.parent_surface {
            Some(handle) if surfaces.get(handle).is_none() => {
                return Err(SceneError::DanglingSurface {
                    object: self.name.clone(),
                    handle: handle.0,
                    count: surfaces.len(),
                });
            }
            None if self.surface_attachment_id > 0 => {
                return Err(SceneError::MissingParentSurface {
                    object: self.name.clone(),
                    tile_id: self.surface_attachment_id,
                });
            }
            None if self.placement_kind() == PlacementKind::WorldRoaming => {
                return Err(SceneError::RoamingWithoutSurface {
                    object: self.name.clone(),
                });
            }
            _ => {}
        }
        if let Some(physics) = &self.physics {
            if physics.mass <= 0.0 {
                return Err(SceneError::NonPositiveMass {
                    object: self.name.clone(),
                    mass: physics.mass,
                });
            }
        }
        Ok(())
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub objects: Vec<Object>,
    pub surfaces: SurfaceRegistry,
    pub collision: CollisionContext,
    pub settings: SimSettings,
    /// Simulation clock in seconds
    pub time: f64,
    /// Frames simulated so far
    pub frame: u64,
}

impl World {
    /// Build a world from a fully constructed scene
    pub fn new(
        objects: Vec<Object>,
        surfaces: SurfaceRegistry,
        settings: SimSettings,
    ) -> Result<Self, SceneError> {
        for object in &objects {
            object.validate(&surfaces)?;
        }
        log::info!(
            "World created with {} objects on {} surfaces",
            objects.len(),
            surfaces.len()
        );
        Ok(Self {
            objects,
            surfaces,
            collision: CollisionContext::new(settings.static_check_interval),
            settings,
            time: 0.0,
            frame: 0,
        })
    }

    /// Index of the first object called `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.name == name)
    }

    /// Clear every collision flag
    pub fn reset_collisions(&mut self) {
        for object in &mut self.objects {
            object.clear_collision();
        }
    }
}
