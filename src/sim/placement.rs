//! Placement resolver
//!
//! Works out where an object's anchor sits in the world this frame, and
//! re-centers its geometry and crash boxes on that anchor.
//!
//! Placement kinds, by precedence:
//! - Surface-attached: anchor is the first vertex of a tile on the parent surface
//! - Screen-fixed: zero world offset, anchored to the screen reference
//! - World-roaming: anchor is the surface position minus the object's world offset

use serde::{Deserialize, Serialize};

use super::geometry::{CrashBox, Triangle, Vec3};
use super::state::Object;
use crate::settings::SimSettings;

/// Non-owning handle into a [`SurfaceRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceHandle(pub usize);

/// Terrain surface: a set of tiles plus its global position
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Surface {
    /// Position of the viewer's surface in world space
    pub global_position: Vec3,
    /// Currently active tiles
    pub tiles: Vec<Triangle>,
}

impl Surface {
    pub fn new(global_position: Vec3, tiles: Vec<Triangle>) -> Self {
        Self {
            global_position,
            tiles,
        }
    }

    /// Tile whose `surface_tile_id` matches
    pub fn tile(&self, id: u32) -> Option<&Triangle> {
        self.tiles.iter().find(|t| t.surface_tile_id == Some(id))
    }
}

/// All surfaces in the scene. Objects refer to them by handle only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurfaceRegistry {
    surfaces: Vec<Surface>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, surface: Surface) -> SurfaceHandle {
        self.surfaces.push(surface);
        SurfaceHandle(self.surfaces.len() - 1)
    }

    pub fn get(&self, handle: SurfaceHandle) -> Option<&Surface> {
        self.surfaces.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: SurfaceHandle) -> Option<&mut Surface> {
        self.surfaces.get_mut(handle.0)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

/// How an object is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    SurfaceAttached { tile_id: u32 },
    ScreenFixed,
    WorldRoaming,
}

impl PlacementKind {
    pub fn of(object: &Object) -> Self {
        if object.surface_attachment_id > 0 {
            PlacementKind::SurfaceAttached {
                tile_id: object.surface_attachment_id,
            }
        } else if object.world_offset == Vec3::ZERO {
            PlacementKind::ScreenFixed
        } else {
            PlacementKind::WorldRoaming
        }
    }
}

/// Anchor for this frame, or `None` if the object is not visible.
pub fn resolve_world_anchor(
    object: &Object,
    surfaces: &SurfaceRegistry,
    settings: &SimSettings,
) -> Option<Vec3> {
    match PlacementKind::of(object) {
        PlacementKind::SurfaceAttached { tile_id } => {
            let surface = object.parent_surface.and_then(|h| surfaces.get(h))?;
            surface.tile(tile_id).map(|tile| tile.vert1)
        }
        PlacementKind::ScreenFixed => Some(settings.screen_anchor),
        PlacementKind::WorldRoaming => {
            let surface = object.parent_surface.and_then(|h| surfaces.get(h))?;
            let distance = surface.global_position.distance(object.world_offset);
            (distance <= settings.visibility_radius)
                .then(|| surface.global_position - object.world_offset)
        }
    }
}

/// Point the object's geometry and crash boxes are centered on.
///
/// Surface-attached objects use the anchor alone; their local position has no
/// meaning once snapped to a tile.
pub fn placement_target(object: &Object, anchor: Vec3) -> Vec3 {
    match PlacementKind::of(object) {
        PlacementKind::SurfaceAttached { .. } => anchor,
        _ => anchor + object.position,
    }
}

/// Mean of all vertices
pub fn geometric_center(triangles: &[Triangle]) -> Vec3 {
    if triangles.is_empty() {
        return Vec3::ZERO;
    }
    let sum: Vec3 = triangles.iter().map(Triangle::centroid).sum();
    sum / triangles.len() as f32
}

/// Shift triangles so their geometric center lands on `target`
pub fn center_geometry(triangles: &mut [Triangle], target: Vec3) {
    let offset = target - geometric_center(triangles);
    for tri in triangles.iter_mut() {
        *tri = tri.translated(offset);
    }
}

/// Floor point of a set of boxes: horizontal center at the minimum Y
pub fn floor_point(boxes: &[CrashBox]) -> Vec3 {
    let Some(first) = boxes.first() else {
        return Vec3::ZERO;
    };
    let (min, max) = boxes
        .iter()
        .fold((first.min, first.max), |(lo, hi), b| (lo.min(b.min), hi.max(b.max)));
    Vec3::new((min.x + max.x) * 0.5, min.y, (min.z + max.z) * 0.5)
}

/// Shift boxes together so their floor point lands on `target`.
///
/// Boxes snap by their lowest Y rather than their mean, so an object rests on
/// its anchor.
pub fn center_crash_boxes(boxes: &mut [CrashBox], target: Vec3) {
    let offset = target - floor_point(boxes);
    for b in boxes.iter_mut() {
        *b = b.translated(offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::ObjectKind;

    fn registry_with_tiles() -> (SurfaceRegistry, SurfaceHandle) {
        let tiles = vec![
            Triangle::new(Vec3::new(10.0, 0.0, 10.0), Vec3::new(20.0, 0.0, 10.0), Vec3::new(10.0, 0.0, 20.0))
                .with_tile_id(1),
            Triangle::new(Vec3::new(50.0, 5.0, 50.0), Vec3::new(60.0, 5.0, 50.0), Vec3::new(50.0, 5.0, 60.0))
                .with_tile_id(7),
        ];
        let mut registry = SurfaceRegistry::new();
        let handle = registry.insert(Surface::new(Vec3::new(1000.0, 0.0, 1000.0), tiles));
        (registry, handle)
    }

    #[test]
    fn test_surface_attached_uses_tile_vertex() {
        let (registry, handle) = registry_with_tiles();
        let mut tree = Object::new("tree", ObjectKind::Tree);
        tree.surface_attachment_id = 7;
        tree.parent_surface = Some(handle);
        // Local position is ignored for attached objects
        tree.position = Vec3::new(99.0, 99.0, 99.0);

        let anchor = resolve_world_anchor(&tree, &registry, &SimSettings::default());
        assert_eq!(anchor, Some(Vec3::new(50.0, 5.0, 50.0)));
        assert_eq!(placement_target(&tree, anchor.unwrap()), Vec3::new(50.0, 5.0, 50.0));
    }

    #[test]
    fn test_missing_tile_is_invisible() {
        let (registry, handle) = registry_with_tiles();
        let mut house = Object::new("house", ObjectKind::House);
        house.surface_attachment_id = 3;
        house.parent_surface = Some(handle);
        assert_eq!(resolve_world_anchor(&house, &registry, &SimSettings::default()), None);

        house.parent_surface = None;
        assert_eq!(resolve_world_anchor(&house, &registry, &SimSettings::default()), None);
    }

    #[test]
    fn test_screen_fixed() {
        let registry = SurfaceRegistry::new();
        let ship = Object::new("ship", ObjectKind::Ship);
        let settings = SimSettings {
            screen_anchor: Vec3::new(0.0, 40.0, 300.0),
            ..SimSettings::default()
        };
        assert_eq!(PlacementKind::of(&ship), PlacementKind::ScreenFixed);
        assert_eq!(
            resolve_world_anchor(&ship, &registry, &settings),
            Some(Vec3::new(0.0, 40.0, 300.0))
        );
    }

    #[test]
    fn test_world_roaming_visibility_radius() {
        let (registry, handle) = registry_with_tiles();
        let settings = SimSettings::default();
        let mut seeder = Object::new("seeder", ObjectKind::Seeder);
        seeder.parent_surface = Some(handle);

        // 1400 units away: still visible
        seeder.world_offset = Vec3::new(1000.0, 0.0, 2400.0);
        assert_eq!(
            resolve_world_anchor(&seeder, &registry, &settings),
            Some(Vec3::new(0.0, 0.0, -1400.0))
        );

        // Just beyond
        seeder.world_offset = Vec3::new(1000.0, 0.0, 2401.0);
        assert_eq!(resolve_world_anchor(&seeder, &registry, &settings), None);
    }

    #[test]
    fn test_crash_boxes_snap_to_floor() {
        let mut boxes = vec![
            CrashBox::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 10.0, 1.0)),
            CrashBox::new(Vec3::new(-4.0, 10.0, -4.0), Vec3::new(4.0, 20.0, 4.0)),
        ];
        center_crash_boxes(&mut boxes, Vec3::new(100.0, 50.0, 100.0));
        assert_eq!(boxes[0].min, Vec3::new(99.0, 50.0, 99.0));
        // Relative layout is kept
        assert_eq!(boxes[1].max, Vec3::new(104.0, 70.0, 104.0));
    }

    #[test]
    fn test_center_geometry() {
        let mut tris = vec![Triangle::new(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0))];
        center_geometry(&mut tris, Vec3::new(10.0, 10.0, 10.0));
        assert!((geometric_center(&tris) - Vec3::new(10.0, 10.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_placement_is_idempotent() {
        let (registry, handle) = registry_with_tiles();
        let settings = SimSettings::default();
        let mut seeder = Object::new("seeder", ObjectKind::Seeder);
        seeder.parent_surface = Some(handle);
        seeder.world_offset = Vec3::new(900.0, 0.0, 800.0);
        seeder.position = Vec3::new(1.0, 2.0, 3.0);
        seeder.parts.push(crate::sim::ObjectPart::new(
            "hull",
            vec![Triangle::new(Vec3::ZERO, Vec3::X * 4.0, Vec3::Y * 4.0)],
        ));

        let first = resolve_world_anchor(&seeder, &registry, &settings).unwrap();
        let second = resolve_world_anchor(&seeder, &registry, &settings).unwrap();
        assert_eq!(first, second);

        let mut a = seeder.parts[0].triangles.clone();
        let mut b = seeder.parts[0].triangles.clone();
        center_geometry(&mut a, placement_target(&seeder, first));
        center_geometry(&mut b, placement_target(&seeder, second));
        assert_eq!(a, b);
        // Centering an already centered mesh does not drift
        let before = a.clone();
        center_geometry(&mut a, placement_target(&seeder, first));
        for (x, y) in a.iter().zip(&before) {
            assert!((x.vert1 - y.vert1).length() < 1e-4);
        }
    }
}
